use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    pub database: DatabaseConfig,
    pub server: ServerConfig,
    pub session: SessionConfig,
    pub media: MediaConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub connection_timeout_seconds: u64,
    pub idle_timeout_seconds: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub external_url: Option<String>,
    pub api_rate_limit: u64,
    pub max_request_body_size: usize,
    pub cors_origin: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    pub cookie_name: String,
    pub ttl_seconds: u64,
}

/// Credentials for the media host. Uploads are disabled when any of the
/// three credentials is missing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaConfig {
    pub base_url: String,
    pub cloud_name: Option<String>,
    pub api_key: Option<String>,
    #[serde(skip_serializing)]
    pub api_secret: Option<String>,
}

/// Read `name` from the environment, falling back to `default`
fn env_or<T: FromStr>(name: &str, default: &str) -> Result<T> {
    std::env::var(name)
        .unwrap_or_else(|_| default.to_string())
        .parse()
        .map_err(|_| Error::Config(format!("Invalid {name} value")))
}

impl Settings {
    /// Load settings from environment variables
    pub fn from_env() -> Result<Self> {
        let database_url = std::env::var("DATABASE_URL")
            .unwrap_or_else(|_| "sqlite:./data/pantry.db?mode=rwc".to_string());

        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let port = env_or("PORT", "3000")?;
        let external_url = std::env::var("EXTERNAL_URL").ok();
        let api_rate_limit = env_or("API_RATE_LIMIT", "100")?;
        let max_request_body_size = env_or("MAX_REQUEST_BODY_SIZE", "10485760")?;
        let cors_origin = std::env::var("CORS_ORIGIN")
            .unwrap_or_else(|_| "https://pantrydev.netlify.app".to_string());

        let max_connections = env_or("DATABASE_MAX_CONNECTIONS", "25")?;
        let min_connections = env_or("DATABASE_MIN_CONNECTIONS", "5")?;
        let connection_timeout_seconds = env_or("DATABASE_CONNECTION_TIMEOUT", "30")?;
        let idle_timeout_seconds = env_or("DATABASE_IDLE_TIMEOUT", "600")?;

        let cookie_name =
            std::env::var("SESSION_COOKIE").unwrap_or_else(|_| "pantry.sid".to_string());
        // Sessions expire after ten minutes unless configured otherwise
        let ttl_seconds = env_or("SESSION_TTL", "600")?;

        let media = MediaConfig {
            base_url: std::env::var("CLOUDINARY_URL_BASE")
                .unwrap_or_else(|_| "https://api.cloudinary.com".to_string()),
            cloud_name: std::env::var("CLOUDINARY_NAME").ok(),
            api_key: std::env::var("CLOUDINARY_KEY").ok(),
            api_secret: std::env::var("CLOUDINARY_SECRET").ok(),
        };

        Ok(Settings {
            database: DatabaseConfig {
                url: database_url,
                max_connections,
                min_connections,
                connection_timeout_seconds,
                idle_timeout_seconds,
            },
            server: ServerConfig {
                host,
                port,
                external_url,
                api_rate_limit,
                max_request_body_size,
                cors_origin,
            },
            session: SessionConfig {
                cookie_name,
                ttl_seconds,
            },
            media,
        })
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.server.port == 0 {
            return Err(Error::Config("Port must be non-zero".to_string()));
        }

        if self.server.api_rate_limit == 0 {
            return Err(Error::Config("API rate limit must be non-zero".to_string()));
        }

        if self.session.ttl_seconds == 0 {
            return Err(Error::Config("Session TTL must be non-zero".to_string()));
        }

        if self.server.cors_origin.parse::<axum::http::HeaderValue>().is_err() {
            return Err(Error::Config(format!(
                "Invalid CORS_ORIGIN: {}",
                self.server.cors_origin
            )));
        }

        Ok(())
    }

    /// Base URL clients use to reach this server
    pub fn server_url(&self) -> String {
        self.server
            .external_url
            .clone()
            .unwrap_or_else(|| format!("http://{}:{}", self.server.host, self.server.port))
    }
}

#[cfg(test)]
pub(crate) fn test_settings() -> Settings {
    Settings {
        database: DatabaseConfig {
            url: "sqlite::memory:".to_string(),
            max_connections: 1,
            min_connections: 1,
            connection_timeout_seconds: 30,
            idle_timeout_seconds: 600,
        },
        server: ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 3000,
            external_url: None,
            api_rate_limit: 100,
            max_request_body_size: 10485760,
            cors_origin: "https://pantrydev.netlify.app".to_string(),
        },
        session: SessionConfig {
            cookie_name: "pantry.sid".to_string(),
            ttl_seconds: 600,
        },
        media: MediaConfig {
            base_url: "https://api.cloudinary.com".to_string(),
            cloud_name: None,
            api_key: None,
            api_secret: None,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_settings_validation() {
        let mut settings = test_settings();
        assert!(settings.validate().is_ok());

        settings.server.port = 0;
        assert!(settings.validate().is_err());

        let mut settings = test_settings();
        settings.session.ttl_seconds = 0;
        assert!(settings.validate().is_err());

        let mut settings = test_settings();
        settings.server.cors_origin = "bad\norigin".to_string();
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_server_url_prefers_external() {
        let mut settings = test_settings();
        assert_eq!(settings.server_url(), "http://127.0.0.1:3000");

        settings.server.external_url = Some("https://pantry.example.com".to_string());
        assert_eq!(settings.server_url(), "https://pantry.example.com");
    }
}
