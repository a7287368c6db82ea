//! Client for the third-party media host that stores recipe images.

use crate::config::MediaConfig;
use crate::{Error, Result};
use reqwest::{multipart, Client};
use serde::Deserialize;
use sha2::{Digest, Sha256};
use tracing::{debug, error};

/// Subset of the upload response we rely on
#[derive(Debug, Deserialize)]
struct UploadResponse {
    secure_url: String,
}

/// Signed uploader for a Cloudinary-compatible image API
#[derive(Clone)]
pub struct MediaClient {
    client: Client,
    upload_url: String,
    api_key: String,
    api_secret: String,
}

impl MediaClient {
    /// Create a client, or `None` when the media host isn't configured
    pub fn from_config(config: &MediaConfig) -> Result<Option<Self>> {
        let (Some(cloud_name), Some(api_key), Some(api_secret)) =
            (&config.cloud_name, &config.api_key, &config.api_secret)
        else {
            return Ok(None);
        };

        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(60))
            .build()
            .map_err(|e| Error::Internal(format!("Failed to create HTTP client: {e}")))?;

        Ok(Some(Self {
            client,
            upload_url: format!(
                "{}/v1_1/{}/image/upload",
                config.base_url.trim_end_matches('/'),
                cloud_name
            ),
            api_key: api_key.clone(),
            api_secret: api_secret.clone(),
        }))
    }

    /// Upload an image and return its durable HTTPS URL
    pub async fn upload(&self, file_name: &str, data: Vec<u8>) -> Result<String> {
        let timestamp = chrono::Utc::now().timestamp().to_string();
        let signature = sign(&timestamp, &self.api_secret);

        let file = multipart::Part::bytes(data).file_name(file_name.to_string());
        let form = multipart::Form::new()
            .part("file", file)
            .text("api_key", self.api_key.clone())
            .text("timestamp", timestamp)
            .text("signature", signature)
            .text("signature_algorithm", "sha256");

        debug!("Uploading {} to media host", file_name);

        let response = self
            .client
            .post(&self.upload_url)
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unable to read error response".to_string());
            error!("Media host error: {} - {}", status, body);
            return Err(Error::Media(format!("Upload rejected with status {status}")));
        }

        let uploaded: UploadResponse = response
            .json()
            .await
            .map_err(|e| Error::Media(format!("Failed to parse upload response: {e}")))?;

        Ok(uploaded.secure_url)
    }
}

/// Request signature: hex SHA-256 of the signed parameters followed by the secret
fn sign(timestamp: &str, api_secret: &str) -> String {
    format!(
        "{:x}",
        Sha256::digest(format!("timestamp={timestamp}{api_secret}").as_bytes())
    )
}
