use clap::Parser;
use pantry::{
    api::{handlers::AppState, routes},
    cli::{commands, Cli, Commands},
    config::Settings,
    db,
    media::MediaClient,
    Error, Result,
};
use std::net::SocketAddr;
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// How often expired sessions are purged
const SESSION_SWEEP_INTERVAL: Duration = Duration::from_secs(300);

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file if it exists
    let _ = dotenvy::dotenv();

    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,pantry=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Parse CLI arguments
    let cli = Cli::parse();

    // Load configuration
    let settings = Settings::from_env()?;
    settings.validate()?;

    match cli.command {
        Commands::Serve { port, host } => {
            serve(settings, port, host).await?;
        }
        Commands::Migrate => {
            migrate(settings).await?;
        }
        Commands::Search { terms, filter } => {
            let query = commands::query_from_args(terms, filter.as_deref());
            commands::search(&settings.server_url(), &query).await?;
        }
    }

    Ok(())
}

async fn serve(mut settings: Settings, port: Option<u16>, host: Option<String>) -> Result<()> {
    // Override settings with CLI arguments
    if let Some(port) = port {
        settings.server.port = port;
    }
    if let Some(host) = host {
        settings.server.host = host;
    }

    info!("Starting Pantry server");
    info!("Database: {}", settings.database.url);
    info!("Server: {}:{}", settings.server.host, settings.server.port);

    // Initialize database with connection pooling configuration
    let pool = db::init_pool_with_config(&settings.database).await?;
    info!(
        "Database connection established (max_connections: {}, min_connections: {})",
        settings.database.max_connections, settings.database.min_connections
    );

    // Run migrations
    db::run_migrations(&pool).await?;
    info!("Database migrations completed");

    let recipe_count = db::recipes::count_all_recipes(&pool).await?;
    info!("{} recipes in store", recipe_count);

    let media = MediaClient::from_config(&settings.media)?;
    if media.is_some() {
        info!("Media uploads enabled ({})", settings.media.base_url);
    } else {
        warn!("Media host credentials not set - image uploads are disabled");
    }

    // Periodically drop expired sessions
    let sweep_pool = pool.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(SESSION_SWEEP_INTERVAL);
        loop {
            interval.tick().await;
            match db::sessions::delete_expired_sessions(&sweep_pool).await {
                Ok(0) => {}
                Ok(n) => info!("Removed {} expired sessions", n),
                Err(e) => warn!("Session cleanup failed: {}", e.log_safe()),
            }
        }
    });

    let state = AppState {
        pool,
        media,
        settings: settings.clone(),
    };

    let app = routes::create_router(state, &settings);

    let addr = format!("{}:{}", settings.server.host, settings.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| Error::Internal(format!("Failed to bind to {addr}: {e}")))?;

    println!("\n========================================");
    println!("Pantry Server");
    println!("========================================");
    println!("Address: http://{addr}");
    println!("Allowed origin: {}", settings.server.cors_origin);
    println!("\nAPI Endpoints:");
    println!("  GET    /recipes?parameter=<term>&filter=<sort>");
    println!("  POST   /recipes");
    println!("  GET    /recipes/created");
    println!("  GET    /recipes/favorited");
    println!("  POST   /recipes/upload");
    println!("  GET    /recipes/:id");
    println!("  PATCH  /recipes/:id");
    println!("  DELETE /recipes/:id");
    println!("\nPress Ctrl+C to stop");
    println!("========================================\n");

    info!("Server listening on {}", addr);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    .map_err(|e| Error::Internal(format!("Server error: {e}")))?;

    info!("Shutting down...");
    Ok(())
}

async fn migrate(settings: Settings) -> Result<()> {
    info!("Running database migrations");

    let pool = db::init_pool(&settings.database.url).await?;
    db::run_migrations(&pool).await?;

    println!("\u{2713} Database migrations completed successfully");
    Ok(())
}
