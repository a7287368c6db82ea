pub mod config;
pub mod db;
pub mod error;

// Recipe listing queries
pub mod search;

// Third-party media host
pub mod media;

// HTTP API
pub mod api;

// Command-line interface
pub mod cli;

// Utilities
pub mod utils;

// Re-exports
pub use config::Settings;
pub use error::{Error, Result};
