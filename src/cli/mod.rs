pub mod commands;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "pantry")]
#[command(about = "Pantry - recipe collection backend", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the API server
    Serve {
        /// Port to listen on
        #[arg(short, long, env = "PORT")]
        port: Option<u16>,

        /// Host to bind to
        #[arg(long, env = "HOST")]
        host: Option<String>,
    },

    /// Run database migrations
    Migrate,

    /// Search recipes on a running server
    Search {
        /// Search terms; every term must match the name, a tag or an ingredient
        terms: Vec<String>,

        /// Sort order: "Popular", "Recent" or "Highly Rated" (default: by name)
        #[arg(short, long)]
        filter: Option<String>,
    },
}
