use std::path::PathBuf;

use clap::Parser;

/// CLI for the wikinotes HTTP backend.
#[derive(Debug, Clone, Parser)]
#[command(name = "wikinotes-server", about = "HTTP/JSON backend for the wikinotes personal wiki")]
pub struct Cli {
    /// Path to the SQLite database file (created if missing)
    #[arg(long, env = "WIKINOTES_DB", default_value = "wikinotes.db")]
    pub db: PathBuf,

    /// Listen address for the HTTP API
    #[arg(long, env = "WIKINOTES_ADDR", default_value = "127.0.0.1:8080")]
    pub listen_addr: String,

    /// Front-end origins allowed to call the API (comma separated)
    #[arg(
        long = "cors-origin",
        env = "WIKINOTES_CORS_ORIGINS",
        value_delimiter = ',',
        default_values = [
            "http://localhost:5173",
            "http://localhost:5174",
            "http://localhost:3000",
        ]
    )]
    pub cors_origins: Vec<String>,

    /// Re-derive every page's links before serving
    #[arg(long, env = "WIKINOTES_REINDEX_ON_START")]
    pub reindex_on_start: bool,

    /// Enable debug logging
    #[arg(long, short)]
    pub verbose: bool,
}
