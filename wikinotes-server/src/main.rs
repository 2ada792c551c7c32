//! wikinotes-server: HTTP/JSON backend for the wikinotes personal wiki.
//!
//! Serves page CRUD and backlink queries from a single SQLite database and
//! keeps the wiki-link graph in sync as pages change.

use anyhow::Result;
use clap::Parser;

use wikinotes_server::cli::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    wikinotes_server::run_with_cli(cli).await
}
