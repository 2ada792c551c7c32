use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{Context, Result};
use axum::http::HeaderValue;

use crate::cli::Cli;

/// Runtime configuration derived from CLI/env.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub db_path: PathBuf,
    pub listen_addr: SocketAddr,
    pub cors_origins: Vec<HeaderValue>,
    pub reindex_on_start: bool,
}

impl ServerConfig {
    pub fn from_cli(cli: &Cli) -> Result<Self> {
        let db_path = if cli.db.is_relative() {
            std::env::current_dir()?.join(&cli.db)
        } else {
            cli.db.clone()
        };

        let listen_addr = cli
            .listen_addr
            .parse()
            .with_context(|| format!("invalid listen address: {}", cli.listen_addr))?;

        let cors_origins = cli
            .cors_origins
            .iter()
            .map(|origin| origin.trim())
            .filter(|origin| !origin.is_empty())
            .map(|origin| {
                HeaderValue::from_str(origin)
                    .with_context(|| format!("invalid CORS origin: {origin}"))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            db_path,
            listen_addr,
            cors_origins,
            reindex_on_start: cli.reindex_on_start,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_defaults() {
        let cli = Cli::parse_from(["wikinotes-server"]);
        let cfg = ServerConfig::from_cli(&cli).unwrap();

        assert!(cfg.db_path.is_absolute());
        assert!(cfg.db_path.ends_with("wikinotes.db"));
        assert_eq!(cfg.listen_addr, "127.0.0.1:8080".parse().unwrap());
        assert_eq!(cfg.cors_origins.len(), 3);
        assert!(!cfg.reindex_on_start);
    }

    #[test]
    fn test_explicit_values() {
        let cli = Cli::parse_from([
            "wikinotes-server",
            "--db",
            "/var/lib/wikinotes/pages.db",
            "--listen-addr",
            "0.0.0.0:9000",
            "--cors-origin",
            "https://wiki.example.com, https://notes.example.com",
            "--reindex-on-start",
        ]);
        let cfg = ServerConfig::from_cli(&cli).unwrap();

        assert_eq!(cfg.db_path, PathBuf::from("/var/lib/wikinotes/pages.db"));
        assert_eq!(cfg.listen_addr.port(), 9000);
        assert_eq!(
            cfg.cors_origins,
            vec![
                HeaderValue::from_static("https://wiki.example.com"),
                HeaderValue::from_static("https://notes.example.com"),
            ]
        );
        assert!(cfg.reindex_on_start);
    }

    #[test]
    fn test_bad_listen_addr() {
        let cli = Cli::parse_from(["wikinotes-server", "--listen-addr", "not-an-addr"]);
        assert!(ServerConfig::from_cli(&cli).is_err());
    }
}
