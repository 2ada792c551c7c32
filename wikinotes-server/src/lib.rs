//! Library entrypoint for wikinotes-server so tests (and other binaries) can
//! build the router without binding a socket.

pub mod cli;
pub mod config;
pub mod error;
pub mod server;

use anyhow::Result;
use tracing_subscriber::EnvFilter;

use crate::config::ServerConfig;

/// Install the global subscriber. `RUST_LOG` wins over `--verbose`; a
/// second call keeps the subscriber already installed.
fn init_tracing(verbose: bool) {
    let directives = if verbose {
        "wikinotes_server=debug,wikinotes_core=debug,tower_http=debug"
    } else {
        "wikinotes_server=info,wikinotes_core=info,tower_http=info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(directives));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(verbose)
        .try_init();
}

/// Run the server using CLI args (parsed by the caller).
pub async fn run_with_cli(cli: cli::Cli) -> Result<()> {
    init_tracing(cli.verbose);

    let cfg = ServerConfig::from_cli(&cli)?;
    server::serve(cfg).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_tracing_twice_is_harmless() {
        init_tracing(false);
        init_tracing(true);
    }
}
