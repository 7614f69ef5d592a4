//! Runtime construction and shared glue for the binary
//!
//! This module provides:
//! - The single-threaded tokio runtime the reactor runs on
//! - Configuration loading for server mode
//! - Shutdown signal handling

use std::path::Path;

use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::args::ServerArgs;
use crate::config::{Config, ConfigSource, load_config_with_fallback};
use crate::reactor::Reactor;
use crate::session::ServerSessionFactory;
use crate::storage;

/// Build the current-thread runtime
///
/// Every session runs on the reactor's dispatch loop, so extra worker
/// threads would only carry the socket reader and writer tasks.
pub fn build_runtime() -> Result<tokio::runtime::Runtime> {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to build tokio runtime")
}

/// Load the config file (or defaults) and overlay command-line arguments
pub fn load_server_config(args: &ServerArgs) -> Result<(Config, ConfigSource)> {
    let (mut config, source) = load_config_with_fallback(&args.config)?;
    args.apply(&mut config);
    config.validate()?;
    Ok((config, source))
}

/// Log where the configuration came from and what it selects
pub fn log_config(config: &Config, source: ConfigSource, path: &Path) {
    match source {
        ConfigSource::File => info!("Loaded configuration from {} '{}'", source.description(), path.display()),
        ConfigSource::Defaults => info!("Using {}", source.description()),
    }
    info!(
        "Storage backend: {} (root {})",
        config.storage.backend, config.storage.root
    );
}

/// Run the server until a shutdown signal arrives
pub async fn run_server(config: Config) -> Result<()> {
    let database = storage::open(&config.storage)?;
    let factory = ServerSessionFactory::new(database, config.protocol.max_string_length);

    let listener = Reactor::<ServerSessionFactory>::bind(&config.server.host, config.server.port)
        .await
        .context("Failed to start server")?;
    info!(
        "fusenet listening on {}:{}",
        config.server.host, config.server.port
    );

    let mut reactor = Reactor::new(factory, config.server.read_buffer_size)
        .with_output_limit(config.server.output_backlog_limit);
    reactor.serve(listener, shutdown_signal()).await?;

    info!("Server shutdown complete");
    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM on Unix)
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => info!("Received Ctrl+C"),
        () = terminate => info!("Received SIGTERM"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::args::{Cli, Mode};
    use crate::config::StorageBackend;
    use clap::Parser;
    use std::io::Write;

    fn server_args(extra: &[&str]) -> ServerArgs {
        let mut argv = vec!["fusenet", "server"];
        argv.extend_from_slice(extra);
        match Cli::try_parse_from(argv).unwrap().mode {
            Mode::Server(args) => args,
            Mode::Client(_) => panic!("expected server mode"),
        }
    }

    #[test]
    fn test_missing_config_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.toml");
        let path = path.to_str().unwrap();

        let (config, source) = load_server_config(&server_args(&["--config", path])).unwrap();
        assert_eq!(source, ConfigSource::Defaults);
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_arguments_override_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[server]\nport = 4100\n\n[storage]\nbackend = \"filesystem\"").unwrap();
        let path = file.path().to_str().unwrap();

        let (config, source) =
            load_server_config(&server_args(&["--config", path, "--port", "4200"])).unwrap();
        assert_eq!(source, ConfigSource::File);
        assert_eq!(config.server.port.get(), 4200);
        assert_eq!(config.storage.backend, StorageBackend::Filesystem);
    }

    #[test]
    fn test_runtime_builds() {
        let rt = build_runtime().unwrap();
        assert_eq!(rt.block_on(async { 1 + 1 }), 2);
    }
}
