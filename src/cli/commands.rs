//! CLI command implementations

use std::path::Path;
use std::sync::Arc;

use crate::config::DriverConfig;
use crate::driver::Driver;
use crate::filter::PatternArtifactFilter;
use crate::http_server::HttpServer;
use crate::model::DefaultArtifactValidator;
use crate::observability::init_logging;
use crate::repo::{HttpRepositoryManager, InMemoryRepositoryManager, RepositoryManager};

use super::args::Command;
use super::errors::{CliError, CliResult};

/// Parse arguments and run the selected command
pub fn run() -> CliResult<()> {
    let cli = super::args::Cli::parse_args();
    run_command(cli.command)
}

/// Run the appropriate command based on CLI args
pub fn run_command(cmd: Command) -> CliResult<()> {
    match cmd {
        Command::Serve { config, in_memory } => serve(&config, in_memory),
        Command::CheckConfig { config } => check_config(&config),
    }
}

/// Load, validate and report a configuration file.
pub fn check_config(config_path: &Path) -> CliResult<()> {
    let config = DriverConfig::load(config_path)?;
    println!(
        "Configuration OK: repository manager {}, listening on {}",
        config.repository_manager.url,
        config.server.socket_addr()
    );
    Ok(())
}

/// Start the driver and serve until interrupted.
pub fn serve(config_path: &Path, in_memory: bool) -> CliResult<()> {
    let config = DriverConfig::load(config_path)?;
    init_logging(&config.logging);

    let runtime = tokio::runtime::Runtime::new()
        .map_err(|e| CliError::boot_failed(format!("Failed to create tokio runtime: {}", e)))?;

    runtime.block_on(async {
        let repository: Arc<dyn RepositoryManager> = if in_memory {
            tracing::warn!("Using in-memory repository manager; nothing is persisted");
            Arc::new(InMemoryRepositoryManager::new(&config.repository_manager.url))
        } else {
            Arc::new(HttpRepositoryManager::new(&config.repository_manager)?)
        };
        let filter = Arc::new(PatternArtifactFilter::from_config(&config)?);

        let driver = Arc::new(Driver::new(
            &config,
            repository,
            filter,
            Arc::new(DefaultArtifactValidator),
        )?);

        HttpServer::new(config.server.clone(), driver)
            .start(config.shutdown_timeout())
            .await
            .map_err(|e| CliError::serve_failed(format!("HTTP server failed: {}", e)))
    })
}
