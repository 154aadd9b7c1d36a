//! CLI runner for common setup and operations.
//!
//! Encapsulates config loading, logging initialization and the async runtime
//! so command handlers stay focused on their own work.

use std::future::Future;

use tracing::info;

use rtklink::config::ConfigFile;
use rtklink::logging::{init_logging, split_log_path, LoggingGuard};

use crate::error::CliError;

/// Runner that manages CLI lifecycle and common operations.
pub struct CliRunner {
    /// Logging guard - keeps logging active while runner exists
    #[allow(dead_code)]
    logging_guard: LoggingGuard,
    /// Loaded configuration file
    config: ConfigFile,
}

impl CliRunner {
    /// Create a new CLI runner with optional debug logging.
    ///
    /// Loads the config file (defaults when absent) and sends logs both to
    /// the configured file and to stdout.
    pub fn with_debug(debug_mode: bool) -> Result<Self, CliError> {
        let config = ConfigFile::load()?;

        let (log_dir, log_file) = split_log_path(&config.logging.file);
        let logging_guard = init_logging(&log_dir, &log_file, true, debug_mode)
            .map_err(|e| CliError::LoggingInit(e.to_string()))?;

        Ok(Self {
            logging_guard,
            config,
        })
    }

    /// Get the loaded configuration.
    pub fn config(&self) -> &ConfigFile {
        &self.config
    }

    /// Mutable access for command-line overrides.
    pub fn config_mut(&mut self) -> &mut ConfigFile {
        &mut self.config
    }

    /// Log startup information for a command.
    pub fn log_startup(&self, command: &str) {
        info!("rtklink v{}", rtklink::VERSION);
        info!("rtklink CLI: {} command", command);
    }

    /// Run a future to completion on a fresh multi-threaded runtime.
    pub fn block_on<F: Future>(&self, future: F) -> Result<F::Output, CliError> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()
            .map_err(CliError::Runtime)?;
        Ok(runtime.block_on(future))
    }

    /// Caster settings, failing when no host is configured.
    pub fn require_caster(&self) -> Result<&rtklink::config::CasterSettings, CliError> {
        if !self.config.caster.is_configured() {
            return Err(CliError::Config(
                "No caster configured. Set caster.host with 'rtklink config init' and edit the file."
                    .to_string(),
            ));
        }
        Ok(&self.config.caster)
    }
}
