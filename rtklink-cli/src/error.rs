//! CLI error handling with user-friendly messages.
//!
//! Centralizes error handling for the CLI, providing consistent formatting
//! and appropriate exit codes.

use std::fmt;
use std::process;

use rtklink::config::ConfigFileError;
use rtklink::directory::DirectoryError;
use rtklink::radio::RadioError;
use rtklink::tunnel::TunnelError;

/// CLI-specific errors with user-friendly messages.
#[derive(Debug)]
pub enum CliError {
    /// Failed to initialize logging
    LoggingInit(String),
    /// Configuration error
    Config(String),
    /// Failed to start the async runtime
    Runtime(std::io::Error),
    /// Failed to read rover input
    Input { path: String, error: std::io::Error },
    /// Sourcetable retrieval failed
    Directory(DirectoryError),
    /// Radio link error
    Radio(RadioError),
    /// Correction stream error
    Tunnel(TunnelError),
}

impl CliError {
    /// Exit the process with an appropriate error message and code.
    pub fn exit(&self) -> ! {
        eprintln!("Error: {}", self);

        match self {
            CliError::Directory(DirectoryError::Unauthorized)
            | CliError::Tunnel(TunnelError::Unauthorized) => {
                eprintln!();
                eprintln!("The caster rejected the account. Check caster.username and");
                eprintln!("caster.password in the config file ('rtklink config path').");
            }
            CliError::Tunnel(TunnelError::MountpointNotFound(_)) => {
                eprintln!();
                eprintln!("List the mountpoints this caster offers with: rtklink sourcetable");
            }
            CliError::Radio(RadioError::Connect(_)) => {
                eprintln!();
                eprintln!("Common issues:");
                eprintln!("  1. The radio bridge is powered off or out of range");
                eprintln!("  2. radio.address does not match the bridge's host:port");
                eprintln!("  3. Another client holds the bridge connection");
            }
            _ => {}
        }

        process::exit(1)
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::LoggingInit(msg) => write!(f, "Failed to initialize logging: {}", msg),
            CliError::Config(msg) => write!(f, "Configuration error: {}", msg),
            CliError::Runtime(e) => write!(f, "Failed to start runtime: {}", e),
            CliError::Input { path, error } => {
                write!(f, "Failed to read '{}': {}", path, error)
            }
            CliError::Directory(e) => write!(f, "Sourcetable error: {}", e),
            CliError::Radio(e) => write!(f, "Radio error: {}", e),
            CliError::Tunnel(e) => write!(f, "Correction stream error: {}", e),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::Runtime(e) => Some(e),
            CliError::Input { error, .. } => Some(error),
            CliError::Directory(e) => Some(e),
            CliError::Radio(e) => Some(e),
            CliError::Tunnel(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ConfigFileError> for CliError {
    fn from(e: ConfigFileError) -> Self {
        CliError::Config(e.to_string())
    }
}

impl From<DirectoryError> for CliError {
    fn from(e: DirectoryError) -> Self {
        CliError::Directory(e)
    }
}

impl From<RadioError> for CliError {
    fn from(e: RadioError) -> Self {
        CliError::Radio(e)
    }
}

impl From<TunnelError> for CliError {
    fn from(e: TunnelError) -> Self {
        CliError::Tunnel(e)
    }
}
