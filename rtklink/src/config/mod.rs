//! Configuration for rtklink.
//!
//! User settings live in `~/.rtklink/config.ini`:
//!
//! - [`settings`] - one struct per INI section
//! - [`defaults`] - `DEFAULT_*` constants and `ConfigFile::default()`
//! - `parser` / `writer` - INI to settings and back
//!
//! Settings convert into the runtime configuration of each component
//! (`TransportConfig`, `TunnelConfig`, `CorrectionLoopConfig`).

pub mod defaults;
mod file;
mod parser;
pub mod settings;
mod writer;

pub use defaults::*;
pub use file::{config_directory, config_file_path, ConfigFileError};
pub use settings::{
    CasterSettings, ConfigFile, LoggingSettings, RadioSettings, SelectionSettings, TunnelSettings,
};
