//! CLI command implementations.
//!
//! Each subcommand has its own module with argument definitions and handlers.
//!
//! # Command Modules
//!
//! - [`config`] - Configuration management (init, show, path)
//! - [`decode`] - Decode rover sentences from a file or stdin
//! - [`run`] - Main command (relay corrections to the rover)
//! - [`sourcetable`] - List a caster's mountpoints

pub mod config;
pub mod decode;
pub mod run;
pub mod sourcetable;
