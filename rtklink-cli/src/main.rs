//! rtklink CLI - Command-line interface
//!
//! Relays RTK corrections from an NTRIP caster to a rover radio link and
//! offers a few tools to inspect casters and recorded rover output.

mod commands;
mod error;
mod runner;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use rtklink::radio::WritePolicy;

use commands::config::ConfigCommands;
use commands::decode::DecodeArgs;
use commands::run::RunArgs;
use commands::sourcetable::SourcetableArgs;

#[derive(Parser)]
#[command(name = "rtklink")]
#[command(version = rtklink::VERSION)]
#[command(about = "Relay RTK corrections from an NTRIP caster to a GNSS rover", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Stream corrections to the rover until interrupted
    Run {
        /// Mountpoint to stream from (disables automatic selection)
        #[arg(long)]
        mountpoint: Option<String>,

        /// Radio bridge address as host:port
        #[arg(long)]
        radio: Option<String>,

        /// Outbound buffering: fifo or latest
        #[arg(long)]
        policy: Option<WritePolicy>,

        /// Keep the configured mountpoint instead of choosing the nearest
        #[arg(long)]
        no_auto_select: bool,

        /// Enable debug logging
        #[arg(long)]
        debug: bool,
    },

    /// List the mountpoints of the configured caster
    Sourcetable {
        /// Latitude to rank mountpoints by distance
        #[arg(long, requires = "lon", allow_hyphen_values = true)]
        lat: Option<f64>,

        /// Longitude to rank mountpoints by distance
        #[arg(long, requires = "lat", allow_hyphen_values = true)]
        lon: Option<f64>,

        /// Search radius in kilometers
        #[arg(long)]
        radius: Option<f64>,

        /// Maximum number of mountpoints listed
        #[arg(long)]
        limit: Option<usize>,

        /// Enable debug logging
        #[arg(long)]
        debug: bool,
    },

    /// Decode recorded rover sentences
    Decode {
        /// File to read (defaults to stdin)
        input: Option<PathBuf>,

        /// Also print the satellites in view
        #[arg(long)]
        satellites: bool,
    },

    /// Manage the configuration file
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Run {
            mountpoint,
            radio,
            policy,
            no_auto_select,
            debug,
        } => commands::run::run(RunArgs {
            mountpoint,
            radio,
            policy,
            no_auto_select,
            debug,
        }),
        Commands::Sourcetable {
            lat,
            lon,
            radius,
            limit,
            debug,
        } => commands::sourcetable::run(SourcetableArgs {
            position: lat.zip(lon),
            radius_km: radius,
            limit,
            debug,
        }),
        Commands::Decode { input, satellites } => {
            commands::decode::run(DecodeArgs { input, satellites })
        }
        Commands::Config { command } => commands::config::run(command),
    };

    if let Err(e) = result {
        e.exit();
    }
}
