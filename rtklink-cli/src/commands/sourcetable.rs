//! Sourcetable command - list the mountpoints a caster offers.

use rtklink::directory::{DirectoryClient, RankOptions};
use rtklink::geo::Coordinates;

use crate::error::CliError;
use crate::runner::CliRunner;

/// Arguments for the sourcetable command.
pub struct SourcetableArgs {
    /// Rank by distance to this position
    pub position: Option<(f64, f64)>,
    pub radius_km: Option<f64>,
    pub limit: Option<usize>,
    pub debug: bool,
}

/// Run the sourcetable command.
pub fn run(args: SourcetableArgs) -> Result<(), CliError> {
    let runner = CliRunner::with_debug(args.debug)?;
    runner.log_startup("sourcetable");

    let caster = runner.require_caster()?;
    let client = DirectoryClient::new(caster.address(), caster.credentials());
    let table = runner.block_on(client.fetch())??;

    let Some((latitude, longitude)) = args.position else {
        println!("{} mountpoints on {}", table.mountpoints.len(), client.caster());
        for record in &table.mountpoints {
            println!(
                "  {:<16} {:<20} {:<10} {:>9.4} {:>10.4}  {}",
                record.mountpoint,
                record.identifier,
                record.format,
                record.latitude,
                record.longitude,
                record.nav_system
            );
        }
        return Ok(());
    };

    let observer = Coordinates::new(latitude, longitude);
    if !observer.is_valid() {
        return Err(CliError::Config(format!(
            "Invalid position {}, {}",
            latitude, longitude
        )));
    }

    let defaults = runner.config().selection.rank_options();
    let options = RankOptions {
        radius_km: args.radius_km.unwrap_or(defaults.radius_km),
        max_results: args.limit.unwrap_or(defaults.max_results),
    };
    let ranked = table.nearest(observer, &options);
    if ranked.is_empty() {
        println!("No mountpoints within {} km", options.radius_km);
        return Ok(());
    }

    for candidate in ranked {
        println!(
            "  {:<16} {:>8.1} km  {:<20} {}",
            candidate.record.mountpoint,
            candidate.distance_km,
            candidate.record.identifier,
            candidate.record.format
        );
    }
    Ok(())
}
