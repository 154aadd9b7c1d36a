//! Decode command - print the fixes found in recorded rover output.

use std::io::Read;
use std::path::PathBuf;

use rtklink::nmea::{Fix, SentenceDecoder};

use crate::error::CliError;

/// Arguments for the decode command.
pub struct DecodeArgs {
    /// Input file; stdin when absent
    pub input: Option<PathBuf>,
    /// Print the last complete satellites-in-view set
    pub satellites: bool,
}

/// Run the decode command.
pub fn run(args: DecodeArgs) -> Result<(), CliError> {
    let (label, text) = match &args.input {
        Some(path) => {
            let text = std::fs::read(path).map_err(|error| CliError::Input {
                path: path.display().to_string(),
                error,
            })?;
            (path.display().to_string(), String::from_utf8_lossy(&text).into_owned())
        }
        None => {
            let mut text = Vec::new();
            std::io::stdin()
                .read_to_end(&mut text)
                .map_err(|error| CliError::Input {
                    path: "<stdin>".to_string(),
                    error,
                })?;
            ("<stdin>".to_string(), String::from_utf8_lossy(&text).into_owned())
        }
    };

    let mut decoder = SentenceDecoder::new();
    let fixes = decoder.decode(&text);
    for fix in &fixes {
        println!("{}", describe(fix));
    }

    if args.satellites {
        match decoder.satellites_in_view() {
            Some(view) => {
                println!();
                println!("Satellites in view: {}", view.len());
                for satellite in view {
                    println!(
                        "  PRN {:>3}  elev {:>3}  azim {:>3}  snr {}",
                        satellite.prn,
                        optional(satellite.elevation),
                        optional(satellite.azimuth),
                        optional(satellite.snr),
                    );
                }
            }
            None => println!("No complete satellites-in-view sequence"),
        }
    }

    eprintln!("{}: {} fixes decoded", label, fixes.len());
    Ok(())
}

fn describe(fix: &Fix) -> String {
    let position = fix
        .coordinates
        .map(|c| format!("{:.7}, {:.7}", c.latitude, c.longitude))
        .unwrap_or_else(|| "no position".to_string());
    let mut line = format!(
        "{}{} {:<12} {}  sats {}",
        fix.talker,
        fix.kind.code(),
        fix.quality.to_string(),
        position,
        fix.satellites
    );
    if let Some(hdop) = fix.hdop {
        line.push_str(&format!("  hdop {:.1}", hdop));
    }
    if let Some(altitude) = fix.altitude_m {
        line.push_str(&format!("  alt {:.1} m", altitude));
    }
    if let Some(speed) = fix.speed_kmh {
        line.push_str(&format!("  {:.1} km/h", speed));
    }
    if let Some(time) = fix.utc_time {
        line.push_str(&format!("  {}Z", time.format("%H:%M:%S%.3f")));
    }
    line
}

fn optional<T: std::fmt::Display>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_else(|| "-".to_string())
}
