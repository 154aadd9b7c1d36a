//! Upstream position report.
//!
//! Casters serving the virtual `NEAR` mountpoint pick a base station from a
//! GGA sentence sent by the client. The report is rebuilt from the current
//! position with a fixed autonomous quality.

use chrono::{NaiveTime, Timelike};

use super::coordinate::{format_coordinate, Axis};
use crate::geo::Coordinates;

/// Satellite count reported upstream.
pub const REPORT_SATELLITES: u8 = 12;

/// HDOP reported upstream.
pub const REPORT_HDOP: f32 = 1.0;

/// Observer position reported to the caster.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReportPosition {
    pub coordinates: Coordinates,
    /// Altitude above mean sea level in meters.
    pub altitude_m: f64,
}

impl ReportPosition {
    pub fn new(coordinates: Coordinates, altitude_m: f64) -> Self {
        Self {
            coordinates,
            altitude_m,
        }
    }
}

/// XOR of every byte of the record body (between `$` and `*`).
pub fn checksum(body: &str) -> u8 {
    body.bytes().fold(0, |acc, b| acc ^ b)
}

/// Build a `$GPGGA` report, CRLF terminated.
pub fn encode_gga(position: &ReportPosition, utc: NaiveTime) -> String {
    let (lat, ns) = format_coordinate(position.coordinates.latitude, Axis::Latitude);
    let (lon, ew) = format_coordinate(position.coordinates.longitude, Axis::Longitude);
    let time = format!(
        "{:02}{:02}{:02}.{:02}",
        utc.hour(),
        utc.minute(),
        utc.second(),
        (utc.nanosecond() % 1_000_000_000) / 10_000_000
    );

    let body = format!(
        "GPGGA,{time},{lat},{ns},{lon},{ew},1,{:02},{:.1},{:.3},M,0.000,M,,",
        REPORT_SATELLITES, REPORT_HDOP, position.altitude_m
    );
    format!("${}*{:02X}\r\n", body, checksum(&body))
}
