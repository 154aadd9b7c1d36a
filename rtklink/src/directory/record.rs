//! Sourcetable `STR` records.

use crate::geo::Coordinates;

/// Minimum number of `;`-separated fields in a usable `STR` line.
///
/// The full record has 19 fields; the trailing `misc` field is optional.
pub const STR_MIN_FIELDS: usize = 18;

/// Whether a mountpoint is served by a single base or a network solution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Solution {
    #[default]
    SingleBase,
    Network,
}

/// One mountpoint advertised by a caster.
///
/// Distance to the observer is not stored; it is computed when ranking.
#[derive(Debug, Clone, PartialEq)]
pub struct MountpointRecord {
    /// Name used in the request path.
    pub mountpoint: String,
    /// Human-readable source identifier (often a city name).
    pub identifier: String,
    /// Data format, e.g. `RTCM 3.2`.
    pub format: String,
    /// Message types and rates.
    pub format_details: String,
    /// Carrier phase information: 0 none, 1 L1, 2 L1+L2.
    pub carrier: u8,
    /// Navigation systems, e.g. `GPS+GLO+GAL`.
    pub nav_system: String,
    pub network: String,
    /// ISO 3166 country code.
    pub country: String,
    pub latitude: f64,
    pub longitude: f64,
    /// Client must send its position (GGA) to receive data.
    pub nmea_required: bool,
    pub solution: Solution,
    pub generator: String,
    pub compression: String,
    /// `N` none, `B` basic, `D` digest.
    pub authentication: String,
    /// Access is charged.
    pub fee: bool,
    /// Bits per second.
    pub bitrate: u32,
    pub misc: String,
}

impl MountpointRecord {
    /// Parse a sourcetable line. Returns `None` unless it is a complete `STR` record.
    pub fn parse_line(line: &str) -> Option<Self> {
        let fields: Vec<&str> = line.trim().split(';').collect();
        if fields.len() < STR_MIN_FIELDS || fields[0] != "STR" {
            return None;
        }

        let text = |i: usize| fields.get(i).map(|f| f.trim().to_string()).unwrap_or_default();
        let flag = |i: usize| fields.get(i).map(|f| f.trim() == "1" || f.trim() == "Y");

        let latitude = fields[9].trim().parse::<f64>().ok()?;
        let longitude = fields[10].trim().parse::<f64>().ok()?;
        if !latitude.is_finite() || !longitude.is_finite() {
            return None;
        }

        Some(Self {
            mountpoint: text(1),
            identifier: text(2),
            format: text(3),
            format_details: text(4),
            carrier: fields[5].trim().parse().unwrap_or(0),
            nav_system: text(6),
            network: text(7),
            country: text(8),
            latitude,
            longitude,
            nmea_required: flag(11).unwrap_or(false),
            solution: match fields[12].trim() {
                "1" => Solution::Network,
                _ => Solution::SingleBase,
            },
            generator: text(13),
            compression: text(14),
            authentication: text(15),
            fee: flag(16).unwrap_or(false),
            bitrate: fields[17].trim().parse().unwrap_or(0),
            // Misc may itself contain ';'
            misc: fields.get(18..).map(|rest| rest.join(";")).unwrap_or_default(),
        })
    }

    pub fn coordinates(&self) -> Coordinates {
        Coordinates::new(self.latitude, self.longitude)
    }

    /// Mountpoint name compared case-insensitively.
    pub fn is_named(&self, name: &str) -> bool {
        self.mountpoint.eq_ignore_ascii_case(name)
    }
}
