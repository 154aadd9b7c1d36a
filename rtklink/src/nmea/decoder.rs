//! Line-oriented sentence decoder.

use std::time::Instant;

use chrono::NaiveTime;
use thiserror::Error;
use tracing::trace;

use super::coordinate::{parse_coordinate, Axis};
use super::fix::{Fix, FixQuality, SentenceKind};
use super::satellites::{SatelliteAccumulator, SatelliteInView};
use crate::geo::Coordinates;

/// Start-of-record marker.
const MARKER: char = '$';

/// Separator between the record body and its checksum.
const CHECKSUM_SEPARATOR: char = '*';

/// Knots to kilometers per hour.
const KNOTS_TO_KMH: f64 = 1.852;

/// Minimum field count (address included) for a usable GGA record.
const GGA_MIN_FIELDS: usize = 7;

/// Minimum field count (address included) for a usable RMC record.
const RMC_MIN_FIELDS: usize = 7;

/// Reasons a record was dropped.
///
/// These never escape [`SentenceDecoder::decode`]; they are logged at trace
/// level and the record is skipped.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SentenceError {
    #[error("Record does not start with '$'")]
    MissingMarker,

    #[error("Invalid address field '{0}'")]
    InvalidAddress(String),

    #[error("Unsupported sentence type '{0}'")]
    Unsupported(String),

    #[error("Record has {found} fields, expected at least {expected}")]
    TooShort { found: usize, expected: usize },

    #[error("Invalid {0} field")]
    InvalidField(&'static str),

    #[error("GSV record {index}/{total} does not continue the current sequence")]
    OutOfSequence { index: u8, total: u8 },
}

/// Decoder for rover positioning sentences.
///
/// Holds the satellites-in-view accumulator, so each decoder instance owns its
/// own multi-record state. Use one decoder per input stream.
#[derive(Debug, Default)]
pub struct SentenceDecoder {
    satellites: SatelliteAccumulator,
}

impl SentenceDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode a block of newline-separated records.
    ///
    /// Returns the GGA and RMC fixes in input order. Malformed, unsupported
    /// and GSV records produce no output.
    pub fn decode(&mut self, text: &str) -> Vec<Fix> {
        text.lines()
            .filter_map(|line| self.decode_line(line))
            .collect()
    }

    /// Decode a single record.
    pub fn decode_line(&mut self, line: &str) -> Option<Fix> {
        let line = line.trim();
        if line.is_empty() {
            return None;
        }

        match self.parse_record(line) {
            Ok(fix) => fix,
            Err(e) => {
                trace!(error = %e, record = line, "Dropping positioning sentence");
                None
            }
        }
    }

    /// Last complete satellites-in-view set.
    pub fn satellites_in_view(&self) -> Option<&[SatelliteInView]> {
        self.satellites.completed()
    }

    fn parse_record(&mut self, line: &str) -> Result<Option<Fix>, SentenceError> {
        let body = line
            .strip_prefix(MARKER)
            .ok_or(SentenceError::MissingMarker)?;
        let body = body
            .split_once(CHECKSUM_SEPARATOR)
            .map(|(body, _checksum)| body)
            .unwrap_or(body);

        let fields: Vec<&str> = body.split(',').collect();
        let address = fields[0];
        if address.len() != 5 || !address.bytes().all(|b| b.is_ascii_alphanumeric()) {
            return Err(SentenceError::InvalidAddress(address.to_string()));
        }

        let (talker, code) = address.split_at(2);
        match SentenceKind::from_code(code) {
            Some(SentenceKind::PositionFix) => parse_gga(talker, &fields).map(Some),
            Some(SentenceKind::MinimumRecommended) => parse_rmc(talker, &fields).map(Some),
            Some(SentenceKind::SatellitesInView) => {
                self.satellites.push(&fields)?;
                Ok(None)
            }
            None => Err(SentenceError::Unsupported(code.to_string())),
        }
    }
}

/// GGA: time, lat, N/S, lon, E/W, quality, satellites, HDOP, altitude, M, ...
fn parse_gga(talker: &str, fields: &[&str]) -> Result<Fix, SentenceError> {
    require_fields(fields, GGA_MIN_FIELDS)?;

    Ok(Fix {
        kind: SentenceKind::PositionFix,
        talker: talker.to_string(),
        coordinates: parse_pair(fields, 2),
        altitude_m: field(fields, 9).parse().ok(),
        quality: FixQuality::from_code(field(fields, 6).parse().unwrap_or(0)),
        satellites: field(fields, 7).parse().unwrap_or(0),
        hdop: field(fields, 8).parse().ok(),
        speed_kmh: None,
        utc_time: parse_time(field(fields, 1)),
        received_at: Instant::now(),
    })
}

/// RMC: time, status, lat, N/S, lon, E/W, speed (knots), course, date, ...
fn parse_rmc(talker: &str, fields: &[&str]) -> Result<Fix, SentenceError> {
    require_fields(fields, RMC_MIN_FIELDS)?;

    // RMC carries no correction information: active means an autonomous fix
    let quality = match field(fields, 2) {
        "A" => FixQuality::Autonomous,
        _ => FixQuality::NoFix,
    };

    Ok(Fix {
        kind: SentenceKind::MinimumRecommended,
        talker: talker.to_string(),
        coordinates: parse_pair(fields, 3),
        altitude_m: None,
        quality,
        satellites: 0,
        hdop: None,
        speed_kmh: field(fields, 7)
            .parse::<f64>()
            .ok()
            .map(|knots| knots * KNOTS_TO_KMH),
        utc_time: parse_time(field(fields, 1)),
        received_at: Instant::now(),
    })
}

fn require_fields(fields: &[&str], expected: usize) -> Result<(), SentenceError> {
    if fields.len() < expected {
        return Err(SentenceError::TooShort {
            found: fields.len(),
            expected,
        });
    }
    Ok(())
}

fn field<'a>(fields: &[&'a str], index: usize) -> &'a str {
    fields.get(index).map(|f| f.trim()).unwrap_or("")
}

/// Decode a latitude/longitude pair starting at `start` (lat, N/S, lon, E/W).
///
/// Both halves must decode, otherwise the pair is absent.
fn parse_pair(fields: &[&str], start: usize) -> Option<Coordinates> {
    let latitude = parse_coordinate(
        field(fields, start),
        field(fields, start + 1),
        Axis::Latitude,
    )?;
    let longitude = parse_coordinate(
        field(fields, start + 2),
        field(fields, start + 3),
        Axis::Longitude,
    )?;
    Some(Coordinates::new(latitude, longitude))
}

/// Parse `hhmmss[.sss]`.
fn parse_time(value: &str) -> Option<NaiveTime> {
    let (clock, fraction) = value.split_once('.').unwrap_or((value, ""));
    if clock.len() != 6 || !clock.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    if !fraction.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }

    let hour: u32 = clock[0..2].parse().ok()?;
    let minute: u32 = clock[2..4].parse().ok()?;
    let second: u32 = clock[4..6].parse().ok()?;

    // Fractional digits beyond nanoseconds are ignored
    let digits = &fraction[..fraction.len().min(9)];
    let nanos = if digits.is_empty() {
        0
    } else {
        let value: u32 = digits.parse().ok()?;
        value * 10u32.pow(9 - digits.len() as u32)
    };

    NaiveTime::from_hms_nano_opt(hour, minute, second, nanos)
}
