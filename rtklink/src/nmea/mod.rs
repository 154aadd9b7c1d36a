//! Positioning sentence decoding.
//!
//! The rover streams NMEA 0183 text: one record per line, in the form
//! `$<talker><type>,<field>,...*<checksum>`. This module turns that text into
//! typed [`Fix`] records and builds the position report sent upstream to
//! casters that select the nearest base station.
//!
//! # Supported records
//!
//! - **GGA** - position fix with quality, satellite count, HDOP and altitude
//! - **RMC** - recommended minimum with ground speed
//! - **GSV** - satellites in view, accumulated across a multi-record sequence
//!
//! Malformed or unknown records are dropped; decoding never fails.
//!
//! # Example
//!
//! ```
//! use rtklink::nmea::SentenceDecoder;
//!
//! let mut decoder = SentenceDecoder::new();
//! let fixes = decoder.decode("$GPGGA,123519,4851.0000,N,00221.0000,E,4,12,0.9,35.2,M,47.0,M,,*47\r\n");
//! let coords = fixes[0].coordinates.unwrap();
//! assert!((coords.latitude - 48.85).abs() < 1e-9);
//! ```

mod assembler;
mod coordinate;
mod decoder;
mod encoder;
mod fix;
mod satellites;

pub use assembler::{LineAssembler, DEFAULT_MAX_LINE_BUFFER};
pub use coordinate::{format_coordinate, parse_coordinate, Axis};
pub use decoder::{SentenceDecoder, SentenceError};
pub use encoder::{checksum, encode_gga, ReportPosition, REPORT_HDOP, REPORT_SATELLITES};
pub use fix::{Fix, FixQuality, SentenceKind};
pub use satellites::{SatelliteAccumulator, SatelliteInView};
