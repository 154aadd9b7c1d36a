//! Decoded fix records.

use std::time::Instant;

use chrono::NaiveTime;

use crate::geo::Coordinates;

/// Kind of positioning sentence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SentenceKind {
    /// GGA - global positioning system fix data.
    PositionFix,
    /// RMC - recommended minimum navigation information.
    MinimumRecommended,
    /// GSV - satellites in view. Accumulated, never yields a [`Fix`].
    SatellitesInView,
}

impl SentenceKind {
    /// Map a three-letter sentence type code.
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "GGA" => Some(Self::PositionFix),
            "RMC" => Some(Self::MinimumRecommended),
            "GSV" => Some(Self::SatellitesInView),
            _ => None,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Self::PositionFix => "GGA",
            Self::MinimumRecommended => "RMC",
            Self::SatellitesInView => "GSV",
        }
    }
}

/// GGA fix quality indicator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum FixQuality {
    /// No fix. Coordinates must not be trusted.
    #[default]
    NoFix = 0,
    /// Autonomous GNSS fix.
    Autonomous = 1,
    /// Differential GNSS fix.
    Differential = 2,
    /// PPS fix.
    Pps = 3,
    /// RTK with fixed integer ambiguities.
    RtkFixed = 4,
    /// RTK with float ambiguities.
    RtkFloat = 5,
    /// Dead reckoning.
    DeadReckoning = 6,
}

impl FixQuality {
    /// Convert an integer code. Unknown codes map to [`FixQuality::NoFix`].
    pub fn from_code(code: u8) -> Self {
        match code {
            1 => Self::Autonomous,
            2 => Self::Differential,
            3 => Self::Pps,
            4 => Self::RtkFixed,
            5 => Self::RtkFloat,
            6 => Self::DeadReckoning,
            _ => Self::NoFix,
        }
    }

    pub fn code(&self) -> u8 {
        *self as u8
    }

    /// True for every quality other than [`FixQuality::NoFix`].
    pub fn has_fix(&self) -> bool {
        *self != Self::NoFix
    }

    pub fn is_rtk(&self) -> bool {
        matches!(self, Self::RtkFixed | Self::RtkFloat)
    }
}

impl std::fmt::Display for FixQuality {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoFix => write!(f, "No fix"),
            Self::Autonomous => write!(f, "Autonomous"),
            Self::Differential => write!(f, "DGNSS"),
            Self::Pps => write!(f, "PPS"),
            Self::RtkFixed => write!(f, "RTK fixed"),
            Self::RtkFloat => write!(f, "RTK float"),
            Self::DeadReckoning => write!(f, "Dead reckoning"),
        }
    }
}

/// One decoded positioning sentence.
///
/// Coordinates are stored as a pair, so latitude and longitude are always
/// present together or absent together.
#[derive(Debug, Clone, PartialEq)]
pub struct Fix {
    pub kind: SentenceKind,
    /// Two-letter talker identifier (`GP`, `GN`, `GL`, ...).
    pub talker: String,
    pub coordinates: Option<Coordinates>,
    /// Altitude above mean sea level in meters (GGA only).
    pub altitude_m: Option<f64>,
    pub quality: FixQuality,
    pub satellites: u8,
    pub hdop: Option<f32>,
    /// Ground speed in km/h (RMC only).
    pub speed_kmh: Option<f64>,
    /// UTC time of the fix as reported by the receiver.
    pub utc_time: Option<NaiveTime>,
    /// Local time the record was decoded.
    pub received_at: Instant,
}

impl Fix {
    /// Coordinates, but only when the fix quality says they can be used.
    pub fn trusted_coordinates(&self) -> Option<Coordinates> {
        if self.quality.has_fix() {
            self.coordinates
        } else {
            None
        }
    }
}
