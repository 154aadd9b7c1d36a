//! Degrees-minutes coordinate fields.
//!
//! NMEA encodes latitude as `DDMM.MMMM` and longitude as `DDDMM.MMMM`, with a
//! separate hemisphere letter. The degree digit count is checked against the
//! axis instead of being inferred from field position, so a longitude
//! accidentally fed in as a latitude is rejected rather than misread.

/// Which coordinate a field encodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    Latitude,
    Longitude,
}

impl Axis {
    /// Number of degree digits before the two minute digits.
    pub fn degree_digits(&self) -> usize {
        match self {
            Self::Latitude => 2,
            Self::Longitude => 3,
        }
    }

    fn max_degrees(&self) -> f64 {
        match self {
            Self::Latitude => 90.0,
            Self::Longitude => 180.0,
        }
    }

    /// Sign for a hemisphere letter, or `None` if it does not belong to this axis.
    fn hemisphere_sign(&self, hemisphere: &str) -> Option<f64> {
        match (self, hemisphere.trim()) {
            (Self::Latitude, "N") | (Self::Longitude, "E") => Some(1.0),
            (Self::Latitude, "S") | (Self::Longitude, "W") => Some(-1.0),
            _ => None,
        }
    }

    fn hemisphere_letter(&self, negative: bool) -> char {
        match (self, negative) {
            (Self::Latitude, false) => 'N',
            (Self::Latitude, true) => 'S',
            (Self::Longitude, false) => 'E',
            (Self::Longitude, true) => 'W',
        }
    }
}

/// Parse a degrees-minutes field and hemisphere into signed decimal degrees.
///
/// Returns `None` for empty or malformed input: wrong degree digit count,
/// non-digit characters, minutes outside `[0, 60)`, degrees out of range, or
/// a hemisphere letter that does not belong to the axis.
pub fn parse_coordinate(field: &str, hemisphere: &str, axis: Axis) -> Option<f64> {
    let field = field.trim();
    let (whole, fraction) = field.split_once('.').unwrap_or((field, ""));

    if whole.len() != axis.degree_digits() + 2
        || !whole.bytes().all(|b| b.is_ascii_digit())
        || !fraction.bytes().all(|b| b.is_ascii_digit())
    {
        return None;
    }

    let split = whole.len() - 2;
    let degrees: f64 = field[..split].parse().ok()?;
    let minutes: f64 = field[split..].parse().ok()?;

    if !(0.0..60.0).contains(&minutes) {
        return None;
    }

    let value = degrees + minutes / 60.0;
    if value > axis.max_degrees() {
        return None;
    }

    let sign = axis.hemisphere_sign(hemisphere)?;
    Some(sign * value)
}

/// Format signed decimal degrees as a degrees-minutes field and hemisphere.
///
/// Minutes carry five decimals. Rounding is done on integer units, so a
/// value never renders as `60.00000` minutes.
pub fn format_coordinate(value: f64, axis: Axis) -> (String, char) {
    const SCALE: u64 = 100_000;
    const UNITS_PER_DEGREE: u64 = 60 * SCALE;

    let hemisphere = axis.hemisphere_letter(value < 0.0);
    let units = (value.abs() * UNITS_PER_DEGREE as f64).round() as u64;
    let degrees = units / UNITS_PER_DEGREE;
    let remainder = units % UNITS_PER_DEGREE;
    let minutes = remainder / SCALE;
    let fraction = remainder % SCALE;

    let field = format!(
        "{:0width$}{:02}.{:05}",
        degrees,
        minutes,
        fraction,
        width = axis.degree_digits()
    );
    (field, hemisphere)
}
