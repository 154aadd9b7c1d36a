//! Geographic coordinate helpers.
//!
//! Positions are WGS84 latitude/longitude in decimal degrees, positive
//! north and east.

/// Mean Earth radius used for great-circle distances.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

const DEG_TO_RAD: f64 = std::f64::consts::PI / 180.0;

/// A latitude/longitude pair in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Great-circle distance to another point in kilometers.
    pub fn distance_km(&self, other: &Coordinates) -> f64 {
        distance_km(
            (self.latitude, self.longitude),
            (other.latitude, other.longitude),
        )
    }

    /// True when both values are finite and inside the valid WGS84 range.
    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && (-90.0..=90.0).contains(&self.latitude)
            && (-180.0..=180.0).contains(&self.longitude)
    }
}

impl std::fmt::Display for Coordinates {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.6}, {:.6}", self.latitude, self.longitude)
    }
}

/// Calculate the great-circle distance between two positions.
///
/// Uses the haversine formula with a spherical Earth of radius
/// [`EARTH_RADIUS_KM`].
///
/// # Arguments
///
/// * `from` - First position as (latitude, longitude) in degrees
/// * `to` - Second position as (latitude, longitude) in degrees
///
/// # Example
///
/// ```
/// use rtklink::geo::distance_km;
///
/// // One degree of latitude is roughly 111 km
/// let dist = distance_km((0.0, 0.0), (1.0, 0.0));
/// assert!((dist - 111.19).abs() < 0.1);
/// ```
pub fn distance_km(from: (f64, f64), to: (f64, f64)) -> f64 {
    let (lat1, lon1) = from;
    let (lat2, lon2) = to;

    let lat1_rad = lat1 * DEG_TO_RAD;
    let lat2_rad = lat2 * DEG_TO_RAD;
    let delta_lat = (lat2 - lat1) * DEG_TO_RAD;
    let delta_lon = (lon2 - lon1) * DEG_TO_RAD;

    let a = (delta_lat / 2.0).sin().powi(2)
        + lat1_rad.cos() * lat2_rad.cos() * (delta_lon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().min(1.0).asin();

    EARTH_RADIUS_KM * c
}

#[cfg(test)]
mod tests {
    use super::*;

    const PARIS: (f64, f64) = (48.8566, 2.3522);
    const LONDON: (f64, f64) = (51.5074, -0.1278);

    #[test]
    fn test_distance_to_self_is_zero() {
        assert_eq!(distance_km(PARIS, PARIS), 0.0);
    }

    #[test]
    fn test_distance_is_symmetric() {
        assert_eq!(distance_km(PARIS, LONDON), distance_km(LONDON, PARIS));
    }

    #[test]
    fn test_paris_london_distance() {
        let dist = distance_km(PARIS, LONDON);
        assert!((dist - 343.5).abs() < 1.0, "got {dist}");
    }

    #[test]
    fn test_antipodal_points() {
        let dist = distance_km((0.0, 0.0), (0.0, 180.0));
        assert!((dist - std::f64::consts::PI * EARTH_RADIUS_KM).abs() < 1e-6);
    }

    #[test]
    fn test_coordinates_validity() {
        assert!(Coordinates::new(48.85, 2.35).is_valid());
        assert!(!Coordinates::new(91.0, 0.0).is_valid());
        assert!(!Coordinates::new(0.0, f64::NAN).is_valid());
    }
}
