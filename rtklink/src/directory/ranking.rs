//! Distance ranking of mountpoints.

use super::record::MountpointRecord;
use crate::geo::Coordinates;

/// Default search radius around the observer.
pub const DEFAULT_RADIUS_KM: f64 = 50.0;

/// Default number of mountpoints returned.
pub const DEFAULT_MAX_RESULTS: usize = 5;

/// Ranking limits.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RankOptions {
    /// Records farther than this are dropped.
    pub radius_km: f64,
    pub max_results: usize,
}

impl Default for RankOptions {
    fn default() -> Self {
        Self {
            radius_km: DEFAULT_RADIUS_KM,
            max_results: DEFAULT_MAX_RESULTS,
        }
    }
}

/// A record with its distance to the observer at ranking time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RankedMountpoint<'a> {
    pub record: &'a MountpointRecord,
    pub distance_km: f64,
}

/// Rank records by great-circle distance to `observer`.
///
/// Keeps records within `radius_km`, sorts them nearest first and truncates
/// to `max_results`. The sort is stable: records at equal distance keep
/// their input order.
pub fn rank_nearest<'a>(
    records: &'a [MountpointRecord],
    observer: Coordinates,
    options: &RankOptions,
) -> Vec<RankedMountpoint<'a>> {
    let mut ranked: Vec<RankedMountpoint<'a>> = records
        .iter()
        .map(|record| RankedMountpoint {
            record,
            distance_km: observer.distance_km(&record.coordinates()),
        })
        .filter(|ranked| ranked.distance_km <= options.radius_km)
        .collect();

    ranked.sort_by(|a, b| a.distance_km.total_cmp(&b.distance_km));
    ranked.truncate(options.max_results);
    ranked
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::EARTH_RADIUS_KM;

    /// Build a record `km` kilometers due north of the origin.
    fn record_north_of_origin(name: &str, km: f64) -> MountpointRecord {
        let latitude = (km / EARTH_RADIUS_KM).to_degrees();
        let line = format!("STR;{name};{name};RTCM 3.2;;2;GPS;NET;XXX;{latitude};0.0;0;0;gen;none;N;N;0;");
        MountpointRecord::parse_line(&line).unwrap()
    }

    fn names<'a>(ranked: &[RankedMountpoint<'a>]) -> Vec<&'a str> {
        ranked.iter().map(|r| r.record.mountpoint.as_str()).collect()
    }

    #[test]
    fn test_radius_filter_and_limit() {
        let records = vec![
            record_north_of_origin("A", 120.0),
            record_north_of_origin("B", 5.0),
            record_north_of_origin("C", 40.0),
            record_north_of_origin("D", 500.0),
        ];
        let options = RankOptions {
            radius_km: 50.0,
            max_results: 2,
        };

        let ranked = rank_nearest(&records, Coordinates::new(0.0, 0.0), &options);
        assert_eq!(names(&ranked), vec!["B", "C"]);
        assert!((ranked[0].distance_km - 5.0).abs() < 1e-6);
        assert!((ranked[1].distance_km - 40.0).abs() < 1e-6);
    }

    #[test]
    fn test_ties_keep_input_order() {
        let records = vec![
            record_north_of_origin("FIRST", 10.0),
            record_north_of_origin("NEAR", 1.0),
            record_north_of_origin("SECOND", 10.0),
            record_north_of_origin("THIRD", 10.0),
        ];
        let ranked = rank_nearest(&records, Coordinates::new(0.0, 0.0), &RankOptions::default());
        assert_eq!(names(&ranked), vec!["NEAR", "FIRST", "SECOND", "THIRD"]);
    }

    #[test]
    fn test_nothing_in_range() {
        let records = vec![record_north_of_origin("FAR", 300.0)];
        let ranked = rank_nearest(&records, Coordinates::new(0.0, 0.0), &RankOptions::default());
        assert!(ranked.is_empty());
    }

    #[test]
    fn test_default_options() {
        let options = RankOptions::default();
        assert_eq!(options.radius_km, 50.0);
        assert_eq!(options.max_results, 5);
    }
}
