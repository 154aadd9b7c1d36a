//! Full sourcetable documents.

use tracing::trace;

use super::ranking::{rank_nearest, RankOptions, RankedMountpoint};
use super::record::MountpointRecord;
use crate::geo::Coordinates;

const END_MARKER: &str = "ENDSOURCETABLE";

/// Parsed caster sourcetable.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Sourcetable {
    pub mountpoints: Vec<MountpointRecord>,
    /// Raw `CAS` lines.
    pub casters: Vec<String>,
    /// Raw `NET` lines.
    pub networks: Vec<String>,
}

impl Sourcetable {
    /// Parse a sourcetable body. Unusable lines are skipped.
    pub fn parse(text: &str) -> Self {
        let mut table = Self::default();

        for line in text.lines() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            if line.starts_with(END_MARKER) {
                break;
            }

            match line.split(';').next() {
                Some("STR") => match MountpointRecord::parse_line(line) {
                    Some(record) => table.mountpoints.push(record),
                    None => trace!(line, "Skipping malformed STR record"),
                },
                Some("CAS") => table.casters.push(line.to_string()),
                Some("NET") => table.networks.push(line.to_string()),
                _ => trace!(line, "Skipping unknown sourcetable line"),
            }
        }

        table
    }

    /// Look up a mountpoint by name (case-insensitive).
    pub fn find(&self, name: &str) -> Option<&MountpointRecord> {
        self.mountpoints.iter().find(|m| m.is_named(name))
    }

    /// Mountpoints nearest to `observer`, see [`rank_nearest`].
    pub fn nearest(&self, observer: Coordinates, options: &RankOptions) -> Vec<RankedMountpoint<'_>> {
        rank_nearest(&self.mountpoints, observer, options)
    }

    pub fn is_empty(&self) -> bool {
        self.mountpoints.is_empty()
    }
}

/// True once `data` contains the end-of-table marker.
pub(crate) fn is_complete(data: &[u8]) -> bool {
    data.windows(END_MARKER.len())
        .any(|w| w == END_MARKER.as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    const TABLE: &str = "CAS;caster.example.org;2101;Example;Org;0;FRA;48.85;2.35;0.0.0.0;0;http://example.org\r\n\
NET;EXNET;Example;B;N;http://example.org;;;none\r\n\
STR;PARIS;Paris;RTCM 3.2;1004(1);2;GPS;EXNET;FRA;48.85;2.35;1;0;gen;none;B;N;9600;\r\n\
STR;SHORT;Short\r\n\
STR;LYON;Lyon;RTCM 3.2;1004(1);2;GPS;EXNET;FRA;45.76;4.84;1;0;gen;none;B;N;9600;\r\n\
ENDSOURCETABLE\r\n\
STR;AFTER;After;RTCM 3.2;1004(1);2;GPS;EXNET;FRA;45.76;4.84;1;0;gen;none;B;N;9600;\r\n";

    #[test]
    fn test_parse_sourcetable() {
        let table = Sourcetable::parse(TABLE);
        assert_eq!(table.mountpoints.len(), 2);
        assert_eq!(table.casters.len(), 1);
        assert_eq!(table.networks.len(), 1);
        assert!(table.find("paris").is_some());
        assert!(table.find("AFTER").is_none());
    }

    #[test]
    fn test_nearest_from_table() {
        let table = Sourcetable::parse(TABLE);
        let ranked = table.nearest(
            Coordinates::new(45.70, 4.80),
            &RankOptions {
                radius_km: 1000.0,
                max_results: 5,
            },
        );
        assert_eq!(ranked[0].record.mountpoint, "LYON");
        assert_eq!(ranked[1].record.mountpoint, "PARIS");
    }

    #[test]
    fn test_complete_marker() {
        assert!(is_complete(b"STR;A\r\nENDSOURCETABLE\r\n"));
        assert!(!is_complete(b"STR;A\r\n"));
    }
}
