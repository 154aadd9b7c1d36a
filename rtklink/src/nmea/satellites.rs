//! Satellites-in-view accumulation.
//!
//! A GSV view is split over several records, each carrying the total record
//! count, its own index, and up to four satellites. The accumulator collects
//! records until the last index arrives and then publishes the full view.

use super::decoder::SentenceError;

/// One satellite from a GSV record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SatelliteInView {
    pub prn: u16,
    /// Elevation in degrees.
    pub elevation: Option<u8>,
    /// Azimuth in degrees from true north.
    pub azimuth: Option<u16>,
    /// Signal-to-noise ratio in dB-Hz. Absent when not tracked.
    pub snr: Option<u8>,
}

/// Collects a multi-record GSV sequence.
///
/// A record with message index 1 always starts a new sequence. A record that
/// does not continue the current sequence discards it.
#[derive(Debug, Default)]
pub struct SatelliteAccumulator {
    pending: Vec<SatelliteInView>,
    expected_total: u8,
    next_index: u8,
    completed: Option<Vec<SatelliteInView>>,
}

impl SatelliteAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply one GSV record (fields after splitting on `,`, address included).
    ///
    /// Returns true when this record completed a view.
    pub fn push(&mut self, fields: &[&str]) -> Result<bool, SentenceError> {
        let total: u8 = field(fields, 1)
            .parse()
            .map_err(|_| SentenceError::InvalidField("message count"))?;
        let index: u8 = field(fields, 2)
            .parse()
            .map_err(|_| SentenceError::InvalidField("message index"))?;

        if total == 0 || index == 0 || index > total {
            return Err(SentenceError::InvalidField("message index"));
        }

        if index == 1 {
            self.pending.clear();
            self.expected_total = total;
        } else if index != self.next_index || total != self.expected_total {
            self.reset_pending();
            return Err(SentenceError::OutOfSequence { index, total });
        }

        for group in fields.get(4..).unwrap_or(&[]).chunks(4) {
            if let Some(satellite) = parse_satellite(group) {
                self.pending.push(satellite);
            }
        }

        if index == total {
            self.completed = Some(std::mem::take(&mut self.pending));
            self.reset_pending();
            return Ok(true);
        }

        self.next_index = index + 1;
        Ok(false)
    }

    /// Most recent complete view.
    pub fn completed(&self) -> Option<&[SatelliteInView]> {
        self.completed.as_deref()
    }

    /// Satellites collected so far in the current, incomplete sequence.
    pub fn in_progress(&self) -> usize {
        self.pending.len()
    }

    /// Drop everything, including the last complete view.
    pub fn reset(&mut self) {
        self.reset_pending();
        self.completed = None;
    }

    fn reset_pending(&mut self) {
        self.pending.clear();
        self.expected_total = 0;
        self.next_index = 0;
    }
}

fn field<'a>(fields: &[&'a str], index: usize) -> &'a str {
    fields.get(index).map(|f| f.trim()).unwrap_or("")
}

fn parse_satellite(group: &[&str]) -> Option<SatelliteInView> {
    let prn = group.first()?.trim().parse().ok()?;
    let number = |i: usize| group.get(i).and_then(|v| v.trim().parse().ok());
    Some(SatelliteInView {
        prn,
        elevation: number(1),
        azimuth: group.get(2).and_then(|v| v.trim().parse().ok()),
        snr: number(3),
    })
}
