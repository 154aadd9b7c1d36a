//! Radio link service profile.
//!
//! The rover firmware exposes one primary service with two characteristics:
//! one accepting writes (corrections to the rover) and one emitting
//! notifications (telemetry from the rover). The identifiers follow the
//! Nordic UART Service layout.

/// The three fixed 128-bit identifiers of the rover's radio service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LinkProfile {
    pub service: u128,
    /// Rover-bound characteristic.
    pub write: u128,
    /// Rover-to-application characteristic.
    pub notify: u128,
}

impl LinkProfile {
    pub const NORDIC_UART: LinkProfile = LinkProfile {
        service: 0x6E40_0001_B5A3_F393_E0A9_E50E_24DC_CA9E,
        write: 0x6E40_0002_B5A3_F393_E0A9_E50E_24DC_CA9E,
        notify: 0x6E40_0003_B5A3_F393_E0A9_E50E_24DC_CA9E,
    };

    pub fn service_uuid(&self) -> String {
        format_uuid(self.service)
    }

    pub fn write_uuid(&self) -> String {
        format_uuid(self.write)
    }

    pub fn notify_uuid(&self) -> String {
        format_uuid(self.notify)
    }
}

impl Default for LinkProfile {
    fn default() -> Self {
        Self::NORDIC_UART
    }
}

/// Canonical lowercase hyphenated form (`8-4-4-4-12`).
pub fn format_uuid(value: u128) -> String {
    let hex = format!("{:032x}", value);
    format!(
        "{}-{}-{}-{}-{}",
        &hex[0..8],
        &hex[8..12],
        &hex[12..16],
        &hex[16..20],
        &hex[20..32]
    )
}
