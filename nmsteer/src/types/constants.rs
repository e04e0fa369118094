//! Constants for NetworkManager D-Bus interface values.
//!
//! These constants correspond to the numeric codes used by NetworkManager's
//! D-Bus API for device types, security flags and frequency ranges, plus the
//! defaults used by the steering engine.

use bitflags::bitflags;

/// NetworkManager device type constants.
pub mod device_type {
    pub const WIFI: u32 = 2;
}

/// NetworkManager connection type names.
pub mod connection_type {
    pub const WIRELESS: &str = "802-11-wireless";
}

/// Settings section and key names touched by this crate.
pub mod setting {
    pub const CONNECTION: &str = "connection";
    pub const WIRELESS: &str = "802-11-wireless";
    pub const WIRELESS_SECURITY: &str = "802-11-wireless-security";
    pub const IPV6: &str = "ipv6";

    pub const KEY_MGMT: &str = "key-mgmt";
    pub const BAND: &str = "band";
    pub const SSID: &str = "ssid";
    pub const SECURITY: &str = "security";
}

bitflags! {
    /// General capability flags of an access point (`Flags` property).
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct ApFlags: u32 {
        const PRIVACY = 0x1;
        const WPS = 0x2;
        const WPS_PBC = 0x4;
        const WPS_PIN = 0x8;
    }
}

bitflags! {
    /// Security flags of an access point (`WpaFlags` / `RsnFlags` properties).
    ///
    /// An empty set is NetworkManager's `NM_802_11_AP_SEC_NONE`.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct ApSecurityFlags: u32 {
        const PAIR_WEP40 = 0x1;
        const PAIR_WEP104 = 0x2;
        const PAIR_TKIP = 0x4;
        const PAIR_CCMP = 0x8;
        const GROUP_WEP40 = 0x10;
        const GROUP_WEP104 = 0x20;
        const GROUP_TKIP = 0x40;
        const GROUP_CCMP = 0x80;
        const KEY_MGMT_PSK = 0x100;
        const KEY_MGMT_802_1X = 0x200;
        const KEY_MGMT_SAE = 0x400;
        const KEY_MGMT_OWE = 0x800;
        const KEY_MGMT_OWE_TM = 0x1000;
        const KEY_MGMT_EAP_SUITE_B_192 = 0x2000;
    }
}

/// Wi-Fi frequency ranges (MHz) used to classify bands.
pub mod frequency {
    pub const BAND_5_LOWER: u32 = 4915;
    pub const BAND_5_UPPER: u32 = 5825;
    pub const BAND_2_4_LOWER: u32 = 2412;
    pub const BAND_2_4_UPPER: u32 = 2484;
}

/// Signal strength thresholds used by steering and visibility.
pub mod strength {
    /// Above this strength a 5 GHz link is left alone.
    pub const AUTO_CHANGE_THRESHOLD: u8 = 65;
    /// Minimum gain a candidate needs before an automatic switch.
    pub const MIN_GAIN: u8 = 20;
    /// Strengths in `1..IGNORE_BELOW` mark an inactive AP as ignored.
    pub const IGNORE_BELOW: u8 = 10;
}

/// Timing constants.
pub mod timeouts {
    use std::time::Duration;

    /// Delay used to coalesce scan result bursts before steering (10 seconds).
    const STEERING_DEBOUNCE_SECS: u64 = 10;

    /// Returns the default steering debounce duration.
    pub fn steering_debounce() -> Duration {
        Duration::from_secs(STEERING_DEBOUNCE_SECS)
    }
}

/// Capacity of the access point event channel.
pub const EVENT_CHANNEL_CAPACITY: usize = 256;

/// D-Bus path NetworkManager uses for "no object".
pub const NULL_PATH: &str = "/";
