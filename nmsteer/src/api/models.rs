use serde::Serialize;
use std::fmt::{Display, Formatter};
use std::str::FromStr;
use thiserror::Error;
use zvariant::OwnedObjectPath;

use crate::types::constants::frequency;

/// NetworkManager active connection state.
///
/// These values represent the lifecycle states of an active connection
/// as reported by the NM D-Bus API.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActiveConnectionState {
    /// Connection state is unknown.
    Unknown,
    /// Connection is activating (connecting).
    Activating,
    /// Connection is fully activated (connected).
    Activated,
    /// Connection is deactivating (disconnecting).
    Deactivating,
    /// Connection is fully deactivated (disconnected).
    Deactivated,
    /// Unknown state code not mapped to a specific variant.
    Other(u32),
}

impl From<u32> for ActiveConnectionState {
    fn from(code: u32) -> Self {
        match code {
            0 => Self::Unknown,
            1 => Self::Activating,
            2 => Self::Activated,
            3 => Self::Deactivating,
            4 => Self::Deactivated,
            v => Self::Other(v),
        }
    }
}

impl Display for ActiveConnectionState {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unknown => write!(f, "unknown"),
            Self::Activating => write!(f, "activating"),
            Self::Activated => write!(f, "activated"),
            Self::Deactivating => write!(f, "deactivating"),
            Self::Deactivated => write!(f, "deactivated"),
            Self::Other(v) => write!(f, "unknown state ({v})"),
        }
    }
}

/// Security category of an access point.
///
/// Derived from the raw capability flags an AP advertises, see
/// [`classify_security`](crate::classify_security).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SecurityCategory {
    /// Open network.
    None,
    /// Static WEP.
    Wep,
    /// WPA/WPA2/WPA3 Personal.
    Psk,
    /// WPA Enterprise (802.1X).
    Eap,
}

impl SecurityCategory {
    /// Whether any security is required.
    pub fn is_secured(self) -> bool {
        self != Self::None
    }

    /// Whether 802.1X credentials are required.
    pub fn is_eap(self) -> bool {
        self == Self::Eap
    }
}

impl Display for SecurityCategory {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::None => write!(f, "none"),
            Self::Wep => write!(f, "wep"),
            Self::Psk => write!(f, "wpa-psk"),
            Self::Eap => write!(f, "wpa-eap"),
        }
    }
}

/// Wi-Fi band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Band {
    /// 5 GHz ("a").
    A,
    /// 2.4 GHz ("bg").
    Bg,
}

impl Band {
    /// Classifies a frequency in MHz.
    ///
    /// Returns `None` for frequencies outside both the 5 GHz
    /// (4915-5825 MHz) and 2.4 GHz (2412-2484 MHz) ranges.
    pub fn from_frequency(mhz: u32) -> Option<Self> {
        match mhz {
            frequency::BAND_5_LOWER..=frequency::BAND_5_UPPER => Some(Self::A),
            frequency::BAND_2_4_LOWER..=frequency::BAND_2_4_UPPER => Some(Self::Bg),
            _ => None,
        }
    }

    /// Whether `mhz` falls inside this band's range.
    pub fn contains(self, mhz: u32) -> bool {
        Self::from_frequency(mhz) == Some(self)
    }

    /// The token NetworkManager uses for this band in `802-11-wireless.band`.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::A => "a",
            Self::Bg => "bg",
        }
    }
}

impl Display for Band {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Band {
    type Err = NetworkError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "a" => Ok(Self::A),
            "bg" => Ok(Self::Bg),
            other => Err(NetworkError::InvalidBand(other.to_string())),
        }
    }
}

/// Raw properties of an access point as read from NetworkManager.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AccessPointProps {
    /// SSID as raw bytes (may not be valid UTF-8).
    pub ssid: Vec<u8>,
    /// General capability flags.
    pub flags: u32,
    /// WPA security flags.
    pub wpa_flags: u32,
    /// RSN (WPA2) security flags.
    pub rsn_flags: u32,
    /// Signal strength, 0-255 as reported (NetworkManager uses 0-100).
    pub strength: u8,
    /// Operating frequency in MHz.
    pub frequency: u32,
}

/// Point-in-time copy of the public fields of a tracked access point.
///
/// Serializes with the field names listeners expect
/// (`Ssid`, `Secured`, `SecuredInEap`, `Strength`, `Path`, `Frequency`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct AccessPointSnapshot {
    pub ssid: String,
    pub secured: bool,
    pub secured_in_eap: bool,
    pub strength: u8,
    pub path: OwnedObjectPath,
    pub frequency: u32,
}

impl AccessPointSnapshot {
    /// Band this access point operates on, if known.
    pub fn band(&self) -> Option<Band> {
        Band::from_frequency(self.frequency)
    }
}

/// Change notification emitted by the access point registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccessPointEvent {
    /// An access point became visible on a device.
    Added {
        device: OwnedObjectPath,
        access_point: AccessPointSnapshot,
    },
    /// A visible access point disappeared or became ignored.
    Removed {
        device: OwnedObjectPath,
        access_point: AccessPointSnapshot,
    },
    /// Properties of a visible access point changed.
    PropertiesChanged {
        device: OwnedObjectPath,
        access_point: AccessPointSnapshot,
    },
}

impl AccessPointEvent {
    /// Signal name of this event.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Added { .. } => "AccessPointAdded",
            Self::Removed { .. } => "AccessPointRemoved",
            Self::PropertiesChanged { .. } => "AccessPointPropertiesChanged",
        }
    }

    /// Device that owns the access point.
    pub fn device(&self) -> &OwnedObjectPath {
        match self {
            Self::Added { device, .. }
            | Self::Removed { device, .. }
            | Self::PropertiesChanged { device, .. } => device,
        }
    }

    /// Snapshot carried by the event.
    pub fn access_point(&self) -> &AccessPointSnapshot {
        match self {
            Self::Added { access_point, .. }
            | Self::Removed { access_point, .. }
            | Self::PropertiesChanged { access_point, .. } => access_point,
        }
    }

    /// JSON serialization of the carried snapshot.
    pub fn access_point_json(&self) -> Result<String, NetworkError> {
        Ok(serde_json::to_string(self.access_point())?)
    }
}

/// An active connection as seen from one device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveConnectionInfo {
    /// Path of the active connection object.
    pub path: OwnedObjectPath,
    /// Current activation state.
    pub state: ActiveConnectionState,
    /// UUID of the profile backing this connection.
    pub uuid: String,
    /// Path of the settings object of the profile.
    pub connection: OwnedObjectPath,
    /// Connection type, e.g. `802-11-wireless`.
    pub conn_type: String,
    /// Devices using this connection.
    pub devices: Vec<OwnedObjectPath>,
}

/// Notification delivered by a wireless device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeviceEvent {
    /// A new access point was discovered.
    AccessPointAppeared(OwnedObjectPath),
    /// An access point is no longer visible.
    AccessPointVanished(OwnedObjectPath),
    /// A scan finished and results were refreshed.
    ScanFinished,
}

/// Errors that can occur while tracking access points or steering.
#[derive(Debug, Error)]
pub enum NetworkError {
    /// A D-Bus communication error occurred.
    #[error("D-Bus error: {0}")]
    Dbus(#[from] zbus::Error),

    /// A D-Bus value could not be converted.
    #[error("variant error: {0}")]
    Variant(#[from] zvariant::Error),

    /// Serializing a snapshot failed.
    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// The access point does not broadcast an SSID.
    #[error("ignore hidden access point")]
    HiddenAccessPoint,

    /// The access point is not known.
    #[error("access point not found: {0}")]
    AccessPointNotFound(String),

    /// No saved connection exists for the given UUID.
    #[error("no saved connection with uuid {0}")]
    NoSavedConnection(String),

    /// The access point now requires 802.1X credentials the saved profile
    /// does not carry.
    #[error("need user edit")]
    NeedUserEdit,

    /// A band token other than `a` or `bg` was supplied.
    #[error("band input error: {0:?}")]
    InvalidBand(String),

    /// Stored settings are missing a section or hold an unexpected value.
    #[error("invalid connection settings: {0}")]
    InvalidSettings(String),

    /// The manager was shut down and no longer tracks anything.
    #[error("access point manager has been shut down")]
    ShutDown,
}
