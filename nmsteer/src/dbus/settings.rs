//! NetworkManager Settings proxies.

use std::collections::HashMap;
use zbus::{Result, proxy};
use zvariant::{OwnedObjectPath, OwnedValue};

/// Proxy for the settings service holding saved connection profiles.
#[proxy(
    interface = "org.freedesktop.NetworkManager.Settings",
    default_service = "org.freedesktop.NetworkManager",
    default_path = "/org/freedesktop/NetworkManager/Settings"
)]
pub trait NMSettings {
    /// Returns the settings object of the profile with the given UUID.
    fn get_connection_by_uuid(&self, uuid: &str) -> Result<OwnedObjectPath>;
}

/// Proxy for a single saved connection profile.
#[proxy(
    interface = "org.freedesktop.NetworkManager.Settings.Connection",
    default_service = "org.freedesktop.NetworkManager"
)]
pub trait NMSettingsConnection {
    /// Returns the profile's settings, secrets excluded.
    fn get_settings(&self) -> Result<HashMap<String, HashMap<String, OwnedValue>>>;

    /// Replaces the profile's settings and persists them to disk.
    fn update(&self, properties: HashMap<String, HashMap<String, OwnedValue>>) -> Result<()>;
}
