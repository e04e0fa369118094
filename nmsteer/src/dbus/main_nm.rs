//! `org.freedesktop.NetworkManager`.

use std::collections::HashMap;
use zbus::proxy;
use zvariant::{OwnedObjectPath, OwnedValue};

/// The NetworkManager root object.
#[proxy(
    interface = "org.freedesktop.NetworkManager",
    default_service = "org.freedesktop.NetworkManager",
    default_path = "/org/freedesktop/NetworkManager"
)]
pub trait NM {
    /// Every device NetworkManager manages, of any type.
    fn get_devices(&self) -> zbus::Result<Vec<OwnedObjectPath>>;

    /// Connections that are activating or activated.
    #[zbus(property)]
    fn active_connections(&self) -> zbus::Result<Vec<OwnedObjectPath>>;

    /// Saves `connection` as a new profile and activates it.
    ///
    /// Returns the settings path and the active connection path.
    fn add_and_activate_connection(
        &self,
        connection: HashMap<String, HashMap<String, OwnedValue>>,
        device: OwnedObjectPath,
        specific_object: OwnedObjectPath,
    ) -> zbus::Result<(OwnedObjectPath, OwnedObjectPath)>;

    /// Activates a saved profile, optionally pinned to `specific_object`.
    fn activate_connection(
        &self,
        connection: OwnedObjectPath,
        device: OwnedObjectPath,
        specific_object: OwnedObjectPath,
    ) -> zbus::Result<OwnedObjectPath>;
}
