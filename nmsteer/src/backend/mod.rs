//! Seam between the access point model and the network-management service.
//!
//! The registry, activator and steering engine never talk to D-Bus
//! directly; they go through [`NetworkBackend`]. [`DbusBackend`] is the
//! production implementation on the system bus.

mod dbus;

use async_trait::async_trait;
use futures::stream::BoxStream;
use std::collections::HashMap;
use zvariant::{OwnedObjectPath, OwnedValue};

use crate::Result;
use crate::api::models::{AccessPointProps, ActiveConnectionInfo, DeviceEvent};

pub use dbus::DbusBackend;

/// Connection profile settings, keyed by section then by setting name.
///
/// This is the `a{sa{sv}}` dictionary NetworkManager uses for
/// `GetSettings`, `Update` and `AddAndActivateConnection`.
pub type ConnectionSettings = HashMap<String, HashMap<String, OwnedValue>>;

/// Operations the core needs from the network-management service.
///
/// Every call may block on the service; callers never hold the registry
/// lock across them.
#[async_trait]
pub trait NetworkBackend: Send + Sync {
    /// Paths of all Wi-Fi devices.
    async fn wireless_devices(&self) -> Result<Vec<OwnedObjectPath>>;

    /// Access points currently visible to `device`.
    async fn access_points(&self, device: &OwnedObjectPath) -> Result<Vec<OwnedObjectPath>>;

    /// Reads the live properties of an access point.
    async fn access_point(&self, ap: &OwnedObjectPath) -> Result<AccessPointProps>;

    /// Access point `device` is associated with, if any.
    async fn active_access_point(&self, device: &OwnedObjectPath)
    -> Result<Option<OwnedObjectPath>>;

    /// Active connection on `device`, if any.
    async fn active_connection(
        &self,
        device: &OwnedObjectPath,
    ) -> Result<Option<ActiveConnectionInfo>>;

    /// All active connections known to the service.
    async fn active_connections(&self) -> Result<Vec<ActiveConnectionInfo>>;

    /// Settings of the saved profile with the given UUID.
    async fn connection_settings(&self, uuid: &str) -> Result<ConnectionSettings>;

    /// Settings of the saved profile at the given settings path.
    async fn connection_settings_by_path(
        &self,
        path: &OwnedObjectPath,
    ) -> Result<ConnectionSettings>;

    /// Replaces and persists the settings of the profile with the given UUID.
    async fn update_connection(&self, uuid: &str, settings: ConnectionSettings) -> Result<()>;

    /// Activates a saved profile on `device`, returning the active connection path.
    async fn activate_connection(
        &self,
        uuid: &str,
        device: &OwnedObjectPath,
        specific_object: &OwnedObjectPath,
    ) -> Result<OwnedObjectPath>;

    /// Creates a profile from `settings` and activates it in one step,
    /// returning the active connection path.
    async fn add_and_activate_connection(
        &self,
        settings: ConnectionSettings,
        device: &OwnedObjectPath,
        specific_object: &OwnedObjectPath,
    ) -> Result<OwnedObjectPath>;

    /// Asks `device` to scan for access points.
    async fn request_scan(&self, device: &OwnedObjectPath) -> Result<()>;

    /// Stream of access point and scan notifications for `device`.
    async fn device_events(
        &self,
        device: &OwnedObjectPath,
    ) -> Result<BoxStream<'static, DeviceEvent>>;

    /// Stream that yields whenever a property of `ap` changes.
    async fn access_point_changes(&self, ap: &OwnedObjectPath) -> Result<BoxStream<'static, ()>>;
}
