//! `org.freedesktop.NetworkManager.Device.Wireless`.

use std::collections::HashMap;
use zbus::{Result, proxy};
use zvariant::OwnedObjectPath;

/// Wi-Fi side of a device object: scans, visible access points and the
/// signals announcing them.
#[proxy(
    interface = "org.freedesktop.NetworkManager.Device.Wireless",
    default_service = "org.freedesktop.NetworkManager"
)]
pub trait NMWireless {
    /// Starts a scan. No options are passed.
    fn request_scan(&self, options: HashMap<String, zvariant::Value<'_>>) -> Result<()>;

    /// An access point came into view.
    #[zbus(signal)]
    fn access_point_added(&self, path: OwnedObjectPath);

    /// An access point went out of view.
    #[zbus(signal)]
    fn access_point_removed(&self, path: OwnedObjectPath);

    /// Access points currently in view.
    #[zbus(property)]
    fn access_points(&self) -> Result<Vec<OwnedObjectPath>>;

    /// Associated access point, or `/`.
    #[zbus(property)]
    fn active_access_point(&self) -> Result<OwnedObjectPath>;

    /// CLOCK_BOOTTIME milliseconds of the last finished scan, -1 if none.
    /// Changes to it mark the end of a scan.
    #[zbus(property)]
    fn last_scan(&self) -> Result<i64>;
}
