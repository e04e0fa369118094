//! NetworkManager Device proxy.

use zbus::{Result, proxy};
use zvariant::OwnedObjectPath;

/// Proxy for NetworkManager device interface.
#[proxy(
    interface = "org.freedesktop.NetworkManager.Device",
    default_service = "org.freedesktop.NetworkManager"
)]
pub trait NMDevice {
    /// Device type as a numeric code (2 = Wi-Fi).
    #[zbus(property)]
    fn device_type(&self) -> Result<u32>;

    /// Path of the active connection on this device ("/" if none).
    #[zbus(property)]
    fn active_connection(&self) -> Result<OwnedObjectPath>;
}
