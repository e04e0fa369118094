//! NetworkManager Active Connection proxy.

use zbus::{Result, proxy};
use zvariant::OwnedObjectPath;

/// Proxy for active connection interface.
///
/// Used to check whether a device's connection has finished activating
/// and to find the saved profile behind it.
#[proxy(
    interface = "org.freedesktop.NetworkManager.Connection.Active",
    default_service = "org.freedesktop.NetworkManager"
)]
pub trait NMActiveConnection {
    /// Current state of the active connection.
    ///
    /// Values:
    /// - 0: Unknown
    /// - 1: Activating
    /// - 2: Activated
    /// - 3: Deactivating
    /// - 4: Deactivated
    #[zbus(property)]
    fn state(&self) -> Result<u32>;

    /// Path to the connection settings used for this connection.
    #[zbus(property)]
    fn connection(&self) -> Result<OwnedObjectPath>;

    /// Connection UUID.
    #[zbus(property)]
    fn uuid(&self) -> Result<String>;

    /// Connection type (e.g. `802-11-wireless`).
    #[zbus(property, name = "Type")]
    fn connection_type(&self) -> Result<String>;

    /// Paths to devices using this connection.
    #[zbus(property)]
    fn devices(&self) -> Result<Vec<OwnedObjectPath>>;
}
