//! `org.freedesktop.NetworkManager.AccessPoint`.

use zbus::{Result, proxy};

/// One access point object.
///
/// Provides the raw SSID, signal strength, security capabilities and
/// frequency the access point model is derived from.
#[proxy(
    interface = "org.freedesktop.NetworkManager.AccessPoint",
    default_service = "org.freedesktop.NetworkManager"
)]
pub trait NMAccessPoint {
    /// Raw SSID bytes; empty for hidden networks.
    #[zbus(property)]
    fn ssid(&self) -> Result<Vec<u8>>;

    /// Signal quality, 0 to 100.
    #[zbus(property)]
    fn strength(&self) -> Result<u8>;

    /// `NM80211ApFlags`; bit 0 marks privacy.
    #[zbus(property)]
    fn flags(&self) -> Result<u32>;

    /// `NM80211ApSecurityFlags` advertised in the WPA IE.
    #[zbus(property)]
    fn wpa_flags(&self) -> Result<u32>;

    /// `NM80211ApSecurityFlags` advertised in the RSN IE.
    #[zbus(property)]
    fn rsn_flags(&self) -> Result<u32>;

    /// Channel frequency in MHz.
    #[zbus(property)]
    fn frequency(&self) -> Result<u32>;
}
