//! Access point security classification.

use crate::api::models::SecurityCategory;
use crate::types::constants::{ApFlags, ApSecurityFlags};

/// Maps the raw capability flags of an access point to a security category.
///
/// Rules are applied in order and later rules overwrite earlier results:
///
/// 1. `None` by default.
/// 2. Privacy bit set with no WPA and no RSN flags: `Wep`.
/// 3. Any WPA flag: `Psk`.
/// 4. Any RSN flag: `Psk`.
/// 5. 802.1X key management in WPA or RSN flags: `Eap`.
///
/// # Example
///
/// ```rust
/// use nmsteer::{classify_security, SecurityCategory};
///
/// assert_eq!(classify_security(0x1, 0, 0), SecurityCategory::Wep);
/// assert_eq!(classify_security(0x1, 0, 0x188), SecurityCategory::Psk);
/// assert_eq!(classify_security(0x1, 0x188, 0x388), SecurityCategory::Eap);
/// ```
pub fn classify_security(flags: u32, wpa_flags: u32, rsn_flags: u32) -> SecurityCategory {
    let flags = ApFlags::from_bits_retain(flags);
    let wpa = ApSecurityFlags::from_bits_retain(wpa_flags);
    let rsn = ApSecurityFlags::from_bits_retain(rsn_flags);

    let mut category = SecurityCategory::None;

    if flags.contains(ApFlags::PRIVACY) && wpa.is_empty() && rsn.is_empty() {
        category = SecurityCategory::Wep;
    }
    if !wpa.is_empty() {
        category = SecurityCategory::Psk;
    }
    if !rsn.is_empty() {
        category = SecurityCategory::Psk;
    }
    if wpa.contains(ApSecurityFlags::KEY_MGMT_802_1X)
        || rsn.contains(ApSecurityFlags::KEY_MGMT_802_1X)
    {
        category = SecurityCategory::Eap;
    }

    category
}
