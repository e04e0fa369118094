//! Edits to saved connection profiles.
//!
//! Saved profiles arrive as the raw `a{sa{sv}}` settings dictionary. The
//! helpers here read the stored security category and rewrite the few
//! settings the activator and the steering engine own: key management,
//! band restriction and the IPv6 address/route layout.

use log::debug;
use std::collections::HashMap;
use zvariant::{OwnedValue, Value};

use crate::Result;
use crate::api::models::{Band, NetworkError, SecurityCategory};
use crate::backend::ConnectionSettings;
use crate::types::constants::setting;

const WEP_KEYS: [&str; 6] = [
    "wep-key0",
    "wep-key1",
    "wep-key2",
    "wep-key3",
    "wep-key-type",
    "wep-tx-keyidx",
];

/// Wraps a plain value for a settings dictionary.
pub(crate) fn owned<'a>(value: impl Into<Value<'a>>) -> Result<OwnedValue> {
    Ok(value.into().try_to_owned()?)
}

/// String value of `section.key`, if present and a string.
pub(crate) fn str_setting<'a>(
    settings: &'a ConnectionSettings,
    section: &str,
    key: &str,
) -> Option<&'a str> {
    match settings.get(section)?.get(key).map(|v| &**v) {
        Some(Value::Str(s)) => Some(s.as_str()),
        _ => None,
    }
}

/// UUID stored in the `connection` section.
pub(crate) fn uuid_of(settings: &ConnectionSettings) -> Option<&str> {
    str_setting(settings, setting::CONNECTION, "uuid")
}

/// Raw SSID bytes stored in the `802-11-wireless` section.
pub(crate) fn ssid_of(settings: &ConnectionSettings) -> Option<Vec<u8>> {
    match settings.get(setting::WIRELESS)?.get(setting::SSID).map(|v| &**v) {
        Some(Value::Array(arr)) => {
            let mut raw = Vec::new();
            for v in arr.iter() {
                if let Ok(b) = u8::try_from(v.clone()) {
                    raw.push(b);
                }
            }
            Some(raw)
        }
        _ => None,
    }
}

/// Security category a saved profile was configured for.
///
/// A profile without a wireless-security section is open. An unknown
/// key-management value yields [`NetworkError::InvalidSettings`].
pub(crate) fn stored_security(settings: &ConnectionSettings) -> Result<SecurityCategory> {
    if !settings.contains_key(setting::WIRELESS_SECURITY) {
        return Ok(SecurityCategory::None);
    }

    match str_setting(settings, setting::WIRELESS_SECURITY, setting::KEY_MGMT) {
        Some("none") => Ok(SecurityCategory::Wep),
        Some("owe") => Ok(SecurityCategory::None),
        Some("wpa-psk" | "sae") => Ok(SecurityCategory::Psk),
        Some("wpa-eap" | "ieee8021x" | "wpa-eap-suite-b-192") => Ok(SecurityCategory::Eap),
        Some(other) => Err(NetworkError::InvalidSettings(format!(
            "unknown key-mgmt {other:?}"
        ))),
        None => Err(NetworkError::InvalidSettings("missing key-mgmt".into())),
    }
}

/// Rewrites the key management of a profile to match `category`.
///
/// EAP cannot be configured without user-supplied credentials and is
/// refused with [`NetworkError::NeedUserEdit`].
pub(crate) fn set_key_mgmt(
    settings: &mut ConnectionSettings,
    category: SecurityCategory,
) -> Result<()> {
    match category {
        SecurityCategory::None => {
            settings.remove(setting::WIRELESS_SECURITY);
            if let Some(wireless) = settings.get_mut(setting::WIRELESS) {
                wireless.remove(setting::SECURITY);
            }
        }
        SecurityCategory::Wep => {
            let security = settings
                .entry(setting::WIRELESS_SECURITY.to_string())
                .or_insert_with(HashMap::new);
            security.insert(setting::KEY_MGMT.to_string(), owned("none")?);
            security.insert("wep-key-type".to_string(), owned(1u32)?);
            security.remove("psk");
            security.remove("psk-flags");
        }
        SecurityCategory::Psk => {
            let security = settings
                .entry(setting::WIRELESS_SECURITY.to_string())
                .or_insert_with(HashMap::new);
            security.insert(setting::KEY_MGMT.to_string(), owned("wpa-psk")?);
            for key in WEP_KEYS {
                security.remove(key);
            }
        }
        SecurityCategory::Eap => return Err(NetworkError::NeedUserEdit),
    }

    debug!("Set key-mgmt for {category}");
    Ok(())
}

/// Drops the legacy IPv6 `addresses`/`routes` arrays when the structured
/// `address-data`/`route-data` forms are present.
///
/// NetworkManager regenerates the legacy arrays from the structured ones;
/// sending both back after a key-mgmt change can be rejected as
/// conflicting.
pub(crate) fn normalize_ipv6(settings: &mut ConnectionSettings) {
    let Some(ipv6) = settings.get_mut(setting::IPV6) else {
        return;
    };

    for (legacy, structured) in [("addresses", "address-data"), ("routes", "route-data")] {
        if ipv6.contains_key(legacy) && ipv6.contains_key(structured) {
            ipv6.remove(legacy);
            debug!("Dropped legacy ipv6.{legacy} in favour of ipv6.{structured}");
        }
    }
}

/// Restricts a profile to `band`.
pub(crate) fn set_band(settings: &mut ConnectionSettings, band: Band) -> Result<()> {
    let wireless = settings.get_mut(setting::WIRELESS).ok_or_else(|| {
        NetworkError::InvalidSettings(format!("missing {} section", setting::WIRELESS))
    })?;
    wireless.insert(setting::BAND.to_string(), owned(band.as_str())?);
    Ok(())
}
