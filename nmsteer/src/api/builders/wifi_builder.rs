//! Wi-Fi connection builder.
//!
//! Builds the minimal profile created when an access point is activated for
//! the first time: the raw SSID bytes, the security category detected from
//! the access point's flags, and automatic IP configuration.

use std::collections::HashMap;
use uuid::Uuid;
use zvariant::Value;

use super::connection_builder::{ConnectionBuilder, RawSettings, into_owned};
use crate::Result;
use crate::api::models::{Band, SecurityCategory};
use crate::backend::ConnectionSettings;
use crate::types::constants::{connection_type, setting};
use crate::util::utils::decode_ssid_or_empty;

/// Builder for 802.11 infrastructure profiles.
///
/// # Example
///
/// ```rust
/// use nmsteer::builders::WifiConnectionBuilder;
/// use nmsteer::models::SecurityCategory;
///
/// let settings = WifiConnectionBuilder::new(b"Home")
///     .security(SecurityCategory::Psk)
///     .build();
///
/// assert!(settings.contains_key("802-11-wireless-security"));
/// ```
#[derive(Debug, Clone)]
pub struct WifiConnectionBuilder {
    inner: ConnectionBuilder,
    ssid: Vec<u8>,
    security: SecurityCategory,
    band: Option<Band>,
}

impl WifiConnectionBuilder {
    /// Creates a builder for `ssid`, named after its decoded form.
    ///
    /// Defaults to an open network with automatic IPv4 and IPv6.
    pub fn new(ssid: &[u8]) -> Self {
        let id = decode_ssid_or_empty(ssid).into_owned();
        let inner = ConnectionBuilder::new(connection_type::WIRELESS, id)
            .ipv4_auto()
            .ipv6_auto();

        Self {
            inner,
            ssid: ssid.to_vec(),
            security: SecurityCategory::None,
            band: None,
        }
    }

    /// Sets the profile UUID.
    pub fn uuid(mut self, uuid: Uuid) -> Self {
        self.inner = self.inner.uuid(uuid);
        self
    }

    /// Sets the key management the profile is configured for.
    ///
    /// Secrets are never written; NetworkManager asks its secret agent for
    /// them during activation.
    pub fn security(mut self, security: SecurityCategory) -> Self {
        self.security = security;
        self
    }

    /// Restricts the profile to one band.
    pub fn band(mut self, band: Band) -> Self {
        self.band = Some(band);
        self
    }

    pub fn build(mut self) -> RawSettings {
        let mut wireless = HashMap::new();
        wireless.insert(setting::SSID, Value::from(self.ssid));
        wireless.insert("mode", Value::from("infrastructure"));

        if let Some(band) = self.band {
            wireless.insert(setting::BAND, Value::from(band.as_str()));
        }

        if let Some(security) = security_section(self.security) {
            wireless.insert(setting::SECURITY, Value::from(setting::WIRELESS_SECURITY));
            self.inner = self.inner.with_section(setting::WIRELESS_SECURITY, security);
        }

        if self.security.is_eap() {
            self.inner = self.inner.with_section("802-1x", eap_section());
        }

        self.inner
            .with_section(setting::WIRELESS, wireless)
            .build()
    }

    /// Builds the settings in the owned form the D-Bus calls take.
    pub fn into_settings(self) -> Result<ConnectionSettings> {
        into_owned(self.build())
    }
}

fn security_section(
    security: SecurityCategory,
) -> Option<HashMap<&'static str, Value<'static>>> {
    let mut section = HashMap::new();
    match security {
        SecurityCategory::None => return None,
        SecurityCategory::Wep => {
            section.insert(setting::KEY_MGMT, Value::from("none"));
            section.insert("wep-key-type", Value::from(1u32));
        }
        SecurityCategory::Psk => {
            section.insert(setting::KEY_MGMT, Value::from("wpa-psk"));
        }
        SecurityCategory::Eap => {
            section.insert(setting::KEY_MGMT, Value::from("wpa-eap"));
        }
    }
    section.insert("auth-alg", Value::from("open"));
    Some(section)
}

// PEAP/MSCHAPv2 is the common enterprise default; identity and password
// come from the secret agent.
fn eap_section() -> HashMap<&'static str, Value<'static>> {
    let mut e1x = HashMap::new();
    e1x.insert("eap", Value::from(vec!["peap".to_string()]));
    e1x.insert("phase2-auth", Value::from("mschapv2"));
    e1x
}
