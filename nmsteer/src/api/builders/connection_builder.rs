//! Core connection builder for NetworkManager settings.
//!
//! `ConnectionBuilder` handles the sections every profile shares
//! (`connection`, `ipv4`, `ipv6`). [`WifiConnectionBuilder`](super::WifiConnectionBuilder)
//! wraps it and adds the wireless sections.
//!
//! # Example
//!
//! ```rust
//! use nmsteer::builders::ConnectionBuilder;
//!
//! let settings = ConnectionBuilder::new("802-11-wireless", "Home")
//!     .autoconnect(true)
//!     .ipv4_auto()
//!     .ipv6_auto()
//!     .build();
//!
//! assert!(settings.contains_key("ipv6"));
//! ```

use std::collections::HashMap;
use uuid::Uuid;
use zvariant::Value;

use crate::Result;
use crate::backend::ConnectionSettings;

/// Settings as assembled by the builders, before conversion to owned values.
pub type RawSettings = HashMap<&'static str, HashMap<&'static str, Value<'static>>>;

/// Core connection settings builder.
///
/// A random v4 UUID is assigned on construction; use [`uuid`](Self::uuid) to
/// pin one.
#[derive(Debug, Clone)]
pub struct ConnectionBuilder {
    settings: RawSettings,
}

impl ConnectionBuilder {
    /// Creates a builder for a profile of `connection_type` named `id`.
    pub fn new(connection_type: &str, id: impl Into<String>) -> Self {
        let mut settings = HashMap::new();
        let mut connection = HashMap::new();

        connection.insert("type", Value::from(connection_type.to_string()));
        connection.insert("id", Value::from(id.into()));
        connection.insert("uuid", Value::from(Uuid::new_v4().to_string()));

        settings.insert("connection", connection);

        Self { settings }
    }

    /// Sets a specific UUID for the connection.
    pub fn uuid(mut self, uuid: Uuid) -> Self {
        if let Some(conn) = self.settings.get_mut("connection") {
            conn.insert("uuid", Value::from(uuid.to_string()));
        }
        self
    }

    /// Enables or disables automatic connection when the network is in range.
    pub fn autoconnect(mut self, enabled: bool) -> Self {
        if let Some(conn) = self.settings.get_mut("connection") {
            conn.insert("autoconnect", Value::from(enabled));
        }
        self
    }

    /// Configures IPv4 to use DHCP.
    pub fn ipv4_auto(mut self) -> Self {
        let mut ipv4 = HashMap::new();
        ipv4.insert("method", Value::from("auto"));
        self.settings.insert("ipv4", ipv4);
        self
    }

    /// Configures IPv6 to use SLAAC/DHCPv6.
    pub fn ipv6_auto(mut self) -> Self {
        let mut ipv6 = HashMap::new();
        ipv6.insert("method", Value::from("auto"));
        self.settings.insert("ipv6", ipv6);
        self
    }

    /// Adds or replaces a whole settings section.
    pub fn with_section(
        mut self,
        name: &'static str,
        section: HashMap<&'static str, Value<'static>>,
    ) -> Self {
        self.settings.insert(name, section);
        self
    }

    /// Returns the assembled settings.
    pub fn build(self) -> RawSettings {
        self.settings
    }

    /// Returns the settings in the owned form the D-Bus calls take.
    pub fn into_settings(self) -> Result<ConnectionSettings> {
        into_owned(self.settings)
    }
}

pub(crate) fn into_owned(raw: RawSettings) -> Result<ConnectionSettings> {
    let mut settings = ConnectionSettings::with_capacity(raw.len());
    for (name, section) in raw {
        let mut owned = HashMap::with_capacity(section.len());
        for (key, value) in section {
            owned.insert(key.to_string(), value.try_to_owned()?);
        }
        settings.insert(name.to_string(), owned);
    }
    Ok(settings)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn creates_basic_connection() {
        let settings = ConnectionBuilder::new("802-11-wireless", "TestNetwork").build();

        let conn = settings.get("connection").unwrap();
        assert_eq!(conn.get("type"), Some(&Value::from("802-11-wireless")));
        assert_eq!(conn.get("id"), Some(&Value::from("TestNetwork")));
        assert!(conn.contains_key("uuid"));
    }

    #[test]
    fn sets_custom_uuid() {
        let test_uuid = Uuid::new_v4();
        let settings = ConnectionBuilder::new("802-11-wireless", "Cafe")
            .uuid(test_uuid)
            .build();

        let conn = settings.get("connection").unwrap();
        assert_eq!(conn.get("uuid"), Some(&Value::from(test_uuid.to_string())));
    }

    #[test]
    fn owned_settings_keep_every_section() {
        let settings = ConnectionBuilder::new("802-11-wireless", "Cafe")
            .autoconnect(false)
            .ipv4_auto()
            .ipv6_auto()
            .into_settings()
            .unwrap();

        assert_eq!(settings.len(), 3);
        assert!(matches!(
            settings["ipv4"].get("method").map(|v| &**v),
            Some(Value::Str(s)) if s.as_str() == "auto"
        ));
        assert!(matches!(
            settings["connection"].get("autoconnect").map(|v| &**v),
            Some(Value::Bool(false))
        ));
    }
}
