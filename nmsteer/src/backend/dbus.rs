//! [`NetworkBackend`] implementation on top of NetworkManager's D-Bus API.

use async_trait::async_trait;
use futures::stream::{self, BoxStream, StreamExt};
use log::{debug, warn};
use std::collections::HashMap;
use zbus::Connection;
use zvariant::OwnedObjectPath;

use super::{ConnectionSettings, NetworkBackend};
use crate::Result;
use crate::api::models::{AccessPointProps, ActiveConnectionInfo, DeviceEvent, NetworkError};
use crate::dbus::{
    NMAccessPointProxy, NMActiveConnectionProxy, NMDeviceProxy, NMProxy,
    NMSettingsConnectionProxy, NMSettingsProxy, NMWirelessProxy,
};
use crate::types::constants::device_type;
use crate::util::utils::is_valid_path;

/// Talks to NetworkManager over the system bus.
///
/// `DbusBackend` is `Clone`; every clone shares the same underlying
/// D-Bus connection.
#[derive(Debug, Clone)]
pub struct DbusBackend {
    conn: Connection,
}

impl DbusBackend {
    /// Connects to the system D-Bus.
    pub async fn system() -> Result<Self> {
        let conn = Connection::system().await?;
        Ok(Self { conn })
    }

    /// Wraps an existing D-Bus connection.
    pub fn new(conn: Connection) -> Self {
        Self { conn }
    }

    async fn wireless(&self, device: &OwnedObjectPath) -> Result<NMWirelessProxy<'static>> {
        Ok(NMWirelessProxy::builder(&self.conn)
            .path(device.clone())?
            .build()
            .await?)
    }

    /// Resolves a profile UUID to its settings object path.
    async fn settings_path(&self, uuid: &str) -> Result<OwnedObjectPath> {
        let settings = NMSettingsProxy::new(&self.conn).await?;
        match settings.get_connection_by_uuid(uuid).await {
            Ok(path) => Ok(path),
            Err(zbus::Error::MethodError(name, _, _)) => {
                debug!("GetConnectionByUuid({uuid}) failed: {name}");
                Err(NetworkError::NoSavedConnection(uuid.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn read_active_connection(&self, path: OwnedObjectPath) -> Result<ActiveConnectionInfo> {
        let ac = NMActiveConnectionProxy::builder(&self.conn)
            .path(path.clone())?
            .build()
            .await?;

        Ok(ActiveConnectionInfo {
            state: ac.state().await?.into(),
            uuid: ac.uuid().await?,
            connection: ac.connection().await?,
            conn_type: ac.connection_type().await?,
            devices: ac.devices().await?,
            path,
        })
    }
}

/// Maps "no such object" replies for a vanished object to
/// [`NetworkError::AccessPointNotFound`].
fn missing_object(e: zbus::Error, path: &OwnedObjectPath) -> NetworkError {
    match &e {
        zbus::Error::MethodError(name, _, _)
            if matches!(
                name.as_str(),
                "org.freedesktop.DBus.Error.UnknownObject"
                    | "org.freedesktop.DBus.Error.UnknownMethod"
                    | "org.freedesktop.DBus.Error.UnknownInterface"
            ) =>
        {
            NetworkError::AccessPointNotFound(path.as_str().to_string())
        }
        _ => e.into(),
    }
}

#[async_trait]
impl NetworkBackend for DbusBackend {
    async fn wireless_devices(&self) -> Result<Vec<OwnedObjectPath>> {
        let nm = NMProxy::new(&self.conn).await?;
        let mut wireless = Vec::new();

        for dp in nm.get_devices().await? {
            let dev = NMDeviceProxy::builder(&self.conn)
                .path(dp.clone())?
                .build()
                .await?;
            if dev.device_type().await? == device_type::WIFI {
                wireless.push(dp);
            }
        }

        Ok(wireless)
    }

    async fn access_points(&self, device: &OwnedObjectPath) -> Result<Vec<OwnedObjectPath>> {
        Ok(self.wireless(device).await?.access_points().await?)
    }

    async fn access_point(&self, ap: &OwnedObjectPath) -> Result<AccessPointProps> {
        let proxy = NMAccessPointProxy::builder(&self.conn)
            .path(ap.clone())?
            .build()
            .await?;

        // The first read tells whether the AP still exists.
        let ssid = proxy.ssid().await.map_err(|e| missing_object(e, ap))?;

        Ok(AccessPointProps {
            ssid,
            flags: proxy.flags().await?,
            wpa_flags: proxy.wpa_flags().await?,
            rsn_flags: proxy.rsn_flags().await?,
            strength: proxy.strength().await?,
            frequency: proxy.frequency().await?,
        })
    }

    async fn active_access_point(
        &self,
        device: &OwnedObjectPath,
    ) -> Result<Option<OwnedObjectPath>> {
        let path = self.wireless(device).await?.active_access_point().await?;
        Ok(is_valid_path(&path).then_some(path))
    }

    async fn active_connection(
        &self,
        device: &OwnedObjectPath,
    ) -> Result<Option<ActiveConnectionInfo>> {
        let dev = NMDeviceProxy::builder(&self.conn)
            .path(device.clone())?
            .build()
            .await?;

        let path = dev.active_connection().await?;
        if !is_valid_path(&path) {
            return Ok(None);
        }

        self.read_active_connection(path).await.map(Some)
    }

    async fn active_connections(&self) -> Result<Vec<ActiveConnectionInfo>> {
        let nm = NMProxy::new(&self.conn).await?;
        let mut infos = Vec::new();

        for path in nm.active_connections().await? {
            // Active connections can vanish between listing and reading.
            match self.read_active_connection(path.clone()).await {
                Ok(info) => infos.push(info),
                Err(e) => warn!("Failed to read active connection {}: {e}", path.as_str()),
            }
        }

        Ok(infos)
    }

    async fn connection_settings(&self, uuid: &str) -> Result<ConnectionSettings> {
        let path = self.settings_path(uuid).await?;
        self.connection_settings_by_path(&path).await
    }

    async fn connection_settings_by_path(
        &self,
        path: &OwnedObjectPath,
    ) -> Result<ConnectionSettings> {
        let conn = NMSettingsConnectionProxy::builder(&self.conn)
            .path(path.clone())?
            .build()
            .await?;
        Ok(conn.get_settings().await?)
    }

    async fn update_connection(&self, uuid: &str, settings: ConnectionSettings) -> Result<()> {
        let path = self.settings_path(uuid).await?;
        let conn = NMSettingsConnectionProxy::builder(&self.conn)
            .path(path.clone())?
            .build()
            .await?;
        conn.update(settings).await?;
        debug!("Updated connection {uuid} at {}", path.as_str());
        Ok(())
    }

    async fn activate_connection(
        &self,
        uuid: &str,
        device: &OwnedObjectPath,
        specific_object: &OwnedObjectPath,
    ) -> Result<OwnedObjectPath> {
        let path = self.settings_path(uuid).await?;
        let nm = NMProxy::new(&self.conn).await?;
        Ok(nm
            .activate_connection(path, device.clone(), specific_object.clone())
            .await?)
    }

    async fn add_and_activate_connection(
        &self,
        settings: ConnectionSettings,
        device: &OwnedObjectPath,
        specific_object: &OwnedObjectPath,
    ) -> Result<OwnedObjectPath> {
        let nm = NMProxy::new(&self.conn).await?;
        let (settings_path, active) = nm
            .add_and_activate_connection(settings, device.clone(), specific_object.clone())
            .await?;
        debug!(
            "Created connection {} (active: {})",
            settings_path.as_str(),
            active.as_str()
        );
        Ok(active)
    }

    async fn request_scan(&self, device: &OwnedObjectPath) -> Result<()> {
        self.wireless(device)
            .await?
            .request_scan(HashMap::new())
            .await?;
        Ok(())
    }

    async fn device_events(
        &self,
        device: &OwnedObjectPath,
    ) -> Result<BoxStream<'static, DeviceEvent>> {
        let wifi = self.wireless(device).await?;

        let added = wifi
            .receive_access_point_added()
            .await?
            .filter_map(|signal| async move {
                match signal.args() {
                    Ok(args) => Some(DeviceEvent::AccessPointAppeared(args.path.clone())),
                    Err(e) => {
                        warn!("Malformed AccessPointAdded signal: {e}");
                        None
                    }
                }
            });

        let removed = wifi
            .receive_access_point_removed()
            .await?
            .filter_map(|signal| async move {
                match signal.args() {
                    Ok(args) => Some(DeviceEvent::AccessPointVanished(args.path.clone())),
                    Err(e) => {
                        warn!("Malformed AccessPointRemoved signal: {e}");
                        None
                    }
                }
            });

        let scans = wifi
            .receive_last_scan_changed()
            .await
            .map(|_| DeviceEvent::ScanFinished);

        debug!("Subscribed to AP signals on device: {}", device.as_str());

        Ok(stream::select_all([added.boxed(), removed.boxed(), scans.boxed()]).boxed())
    }

    async fn access_point_changes(&self, ap: &OwnedObjectPath) -> Result<BoxStream<'static, ()>> {
        let props = zbus::fdo::PropertiesProxy::builder(&self.conn)
            .destination("org.freedesktop.NetworkManager")?
            .path(ap.clone())?
            .build()
            .await?;

        let changes = props.receive_properties_changed().await?;
        Ok(changes.map(|_| ()).boxed())
    }
}
