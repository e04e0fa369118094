//! In-memory `NetworkBackend` used by the integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use futures::channel::mpsc;
use futures::stream::{BoxStream, StreamExt};
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;
use uuid::Uuid;
use zvariant::{OwnedObjectPath, OwnedValue, Value};

use nmsteer::builders::WifiConnectionBuilder;
use nmsteer::{
    AccessPointProps, ActiveConnectionInfo, ActiveConnectionState, ConnectionSettings,
    DeviceEvent, NetworkBackend, NetworkError, Result, SecurityCategory,
};

pub const DEVICE: &str = "/org/freedesktop/NetworkManager/Devices/3";

pub fn path(s: &str) -> OwnedObjectPath {
    OwnedObjectPath::try_from(s).unwrap()
}

pub fn ap_path(n: u32) -> OwnedObjectPath {
    path(&format!("/org/freedesktop/NetworkManager/AccessPoint/{n}"))
}

pub fn device() -> OwnedObjectPath {
    path(DEVICE)
}

pub fn props(ssid: &str, strength: u8, frequency: u32, security: SecurityCategory) -> AccessPointProps {
    let (flags, wpa_flags, rsn_flags) = match security {
        SecurityCategory::None => (0, 0, 0),
        SecurityCategory::Wep => (0x1, 0, 0),
        SecurityCategory::Psk => (0x1, 0, 0x188),
        SecurityCategory::Eap => (0x1, 0, 0x288),
    };
    AccessPointProps {
        ssid: ssid.as_bytes().to_vec(),
        flags,
        wpa_flags,
        rsn_flags,
        strength,
        frequency,
    }
}

pub fn clone_settings(settings: &ConnectionSettings) -> ConnectionSettings {
    settings
        .iter()
        .map(|(name, section)| {
            let section = section
                .iter()
                .map(|(k, v)| (k.clone(), v.try_clone().unwrap()))
                .collect();
            (name.clone(), section)
        })
        .collect()
}

pub fn str_value<'a>(settings: &'a ConnectionSettings, section: &str, key: &str) -> Option<&'a str> {
    match settings.get(section)?.get(key).map(|v| &**v) {
        Some(Value::Str(s)) => Some(s.as_str()),
        _ => None,
    }
}

pub fn owned<'a>(v: impl Into<Value<'a>>) -> OwnedValue {
    v.into().try_to_owned().unwrap()
}

/// A saved profile for `ssid` with the given security.
pub fn profile(ssid: &str, security: SecurityCategory) -> (String, ConnectionSettings) {
    let uuid = Uuid::new_v4();
    let settings = WifiConnectionBuilder::new(ssid.as_bytes())
        .uuid(uuid)
        .security(security)
        .into_settings()
        .unwrap();
    (uuid.to_string(), settings)
}

/// Side effects recorded by the mock.
#[derive(Debug)]
pub enum Call {
    Update { uuid: String },
    Activate {
        uuid: String,
        device: OwnedObjectPath,
        ap: OwnedObjectPath,
    },
    AddAndActivate {
        settings: ConnectionSettings,
        device: OwnedObjectPath,
        ap: OwnedObjectPath,
    },
    Scan(OwnedObjectPath),
}

struct Profile {
    path: OwnedObjectPath,
    settings: ConnectionSettings,
}

#[derive(Default)]
struct State {
    devices: Vec<OwnedObjectPath>,
    device_aps: HashMap<OwnedObjectPath, Vec<OwnedObjectPath>>,
    aps: HashMap<OwnedObjectPath, AccessPointProps>,
    active_ap: HashMap<OwnedObjectPath, OwnedObjectPath>,
    active: HashMap<OwnedObjectPath, ActiveConnectionInfo>,
    profiles: HashMap<String, Profile>,
    calls: Vec<Call>,
    device_tx: HashMap<OwnedObjectPath, Vec<mpsc::UnboundedSender<DeviceEvent>>>,
    ap_tx: HashMap<OwnedObjectPath, Vec<mpsc::UnboundedSender<()>>>,
    next_id: u32,
}

#[derive(Default)]
pub struct MockBackend {
    state: Mutex<State>,
}

impl MockBackend {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> std::sync::MutexGuard<'_, State> {
        self.state.lock().unwrap()
    }

    pub fn add_device(&self, device: &OwnedObjectPath) {
        let mut s = self.state();
        s.devices.push(device.clone());
        s.device_aps.entry(device.clone()).or_default();
    }

    /// Makes `ap` visible on `device` without notifying anyone.
    pub fn add_ap(&self, device: &OwnedObjectPath, ap: &OwnedObjectPath, props: AccessPointProps) {
        let mut s = self.state();
        s.device_aps.entry(device.clone()).or_default().push(ap.clone());
        s.aps.insert(ap.clone(), props);
    }

    pub fn remove_ap(&self, ap: &OwnedObjectPath) {
        let mut s = self.state();
        for aps in s.device_aps.values_mut() {
            aps.retain(|p| p != ap);
        }
        s.aps.remove(ap);
    }

    pub fn set_strength(&self, ap: &OwnedObjectPath, strength: u8) {
        if let Some(props) = self.state().aps.get_mut(ap) {
            props.strength = strength;
        }
    }

    pub fn set_props(&self, ap: &OwnedObjectPath, props: AccessPointProps) {
        self.state().aps.insert(ap.clone(), props);
    }

    pub fn add_profile(&self, uuid: &str, settings: ConnectionSettings) -> OwnedObjectPath {
        let mut s = self.state();
        s.next_id += 1;
        let path = path(&format!(
            "/org/freedesktop/NetworkManager/Settings/{}",
            s.next_id
        ));
        s.profiles.insert(
            uuid.to_string(),
            Profile {
                path: path.clone(),
                settings,
            },
        );
        path
    }

    pub fn profile(&self, uuid: &str) -> ConnectionSettings {
        clone_settings(&self.state().profiles[uuid].settings)
    }

    /// Puts `device` on `ap` using the saved profile `uuid`.
    pub fn connect(
        &self,
        device: &OwnedObjectPath,
        ap: &OwnedObjectPath,
        uuid: &str,
        state: ActiveConnectionState,
    ) {
        let mut s = self.state();
        let connection = s.profiles[uuid].path.clone();
        s.next_id += 1;
        let info = ActiveConnectionInfo {
            path: path(&format!(
                "/org/freedesktop/NetworkManager/ActiveConnection/{}",
                s.next_id
            )),
            state,
            uuid: uuid.to_string(),
            connection,
            conn_type: "802-11-wireless".into(),
            devices: vec![device.clone()],
        };
        s.active.insert(device.clone(), info);
        s.active_ap.insert(device.clone(), ap.clone());
    }

    pub fn active_ap_of(&self, device: &OwnedObjectPath) -> Option<OwnedObjectPath> {
        self.state().active_ap.get(device).cloned()
    }

    pub fn take_calls(&self) -> Vec<Call> {
        std::mem::take(&mut self.state().calls)
    }

    pub fn activations(&self) -> usize {
        self.state()
            .calls
            .iter()
            .filter(|c| matches!(c, Call::Activate { .. } | Call::AddAndActivate { .. }))
            .count()
    }

    pub fn emit_device_event(&self, device: &OwnedObjectPath, event: DeviceEvent) {
        let mut s = self.state();
        if let Some(senders) = s.device_tx.get_mut(device) {
            senders.retain(|tx| tx.unbounded_send(event.clone()).is_ok());
        }
    }

    pub fn emit_ap_changed(&self, ap: &OwnedObjectPath) {
        let mut s = self.state();
        if let Some(senders) = s.ap_tx.get_mut(ap) {
            senders.retain(|tx| tx.unbounded_send(()).is_ok());
        }
    }

    /// Number of live property subscriptions for `ap`.
    pub fn ap_watchers(&self, ap: &OwnedObjectPath) -> usize {
        let mut s = self.state();
        match s.ap_tx.get_mut(ap) {
            Some(senders) => {
                senders.retain(|tx| !tx.is_closed());
                senders.len()
            }
            None => 0,
        }
    }
}

#[async_trait]
impl NetworkBackend for MockBackend {
    async fn wireless_devices(&self) -> Result<Vec<OwnedObjectPath>> {
        Ok(self.state().devices.clone())
    }

    async fn access_points(&self, device: &OwnedObjectPath) -> Result<Vec<OwnedObjectPath>> {
        Ok(self
            .state()
            .device_aps
            .get(device)
            .cloned()
            .unwrap_or_default())
    }

    async fn access_point(&self, ap: &OwnedObjectPath) -> Result<AccessPointProps> {
        self.state()
            .aps
            .get(ap)
            .cloned()
            .ok_or_else(|| NetworkError::AccessPointNotFound(ap.as_str().to_string()))
    }

    async fn active_access_point(
        &self,
        device: &OwnedObjectPath,
    ) -> Result<Option<OwnedObjectPath>> {
        Ok(self.active_ap_of(device))
    }

    async fn active_connection(
        &self,
        device: &OwnedObjectPath,
    ) -> Result<Option<ActiveConnectionInfo>> {
        Ok(self.state().active.get(device).cloned())
    }

    async fn active_connections(&self) -> Result<Vec<ActiveConnectionInfo>> {
        Ok(self.state().active.values().cloned().collect())
    }

    async fn connection_settings(&self, uuid: &str) -> Result<ConnectionSettings> {
        self.state()
            .profiles
            .get(uuid)
            .map(|p| clone_settings(&p.settings))
            .ok_or_else(|| NetworkError::NoSavedConnection(uuid.to_string()))
    }

    async fn connection_settings_by_path(
        &self,
        path: &OwnedObjectPath,
    ) -> Result<ConnectionSettings> {
        self.state()
            .profiles
            .values()
            .find(|p| &p.path == path)
            .map(|p| clone_settings(&p.settings))
            .ok_or_else(|| NetworkError::NoSavedConnection(path.as_str().to_string()))
    }

    async fn update_connection(&self, uuid: &str, settings: ConnectionSettings) -> Result<()> {
        let mut s = self.state();
        let profile = s
            .profiles
            .get_mut(uuid)
            .ok_or_else(|| NetworkError::NoSavedConnection(uuid.to_string()))?;
        profile.settings = settings;
        s.calls.push(Call::Update {
            uuid: uuid.to_string(),
        });
        Ok(())
    }

    async fn activate_connection(
        &self,
        uuid: &str,
        device: &OwnedObjectPath,
        specific_object: &OwnedObjectPath,
    ) -> Result<OwnedObjectPath> {
        if !self.state().profiles.contains_key(uuid) {
            return Err(NetworkError::NoSavedConnection(uuid.to_string()));
        }
        self.connect(device, specific_object, uuid, ActiveConnectionState::Activated);

        let mut s = self.state();
        s.calls.push(Call::Activate {
            uuid: uuid.to_string(),
            device: device.clone(),
            ap: specific_object.clone(),
        });
        Ok(s.active[device].path.clone())
    }

    async fn add_and_activate_connection(
        &self,
        settings: ConnectionSettings,
        device: &OwnedObjectPath,
        specific_object: &OwnedObjectPath,
    ) -> Result<OwnedObjectPath> {
        let mut s = self.state();
        s.next_id += 1;
        let active = path(&format!(
            "/org/freedesktop/NetworkManager/ActiveConnection/{}",
            s.next_id
        ));
        s.calls.push(Call::AddAndActivate {
            settings,
            device: device.clone(),
            ap: specific_object.clone(),
        });
        Ok(active)
    }

    async fn request_scan(&self, device: &OwnedObjectPath) -> Result<()> {
        self.state().calls.push(Call::Scan(device.clone()));
        Ok(())
    }

    async fn device_events(
        &self,
        device: &OwnedObjectPath,
    ) -> Result<BoxStream<'static, DeviceEvent>> {
        let (tx, rx) = mpsc::unbounded();
        self.state()
            .device_tx
            .entry(device.clone())
            .or_default()
            .push(tx);
        Ok(rx.boxed())
    }

    async fn access_point_changes(&self, ap: &OwnedObjectPath) -> Result<BoxStream<'static, ()>> {
        let (tx, rx) = mpsc::unbounded();
        self.state().ap_tx.entry(ap.clone()).or_default().push(tx);
        Ok(rx.boxed())
    }
}

/// Polls `cond` until it holds or a second passes.
pub async fn eventually(mut cond: impl FnMut() -> bool) -> bool {
    for _ in 0..100 {
        if cond() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    cond()
}
