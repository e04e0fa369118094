//! Per-device collection of tracked access points.
//!
//! All mutation and the visible/ignored filtering happen under one mutex.
//! Events are broadcast while the lock is still held, so every listener
//! sees `Added -> PropertiesChanged* -> Removed` in order for each path.
//! Callers read live properties from the service *before* entering the
//! registry; nothing here blocks on D-Bus.

use log::{debug, warn};
use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard, PoisonError};
use tokio::sync::{broadcast, watch};
use tokio_util::sync::DropGuard;
use zvariant::OwnedObjectPath;

use crate::Result;
use crate::api::models::{AccessPointEvent, AccessPointProps, AccessPointSnapshot};
use crate::core::access_point::AccessPoint;
use crate::types::constants::{EVENT_CHANNEL_CAPACITY, strength};

type Slots = HashMap<OwnedObjectPath, Vec<AccessPoint>>;

/// Freshly read state of one access point, ready to be applied.
#[derive(Debug, Clone)]
pub struct Observation {
    /// Object path of the access point.
    pub path: OwnedObjectPath,
    /// Live properties.
    pub props: AccessPointProps,
    /// Whether the AP's SSID is the one activated on its device.
    pub activated: bool,
}

/// Registry of access points per wireless device.
///
/// Exactly one entity exists per access point path, and a path is never
/// tracked under two devices at once. Ignored entities stay in the
/// registry so their transitions can be detected, but are excluded from
/// [`list`](Self::list) and produce no events while ignored.
pub struct AccessPointRegistry {
    slots: Mutex<Slots>,
    events: broadcast::Sender<AccessPointEvent>,
    summary: watch::Sender<String>,
    ignore_below: u8,
}

impl Default for AccessPointRegistry {
    fn default() -> Self {
        Self::new(strength::IGNORE_BELOW)
    }
}

impl std::fmt::Debug for AccessPointRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccessPointRegistry")
            .field("devices", &self.lock().len())
            .field("ignore_below", &self.ignore_below)
            .finish()
    }
}

impl AccessPointRegistry {
    /// Creates an empty registry.
    ///
    /// Inactive APs with strength in `1..ignore_below` are treated as ignored.
    pub fn new(ignore_below: u8) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        let (summary, _) = watch::channel(String::from("{}"));
        Self {
            slots: Mutex::new(HashMap::new()),
            events,
            summary,
            ignore_below,
        }
    }

    /// Subscribes to access point events.
    pub fn subscribe(&self) -> broadcast::Receiver<AccessPointEvent> {
        self.events.subscribe()
    }

    /// Subscribes to the JSON summary of visible access points per device.
    pub fn wireless_access_points(&self) -> watch::Receiver<String> {
        self.summary.subscribe()
    }

    /// Upper (exclusive) strength bound of the ignore window.
    pub fn ignore_below(&self) -> u8 {
        self.ignore_below
    }

    fn lock(&self) -> MutexGuard<'_, Slots> {
        self.slots.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Whether `ap` is tracked under any device.
    pub fn contains(&self, ap: &OwnedObjectPath) -> bool {
        find(&self.lock(), ap).is_some()
    }

    /// Device that owns `ap`.
    pub fn device_of(&self, ap: &OwnedObjectPath) -> Option<OwnedObjectPath> {
        find(&self.lock(), ap).map(|(device, _)| device)
    }

    /// Number of tracked entities for `device`, ignored ones included.
    pub fn tracked_len(&self, device: &OwnedObjectPath) -> usize {
        self.lock().get(device).map_or(0, Vec::len)
    }

    /// Tracked devices.
    pub fn devices(&self) -> Vec<OwnedObjectPath> {
        self.lock().keys().cloned().collect()
    }

    /// Starts tracking an access point.
    ///
    /// Returns `Ok(false)` without touching anything if the path is already
    /// tracked under any device. Hidden access points are rejected with
    /// [`NetworkError::HiddenAccessPoint`](crate::NetworkError::HiddenAccessPoint).
    /// `AccessPointAdded` is emitted only if the new entity is not ignored.
    pub fn add_or_update(&self, device: &OwnedObjectPath, obs: &Observation) -> Result<bool> {
        let mut slots = self.lock();
        if find(&slots, &obs.path).is_some() {
            return Ok(false);
        }

        let ap = AccessPoint::new(
            obs.path.clone(),
            &obs.props,
            obs.activated,
            self.ignore_below,
        )?;

        if ap.is_ignored() {
            debug!("New access point is ignored: {ap:?}");
        } else {
            self.emit(AccessPointEvent::Added {
                device: device.clone(),
                access_point: ap.snapshot(),
            });
        }
        slots.entry(device.clone()).or_default().push(ap);
        self.publish_summary(&slots);

        Ok(true)
    }

    /// Attaches the guard of a property watcher to a tracked entity.
    ///
    /// If the entity is gone the guard is dropped, which cancels the watcher.
    pub(crate) fn attach_watch(&self, ap: &OwnedObjectPath, guard: DropGuard) -> bool {
        let mut slots = self.lock();
        match find(&slots, ap) {
            Some((device, i)) => {
                if let Some(entity) = slots.get_mut(&device).and_then(|aps| aps.get_mut(i)) {
                    entity.attach_watch(guard);
                    return true;
                }
                false
            }
            None => false,
        }
    }

    /// Stops tracking an access point.
    ///
    /// Emits `AccessPointRemoved` and releases the entity. Unknown paths are
    /// a no-op. Returns whether anything was removed.
    pub fn remove(&self, ap: &OwnedObjectPath) -> bool {
        self.take(ap, true)
    }

    fn take(&self, ap: &OwnedObjectPath, emit_ignored: bool) -> bool {
        let mut slots = self.lock();
        let Some((device, index)) = find(&slots, ap) else {
            return false;
        };

        let Some(aps) = slots.get_mut(&device) else {
            return false;
        };
        // Vec::remove keeps the remaining entries in order.
        let entity = aps.remove(index);
        if emit_ignored || !entity.is_ignored() {
            self.emit(AccessPointEvent::Removed {
                device,
                access_point: entity.snapshot(),
            });
        }
        drop(entity);
        self.publish_summary(&slots);

        true
    }

    /// Applies freshly read properties to a tracked access point.
    ///
    /// Event rules, by ignore state before and after:
    /// - ignored -> ignored: nothing
    /// - visible -> visible: `AccessPointPropertiesChanged`
    /// - ignored -> visible: `AccessPointAdded`
    /// - visible -> ignored: `AccessPointRemoved`
    ///
    /// Returns the emitted event, if any. Unknown paths are a no-op.
    pub fn on_properties_changed(&self, obs: &Observation) -> Option<AccessPointEvent> {
        let mut slots = self.lock();
        let (device, index) = find(&slots, &obs.path)?;
        let entity = slots.get_mut(&device)?.get_mut(index)?;

        let ignored_before = entity.is_ignored();
        entity.update_props(&obs.props, obs.activated, self.ignore_below);
        let ignored_now = entity.is_ignored();
        let access_point = entity.snapshot();

        let event = match (ignored_before, ignored_now) {
            (true, true) => {
                debug!("Access point (ignored) properties changed: {access_point:?}");
                return None;
            }
            (false, false) => AccessPointEvent::PropertiesChanged {
                device,
                access_point,
            },
            (true, false) => {
                debug!("Ignored access point available: {access_point:?}");
                AccessPointEvent::Added {
                    device,
                    access_point,
                }
            }
            (false, true) => {
                debug!("Access point is ignored: {access_point:?}");
                AccessPointEvent::Removed {
                    device,
                    access_point,
                }
            }
        };

        self.emit(event.clone());
        self.publish_summary(&slots);
        Some(event)
    }

    /// Visible access points of `device`, in insertion order.
    ///
    /// The result is a copy; it does not change when the registry does.
    pub fn list(&self, device: &OwnedObjectPath) -> Vec<AccessPointSnapshot> {
        visible(&self.lock(), device)
    }

    /// JSON serialization of [`list`](Self::list).
    pub fn list_json(&self, device: &OwnedObjectPath) -> Result<String> {
        Ok(serde_json::to_string(&self.list(device))?)
    }

    /// Synchronises the slot of `device` with the given observations.
    ///
    /// Entities already tracked under `device` are kept and updated, ones not
    /// listed are released (`AccessPointRemoved` only if visible), new ones
    /// are added. Paths owned by another device and hidden access points are
    /// skipped. Returns the newly inserted paths.
    pub fn init_device(
        &self,
        device: &OwnedObjectPath,
        observations: &[Observation],
    ) -> Vec<OwnedObjectPath> {
        let stale: Vec<OwnedObjectPath> = {
            let slots = self.lock();
            slots
                .get(device)
                .map(|aps| {
                    aps.iter()
                        .filter(|ap| !observations.iter().any(|o| &o.path == ap.path()))
                        .map(|ap| ap.path().clone())
                        .collect()
                })
                .unwrap_or_default()
        };
        for path in &stale {
            self.take(path, false);
        }

        let mut inserted = Vec::new();
        for obs in observations {
            match self.device_of(&obs.path) {
                Some(owner) if &owner == device => {
                    self.on_properties_changed(obs);
                }
                Some(owner) => {
                    debug!(
                        "Access point {} already tracked under {}",
                        obs.path.as_str(),
                        owner.as_str()
                    );
                }
                None => match self.add_or_update(device, obs) {
                    Ok(true) => inserted.push(obs.path.clone()),
                    Ok(false) => {}
                    Err(e) => debug!("Skipping {}: {e}", obs.path.as_str()),
                },
            }
        }

        // The slot exists even when every AP was hidden.
        self.lock().entry(device.clone()).or_default();
        inserted
    }

    /// Drops the slot of `device`, emitting `AccessPointRemoved` for each
    /// visible entity. Ignored entities are released silently.
    pub fn remove_device(&self, device: &OwnedObjectPath) {
        let mut slots = self.lock();
        if let Some(aps) = slots.remove(device) {
            self.release_all(device, aps);
            self.publish_summary(&slots);
        }
    }

    /// Empties the registry, emitting `AccessPointRemoved` for every visible
    /// entity. Ignored entities are released silently.
    pub fn clear(&self) {
        let mut slots = self.lock();
        let drained: Vec<_> = slots.drain().collect();
        for (device, aps) in drained {
            self.release_all(&device, aps);
        }
        self.publish_summary(&slots);
    }

    fn release_all(&self, device: &OwnedObjectPath, aps: Vec<AccessPoint>) {
        for ap in aps {
            if !ap.is_ignored() {
                self.emit(AccessPointEvent::Removed {
                    device: device.clone(),
                    access_point: ap.snapshot(),
                });
            }
        }
    }

    fn emit(&self, event: AccessPointEvent) {
        debug!(
            "{} on {}: {}",
            event.name(),
            event.device().as_str(),
            event.access_point().path.as_str()
        );
        // No receivers is fine; events are fire-and-forget.
        let _ = self.events.send(event);
    }

    fn publish_summary(&self, slots: &Slots) {
        let summary: BTreeMap<&str, Vec<AccessPointSnapshot>> = slots
            .keys()
            .map(|device| (device.as_str(), visible(slots, device)))
            .collect();
        match serde_json::to_string(&summary) {
            Ok(json) => {
                self.summary.send_replace(json);
            }
            Err(e) => warn!("Failed to serialize access point summary: {e}"),
        }
    }
}

fn find(slots: &Slots, ap: &OwnedObjectPath) -> Option<(OwnedObjectPath, usize)> {
    slots.iter().find_map(|(device, aps)| {
        aps.iter()
            .position(|entity| entity.path() == ap)
            .map(|i| (device.clone(), i))
    })
}

fn visible(slots: &Slots, device: &OwnedObjectPath) -> Vec<AccessPointSnapshot> {
    slots
        .get(device)
        .map(|aps| {
            aps.iter()
                .filter(|ap| !ap.is_ignored())
                .map(AccessPoint::snapshot)
                .collect()
        })
        .unwrap_or_default()
}
