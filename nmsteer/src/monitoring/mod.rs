//! Background tasks that keep the registry in sync with NetworkManager.
//!
//! One task per tracked device consumes its access point and scan signals;
//! one task per registered access point consumes its property changes. Each
//! task runs under a child of the monitor's cancellation token, and the
//! guard for an access point's task is owned by its registry entity.

pub(crate) mod access_point;
pub(crate) mod device;

use log::{debug, warn};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use tokio_util::sync::{CancellationToken, DropGuard};
use zvariant::OwnedObjectPath;

use crate::Result;
use crate::backend::NetworkBackend;
use crate::core::registry::AccessPointRegistry;
use crate::core::steering::BandSteeringEngine;

use access_point::{observe, watch_access_point};

#[derive(Clone)]
pub(crate) struct Monitor {
    backend: Arc<dyn NetworkBackend>,
    registry: Arc<AccessPointRegistry>,
    steering: Arc<BandSteeringEngine>,
    cancel: CancellationToken,
    devices: Arc<Mutex<HashMap<OwnedObjectPath, DropGuard>>>,
}

impl Monitor {
    pub(crate) fn new(
        backend: Arc<dyn NetworkBackend>,
        registry: Arc<AccessPointRegistry>,
        steering: Arc<BandSteeringEngine>,
    ) -> Self {
        Self {
            backend,
            registry,
            steering,
            cancel: CancellationToken::new(),
            devices: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub(crate) fn registry(&self) -> &Arc<AccessPointRegistry> {
        &self.registry
    }

    pub(crate) fn steering(&self) -> &Arc<BandSteeringEngine> {
        &self.steering
    }

    /// Loads the access points of `device` and starts watching it.
    ///
    /// Calling it again for a tracked device resynchronises its slot and
    /// replaces its device task.
    pub(crate) async fn track_device(&self, device: &OwnedObjectPath) -> Result<()> {
        // Subscribe before listing so no AP appearing in between is missed.
        let events = self.backend.device_events(device).await?;
        let paths = self.backend.access_points(device).await?;

        let ignore_below = self.registry.ignore_below();
        let mut observations = Vec::with_capacity(paths.len());
        for ap in &paths {
            match observe(self.backend.as_ref(), device, ap, ignore_below).await {
                Ok(obs) => observations.push(obs),
                Err(e) => warn!("Failed to read access point {}: {e}", ap.as_str()),
            }
        }

        for ap in self.registry.init_device(device, &observations) {
            self.spawn_watcher(device, &ap);
        }

        let token = self.cancel.child_token();
        let previous = self
            .devices
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(device.clone(), token.clone().drop_guard());
        if previous.is_some() {
            debug!("Replacing watcher of device {}", device.as_str());
        }

        tokio::spawn(device::watch_device(
            self.clone(),
            device.clone(),
            events,
            token,
        ));
        Ok(())
    }

    /// Stops watching `device` and drops its slot.
    pub(crate) fn forget_device(&self, device: &OwnedObjectPath) {
        self.devices
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(device);
        self.registry.remove_device(device);
    }

    /// Registers `ap` under `device`, starting its watcher if it is new.
    pub(crate) async fn track_access_point(
        &self,
        device: &OwnedObjectPath,
        ap: &OwnedObjectPath,
    ) -> Result<bool> {
        let obs = observe(
            self.backend.as_ref(),
            device,
            ap,
            self.registry.ignore_below(),
        )
        .await?;

        let created = self.registry.add_or_update(device, &obs)?;
        if created {
            self.spawn_watcher(device, ap);
        }
        Ok(created)
    }

    fn spawn_watcher(&self, device: &OwnedObjectPath, ap: &OwnedObjectPath) {
        let token = self.cancel.child_token();
        if !self.registry.attach_watch(ap, token.clone().drop_guard()) {
            return;
        }

        tokio::spawn(watch_access_point(
            Arc::clone(&self.backend),
            Arc::clone(&self.registry),
            device.clone(),
            ap.clone(),
            token,
        ));
    }

    /// Stops every task and empties the registry.
    pub(crate) fn shutdown(&self) {
        self.cancel.cancel();
        self.devices
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
        self.steering.cancel_scheduled();
        self.registry.clear();
    }

    pub(crate) fn is_shut_down(&self) -> bool {
        self.cancel.is_cancelled()
    }
}
