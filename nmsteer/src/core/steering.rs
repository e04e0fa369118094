//! Band steering.
//!
//! A pass looks at every tracked wireless device and, when a same-SSID access
//! point on the other band is clearly better (or a band was requested
//! manually), restricts the active profile to that band and re-activates it
//! against the new access point.
//!
//! Passes are triggered by a debounced timer after scan results arrive and by
//! manual band requests. They never overlap, and a pass is never cancelled
//! once started; only the pending timer is replaced.

use futures_timer::Delay;
use log::{debug, error, info, warn};
use std::sync::{Arc, Mutex, PoisonError};
use tokio::task::JoinHandle;
use zvariant::OwnedObjectPath;

use crate::Result;
use crate::api::config::SteeringConfig;
use crate::api::models::{AccessPointSnapshot, ActiveConnectionState, Band};
use crate::backend::NetworkBackend;
use crate::core::activator::ConnectionActivator;
use crate::core::profile;
use crate::core::registry::AccessPointRegistry;
use crate::util::utils::decode_ssid_or_empty;

/// Picks the access point to move to among `aps`.
///
/// With a requested band the first same-SSID access point in that band
/// wins. Without one the strongest same-SSID access point wins, the first
/// found on ties; a strength of 0 never wins.
pub(crate) fn find_candidate<'a>(
    aps: &'a [AccessPointSnapshot],
    ssid: &str,
    band: Option<Band>,
) -> Option<&'a AccessPointSnapshot> {
    let mut same_ssid = aps.iter().filter(|ap| ap.ssid == ssid);

    match band {
        Some(band) => same_ssid.find(|ap| band.contains(ap.frequency)),
        None => same_ssid
            .filter(|ap| ap.strength > 0)
            .fold(None, |best: Option<&AccessPointSnapshot>, ap| match best {
                Some(b) if ap.strength <= b.strength => Some(b),
                _ => Some(ap),
            }),
    }
}

/// Why a device was left alone during a pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Skip {
    NoActiveConnection,
    NotActivated(ActiveConnectionState),
    NoActiveAccessPoint,
    StrongFiveGhz,
    NoCandidate,
    AlreadyOnCandidate,
    MarginalGain,
    UnknownBand,
    SameBand,
}

/// Outcome of steering one device.
#[derive(Debug)]
enum Steer {
    Skipped(Skip),
    Moved(OwnedObjectPath),
}

/// Runs steering passes and owns their scheduling state.
pub struct BandSteeringEngine {
    backend: Arc<dyn NetworkBackend>,
    registry: Arc<AccessPointRegistry>,
    activator: ConnectionActivator,
    config: SteeringConfig,
    pending_band: Mutex<Option<Band>>,
    debounce: Mutex<Option<JoinHandle<()>>>,
    pass: tokio::sync::Mutex<()>,
}

impl BandSteeringEngine {
    pub fn new(
        backend: Arc<dyn NetworkBackend>,
        registry: Arc<AccessPointRegistry>,
        config: SteeringConfig,
    ) -> Self {
        Self {
            activator: ConnectionActivator::new(Arc::clone(&backend)),
            backend,
            registry,
            config,
            pending_band: Mutex::new(None),
            debounce: Mutex::new(None),
            pass: tokio::sync::Mutex::new(()),
        }
    }

    pub fn config(&self) -> &SteeringConfig {
        &self.config
    }

    /// Records a manual band request for the next pass.
    pub fn set_pending_band(&self, band: Band) {
        *self
            .pending_band
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(band);
    }

    pub fn pending_band(&self) -> Option<Band> {
        *self
            .pending_band
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn take_pending_band(&self) -> Option<Band> {
        self.pending_band
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
    }

    /// Schedules a pass after the debounce delay, replacing any pending one.
    ///
    /// Only the timer is replaced; a pass that already started runs to
    /// completion in its own task.
    pub fn schedule(self: &Arc<Self>) {
        let engine = Arc::clone(self);
        let delay = self.config.debounce;

        let timer = tokio::spawn(async move {
            Delay::new(delay).await;
            tokio::spawn(async move {
                engine.run_pass().await;
            });
        });

        let previous = self
            .debounce
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .replace(timer);
        if let Some(previous) = previous {
            previous.abort();
            debug!("Replaced pending steering timer");
        }
    }

    /// Whether a debounced pass is waiting for its timer.
    pub fn is_scheduled(&self) -> bool {
        self.debounce
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .is_some_and(|timer| !timer.is_finished())
    }

    /// Drops the pending timer, if any.
    pub fn cancel_scheduled(&self) {
        if let Some(timer) = self
            .debounce
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
        {
            timer.abort();
        }
    }

    /// Runs one steering pass over every tracked device.
    ///
    /// Waits for a running pass to finish first. Failures are logged per
    /// device and never stop the pass. Returns the devices that were moved.
    pub async fn run_pass(&self) -> Vec<OwnedObjectPath> {
        let _pass = self.pass.lock().await;
        let band = self.take_pending_band();
        debug!(
            "Steering pass (band: {})",
            band.map_or("auto", Band::as_str)
        );

        let mut moved = Vec::new();
        for device in self.registry.devices() {
            match self.steer_device(&device, band).await {
                Ok(Steer::Moved(ap)) => {
                    info!("Steered {} to {}", device.as_str(), ap.as_str());
                    moved.push(device);
                }
                Ok(Steer::Skipped(reason)) => {
                    debug!("Not steering {}: {reason:?}", device.as_str());
                }
                Err(e) => error!("Steering {} failed: {e}", device.as_str()),
            }
        }
        moved
    }

    async fn steer_device(&self, device: &OwnedObjectPath, band: Option<Band>) -> Result<Steer> {
        let Some(active) = self.backend.active_connection(device).await? else {
            return Ok(Steer::Skipped(Skip::NoActiveConnection));
        };
        if active.state != ActiveConnectionState::Activated {
            return Ok(Steer::Skipped(Skip::NotActivated(active.state)));
        }

        let Some(current_path) = self.backend.active_access_point(device).await? else {
            return Ok(Steer::Skipped(Skip::NoActiveAccessPoint));
        };
        let current = self.backend.access_point(&current_path).await?;

        if band.is_none()
            && current.strength > self.config.strength_threshold
            && Band::A.contains(current.frequency)
        {
            return Ok(Steer::Skipped(Skip::StrongFiveGhz));
        }

        let ssid = decode_ssid_or_empty(&current.ssid);
        let visible = self.registry.list(device);
        let Some(candidate) = find_candidate(&visible, &ssid, band) else {
            return Ok(Steer::Skipped(Skip::NoCandidate));
        };
        if candidate.path == current_path {
            return Ok(Steer::Skipped(Skip::AlreadyOnCandidate));
        }

        if band.is_none()
            && candidate.strength.saturating_sub(current.strength) < self.config.min_strength_gain
        {
            return Ok(Steer::Skipped(Skip::MarginalGain));
        }

        let Some(target) = candidate.band() else {
            return Ok(Steer::Skipped(Skip::UnknownBand));
        };
        if Band::from_frequency(current.frequency) == Some(target) {
            return Ok(Steer::Skipped(Skip::SameBand));
        }

        let mut settings = self
            .backend
            .connection_settings_by_path(&active.connection)
            .await?;
        let uuid = match profile::uuid_of(&settings) {
            Some(uuid) => uuid.to_string(),
            None => {
                warn!(
                    "Profile {} has no uuid, using the active connection's",
                    active.connection.as_str()
                );
                active.uuid.clone()
            }
        };

        profile::set_band(&mut settings, target)?;
        self.backend.update_connection(&uuid, settings).await?;
        debug!("Restricted connection {uuid} to band {target}");

        self.activator
            .activate(&uuid, &candidate.path, device)
            .await?;
        Ok(Steer::Moved(candidate.path.clone()))
    }
}

impl Drop for BandSteeringEngine {
    fn drop(&mut self) {
        self.cancel_scheduled();
    }
}

impl std::fmt::Debug for BandSteeringEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BandSteeringEngine")
            .field("config", &self.config)
            .field("pending_band", &self.pending_band())
            .finish_non_exhaustive()
    }
}
