use log::{debug, info, warn};
use std::sync::Arc;
use tokio::sync::{broadcast, watch};
use zvariant::OwnedObjectPath;

use crate::Result;
use crate::api::config::SteeringConfig;
use crate::api::models::{AccessPointEvent, AccessPointSnapshot, Band, NetworkError};
use crate::backend::{DbusBackend, NetworkBackend};
use crate::core::activator::ConnectionActivator;
use crate::core::registry::AccessPointRegistry;
use crate::core::steering::BandSteeringEngine;
use crate::monitoring::Monitor;

/// Process-wide context for access point tracking and band steering.
///
/// Owns the registry, the activator and the steering engine and wires them
/// to NetworkManager signals. Create one per process, track the wireless
/// devices, and call [`shutdown`](Self::shutdown) before exiting.
///
/// # Example
///
/// ```no_run
/// use nmsteer::{ApManager, SteeringConfig};
///
/// # async fn example() -> nmsteer::Result<()> {
/// let manager = ApManager::system(SteeringConfig::default()).await?;
/// manager.track_all_devices().await?;
///
/// let mut events = manager.subscribe();
/// while let Ok(event) = events.recv().await {
///     println!("{} on {}", event.name(), event.device().as_str());
/// }
///
/// manager.shutdown();
/// # Ok(())
/// # }
/// ```
///
/// # Thread Safety
///
/// `ApManager` is `Clone`; clones share all state.
#[derive(Clone)]
pub struct ApManager {
    backend: Arc<dyn NetworkBackend>,
    registry: Arc<AccessPointRegistry>,
    steering: Arc<BandSteeringEngine>,
    activator: ConnectionActivator,
    monitor: Monitor,
}

impl ApManager {
    /// Creates a manager on top of `backend`.
    ///
    /// Nothing is tracked until [`track_device`](Self::track_device) or
    /// [`track_all_devices`](Self::track_all_devices) is called. Must be
    /// called from within a tokio runtime before tracking starts.
    pub fn new(backend: Arc<dyn NetworkBackend>, config: SteeringConfig) -> Self {
        let registry = Arc::new(AccessPointRegistry::new(config.ignore_below_strength));
        let steering = Arc::new(BandSteeringEngine::new(
            Arc::clone(&backend),
            Arc::clone(&registry),
            config,
        ));
        let monitor = Monitor::new(
            Arc::clone(&backend),
            Arc::clone(&registry),
            Arc::clone(&steering),
        );

        Self {
            activator: ConnectionActivator::new(Arc::clone(&backend)),
            backend,
            registry,
            steering,
            monitor,
        }
    }

    /// Creates a manager connected to NetworkManager on the system bus.
    pub async fn system(config: SteeringConfig) -> Result<Self> {
        let backend = DbusBackend::system().await?;
        Ok(Self::new(Arc::new(backend), config))
    }

    pub fn config(&self) -> &SteeringConfig {
        self.steering.config()
    }

    pub fn registry(&self) -> &AccessPointRegistry {
        &self.registry
    }

    fn ensure_running(&self) -> Result<()> {
        if self.monitor.is_shut_down() {
            return Err(NetworkError::ShutDown);
        }
        Ok(())
    }

    /// Starts tracking every wireless device.
    ///
    /// A device that fails to load is logged and skipped. Returns the
    /// number of devices now tracked.
    pub async fn track_all_devices(&self) -> Result<usize> {
        self.ensure_running()?;

        let mut tracked = 0;
        for device in self.backend.wireless_devices().await? {
            match self.monitor.track_device(&device).await {
                Ok(()) => tracked += 1,
                Err(e) => warn!("Failed to track device {}: {e}", device.as_str()),
            }
        }

        info!("Tracking {tracked} wireless device(s)");
        Ok(tracked)
    }

    /// Loads the access points of `device` and watches it for changes.
    pub async fn track_device(&self, device: &OwnedObjectPath) -> Result<()> {
        self.ensure_running()?;
        self.monitor.track_device(device).await
    }

    /// Stops tracking `device`, emitting removals for its visible APs.
    pub fn forget_device(&self, device: &OwnedObjectPath) {
        self.monitor.forget_device(device);
    }

    /// Visible access points of `device`, in discovery order.
    pub fn access_points(&self, device: &OwnedObjectPath) -> Vec<AccessPointSnapshot> {
        self.registry.list(device)
    }

    /// JSON form of [`access_points`](Self::access_points).
    pub fn access_points_json(&self, device: &OwnedObjectPath) -> Result<String> {
        self.registry.list_json(device)
    }

    /// Watches the JSON summary of visible access points per device.
    pub fn wireless_access_points(&self) -> watch::Receiver<String> {
        self.registry.wireless_access_points()
    }

    /// Subscribes to access point added/removed/changed events.
    pub fn subscribe(&self) -> broadcast::Receiver<AccessPointEvent> {
        self.registry.subscribe()
    }

    /// Activates `ap` on `device` with the saved profile `uuid`, or with a new
    /// profile when `uuid` is empty.
    ///
    /// Returns the active connection path.
    pub async fn activate_access_point(
        &self,
        uuid: &str,
        ap: &OwnedObjectPath,
        device: &OwnedObjectPath,
    ) -> Result<OwnedObjectPath> {
        self.activator
            .activate(uuid, ap, device)
            .await
            .inspect_err(|e| warn!("Activating {} failed: {e}", ap.as_str()))
    }

    /// Requests a move to band `token` (`"a"` or `"bg"`).
    ///
    /// The token is validated before anything else happens. Every wireless
    /// device is asked to scan, then a steering pass is scheduled with the
    /// requested band.
    pub async fn request_band(&self, token: &str) -> Result<()> {
        let band: Band = token.parse()?;
        self.ensure_running()?;

        for device in self.backend.wireless_devices().await? {
            self.backend.request_scan(&device).await?;
        }

        self.steering.set_pending_band(band);
        self.steering.schedule();
        debug!("Requested band {band}");
        Ok(())
    }

    /// Schedules a debounced steering pass, replacing a pending one.
    pub fn schedule_steering(&self) {
        self.steering.schedule();
    }

    /// Whether a debounced steering pass is waiting for its timer.
    pub fn steering_scheduled(&self) -> bool {
        self.steering.is_scheduled()
    }

    /// Runs a steering pass now and returns the devices that were moved.
    pub async fn run_steering_pass(&self) -> Vec<OwnedObjectPath> {
        self.steering.run_pass().await
    }

    /// Stops all monitoring, drops the pending steering timer and empties the
    /// registry.
    pub fn shutdown(&self) {
        self.monitor.shutdown();
        info!("Access point manager shut down");
    }
}

impl std::fmt::Debug for ApManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApManager")
            .field("registry", &self.registry)
            .field("steering", &self.steering)
            .finish_non_exhaustive()
    }
}
