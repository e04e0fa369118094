//! Signal monitoring for wireless devices.

use futures::StreamExt;
use futures::stream::BoxStream;
use log::{debug, warn};
use tokio_util::sync::CancellationToken;
use zvariant::OwnedObjectPath;

use super::Monitor;
use crate::api::models::{DeviceEvent, NetworkError};

/// Feeds access point and scan notifications of `device` into the registry
/// and the steering engine until `token` is cancelled.
pub(crate) async fn watch_device(
    monitor: Monitor,
    device: OwnedObjectPath,
    mut events: BoxStream<'static, DeviceEvent>,
    token: CancellationToken,
) {
    debug!("Watching device {}", device.as_str());

    loop {
        tokio::select! {
            _ = token.cancelled() => break,
            event = events.next() => {
                let Some(event) = event else {
                    warn!("Signal stream of {} ended", device.as_str());
                    break;
                };
                handle_event(&monitor, &device, event).await;
            }
        }
    }

    debug!("Stopped watching device {}", device.as_str());
}

async fn handle_event(monitor: &Monitor, device: &OwnedObjectPath, event: DeviceEvent) {
    match event {
        DeviceEvent::AccessPointAppeared(ap) => {
            match monitor.track_access_point(device, &ap).await {
                Ok(_) => {}
                Err(NetworkError::HiddenAccessPoint) => {
                    debug!("Skipping hidden access point {}", ap.as_str());
                }
                Err(e) => warn!("Failed to add access point {}: {e}", ap.as_str()),
            }
        }
        DeviceEvent::AccessPointVanished(ap) => {
            monitor.registry().remove(&ap);
        }
        DeviceEvent::ScanFinished => {
            if monitor.steering().config().steering_enabled {
                monitor.steering().schedule();
            }
        }
    }
}
