//! Property monitoring for individual access points.

use futures::StreamExt;
use log::{debug, warn};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use zvariant::OwnedObjectPath;

use crate::Result;
use crate::backend::NetworkBackend;
use crate::core::access_point::needs_activation_check;
use crate::core::profile;
use crate::core::registry::{AccessPointRegistry, Observation};
use crate::try_log;
use crate::types::constants::connection_type;

async fn active_ssid_matches(
    backend: &dyn NetworkBackend,
    device: &OwnedObjectPath,
    ssid: &[u8],
) -> Option<bool> {
    let active = try_log!(
        backend.active_connections().await,
        "Failed to list active connections"
    );

    for ac in active
        .iter()
        .filter(|ac| ac.conn_type == connection_type::WIRELESS && ac.devices.contains(device))
    {
        let settings = try_log!(
            backend.connection_settings_by_path(&ac.connection).await,
            format!("Failed to read settings of {}", ac.connection.as_str())
        );
        if profile::ssid_of(&settings).as_deref() == Some(ssid) {
            return Some(true);
        }
    }
    Some(false)
}

/// Whether a wireless connection for `ssid` is active on `device`.
///
/// Lookup failures count as "not activated".
pub(crate) async fn is_access_point_activated(
    backend: &dyn NetworkBackend,
    device: &OwnedObjectPath,
    ssid: &[u8],
) -> bool {
    active_ssid_matches(backend, device, ssid)
        .await
        .unwrap_or(false)
}

/// Reads everything the registry needs to know about `ap`.
///
/// The activation lookup only happens when it can change the ignore
/// decision.
pub(crate) async fn observe(
    backend: &dyn NetworkBackend,
    device: &OwnedObjectPath,
    ap: &OwnedObjectPath,
    ignore_below: u8,
) -> Result<Observation> {
    let props = backend.access_point(ap).await?;
    let activated = needs_activation_check(props.strength, ignore_below)
        && is_access_point_activated(backend, device, &props.ssid).await;

    Ok(Observation {
        path: ap.clone(),
        props,
        activated,
    })
}

/// Applies property changes of `ap` to the registry until `token` is
/// cancelled or the change stream ends.
pub(crate) async fn watch_access_point(
    backend: Arc<dyn NetworkBackend>,
    registry: Arc<AccessPointRegistry>,
    device: OwnedObjectPath,
    ap: OwnedObjectPath,
    token: CancellationToken,
) {
    let mut changes = match backend.access_point_changes(&ap).await {
        Ok(changes) => changes,
        Err(e) => {
            warn!("Cannot watch access point {}: {e}", ap.as_str());
            return;
        }
    };

    loop {
        tokio::select! {
            _ = token.cancelled() => break,
            change = changes.next() => {
                if change.is_none() {
                    debug!("Property stream of {} ended", ap.as_str());
                    break;
                }
                match observe(backend.as_ref(), &device, &ap, registry.ignore_below()).await {
                    Ok(obs) => {
                        registry.on_properties_changed(&obs);
                    }
                    Err(e) => warn!("Failed to refresh access point {}: {e}", ap.as_str()),
                }
            }
        }
    }
}
