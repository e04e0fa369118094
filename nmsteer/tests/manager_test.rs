//! Registry maintenance driven by device and access point notifications.

mod common;

use std::sync::Arc;
use std::time::Duration;

use common::{MockBackend, ap_path, device, eventually, profile, props};
use nmsteer::{
    AccessPointEvent, ActiveConnectionState, ApManager, DeviceEvent, NetworkError,
    SecurityCategory, SteeringConfig,
};
use tokio::sync::broadcast;

async fn next_event(rx: &mut broadcast::Receiver<AccessPointEvent>) -> AccessPointEvent {
    tokio::time::timeout(Duration::from_secs(1), rx.recv())
        .await
        .expect("timed out waiting for event")
        .expect("event channel closed")
}

fn manager(backend: &Arc<MockBackend>) -> ApManager {
    ApManager::new(backend.clone(), SteeringConfig::default())
}

fn ssids(manager: &ApManager) -> Vec<String> {
    manager
        .access_points(&device())
        .into_iter()
        .map(|ap| ap.ssid)
        .collect()
}

#[tokio::test]
async fn initial_load_lists_visible_access_points_in_order() {
    let backend = Arc::new(MockBackend::new());
    backend.add_device(&device());
    backend.add_ap(&device(), &ap_path(1), props("Alpha", 50, 2412, SecurityCategory::Psk));
    backend.add_ap(&device(), &ap_path(2), props("Weak", 5, 2437, SecurityCategory::None));
    backend.add_ap(&device(), &ap_path(3), props("Zero", 0, 5180, SecurityCategory::Wep));
    backend.add_ap(&device(), &ap_path(4), props("", 80, 5180, SecurityCategory::Psk));
    backend.add_ap(&device(), &ap_path(5), props("Corp", 60, 5240, SecurityCategory::Eap));

    let manager = manager(&backend);
    assert_eq!(manager.track_all_devices().await.unwrap(), 1);

    assert_eq!(ssids(&manager), ["Alpha", "Zero", "Corp"]);
    // The weak AP is tracked, the hidden one is not.
    assert_eq!(manager.registry().tracked_len(&device()), 4);

    let corp = &manager.access_points(&device())[2];
    assert!(corp.secured && corp.secured_in_eap);

    let json = manager.access_points_json(&device()).unwrap();
    assert!(json.starts_with("[{\"Ssid\":\"Alpha\""));
    manager.shutdown();
}

#[tokio::test]
async fn weak_access_point_in_use_stays_visible() {
    let backend = Arc::new(MockBackend::new());
    backend.add_device(&device());
    backend.add_ap(&device(), &ap_path(1), props("Home", 4, 2412, SecurityCategory::Psk));
    let (uuid, settings) = profile("Home", SecurityCategory::Psk);
    backend.add_profile(&uuid, settings);
    backend.connect(&device(), &ap_path(1), &uuid, ActiveConnectionState::Activated);

    let manager = manager(&backend);
    manager.track_device(&device()).await.unwrap();

    assert_eq!(ssids(&manager), ["Home"]);
    manager.shutdown();
}

#[tokio::test]
async fn signals_add_and_remove_access_points() {
    let backend = Arc::new(MockBackend::new());
    backend.add_device(&device());
    let manager = manager(&backend);
    let mut events = manager.subscribe();
    manager.track_device(&device()).await.unwrap();

    backend.add_ap(&device(), &ap_path(7), props("Cafe", 42, 2462, SecurityCategory::None));
    backend.emit_device_event(&device(), DeviceEvent::AccessPointAppeared(ap_path(7)));

    let added = next_event(&mut events).await;
    assert_eq!(added.name(), "AccessPointAdded");
    assert_eq!(added.device(), &device());
    assert_eq!(added.access_point().ssid, "Cafe");
    assert!(eventually(|| backend.ap_watchers(&ap_path(7)) == 1).await);

    // A repeated announcement is a no-op.
    backend.emit_device_event(&device(), DeviceEvent::AccessPointAppeared(ap_path(7)));
    backend.remove_ap(&ap_path(7));
    backend.emit_device_event(&device(), DeviceEvent::AccessPointVanished(ap_path(7)));

    let removed = next_event(&mut events).await;
    assert_eq!(removed.name(), "AccessPointRemoved");
    assert_eq!(removed.access_point().path, ap_path(7));
    assert!(manager.access_points(&device()).is_empty());

    // Releasing the entity stops its property watcher.
    assert!(eventually(|| backend.ap_watchers(&ap_path(7)) == 0).await);
    manager.shutdown();
}

#[tokio::test]
async fn property_changes_move_access_points_in_and_out_of_view() {
    let backend = Arc::new(MockBackend::new());
    backend.add_device(&device());
    backend.add_ap(&device(), &ap_path(1), props("Flaky", 5, 2412, SecurityCategory::Psk));
    let manager = manager(&backend);
    let mut events = manager.subscribe();
    manager.track_device(&device()).await.unwrap();
    assert!(manager.access_points(&device()).is_empty());
    assert!(eventually(|| backend.ap_watchers(&ap_path(1)) == 1).await);

    backend.set_strength(&ap_path(1), 45);
    backend.emit_ap_changed(&ap_path(1));
    let event = next_event(&mut events).await;
    assert!(matches!(event, AccessPointEvent::Added { .. }));
    assert_eq!(event.access_point().strength, 45);

    backend.set_strength(&ap_path(1), 50);
    backend.emit_ap_changed(&ap_path(1));
    let event = next_event(&mut events).await;
    assert!(matches!(event, AccessPointEvent::PropertiesChanged { .. }));

    backend.set_strength(&ap_path(1), 3);
    backend.emit_ap_changed(&ap_path(1));
    let event = next_event(&mut events).await;
    assert!(matches!(event, AccessPointEvent::Removed { .. }));
    assert!(manager.access_points(&device()).is_empty());
    assert_eq!(manager.registry().tracked_len(&device()), 1);
    manager.shutdown();
}

#[tokio::test]
async fn summary_tracks_visible_access_points_per_device() {
    let backend = Arc::new(MockBackend::new());
    backend.add_device(&device());
    backend.add_ap(&device(), &ap_path(1), props("Alpha", 50, 2412, SecurityCategory::Psk));
    let manager = manager(&backend);
    let summary = manager.wireless_access_points();

    manager.track_device(&device()).await.unwrap();

    let json = summary.borrow().clone();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(value[common::DEVICE][0]["Ssid"], "Alpha");
    manager.shutdown();
}

#[tokio::test]
async fn forget_device_removes_its_access_points() {
    let backend = Arc::new(MockBackend::new());
    backend.add_device(&device());
    backend.add_ap(&device(), &ap_path(1), props("Alpha", 50, 2412, SecurityCategory::Psk));
    backend.add_ap(&device(), &ap_path(2), props("Weak", 2, 2412, SecurityCategory::Psk));
    let manager = manager(&backend);
    manager.track_device(&device()).await.unwrap();
    let mut events = manager.subscribe();

    manager.forget_device(&device());

    let event = next_event(&mut events).await;
    assert!(matches!(event, AccessPointEvent::Removed { .. }));
    assert!(events.try_recv().is_err());
    assert_eq!(manager.registry().tracked_len(&device()), 0);
    manager.shutdown();
}

#[tokio::test]
async fn shutdown_clears_registry_and_refuses_further_tracking() {
    let backend = Arc::new(MockBackend::new());
    backend.add_device(&device());
    backend.add_ap(&device(), &ap_path(1), props("Alpha", 50, 2412, SecurityCategory::Psk));
    backend.add_ap(&device(), &ap_path(2), props("Beta", 60, 5180, SecurityCategory::Psk));
    backend.add_ap(&device(), &ap_path(3), props("Weak", 2, 2412, SecurityCategory::Psk));
    let manager = manager(&backend);
    manager.track_device(&device()).await.unwrap();
    let mut events = manager.subscribe();

    manager.shutdown();

    for _ in 0..2 {
        assert!(matches!(
            next_event(&mut events).await,
            AccessPointEvent::Removed { .. }
        ));
    }
    assert!(events.try_recv().is_err());
    assert!(manager.registry().devices().is_empty());
    assert!(matches!(
        manager.track_device(&device()).await,
        Err(NetworkError::ShutDown)
    ));
    assert!(eventually(|| backend.ap_watchers(&ap_path(1)) == 0).await);
}
