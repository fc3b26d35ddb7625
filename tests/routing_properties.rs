//! Property-style checks run against the public routing API (§8 invariants 1, 6) and a
//! repeated-dispatch idempotence check for device cleanup (§8 invariant 7).

use std::fs::File;
use std::io::Write as _;
use std::sync::Arc;

use uuid::Uuid;

use nomnom_radar::cancel::CancellationToken;
use nomnom_radar::config::RoutingConfig;
use nomnom_radar::geo::{haversine_meters, Coordinate};
use nomnom_radar::notification::testing::{
    InMemoryAddressStore, InMemoryDeviceStore, InMemoryNotificationStore, InMemoryPushProvider, InMemorySubscriptionStore,
};
use nomnom_radar::notification::{
    AddressStore, Device, DeviceStore, LocationInput, NotificationOrchestrator, NotificationStore, Platform, PushProvider,
    SubscriberAddress, SubscriptionStore,
};
use nomnom_radar::routing::{ChEngine, RoutingFacade};

fn grid_engine() -> ChEngine {
    let tmp = tempfile::tempdir().unwrap();
    let mut f = File::create(tmp.path().join("vertices.csv")).unwrap();
    f.write_all(
        b"id,lat,lng,order_pos,importance\n\
          0,25.0330,121.5654,0,1\n\
          1,25.0400,121.5700,1,1\n\
          2,25.0500,121.5900,2,1\n",
    )
    .unwrap();
    let mut f = File::create(tmp.path().join("edges.csv")).unwrap();
    f.write_all(b"from,to,weight\n0,1,1200.0\n1,0,1200.0\n1,2,2500.0\n2,1,2500.0\n").unwrap();
    let mut f = File::create(tmp.path().join("metadata.json")).unwrap();
    f.write_all(
        br#"{"version":"1.0","source":{"region":"taipei"},"processing":{"generated_at":1700000000},
            "output":{"vertices_count":3,"edges_count":4,"shortcuts_count":0}}"#,
    )
    .unwrap();

    let config = RoutingConfig { max_snap_distance_km: 5.0, ..RoutingConfig::default() };
    let engine = ChEngine::new(config);
    engine.load_data(tmp.path().to_str().unwrap()).unwrap();
    engine
}

#[test]
fn shortest_path_distance_is_never_shorter_than_haversine() {
    let engine = grid_engine();
    let a = Coordinate::new(25.0330, 121.5654);
    let b = Coordinate::new(25.0500, 121.5900);
    let result = engine.shortest_path(a, b).unwrap();
    assert!(result.is_reachable);
    assert!(result.distance_m + 1e-6 >= haversine_meters(a, b));
}

#[test]
fn repeated_one_to_many_calls_are_deterministic() {
    let engine = grid_engine();
    let source = Coordinate::new(25.0330, 121.5654);
    let targets = vec![nomnom_radar::routing::OneToManyTarget {
        coordinate: Coordinate::new(25.0500, 121.5900),
        radius_m: Some(10_000.0),
    }];
    let cancel = CancellationToken::new();
    let r1 = engine.one_to_many(source, &targets, &cancel).unwrap();
    let r2 = engine.one_to_many(source, &targets, &cancel).unwrap();
    assert!((r1[0].distance_m - r2[0].distance_m).abs() < 1e-9);
}

#[tokio::test]
async fn publishing_twice_with_the_same_invalid_token_deletes_the_device_twice_and_both_are_tolerated() {
    let addresses = Arc::new(InMemoryAddressStore::new());
    let subscriptions = Arc::new(InMemorySubscriptionStore::new());
    let devices = Arc::new(InMemoryDeviceStore::new());
    let notifications = Arc::new(InMemoryNotificationStore::new());
    let push: Arc<dyn PushProvider> = Arc::new(InMemoryPushProvider::with_invalid_tokens(vec!["bad".to_string()]));
    let config = RoutingConfig::default();
    let facade = RoutingFacade::new(ChEngine::new(config.clone()), config);
    let orchestrator = NotificationOrchestrator::new(
        addresses as Arc<dyn AddressStore>,
        subscriptions.clone() as Arc<dyn SubscriptionStore>,
        devices.clone() as Arc<dyn DeviceStore>,
        notifications as Arc<dyn NotificationStore>,
        push,
        Arc::new(facade),
    );

    let merchant_id = Uuid::new_v4();
    let user_id = Uuid::new_v4();
    let device_id = Uuid::new_v4();
    subscriptions.add_subscriber(
        merchant_id,
        SubscriberAddress { owner_id: user_id, lat: 25.0335, lng: 121.5660, notification_radius_meters: 1000.0 },
    );
    subscriptions.add_device(
        user_id,
        Device { id: device_id, user_id, fcm_token: "bad".into(), device_id: "d1".into(), platform: Platform::Android, is_active: true },
    );

    for _ in 0..2 {
        let cancel = CancellationToken::new();
        let location =
            LocationInput::LocationData { name: "Stall".into(), full_address: "Taipei".into(), lat: 25.0330, lng: 121.5654 };
        orchestrator.publish_location_notification(merchant_id, Some(location), "", &cancel).await.unwrap();
    }

    assert_eq!(devices.deleted_ids().len(), 2);
    assert!(devices.deleted_ids().iter().all(|id| *id == device_id));
}
