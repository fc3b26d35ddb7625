//! In-memory collaborator implementations used by unit and integration tests. Kept out of
//! `#[cfg(test)]` so integration tests under `tests/` (which link the ordinary, non-test-cfg
//! build of this crate) can see them too.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use uuid::Uuid;

use super::collaborators::{AddressStore, DeviceStore, NotificationStore, PushBatchOutcome, PushProvider, SubscriptionStore};
use super::models::{Address, Device, MerchantLocationNotification, NotificationLog, SubscriberAddress};
use crate::error::{AppError, AppResult};
use crate::geo::{haversine_meters, Coordinate};

#[derive(Default)]
pub struct InMemoryAddressStore {
    addresses: Mutex<HashMap<Uuid, Address>>,
}

impl InMemoryAddressStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, address: Address) {
        self.addresses.lock().unwrap().insert(address.id, address);
    }
}

#[async_trait]
impl AddressStore for InMemoryAddressStore {
    async fn find_by_id(&self, id: Uuid) -> AppResult<Address> {
        self.addresses
            .lock()
            .unwrap()
            .get(&id)
            .cloned()
            .ok_or_else(|| AppError::not_found("ADDRESS_NOT_FOUND", format!("address {id} not found")))
    }
}

/// Holds subscriptions joined with their subscriber's addresses and registered devices,
/// mirroring the join the storage collaborator is expected to perform (§4.5 Stage 2/3).
#[derive(Default)]
pub struct InMemorySubscriptionStore {
    subscriber_addresses: Mutex<HashMap<Uuid, Vec<SubscriberAddress>>>,
    devices: Mutex<HashMap<Uuid, Vec<Device>>>,
}

impl InMemorySubscriptionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_subscriber(&self, merchant_id: Uuid, subscriber: SubscriberAddress) {
        self.subscriber_addresses.lock().unwrap().entry(merchant_id).or_default().push(subscriber);
    }

    pub fn add_device(&self, user_id: Uuid, device: Device) {
        self.devices.lock().unwrap().entry(user_id).or_default().push(device);
    }
}

#[async_trait]
impl SubscriptionStore for InMemorySubscriptionStore {
    /// Applies a generous bounding-box prefilter around `(lat, lng)` before returning, the
    /// same coarse-then-precise shape the real storage collaborator is expected to follow.
    async fn find_subscriber_addresses_within_radius(
        &self,
        merchant_id: Uuid,
        lat: f64,
        lng: f64,
    ) -> AppResult<Vec<SubscriberAddress>> {
        const BBOX_DEG: f64 = 5.0;
        let origin = Coordinate::new(lat, lng);
        let matches = self
            .subscriber_addresses
            .lock()
            .unwrap()
            .get(&merchant_id)
            .cloned()
            .unwrap_or_default()
            .into_iter()
            .filter(|s| (s.lat - lat).abs() <= BBOX_DEG && (s.lng - lng).abs() <= BBOX_DEG)
            .filter(|s| haversine_meters(origin, Coordinate::new(s.lat, s.lng)) <= s.notification_radius_meters * 4.0)
            .collect();
        Ok(matches)
    }

    async fn find_devices_for_users(&self, user_ids: &[Uuid]) -> AppResult<Vec<Device>> {
        let devices = self.devices.lock().unwrap();
        Ok(user_ids
            .iter()
            .filter_map(|id| devices.get(id))
            .flatten()
            .filter(|d| d.is_active)
            .cloned()
            .collect())
    }
}

#[derive(Default)]
pub struct InMemoryDeviceStore {
    deleted: Mutex<Vec<Uuid>>,
}

impl InMemoryDeviceStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn deleted_ids(&self) -> Vec<Uuid> {
        self.deleted.lock().unwrap().clone()
    }
}

#[async_trait]
impl DeviceStore for InMemoryDeviceStore {
    async fn delete_device(&self, device_id: Uuid) -> AppResult<()> {
        self.deleted.lock().unwrap().push(device_id);
        Ok(())
    }
}

#[derive(Default)]
pub struct InMemoryNotificationStore {
    notifications: Mutex<HashMap<Uuid, MerchantLocationNotification>>,
    logs: Mutex<Vec<NotificationLog>>,
}

impl InMemoryNotificationStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn logs(&self) -> Vec<NotificationLog> {
        self.logs.lock().unwrap().clone()
    }

    pub fn get(&self, id: Uuid) -> Option<MerchantLocationNotification> {
        self.notifications.lock().unwrap().get(&id).cloned()
    }
}

#[async_trait]
impl NotificationStore for InMemoryNotificationStore {
    async fn create_notification(&self, notification: &MerchantLocationNotification) -> AppResult<()> {
        self.notifications.lock().unwrap().insert(notification.id, notification.clone());
        Ok(())
    }

    async fn batch_create_logs(&self, logs: &[NotificationLog]) -> AppResult<()> {
        self.logs.lock().unwrap().extend_from_slice(logs);
        Ok(())
    }

    async fn update_status(&self, id: Uuid, total_sent: i64, total_failed: i64) -> AppResult<()> {
        let mut notifications = self.notifications.lock().unwrap();
        let n = notifications
            .get_mut(&id)
            .ok_or_else(|| AppError::not_found("NOTIFICATION_NOT_FOUND", format!("notification {id} not found")))?;
        n.total_sent = total_sent;
        n.total_failed = total_failed;
        n.published_at = Some(n.published_at.unwrap_or_else(chrono::Utc::now));
        n.updated_at = chrono::Utc::now();
        Ok(())
    }

    async fn find_by_merchant(
        &self,
        merchant_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> AppResult<Vec<MerchantLocationNotification>> {
        let mut matches: Vec<MerchantLocationNotification> = self
            .notifications
            .lock()
            .unwrap()
            .values()
            .filter(|n| n.merchant_id == merchant_id)
            .cloned()
            .collect();
        matches.sort_by_key(|n| std::cmp::Reverse(n.created_at));
        Ok(matches.into_iter().skip(offset.max(0) as usize).take(limit.max(0) as usize).collect())
    }
}

/// Always succeeds, reporting every token as delivered. Counts calls to `send_batch` so
/// batching tests can assert window counts (§8 S7).
pub struct InMemoryPushProvider {
    invalid_tokens: Vec<String>,
    calls: AtomicUsize,
}

impl InMemoryPushProvider {
    pub fn always_succeeds() -> Self {
        Self { invalid_tokens: Vec::new(), calls: AtomicUsize::new(0) }
    }

    pub fn with_invalid_tokens(invalid_tokens: Vec<String>) -> Self {
        Self { invalid_tokens, calls: AtomicUsize::new(0) }
    }

    pub fn batch_calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PushProvider for InMemoryPushProvider {
    async fn send_batch(
        &self,
        tokens: &[String],
        _title: &str,
        _body: &str,
        _data: &HashMap<String, String>,
    ) -> AppResult<PushBatchOutcome> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let invalid: Vec<String> = tokens.iter().filter(|t| self.invalid_tokens.contains(t)).cloned().collect();
        Ok(PushBatchOutcome {
            success: tokens.len() - invalid.len(),
            failure: invalid.len(),
            invalid_tokens: invalid,
        })
    }
}

/// Every call errors, simulating a provider-wide outage (§4.6 step 2).
pub struct FailingPushProvider;

#[async_trait]
impl PushProvider for FailingPushProvider {
    async fn send_batch(
        &self,
        _tokens: &[String],
        _title: &str,
        _body: &str,
        _data: &HashMap<String, String>,
    ) -> AppResult<PushBatchOutcome> {
        Err(AppError::provider_error("push provider unavailable"))
    }
}
