//! External capability contracts consumed by the orchestrator (§6.2). The core owns only
//! these trait boundaries; persistence, push transport, and HTTP delivery are out of scope
//! (§1) and left to whatever implements these traits in the surrounding application.

use std::collections::HashMap;

use async_trait::async_trait;
use uuid::Uuid;

use super::models::{Address, Device, MerchantLocationNotification, NotificationLog, SubscriberAddress};
use crate::error::AppResult;

#[async_trait]
pub trait AddressStore: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> AppResult<Address>;
}

#[async_trait]
pub trait SubscriptionStore: Send + Sync {
    async fn find_subscriber_addresses_within_radius(
        &self,
        merchant_id: Uuid,
        lat: f64,
        lng: f64,
    ) -> AppResult<Vec<SubscriberAddress>>;

    async fn find_devices_for_users(&self, user_ids: &[Uuid]) -> AppResult<Vec<Device>>;
}

#[async_trait]
pub trait DeviceStore: Send + Sync {
    async fn delete_device(&self, device_id: Uuid) -> AppResult<()>;
}

#[async_trait]
pub trait NotificationStore: Send + Sync {
    async fn create_notification(&self, notification: &MerchantLocationNotification) -> AppResult<()>;
    async fn batch_create_logs(&self, logs: &[NotificationLog]) -> AppResult<()>;
    async fn update_status(&self, id: Uuid, total_sent: i64, total_failed: i64) -> AppResult<()>;
    async fn find_by_merchant(
        &self,
        merchant_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> AppResult<Vec<MerchantLocationNotification>>;
}

/// Outcome of one push-provider batch call (§4.6, §6.2).
#[derive(Debug, Clone, Default)]
pub struct PushBatchOutcome {
    pub success: usize,
    pub failure: usize,
    pub invalid_tokens: Vec<String>,
}

#[async_trait]
pub trait PushProvider: Send + Sync {
    async fn send_batch(
        &self,
        tokens: &[String],
        title: &str,
        body: &str,
        data: &HashMap<String, String>,
    ) -> AppResult<PushBatchOutcome>;
}
