//! Data model for the notification publication pipeline (§3).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Ios,
    Android,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OwnerType {
    Merchant,
    User,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogStatus {
    Sent,
    Failed,
}

/// An address record owned by either a merchant or a user (§4.5 location resolution).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Address {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub owner_type: OwnerType,
    pub name: String,
    pub full_address: String,
    pub lat: f64,
    pub lng: f64,
}

/// A user's subscription to a merchant's location notifications (§3, external entity).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Subscription {
    pub id: Uuid,
    pub user_id: Uuid,
    pub merchant_id: Uuid,
    pub notification_radius_meters: f64,
    pub is_active: bool,
    pub subscribed_at: DateTime<Utc>,
}

/// The storage collaborator's join projection: a subscriber's address and per-subscription
/// radius, already bounding-box filtered (§4.5 Stage 2).
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SubscriberAddress {
    pub owner_id: Uuid,
    pub lat: f64,
    pub lng: f64,
    pub notification_radius_meters: f64,
}

/// A registered push-notification device (§3). `(user_id, device_id)` is unique.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Device {
    pub id: Uuid,
    pub user_id: Uuid,
    pub fcm_token: String,
    pub device_id: String,
    pub platform: Platform,
    pub is_active: bool,
}

/// The audit record anchoring a single `publish_location_notification` call (§3, §4.5).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MerchantLocationNotification {
    pub id: Uuid,
    pub merchant_id: Uuid,
    pub address_id: Option<Uuid>,
    pub location_name: String,
    pub full_address: String,
    pub lat: f64,
    pub lng: f64,
    pub hint_message: String,
    pub total_sent: i64,
    pub total_failed: i64,
    pub published_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl MerchantLocationNotification {
    pub fn new_shell(
        merchant_id: Uuid,
        address_id: Option<Uuid>,
        location_name: String,
        full_address: String,
        lat: f64,
        lng: f64,
        hint_message: String,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            merchant_id,
            address_id,
            location_name,
            full_address,
            lat,
            lng,
            hint_message,
            total_sent: 0,
            total_failed: 0,
            published_at: None,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Per-recipient delivery log entry (§3, §4.6).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationLog {
    pub id: Uuid,
    pub notification_id: Uuid,
    pub user_id: Uuid,
    pub device_id: Uuid,
    pub status: LogStatus,
    pub fcm_message_id: String,
    pub error_message: String,
    pub sent_at: DateTime<Utc>,
}
