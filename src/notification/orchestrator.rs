//! C5 — Notification Orchestrator. The six-stage `publish_location_notification` pipeline
//! (§4.5): persist shell, gather candidates, filter by reachability, look up devices,
//! dispatch, reconcile.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono::Utc;
use tracing::warn;
use uuid::Uuid;

use super::batcher;
use super::collaborators::{AddressStore, DeviceStore, NotificationStore, PushProvider, SubscriptionStore};
use super::models::{MerchantLocationNotification, OwnerType};
use crate::cancel::CancellationToken;
use crate::error::{AppError, AppResult};
use crate::geo::Coordinate;
use crate::routing::{OneToManyTarget, RoutingFacade};

const NOTIFICATION_TITLE: &str = "商戶位置通知";

/// One of the two ways to supply a notification's location (§4.5 Preconditions). Passing
/// `None` to `publish_location_notification` represents "neither provided" and is rejected
/// with `INVALID_NOTIFICATION_DATA` before any row is created.
pub enum LocationInput {
    AddressId(Uuid),
    LocationData { name: String, full_address: String, lat: f64, lng: f64 },
}

pub struct NotificationOrchestrator {
    addresses: Arc<dyn AddressStore>,
    subscriptions: Arc<dyn SubscriptionStore>,
    devices: Arc<dyn DeviceStore>,
    notifications: Arc<dyn NotificationStore>,
    push: Arc<dyn PushProvider>,
    routing: Arc<RoutingFacade>,
}

impl NotificationOrchestrator {
    pub fn new(
        addresses: Arc<dyn AddressStore>,
        subscriptions: Arc<dyn SubscriptionStore>,
        devices: Arc<dyn DeviceStore>,
        notifications: Arc<dyn NotificationStore>,
        push: Arc<dyn PushProvider>,
        routing: Arc<RoutingFacade>,
    ) -> Self {
        Self { addresses, subscriptions, devices, notifications, push, routing }
    }

    pub async fn publish_location_notification(
        &self,
        merchant_id: Uuid,
        location: Option<LocationInput>,
        hint_message: &str,
        cancel: &CancellationToken,
    ) -> AppResult<MerchantLocationNotification> {
        let location = location.ok_or_else(|| {
            AppError::invalid_input("INVALID_NOTIFICATION_DATA", "exactly one of address_id or location_data must be provided")
        })?;
        let (address_id, name, full_address, lat, lng) = self.resolve_location(merchant_id, location).await?;

        let now = Utc::now();
        let mut shell = MerchantLocationNotification::new_shell(
            merchant_id,
            address_id,
            name.clone(),
            full_address.clone(),
            lat,
            lng,
            hint_message.to_string(),
            now,
        );
        self.notifications.create_notification(&shell).await?;

        // Stage 2 — candidate set.
        let subscribers = self.subscriptions.find_subscriber_addresses_within_radius(merchant_id, lat, lng).await?;
        if subscribers.is_empty() {
            return Ok(shell);
        }

        // Stage 3 — reachability filter.
        let merchant_point = Coordinate::new(lat, lng);
        let targets: Vec<OneToManyTarget> = subscribers
            .iter()
            .map(|s| OneToManyTarget { coordinate: Coordinate::new(s.lat, s.lng), radius_m: Some(s.notification_radius_meters) })
            .collect();
        let results = self.routing.one_to_many(merchant_point, &targets, cancel).map_err(|e| match e {
            AppError::Canceled { .. } => e,
            _ => AppError::routing_failed("routing service failed"),
        })?;

        let mut retained_user_ids: Vec<Uuid> = Vec::new();
        let mut seen = HashSet::new();
        for (subscriber, result) in subscribers.iter().zip(results.iter()) {
            if result.is_reachable && result.distance_m <= subscriber.notification_radius_meters && seen.insert(subscriber.owner_id) {
                retained_user_ids.push(subscriber.owner_id);
            }
        }
        if retained_user_ids.is_empty() {
            return Ok(shell);
        }

        // Stage 4 — device lookup.
        let devices = self.subscriptions.find_devices_for_users(&retained_user_ids).await?;
        if devices.is_empty() {
            return Ok(shell);
        }

        // Stage 5 — dispatch.
        let body = self.render_body(&name, &full_address, hint_message);
        let data = self.render_data(&shell, &name, &full_address, lat, lng);
        let dispatch_result = batcher::dispatch(self.push.as_ref(), &devices, NOTIFICATION_TITLE, &body, &data, shell.id).await?;

        // Stage 6 — reconcile.
        if let Err(e) = self.notifications.batch_create_logs(&dispatch_result.logs).await {
            warn!(target: "nomnom_radar::notification", "failed to persist delivery logs: {e}");
        }
        for token in &dispatch_result.invalid_tokens {
            if let Some(device) = devices.iter().find(|d| &d.fcm_token == token) {
                if let Err(e) = self.devices.delete_device(device.id).await {
                    warn!(target: "nomnom_radar::notification", "failed to soft-delete invalid device {}: {e}", device.id);
                }
            }
        }
        self.notifications
            .update_status(shell.id, dispatch_result.total_sent, dispatch_result.total_failed)
            .await
            .map_err(|_| AppError::internal("failed to update notification status"))?;

        shell.total_sent = dispatch_result.total_sent;
        shell.total_failed = dispatch_result.total_failed;
        shell.published_at = Some(Utc::now());
        shell.updated_at = Utc::now();
        Ok(shell)
    }

    pub async fn get_merchant_notification_history(
        &self,
        merchant_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> AppResult<Vec<MerchantLocationNotification>> {
        self.notifications.find_by_merchant(merchant_id, limit, offset).await
    }

    async fn resolve_location(
        &self,
        merchant_id: Uuid,
        location: LocationInput,
    ) -> AppResult<(Option<Uuid>, String, String, f64, f64)> {
        match location {
            LocationInput::AddressId(address_id) => {
                let address = self.addresses.find_by_id(address_id).await?;
                if address.owner_id != merchant_id || !matches!(address.owner_type, OwnerType::Merchant) {
                    return Err(AppError::unauthorized(
                        "UNAUTHORIZED",
                        "address does not belong to this merchant",
                    ));
                }
                Ok((Some(address_id), address.name, address.full_address, address.lat, address.lng))
            }
            LocationInput::LocationData { name, full_address, lat, lng } => Ok((None, name, full_address, lat, lng)),
        }
    }

    fn render_body(&self, name: &str, full_address: &str, hint_message: &str) -> String {
        let mut body = format!("{name} 已在 {full_address} 開始營業");
        if !hint_message.is_empty() {
            body.push_str(" - ");
            body.push_str(hint_message);
        }
        body
    }

    fn render_data(
        &self,
        shell: &MerchantLocationNotification,
        name: &str,
        full_address: &str,
        lat: f64,
        lng: f64,
    ) -> HashMap<String, String> {
        let mut data = HashMap::with_capacity(6);
        data.insert("notification_id".to_string(), shell.id.to_string());
        data.insert("merchant_id".to_string(), shell.merchant_id.to_string());
        data.insert("latitude".to_string(), lat.to_string());
        data.insert("longitude".to_string(), lng.to_string());
        data.insert("location_name".to_string(), name.to_string());
        data.insert("full_address".to_string(), full_address.to_string());
        data
    }
}
