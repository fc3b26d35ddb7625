//! C6 — Delivery Batcher. Splits recipients into fixed-size windows, invokes the push
//! collaborator per window, and classifies per-token outcomes into audit logs (§4.6).

use std::collections::HashMap;

use chrono::Utc;
use tracing::warn;
use uuid::Uuid;

use super::collaborators::PushProvider;
use super::models::{Device, LogStatus, NotificationLog};
use crate::config::FIREBASE_BATCH_SIZE;
use crate::error::AppResult;

pub struct BatchDispatchResult {
    pub total_sent: i64,
    pub total_failed: i64,
    pub logs: Vec<NotificationLog>,
    pub invalid_tokens: Vec<String>,
}

/// Dispatches `devices` in fixed-size windows. A window whose `send_batch` call errors
/// is counted entirely as failed and produces no per-token logs (§4.6 step 2); batching
/// otherwise continues across the remaining windows regardless of earlier failures.
pub async fn dispatch(
    push: &dyn PushProvider,
    devices: &[Device],
    title: &str,
    body: &str,
    data: &HashMap<String, String>,
    notification_id: Uuid,
) -> AppResult<BatchDispatchResult> {
    let mut total_sent = 0i64;
    let mut total_failed = 0i64;
    let mut logs = Vec::with_capacity(devices.len());
    let mut invalid_tokens = Vec::new();

    for window in devices.chunks(FIREBASE_BATCH_SIZE) {
        let tokens: Vec<String> = window.iter().map(|d| d.fcm_token.clone()).collect();
        match push.send_batch(&tokens, title, body, data).await {
            Err(e) => {
                warn!(target: "nomnom_radar::notification", "push batch of {} failed wholesale: {e}", window.len());
                total_failed += window.len() as i64;
            }
            Ok(outcome) => {
                total_sent += outcome.success as i64;
                total_failed += outcome.failure as i64;
                for device in window {
                    let is_invalid = outcome.invalid_tokens.iter().any(|t| t == &device.fcm_token);
                    let (status, error_message) = if is_invalid {
                        (LogStatus::Failed, "invalid or unregistered token".to_string())
                    } else {
                        (LogStatus::Sent, String::new())
                    };
                    logs.push(NotificationLog {
                        id: Uuid::new_v4(),
                        notification_id,
                        user_id: device.user_id,
                        device_id: device.id,
                        status,
                        fcm_message_id: String::new(),
                        error_message,
                        sent_at: Utc::now(),
                    });
                }
                invalid_tokens.extend(outcome.invalid_tokens);
            }
        }
    }

    Ok(BatchDispatchResult { total_sent, total_failed, logs, invalid_tokens })
}
