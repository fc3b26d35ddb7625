//! Notification publication pipeline: data model (§3), collaborator contracts (§6.2),
//! the delivery batcher (C6), and the orchestrator (C5) that ties them together.

pub mod batcher;
pub mod collaborators;
pub mod models;
pub mod orchestrator;
pub mod testing;

pub use collaborators::{AddressStore, DeviceStore, NotificationStore, PushBatchOutcome, PushProvider, SubscriptionStore};
pub use models::{
    Address, Device, LogStatus, MerchantLocationNotification, NotificationLog, OwnerType, Platform, Subscription, SubscriberAddress,
};
pub use orchestrator::{LocationInput, NotificationOrchestrator};
