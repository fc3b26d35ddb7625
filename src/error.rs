//! Unified application error model and mapping helpers.
//! This module provides a common error enum used across the routing engine and the
//! notification orchestrator, along with a mapper to an (external) HTTP boundary.

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AppError {
    InvalidInput { code: String, message: String },
    NotFound { code: String, message: String },
    Unauthorized { code: String, message: String },
    EngineNotReady { code: String, message: String },
    SnapDistanceExceeded { code: String, message: String },
    RoutingFailed { code: String, message: String },
    ProviderError { code: String, message: String },
    Storage { code: String, message: String },
    Canceled { code: String, message: String },
    Internal { code: String, message: String },
}

impl AppError {
    pub fn code_str(&self) -> &str {
        match self {
            AppError::InvalidInput { code, .. }
            | AppError::NotFound { code, .. }
            | AppError::Unauthorized { code, .. }
            | AppError::EngineNotReady { code, .. }
            | AppError::SnapDistanceExceeded { code, .. }
            | AppError::RoutingFailed { code, .. }
            | AppError::ProviderError { code, .. }
            | AppError::Storage { code, .. }
            | AppError::Canceled { code, .. }
            | AppError::Internal { code, .. } => code.as_str(),
        }
    }

    pub fn message(&self) -> &str {
        match self {
            AppError::InvalidInput { message, .. }
            | AppError::NotFound { message, .. }
            | AppError::Unauthorized { message, .. }
            | AppError::EngineNotReady { message, .. }
            | AppError::SnapDistanceExceeded { message, .. }
            | AppError::RoutingFailed { message, .. }
            | AppError::ProviderError { message, .. }
            | AppError::Storage { message, .. }
            | AppError::Canceled { message, .. }
            | AppError::Internal { message, .. } => message.as_str(),
        }
    }

    pub fn invalid_input<S: Into<String>>(code: S, msg: S) -> Self {
        AppError::InvalidInput { code: code.into(), message: msg.into() }
    }
    pub fn not_found<S: Into<String>>(code: S, msg: S) -> Self {
        AppError::NotFound { code: code.into(), message: msg.into() }
    }
    pub fn unauthorized<S: Into<String>>(code: S, msg: S) -> Self {
        AppError::Unauthorized { code: code.into(), message: msg.into() }
    }
    pub fn engine_not_ready<S: Into<String>>(msg: S) -> Self {
        AppError::EngineNotReady { code: "ENGINE_NOT_READY".into(), message: msg.into() }
    }
    pub fn snap_distance_exceeded<S: Into<String>>(msg: S) -> Self {
        AppError::SnapDistanceExceeded { code: "SNAP_DISTANCE_EXCEEDED".into(), message: msg.into() }
    }
    pub fn routing_failed<S: Into<String>>(msg: S) -> Self {
        AppError::RoutingFailed { code: "ROUTING_FAILED".into(), message: msg.into() }
    }
    pub fn provider_error<S: Into<String>>(msg: S) -> Self {
        AppError::ProviderError { code: "PROVIDER_ERROR".into(), message: msg.into() }
    }
    pub fn storage<S: Into<String>>(msg: S) -> Self {
        AppError::Storage { code: "STORAGE_ERROR".into(), message: msg.into() }
    }
    pub fn canceled<S: Into<String>>(msg: S) -> Self {
        AppError::Canceled { code: "CANCELED".into(), message: msg.into() }
    }
    pub fn internal<S: Into<String>>(msg: S) -> Self {
        AppError::Internal { code: "INTERNAL".into(), message: msg.into() }
    }

    /// Map to an HTTP status code for the (external, unimplemented) HTTP boundary.
    pub fn http_status(&self) -> u16 {
        match self {
            AppError::InvalidInput { .. } => 400,
            AppError::NotFound { .. } => 404,
            AppError::Unauthorized { .. } => 401,
            AppError::EngineNotReady { .. } => 503,
            AppError::SnapDistanceExceeded { .. } => 422,
            AppError::RoutingFailed { .. } => 502,
            AppError::ProviderError { .. } => 502,
            AppError::Storage { .. } => 500,
            AppError::Canceled { .. } => 499,
            AppError::Internal { .. } => 500,
        }
    }

    /// True for kinds whose detail must never cross the HTTP boundary verbatim.
    pub fn is_internal_detail(&self) -> bool {
        matches!(self, AppError::Internal { .. } | AppError::Storage { .. })
    }
}

impl Display for AppError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code_str(), self.message())
    }
}

impl std::error::Error for AppError {}

pub type AppResult<T> = Result<T, AppError>;

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::Internal { code: "INTERNAL".into(), message: err.to_string() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn http_status_mapping() {
        assert_eq!(AppError::invalid_input("bad_input", "oops").http_status(), 400);
        assert_eq!(AppError::not_found("not_found", "missing").http_status(), 404);
        assert_eq!(AppError::unauthorized("unauthorized", "no").http_status(), 401);
        assert_eq!(AppError::engine_not_ready("loading").http_status(), 503);
        assert_eq!(AppError::snap_distance_exceeded("too far").http_status(), 422);
        assert_eq!(AppError::routing_failed("boom").http_status(), 502);
        assert_eq!(AppError::provider_error("fcm down").http_status(), 502);
        assert_eq!(AppError::storage("db down").http_status(), 500);
        assert_eq!(AppError::canceled("ctx done").http_status(), 499);
        assert_eq!(AppError::internal("panic").http_status(), 500);
    }

    #[test]
    fn internal_detail_flagging() {
        assert!(AppError::internal("x").is_internal_detail());
        assert!(AppError::storage("x").is_internal_detail());
        assert!(!AppError::not_found("nf", "x").is_internal_detail());
    }
}
