//! Error taxonomy for the hybrid pipeline

use crate::types::Token;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Failures the coordinator can observe. None of these are fatal; each one
/// ends in an emission on the response stream.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum HybridError {
    #[error("malformed request: {0}")]
    MalformedRequest(String),

    #[error("{backend} backend unavailable: {message}")]
    BackendUnavailable { backend: String, message: String },

    #[error("remote call {token} timed out after {}ms", .after.as_millis())]
    RemoteTimeout { token: Token, after: Duration },

    #[error("aggregation fault: {0}")]
    AggregationFault(String),

    #[error("token {0} already resolved")]
    DuplicateResolution(Token),
}

impl HybridError {
    /// Stable identifier carried as `error_kind` on error emissions
    pub fn code(&self) -> &'static str {
        match self {
            HybridError::MalformedRequest(_) => "malformed_request",
            HybridError::BackendUnavailable { .. } => "backend_unavailable",
            HybridError::RemoteTimeout { .. } => "remote_timeout",
            HybridError::AggregationFault(_) => "aggregation_fault",
            HybridError::DuplicateResolution(_) => "duplicate_resolution",
        }
    }
}

/// Why a backend could not produce a result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendErrorKind {
    Unavailable,
    Timeout,
    Failed,
    InvalidInput,
}

/// Error reported by a backend collaborator
#[derive(Debug, Clone, Error, PartialEq, Serialize, Deserialize)]
#[error("{kind:?}: {message}")]
pub struct BackendError {
    pub kind: BackendErrorKind,
    pub message: String,
}

impl BackendError {
    pub fn new(kind: BackendErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::new(BackendErrorKind::Unavailable, message)
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(BackendErrorKind::Timeout, message)
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self::new(BackendErrorKind::Failed, message)
    }
}

impl From<HybridError> for BackendError {
    fn from(err: HybridError) -> Self {
        let kind = match &err {
            HybridError::RemoteTimeout { .. } => BackendErrorKind::Timeout,
            HybridError::BackendUnavailable { .. } => BackendErrorKind::Unavailable,
            HybridError::MalformedRequest(_) => BackendErrorKind::InvalidInput,
            _ => BackendErrorKind::Failed,
        };
        BackendError::new(kind, err.to_string())
    }
}

/// Registry lookups for tokens that were never registered or are already gone
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("token {0} not found")]
    NotFound(Token),

    #[error("token {0} is already registered")]
    DuplicateToken(Token),
}
