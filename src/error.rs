//! Error types for the roster.

use crate::types::{SessionId, SignupId};
use thiserror::Error;

/// Errors raised by a record store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Session not found: {0}")]
    SessionNotFound(SessionId),

    #[error("Signup not found: {0}")]
    SignupNotFound(SignupId),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Deserialization error: {0}")]
    Deserialization(String),

    #[error("Corruption detected: {0}")]
    Corruption(String),

    #[error("Checksum mismatch: expected {expected}, got {got}")]
    ChecksumMismatch { expected: u32, got: u32 },

    #[error("Store is locked by another process")]
    Locked,

    #[error("Store not initialized")]
    NotInitialized,

    #[error("Invalid store format: {0}")]
    InvalidFormat(String),
}

impl From<serde_json::Error> for StoreError {
    fn from(e: serde_json::Error) -> Self {
        StoreError::Serialization(e.to_string())
    }
}

impl From<rmp_serde::encode::Error> for StoreError {
    fn from(e: rmp_serde::encode::Error) -> Self {
        StoreError::Serialization(e.to_string())
    }
}

impl From<rmp_serde::decode::Error> for StoreError {
    fn from(e: rmp_serde::decode::Error) -> Self {
        StoreError::Deserialization(e.to_string())
    }
}

/// Errors surfaced by roster operations.
///
/// `Validation` and `Duplicate` are expected outcomes of user input and carry a
/// message fit for display. Store failures pass through untouched.
#[derive(Debug, Error)]
pub enum RosterError {
    #[error("{0}")]
    Validation(String),

    #[error("{name} is already listed for this session.")]
    Duplicate { name: String },

    #[error("Session not found: {0}")]
    SessionNotFound(SessionId),

    #[error("Signup not found: {0}")]
    SignupNotFound(SignupId),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl RosterError {
    /// Whether the caller can fix this by changing its input.
    pub fn is_user_error(&self) -> bool {
        matches!(
            self,
            RosterError::Validation(_) | RosterError::Duplicate { .. }
        )
    }
}

/// Result type for store operations.
pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Result type for roster operations.
pub type Result<T> = std::result::Result<T, RosterError>;
