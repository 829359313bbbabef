//! Error types for codesketch.

use std::time::Duration;
use thiserror::Error;

/// Failure talking to a hosted model endpoint.
#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("Model endpoint returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Model endpoint timed out after {0:?}")]
    Timeout(Duration),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Failed to decode model response: {0}")]
    Decode(String),
}

#[derive(Error, Debug)]
pub enum CodesketchError {
    #[error("Gateway error: {0}")]
    Gateway(#[from] GatewayError),

    #[error("Database error: {0}")]
    DatabaseError(#[from] rusqlite::Error),

    #[error("Interaction store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}
