//! Traits describing provider capabilities and shared error types.

use async_trait::async_trait;
use reqwest::Error as ReqwestError;
use serde_json::Error as JsonError;

use crate::model::{CouncilMeta, PropertyRef, RawServiceRecord};
use crate::normalize::NormalizeError;

#[derive(thiserror::Error, Debug)]
/// Errors that can occur while talking to council backends.
pub enum PortError {
    /// Network layer failed.
    #[error("Network error: {0}")]
    Network(#[from] ReqwestError),
    /// The response body could not be decoded.
    #[error("Decode error for {context}: {source}")]
    Decode {
        /// What was being decoded.
        context: String,
        /// Underlying JSON error.
        #[source]
        source: JsonError,
    },
    /// The council API answered with a non-success status.
    #[error("Unexpected HTTP status {status} from {url}")]
    UnexpectedStatus {
        /// HTTP status code.
        status: u16,
        /// Requested URL.
        url: String,
    },
    /// The council has no registered plugin.
    #[error("Unsupported council")]
    UnsupportedCouncil,
    /// Property reference is invalid for the provider.
    #[error("Invalid property reference: {0}")]
    InvalidPropertyRef(String),
    /// The fetched services could not be normalized.
    #[error(transparent)]
    Normalize(#[from] NormalizeError),
}

#[async_trait]
/// Trait for council-specific collection schedule backends.
pub trait SchedulePort: Send + Sync {
    /// Metadata describing the council handled by this port.
    fn council(&self) -> &CouncilMeta;

    /// Fetch the raw service records for a property.
    ///
    /// # Errors
    ///
    /// Returns a [`PortError`] when the request fails, the council rejects the
    /// property, or the response cannot be decoded.
    async fn services(&self, property: &PropertyRef) -> Result<Vec<RawServiceRecord>, PortError>;
}
