//! Physical time effect trait definitions

use crate::errors::SwanError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Error type for time operations.
#[derive(Debug, Clone, thiserror::Error, Serialize, Deserialize)]
pub enum TimeError {
    /// The clock could not be read
    #[error("Time service unavailable")]
    ServiceUnavailable,
    /// Any other clock failure
    #[error("Operation failed: {reason}")]
    OperationFailed {
        /// Failure detail
        reason: String,
    },
}

impl From<TimeError> for SwanError {
    fn from(err: TimeError) -> Self {
        SwanError::internal(err.to_string())
    }
}

/// Wall-clock time for timestamps and expiry.
#[async_trait]
pub trait PhysicalTimeEffects: Send + Sync {
    /// Current UTC time
    async fn physical_time(&self) -> Result<DateTime<Utc>, TimeError>;
}
