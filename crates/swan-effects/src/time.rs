//! Real time effect handler for production use

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use swan_core::effects::{PhysicalTimeEffects, TimeError};

/// System clock handler
#[derive(Debug, Clone, Copy, Default)]
pub struct RealTimeHandler;

impl RealTimeHandler {
    /// Create a new real time handler
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl PhysicalTimeEffects for RealTimeHandler {
    async fn physical_time(&self) -> Result<DateTime<Utc>, TimeError> {
        Ok(Utc::now())
    }
}
