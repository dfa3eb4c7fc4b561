//! Controllable clock for deterministic testing

use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use parking_lot::Mutex;
use std::sync::Arc;
use swan_core::effects::{PhysicalTimeEffects, TimeError};

/// Clock that only moves when a test moves it.
///
/// Clones share the same underlying time, so a storage handler and an
/// engine built from clones always agree on "now".
#[derive(Debug, Clone)]
pub struct ControllableClock {
    now: Arc<Mutex<DateTime<Utc>>>,
}

impl ControllableClock {
    /// Clock frozen at `at`
    pub fn new(at: DateTime<Utc>) -> Self {
        Self {
            now: Arc::new(Mutex::new(at)),
        }
    }

    /// Default starting point of test clocks: 2024-03-01T12:00:00Z
    pub fn default_start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0)
            .single()
            .unwrap_or(DateTime::<Utc>::MIN_UTC)
    }

    /// Current time
    pub fn now(&self) -> DateTime<Utc> {
        *self.now.lock()
    }

    /// Move the clock forward
    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock();
        *now += by;
    }

    /// Set absolute time
    pub fn set(&self, at: DateTime<Utc>) {
        *self.now.lock() = at;
    }
}

impl Default for ControllableClock {
    fn default() -> Self {
        Self::new(Self::default_start())
    }
}

#[async_trait]
impl PhysicalTimeEffects for ControllableClock {
    async fn physical_time(&self) -> Result<DateTime<Utc>, TimeError> {
        Ok(self.now())
    }
}
