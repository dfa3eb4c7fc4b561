//! Access-control effect trait definitions

use crate::errors::SwanError;
use async_trait::async_trait;

/// Authorises callers of the operator.
#[async_trait]
pub trait AccessEffects: Send + Sync {
    /// Whether `access_key` grants access
    async fn is_allowed(&self, access_key: &str) -> Result<bool, SwanError>;
}
