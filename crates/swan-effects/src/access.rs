//! Access-key handler

use async_trait::async_trait;
use std::collections::HashSet;
use swan_core::effects::AccessEffects;
use swan_core::SwanError;

/// Grants access to a fixed set of keys.
#[derive(Debug, Clone, Default)]
pub struct StaticAccessHandler {
    keys: HashSet<String>,
}

impl StaticAccessHandler {
    /// Handler accepting exactly `keys`
    pub fn new<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            keys: keys.into_iter().map(Into::into).collect(),
        }
    }

    /// Add another accepted key
    pub fn allow(&mut self, key: impl Into<String>) {
        self.keys.insert(key.into());
    }
}

#[async_trait]
impl AccessEffects for StaticAccessHandler {
    async fn is_allowed(&self, access_key: &str) -> Result<bool, SwanError> {
        // An empty key never matches, even if one was registered by mistake.
        Ok(!access_key.is_empty() && self.keys.contains(access_key))
    }
}
