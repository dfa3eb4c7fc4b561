//! In-memory storage network
//!
//! Models the replicated store of a single browser. Values are kept exactly
//! as submitted: signed fields as the base64 text of the directive, stop
//! lists as one UTF-8 entry per value. Merge policies are applied on submit
//! and the requested keys are read back into the results attached to the
//! returned URL.
//!
//! Newest-wins compares the signing times in the record headers; a value
//! that is not a signed record is simply replaced.

use async_trait::async_trait;
use chrono::{DateTime, Duration, NaiveTime, Utc};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use swan_core::config::DEFAULT_RESULTS_TTL_SECONDS;
use swan_core::effects::{PhysicalTimeEffects, StorageEffects};
use swan_core::types::LIST_SEPARATOR;
use swan_core::{
    header_timestamp, MergeDirective, MergePolicy, StorageOperation, StoragePair, StorageResults,
    SwanError,
};
use tokio::sync::RwLock;
use url::Url;

use crate::time::RealTimeHandler;

/// Query parameter carrying encoded results on the return URL
pub const ENCRYPTED_PARAMETER: &str = "encrypted";

#[derive(Debug, Clone)]
struct StoredValue {
    created: DateTime<Utc>,
    expires: DateTime<Utc>,
    values: Vec<Vec<u8>>,
}

/// In-memory storage handler
#[derive(Debug, Clone)]
pub struct MemoryStorageHandler<T = RealTimeHandler> {
    clock: T,
    results_ttl: Duration,
    data: Arc<RwLock<HashMap<String, StoredValue>>>,
    alive: Arc<AtomicBool>,
}

impl Default for MemoryStorageHandler<RealTimeHandler> {
    fn default() -> Self {
        Self::new(RealTimeHandler::new())
    }
}

impl<T: PhysicalTimeEffects> MemoryStorageHandler<T> {
    /// Create an empty store reading time from `clock`
    pub fn new(clock: T) -> Self {
        Self {
            clock,
            results_ttl: Duration::seconds(DEFAULT_RESULTS_TTL_SECONDS as i64),
            data: Arc::new(RwLock::new(HashMap::new())),
            alive: Arc::new(AtomicBool::new(true)),
        }
    }

    /// Set how long returned results remain usable
    pub fn with_results_ttl(mut self, ttl: Duration) -> Self {
        self.results_ttl = ttl;
        self
    }

    /// Mark the network as reachable or not
    pub fn set_alive(&self, alive: bool) {
        self.alive.store(alive, Ordering::SeqCst);
    }

    /// Current values stored under `key`, ignoring expiry
    pub async fn values(&self, key: &str) -> Vec<Vec<u8>> {
        let data = self.data.read().await;
        data.get(key).map(|v| v.values.clone()).unwrap_or_default()
    }

    /// Place a value directly, bypassing merge policies
    pub async fn insert_raw(&self, pair: StoragePair) {
        let mut data = self.data.write().await;
        data.insert(
            pair.key,
            StoredValue {
                created: pair.created,
                expires: pair.expires,
                values: pair.values,
            },
        );
    }

    async fn now(&self) -> Result<DateTime<Utc>, SwanError> {
        Ok(self.clock.physical_time().await?)
    }
}

fn purge_time(directive: &MergeDirective) -> DateTime<Utc> {
    directive.effective_date.and_time(NaiveTime::MIN).and_utc()
}

/// Signing time of a stored signed-field value, if it is one.
fn signed_at(value: &[u8]) -> Option<DateTime<Utc>> {
    let text = std::str::from_utf8(value).ok()?;
    let bytes = swan_core::decode_base64(text).ok()?;
    header_timestamp(&bytes).ok()
}

fn apply(
    data: &mut HashMap<String, StoredValue>,
    directive: &MergeDirective,
    now: DateTime<Utc>,
) {
    let key = directive.key.as_str().to_string();
    let live = data
        .get(&key)
        .filter(|v| v.expires > now && !v.values.is_empty())
        .cloned();
    let expires = purge_time(directive);

    let values = match directive.policy {
        MergePolicy::UseIfAbsent => {
            if live.is_some() {
                tracing::debug!(key = %key, "value present, keeping existing");
                return;
            }
            vec![directive.value.as_bytes().to_vec()]
        }
        MergePolicy::UseIfNewer => {
            let stored_at = live
                .as_ref()
                .and_then(|v| v.values.first())
                .and_then(|v| signed_at(v));
            if let (Some(stored), Some(incoming)) =
                (stored_at, signed_at(directive.value.as_bytes()))
            {
                if incoming < stored {
                    tracing::debug!(key = %key, "stored value signed later, keeping it");
                    return;
                }
            }
            vec![directive.value.as_bytes().to_vec()]
        }
        MergePolicy::Append => {
            let mut values = live.map(|v| v.values).unwrap_or_default();
            for entry in directive.value.split(LIST_SEPARATOR).filter(|e| !e.is_empty()) {
                if !values.iter().any(|v| v.as_slice() == entry.as_bytes()) {
                    values.push(entry.as_bytes().to_vec());
                }
            }
            values
        }
    };

    data.insert(
        key,
        StoredValue {
            created: now,
            expires,
            values,
        },
    );
}

fn append_query(return_url: &str, encoded: &str) -> Result<String, SwanError> {
    let mut url = Url::parse(return_url)
        .map_err(|e| SwanError::invalid(format!("returnUrl '{return_url}' not usable: {e}")))?;
    url.query_pairs_mut().append_pair(ENCRYPTED_PARAMETER, encoded);
    Ok(url.into())
}

#[async_trait]
impl<T: PhysicalTimeEffects> StorageEffects for MemoryStorageHandler<T> {
    async fn submit(&self, host: &str, operation: StorageOperation) -> Result<String, SwanError> {
        if !self.alive.load(Ordering::SeqCst) {
            return Err(SwanError::storage("storage network unreachable"));
        }
        let now = self.now().await?;
        let expires = swan_core::offset(now, self.results_ttl)?;

        let pairs = {
            let mut data = self.data.write().await;
            for directive in &operation.writes {
                apply(&mut data, directive, now);
            }
            operation
                .reads
                .iter()
                .map(|key| match data.get(key.as_str()).filter(|v| v.expires > now) {
                    Some(stored) => StoragePair::new(
                        key.as_str(),
                        stored.created,
                        stored.expires,
                        stored.values.clone(),
                    ),
                    None => StoragePair::new(key.as_str(), now, expires, vec![]),
                })
                .collect::<Vec<_>>()
        };

        tracing::debug!(
            host,
            writes = operation.writes.len(),
            reads = pairs.len(),
            "storage operation applied"
        );

        let results = StorageResults {
            pairs,
            state: operation.state,
            expires,
        };
        let json = serde_json::to_vec(&results)
            .map_err(|e| SwanError::storage(format!("encode results: {e}")))?;
        append_query(&operation.return_url, &swan_core::encode_base64(&json))
    }

    async fn decrypt(&self, _host: &str, encrypted: &[u8]) -> Result<StorageResults, SwanError> {
        serde_json::from_slice(encrypted)
            .map_err(|e| SwanError::storage(format!("results could not be decoded: {e}")))
    }

    async fn home_node(&self, host: &str) -> Result<String, SwanError> {
        if !self.alive.load(Ordering::SeqCst) {
            return Err(SwanError::storage("storage network unreachable"));
        }
        Ok(format!("node.{host}"))
    }

    async fn is_alive(&self) -> bool {
        self.alive.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_append_query() {
        assert_eq!(
            append_query("https://pub.example/page", "abc").unwrap(),
            "https://pub.example/page?encrypted=abc"
        );
        assert_eq!(
            append_query("https://pub.example/page?x=1", "abc").unwrap(),
            "https://pub.example/page?x=1&encrypted=abc"
        );
        assert_eq!(
            append_query("https://pub.example/page#top", "a-b_c").unwrap(),
            "https://pub.example/page?encrypted=a-b_c#top"
        );
        assert!(matches!(
            append_query("not a url", "abc"),
            Err(SwanError::Invalid { .. })
        ));
    }
}
