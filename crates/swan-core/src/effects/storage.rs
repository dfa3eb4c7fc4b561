//! Storage network effect trait definitions
//!
//! The storage network replicates consent data across nodes and applies
//! merge directives. The engine only hands it complete operations and reads
//! back decrypted results.

use crate::directive::StorageOperation;
use crate::errors::SwanError;
use crate::types::StorageResults;
use async_trait::async_trait;

/// The distributed storage network.
#[async_trait]
pub trait StorageEffects: Send + Sync {
    /// Submit an operation for the request's host and return the URL the
    /// browser must navigate to.
    async fn submit(&self, host: &str, operation: StorageOperation) -> Result<String, SwanError>;

    /// Decrypt and decode the `encrypted` payload produced by a completed
    /// operation.
    async fn decrypt(&self, host: &str, encrypted: &[u8]) -> Result<StorageResults, SwanError>;

    /// Home node the browser is assigned to for `host`
    async fn home_node(&self, host: &str) -> Result<String, SwanError>;

    /// Whether the network can currently accept operations
    async fn is_alive(&self) -> bool;
}
