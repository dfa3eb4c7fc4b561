//! Randomness effect trait definitions

use async_trait::async_trait;
use uuid::Uuid;

/// Source of randomness for minting identifiers.
#[async_trait]
pub trait RandomEffects: Send + Sync {
    /// `len` random bytes
    async fn random_bytes(&self, len: usize) -> Vec<u8>;

    /// A random (version 4) UUID
    async fn random_uuid(&self) -> Uuid {
        let bytes = self.random_bytes(16).await;
        let mut raw = [0u8; 16];
        for (dst, src) in raw.iter_mut().zip(bytes) {
            *dst = src;
        }
        uuid::Builder::from_random_bytes(raw).into_uuid()
    }
}
