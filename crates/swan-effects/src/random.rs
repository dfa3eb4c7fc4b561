//! Random effect handlers
//!
//! This is the effect handler layer where actual system randomness is
//! provided. Engine code asks for randomness through `RandomEffects` only.

use async_trait::async_trait;
use rand::RngCore;
use swan_core::effects::RandomEffects;

/// Real random handler using cryptographically secure randomness
#[derive(Debug, Clone, Copy, Default)]
pub struct RealRandomHandler;

impl RealRandomHandler {
    /// Create a new real random handler
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl RandomEffects for RealRandomHandler {
    async fn random_bytes(&self, len: usize) -> Vec<u8> {
        let mut bytes = vec![0u8; len];
        rand::thread_rng().fill_bytes(&mut bytes);
        bytes
    }
}
