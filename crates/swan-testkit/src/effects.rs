//! Deterministic effect bundle
//!
//! [`TestEffects`] implements every effect trait the operator needs by
//! delegating to a deterministic handler, so it satisfies
//! `swan_core::OperatorEffects` through the blanket impl.

use crate::fixtures::{TEST_ACCESS_KEY, TEST_DOMAIN};
use crate::time::ControllableClock;
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use ed25519_dalek::SigningKey;
use parking_lot::Mutex;
use rand::RngCore;
use rand_chacha::ChaCha20Rng;
use rand_core::SeedableRng;
use std::sync::Arc;
use swan_core::effects::{
    AccessEffects, PhysicalTimeEffects, RandomEffects, SignerEffects, StorageEffects, TimeError,
};
use swan_core::{StorageOperation, StorageResults, SwanError};
use swan_effects::{Ed25519SignerHandler, MemoryStorageHandler, StaticAccessHandler};

/// Seeded ChaCha random source
#[derive(Debug, Clone)]
pub struct SeededRandom {
    rng: Arc<Mutex<ChaCha20Rng>>,
}

impl SeededRandom {
    /// Random source reproducible from `seed`
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Arc::new(Mutex::new(ChaCha20Rng::seed_from_u64(seed))),
        }
    }

    /// 32 bytes drawn synchronously, for key material
    pub fn seed_bytes(&self) -> [u8; 32] {
        let mut out = [0u8; 32];
        self.rng.lock().fill_bytes(&mut out);
        out
    }
}

#[async_trait]
impl RandomEffects for SeededRandom {
    async fn random_bytes(&self, len: usize) -> Vec<u8> {
        let mut bytes = vec![0u8; len];
        self.rng.lock().fill_bytes(&mut bytes);
        bytes
    }
}

/// Every operator effect, deterministic.
#[derive(Debug, Clone)]
pub struct TestEffects {
    /// Shared clock; the storage handler reads the same time
    pub clock: ControllableClock,
    /// Seeded randomness
    pub random: SeededRandom,
    /// Signer holding a seeded key for [`TEST_DOMAIN`]
    pub signer: Ed25519SignerHandler,
    /// Storage network
    pub storage: MemoryStorageHandler<ControllableClock>,
    /// Access list containing [`TEST_ACCESS_KEY`]
    pub access: StaticAccessHandler,
}

impl TestEffects {
    /// Bundle reproducible from `seed`
    pub fn new(seed: u64) -> Self {
        let clock = ControllableClock::default();
        let random = SeededRandom::new(seed);
        let signer = Ed25519SignerHandler::new()
            .with_signer(TEST_DOMAIN, SigningKey::from_bytes(&random.seed_bytes()));
        Self {
            storage: MemoryStorageHandler::new(clock.clone()),
            clock,
            random,
            signer,
            access: StaticAccessHandler::new([TEST_ACCESS_KEY]),
        }
    }

    /// Register another signing domain with a key drawn from the seeded source
    pub fn add_signer(&self, domain: &str) -> SigningKey {
        let key = SigningKey::from_bytes(&self.random.seed_bytes());
        self.signer.register_signer(domain, key.clone());
        key
    }

    /// Current test time
    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Move the test clock forward
    pub fn advance(&self, by: Duration) {
        self.clock.advance(by);
    }
}

impl Default for TestEffects {
    fn default() -> Self {
        Self::new(42)
    }
}

#[async_trait]
impl SignerEffects for TestEffects {
    async fn sign(&self, domain: &str, message: &[u8]) -> Result<Vec<u8>, SwanError> {
        self.signer.sign(domain, message).await
    }

    async fn verify(
        &self,
        domain: &str,
        message: &[u8],
        signature: &[u8],
    ) -> Result<bool, SwanError> {
        self.signer.verify(domain, message, signature).await
    }

    fn has_signer(&self, domain: &str) -> bool {
        self.signer.has_signer(domain)
    }
}

#[async_trait]
impl PhysicalTimeEffects for TestEffects {
    async fn physical_time(&self) -> Result<DateTime<Utc>, TimeError> {
        self.clock.physical_time().await
    }
}

#[async_trait]
impl RandomEffects for TestEffects {
    async fn random_bytes(&self, len: usize) -> Vec<u8> {
        self.random.random_bytes(len).await
    }
}

#[async_trait]
impl StorageEffects for TestEffects {
    async fn submit(&self, host: &str, operation: StorageOperation) -> Result<String, SwanError> {
        self.storage.submit(host, operation).await
    }

    async fn decrypt(&self, host: &str, encrypted: &[u8]) -> Result<StorageResults, SwanError> {
        self.storage.decrypt(host, encrypted).await
    }

    async fn home_node(&self, host: &str) -> Result<String, SwanError> {
        self.storage.home_node(host).await
    }

    async fn is_alive(&self) -> bool {
        self.storage.is_alive().await
    }
}

#[async_trait]
impl AccessEffects for TestEffects {
    async fn is_allowed(&self, access_key: &str) -> Result<bool, SwanError> {
        self.access.is_allowed(access_key).await
    }
}
