//! Ed25519 signer handler
//!
//! Keys are registered per domain. A domain with a signing key is
//! implicitly trusted for verification; further domains can be trusted by
//! their verifying key alone.

use async_trait::async_trait;
use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use swan_core::effects::SignerEffects;
use swan_core::SwanError;

#[derive(Default)]
struct KeyRegistry {
    signing: HashMap<String, SigningKey>,
    trusted: HashMap<String, VerifyingKey>,
}

/// Ed25519 signer keyed by domain
#[derive(Clone, Default)]
pub struct Ed25519SignerHandler {
    keys: Arc<RwLock<KeyRegistry>>,
}

impl std::fmt::Debug for Ed25519SignerHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let keys = self.keys.read();
        f.debug_struct("Ed25519SignerHandler")
            .field("signing_domains", &keys.signing.keys().collect::<Vec<_>>())
            .field("trusted_domains", &keys.trusted.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl Ed25519SignerHandler {
    /// Handler with no keys
    pub fn new() -> Self {
        Self::default()
    }

    /// Handler signing for `domain` with a key derived from `seed`
    pub fn from_seed(domain: impl Into<String>, seed: [u8; 32]) -> Self {
        Self::new().with_signer(domain, SigningKey::from_bytes(&seed))
    }

    /// Builder form of [`Ed25519SignerHandler::register_signer`]
    pub fn with_signer(self, domain: impl Into<String>, key: SigningKey) -> Self {
        self.register_signer(domain, key);
        self
    }

    /// Register the signing key for `domain` and trust its verifying key.
    pub fn register_signer(&self, domain: impl Into<String>, key: SigningKey) {
        let domain = domain.into();
        let mut keys = self.keys.write();
        keys.trusted.insert(domain.clone(), key.verifying_key());
        keys.signing.insert(domain, key);
    }

    /// Trust records created by `domain` under `key`.
    pub fn trust(&self, domain: impl Into<String>, key: VerifyingKey) {
        self.keys.write().trusted.insert(domain.into(), key);
    }

    /// Verifying key trusted for `domain`
    pub fn verifying_key(&self, domain: &str) -> Option<VerifyingKey> {
        self.keys.read().trusted.get(domain).copied()
    }
}

#[async_trait]
impl SignerEffects for Ed25519SignerHandler {
    async fn sign(&self, domain: &str, message: &[u8]) -> Result<Vec<u8>, SwanError> {
        let keys = self.keys.read();
        let key = keys
            .signing
            .get(domain)
            .ok_or_else(|| SwanError::signer_unavailable(domain))?;
        Ok(key.sign(message).to_bytes().to_vec())
    }

    async fn verify(
        &self,
        domain: &str,
        message: &[u8],
        signature: &[u8],
    ) -> Result<bool, SwanError> {
        let Some(key) = self.verifying_key(domain) else {
            tracing::debug!(domain, "no trusted key for domain");
            return Ok(false);
        };
        let Ok(signature) = Signature::from_slice(signature) else {
            return Ok(false);
        };
        Ok(key.verify(message, &signature).is_ok())
    }

    fn has_signer(&self, domain: &str) -> bool {
        self.keys.read().signing.contains_key(domain)
    }
}
