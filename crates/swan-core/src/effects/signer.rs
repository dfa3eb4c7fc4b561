//! Signer effect trait definitions
//!
//! The signer creates and checks the signatures embedded in signed records.
//! Keys are registered per internet domain: an operator signs with the key
//! of the domain the request arrived on, and verifies records created by any
//! domain it trusts.

use crate::errors::SwanError;
use async_trait::async_trait;

/// Signing and verification keyed by domain.
#[async_trait]
pub trait SignerEffects: Send + Sync {
    /// Sign `message` with the key registered for `domain`.
    ///
    /// Fails with [`SwanError::SignerUnavailable`] when no key is registered.
    async fn sign(&self, domain: &str, message: &[u8]) -> Result<Vec<u8>, SwanError>;

    /// Verify `signature` over `message` as created by `domain`.
    ///
    /// Returns `Ok(false)` for a domain that is not known and trusted.
    async fn verify(
        &self,
        domain: &str,
        message: &[u8],
        signature: &[u8],
    ) -> Result<bool, SwanError>;

    /// Whether a signing key is registered for `domain`
    fn has_signer(&self, domain: &str) -> bool;
}
