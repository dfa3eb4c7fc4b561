//! Secondary-identifier deriver
//!
//! The secondary identifier is the SHA-256 of a domain-separated,
//! length-prefixed concatenation of the canonical email and the salt. Two
//! operators given the same email and salt compute the same digest, so they
//! can match users without exchanging raw addresses.

use crate::codec;
use chrono::{DateTime, Utc};
use swan_core::effects::SignerEffects;
use swan_core::hash::{hash_parts, SECONDARY_ID_CONTEXT};
use swan_core::{Email, Result, Salt, SecondaryId, Signed, SwanError};

/// Digest of `email` and `salt`. Pure and deterministic.
pub fn digest(email: &Email, salt: &Salt) -> SecondaryId {
    let canonical = email.canonical();
    SecondaryId {
        digest: hash_parts(&[
            SECONDARY_ID_CONTEXT,
            canonical.as_bytes(),
            salt.value.as_bytes(),
        ]),
    }
}

/// Derive and sign the secondary identifier as `domain` at `at`.
///
/// Fails with [`SwanError::SignerUnavailable`] when `domain` has no signer.
pub async fn derive<S: SignerEffects + ?Sized>(
    signer: &S,
    domain: &str,
    email: &Email,
    salt: &Salt,
    at: DateTime<Utc>,
) -> Result<Signed<SecondaryId>> {
    if email.address.trim().is_empty() {
        return Err(SwanError::invalid("email is empty"));
    }
    if salt.value.is_empty() {
        return Err(SwanError::invalid("salt is empty"));
    }
    if !signer.has_signer(domain) {
        tracing::error!(domain, "no signer registered for secondary identifier");
        return Err(SwanError::signer_unavailable(domain));
    }
    let sid = codec::sign_field(signer, digest(email, salt), domain, at).await?;
    tracing::debug!(domain, sid = %sid.payload, "derived secondary identifier");
    Ok(sid)
}
