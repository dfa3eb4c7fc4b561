//! Signed-field codec
//!
//! Converts between storage pairs or inbound text and typed signed fields,
//! checking signatures on the way in unless the operator runs in debug mode.
//! The field-key string does not travel past this module: callers get a
//! [`SignedField`] or a typed [`Signed<T>`].

use chrono::{DateTime, Utc};
use swan_core::effects::SignerEffects;
use swan_core::{
    FieldKind, FieldPayload, Result, Signed, SignedField, StoragePair, SwanError,
    VerificationMode, WireError,
};

fn malformed(kind: FieldKind, err: impl std::fmt::Display) -> SwanError {
    SwanError::malformed(kind.key().as_str(), err.to_string())
}

/// Parse the base64 text of a signed record of `kind`.
fn parse(kind: FieldKind, text: &str) -> Result<SignedField> {
    let bytes = swan_core::decode_base64(text).map_err(|e| malformed(kind, e))?;
    SignedField::from_bytes(kind, &bytes).map_err(|e| malformed(kind, e))
}

/// Whether `field` carries a valid signature from a trusted domain.
pub async fn verify_field<S: SignerEffects + ?Sized>(
    signer: &S,
    field: &SignedField,
) -> Result<bool> {
    let record = field.record();
    let message = field.message().map_err(|e| malformed(field.kind(), e))?;
    signer
        .verify(&record.domain, &message, &record.signature)
        .await
}

/// Decode the storage pair holding a field of `kind`.
///
/// A pair with no values is the normal state of a field never set and
/// yields `None`. A value that does not parse, or whose signature does not
/// verify in strict mode, is [`SwanError::MalformedField`].
pub async fn decode_pair<S: SignerEffects + ?Sized>(
    signer: &S,
    mode: VerificationMode,
    kind: FieldKind,
    pair: &StoragePair,
) -> Result<Option<SignedField>> {
    let Some(value) = pair.first_value() else {
        return Ok(None);
    };
    let text = std::str::from_utf8(value).map_err(|e| malformed(kind, e))?;
    let field = parse(kind, text)?;
    if mode.is_strict() && !verify_field(signer, &field).await? {
        tracing::warn!(
            key = %kind.key(),
            domain = %field.record().domain,
            "stored field failed verification"
        );
        return Err(SwanError::malformed(
            kind.key().as_str(),
            "signature could not be verified",
        ));
    }
    tracing::debug!(key = %kind.key(), "decoded stored field");
    Ok(Some(field))
}

/// Decode a value submitted by a caller.
///
/// Parse failures are [`SwanError::MalformedField`]; a signature that does
/// not verify in strict mode is [`SwanError::UnverifiedField`].
pub async fn decode_value<T, S>(signer: &S, mode: VerificationMode, text: &str) -> Result<Signed<T>>
where
    T: FieldPayload,
    S: SignerEffects + ?Sized,
{
    let bytes = swan_core::decode_base64(text).map_err(|e| malformed(T::KIND, e))?;
    let field = Signed::<T>::from_bytes(&bytes).map_err(|e| malformed(T::KIND, e))?;
    if mode.is_strict() {
        let message = field.message().map_err(|e| malformed(T::KIND, e))?;
        let verified = signer
            .verify(&field.record.domain, &message, &field.record.signature)
            .await?;
        if !verified {
            tracing::warn!(
                key = %T::KIND.key(),
                domain = %field.record.domain,
                "submitted field failed verification"
            );
            return Err(SwanError::unverified(T::KIND.key().as_str()));
        }
    }
    Ok(field)
}

/// Sign `payload` as `domain` at `at`.
///
/// The timestamp is truncated to the minute before signing.
pub async fn sign_field<T, S>(
    signer: &S,
    payload: T,
    domain: &str,
    at: DateTime<Utc>,
) -> Result<Signed<T>>
where
    T: FieldPayload,
    S: SignerEffects + ?Sized,
{
    let message = Signed::signing_message(&payload, domain, at).map_err(|e| match e {
        WireError::InvalidDomain(_) => {
            SwanError::invalid(format!("cannot sign as domain '{domain}'"))
        }
        other => SwanError::internal(other.to_string()),
    })?;
    let signature = signer.sign(domain, &message).await?;
    Ok(Signed::from_parts(payload, domain, at, signature))
}

/// Wire bytes of a signed field.
pub fn encode(field: &SignedField) -> Result<Vec<u8>> {
    field
        .to_bytes()
        .map_err(|e| SwanError::serialization(e.to_string()))
}

/// Base64 text of a signed field, as stored and returned to callers.
pub fn encode_text<T: FieldPayload>(field: &Signed<T>) -> Result<String> {
    field
        .to_base64()
        .map_err(|e| SwanError::serialization(e.to_string()))
}
