//! Constants and builders for signed fields and storage pairs

use chrono::{DateTime, Duration, Utc};
use swan_core::effects::{RandomEffects, SignerEffects};
use swan_core::{
    Email, FieldPayload, Identifier, Preferences, Salt, Signed, StoragePair, SwanError,
};

/// Domain the seeded test signer signs for
pub const TEST_DOMAIN: &str = "not.a.valid.domain";

/// Email used across scenarios
pub const TEST_EMAIL: &str = "test@not.a.valid.domain";

/// Salt used across scenarios
pub const TEST_SALT: &str = "1234";

/// Access key accepted by the test access list
pub const TEST_ACCESS_KEY: &str = "A";

/// Return URL used by operator scenarios
pub const TEST_RETURN_URL: &str = "https://publisher.example/landing";

/// Retention used when building pairs: the operator default of 90 days
pub fn retention() -> Duration {
    Duration::days(90)
}

/// Sign `payload` as `domain` at `at`.
pub async fn sign<T: FieldPayload>(
    signer: &impl SignerEffects,
    payload: T,
    domain: &str,
    at: DateTime<Utc>,
) -> Result<Signed<T>, SwanError> {
    let message = Signed::signing_message(&payload, domain, at)
        .map_err(|e| SwanError::internal(e.to_string()))?;
    let signature = signer.sign(domain, &message).await?;
    Ok(Signed::from_parts(payload, domain, at, signature))
}

/// A freshly signed browser identifier.
pub async fn signed_identifier<E>(
    effects: &E,
    at: DateTime<Utc>,
) -> Result<Signed<Identifier>, SwanError>
where
    E: SignerEffects + RandomEffects,
{
    let id = Identifier::browser(effects.random_uuid().await);
    sign(effects, id, TEST_DOMAIN, at).await
}

/// Signed preferences.
pub async fn signed_preferences(
    signer: &impl SignerEffects,
    personalize: bool,
    at: DateTime<Utc>,
) -> Result<Signed<Preferences>, SwanError> {
    let pref = Preferences {
        use_browsing_for_personalization: personalize,
    };
    sign(signer, pref, TEST_DOMAIN, at).await
}

/// Signed email.
pub async fn signed_email(
    signer: &impl SignerEffects,
    address: &str,
    at: DateTime<Utc>,
) -> Result<Signed<Email>, SwanError> {
    let email = Email::new(address).map_err(|e| SwanError::invalid(e.to_string()))?;
    sign(signer, email, TEST_DOMAIN, at).await
}

/// Signed salt.
pub async fn signed_salt(
    signer: &impl SignerEffects,
    value: &str,
    at: DateTime<Utc>,
) -> Result<Signed<Salt>, SwanError> {
    let salt = Salt::new(value).map_err(|e| SwanError::invalid(e.to_string()))?;
    sign(signer, salt, TEST_DOMAIN, at).await
}

/// Storage pair holding `field` the way the storage network keeps it.
///
/// The value is the base64 text of the record; created and expires follow
/// the record timestamp and [`retention`].
pub fn pair_for<T: FieldPayload>(field: &Signed<T>) -> StoragePair {
    let text = field.to_base64().unwrap_or_default();
    StoragePair::new(
        T::KIND.key().as_str(),
        field.record.timestamp,
        field.record.timestamp + retention(),
        vec![text.into_bytes()],
    )
}

/// Storage pair for `key` holding no value.
pub fn empty_pair(key: &str, at: DateTime<Utc>) -> StoragePair {
    StoragePair::new(key, at, at + Duration::minutes(5), vec![])
}

/// Stop-list pair with one value per domain.
pub fn stop_pair(domains: &[&str], at: DateTime<Utc>) -> StoragePair {
    StoragePair::new(
        "stop",
        at,
        at + retention(),
        domains.iter().map(|d| d.as_bytes().to_vec()).collect(),
    )
}
