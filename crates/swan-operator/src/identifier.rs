//! Identifier minting

use crate::codec;
use chrono::{DateTime, Utc};
use swan_core::{EngineEffects, Identifier, Result, Signed};

/// Mint a fresh browser identifier signed as `domain` at `at`.
pub async fn mint<E: EngineEffects + ?Sized>(
    effects: &E,
    domain: &str,
    at: DateTime<Utc>,
) -> Result<Signed<Identifier>> {
    let id = Identifier::browser(effects.random_uuid().await);
    let rid = codec::sign_field(effects, id, domain, at).await?;
    tracing::debug!(domain, "minted identifier");
    Ok(rid)
}
