//! Merge-directive builder
//!
//! Turns the fields a caller submits into storage writes. Previously issued
//! values must verify and are written newest-wins; a missing identifier is
//! minted and written only-if-absent; stop-list entries are appended. Every
//! field is validated before any directive is returned.

use crate::codec;
use crate::context::EngineContext;
use crate::identifier;
use crate::validity::field_validity;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use swan_core::types::parse_stop_entries;
use swan_core::{
    Email, EngineEffects, FieldKey, FieldPayload, Identifier, MergeDirective, MergePolicy,
    Preferences, Result, Salt, Signed, SwanError,
};

/// Fields submitted by a caller for an update. Values are base64 signed
/// records, except `stop` which is a space-separated domain list. An empty
/// string counts as not supplied.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateRequest {
    /// Previously issued identifier
    #[serde(default)]
    pub rid: Option<String>,
    /// Signed preferences
    #[serde(default)]
    pub pref: Option<String>,
    /// Signed email
    #[serde(default)]
    pub email: Option<String>,
    /// Signed salt
    #[serde(default)]
    pub salt: Option<String>,
    /// Domains to add to the stop list
    #[serde(default)]
    pub stop: Option<String>,
}

fn supplied(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

/// Decode, verify and expiry-check one submitted field.
async fn submitted<T, E>(
    effects: &E,
    ctx: &EngineContext,
    text: &str,
    now: DateTime<Utc>,
) -> Result<Signed<T>>
where
    T: FieldPayload,
    E: EngineEffects + ?Sized,
{
    let field = codec::decode_value::<T, _>(effects, ctx.mode, text).await?;
    if field_validity(field.record.timestamp, ctx.retention)?.is_expired_at(now) {
        tracing::warn!(key = %T::KIND.key(), "submitted field past retention");
        return Err(SwanError::expired(format!(
            "'{}' was signed too long ago to be stored",
            T::KIND.key()
        )));
    }
    Ok(field)
}

async fn newest_wins<T, E>(
    effects: &E,
    ctx: &EngineContext,
    text: &str,
    now: DateTime<Utc>,
    effective_date: chrono::NaiveDate,
) -> Result<MergeDirective>
where
    T: FieldPayload,
    E: EngineEffects + ?Sized,
{
    let field = submitted::<T, E>(effects, ctx, text, now).await?;
    Ok(MergeDirective::new(
        T::KIND.key(),
        MergePolicy::UseIfNewer,
        effective_date,
        codec::encode_text(&field)?,
    ))
}

/// Build the directives for `request`, in the order rid, pref, email, salt,
/// stop.
///
/// Fails without returning any directive if a single field is rejected.
pub async fn build_directives<E: EngineEffects + ?Sized>(
    effects: &E,
    ctx: &EngineContext,
    request: &UpdateRequest,
    now: DateTime<Utc>,
) -> Result<Vec<MergeDirective>> {
    let effective_date = swan_core::offset(now, ctx.retention)?.date_naive();
    let mut directives = Vec::with_capacity(5);

    match supplied(&request.rid) {
        Some(text) => {
            directives
                .push(newest_wins::<Identifier, E>(effects, ctx, text, now, effective_date).await?);
        }
        None => {
            let rid = identifier::mint(effects, &ctx.domain, now).await?;
            directives.push(MergeDirective::new(
                FieldKey::Rid,
                MergePolicy::UseIfAbsent,
                effective_date,
                codec::encode_text(&rid)?,
            ));
        }
    }

    if let Some(text) = supplied(&request.pref) {
        directives
            .push(newest_wins::<Preferences, E>(effects, ctx, text, now, effective_date).await?);
    }
    if let Some(text) = supplied(&request.email) {
        directives.push(newest_wins::<Email, E>(effects, ctx, text, now, effective_date).await?);
    }
    if let Some(text) = supplied(&request.salt) {
        directives.push(newest_wins::<Salt, E>(effects, ctx, text, now, effective_date).await?);
    }
    if let Some(text) = supplied(&request.stop) {
        let entries = parse_stop_entries(text)?;
        if !entries.is_empty() {
            directives.push(stop_directive(&entries, effective_date));
        }
    }

    tracing::debug!(count = directives.len(), "built merge directives");
    Ok(directives)
}

/// Append directive adding `entries` to the stop list.
pub fn stop_directive(entries: &[String], effective_date: chrono::NaiveDate) -> MergeDirective {
    MergeDirective::new(
        FieldKey::Stop,
        MergePolicy::Append,
        effective_date,
        entries.join(swan_core::types::LIST_SEPARATOR),
    )
}
