//! Response assembler
//!
//! Decodes the storage pairs of a completed operation into a consent record:
//!
//! 1. decode every pair by key, discarding keys the engine does not know
//! 2. drop signed fields past their retention
//! 3. mint an identifier when none is stored
//! 4. derive the secondary identifier from email and salt when missing
//! 5. attach field windows and the aggregate record window
//!
//! The result is always a [`RawRecord`]; callers that answer ordinary
//! requests convert it with [`Assembled::into_public`].

use crate::codec;
use crate::context::EngineContext;
use crate::identifier;
use crate::record::{FieldEntry, PublicRecord, RawRecord, StopEntry};
use crate::sid;
use crate::validity::{combined_expiry, field_validity, record_validity};
use chrono::{DateTime, Utc};
use swan_core::{
    Email, EngineEffects, FieldKey, FieldPayload, Identifier, MergeDirective, MergePolicy,
    Preferences, Result, Salt, SecondaryId, Signed, SignedField, StopList, StoragePair, Validity,
};

/// An assembled record plus the writes it implies.
///
/// `directives` holds an only-if-absent write for an identifier minted
/// during assembly, so the caller can persist it; it is empty otherwise.
#[derive(Debug, Clone, PartialEq)]
pub struct Assembled<R> {
    /// The record
    pub record: R,
    /// Writes the caller should submit to keep the record stable
    pub directives: Vec<MergeDirective>,
}

impl Assembled<RawRecord> {
    /// Strip email and salt.
    pub fn into_public(self) -> Assembled<PublicRecord> {
        Assembled {
            record: self.record.into_public(),
            directives: self.directives,
        }
    }
}

#[derive(Default)]
struct Decoded {
    rid: Option<Signed<Identifier>>,
    pref: Option<Signed<Preferences>>,
    email: Option<Signed<Email>>,
    salt: Option<Signed<Salt>>,
    sid: Option<Signed<SecondaryId>>,
    stop: Option<StopList>,
}

impl Decoded {
    fn place(&mut self, field: SignedField) {
        // Duplicate keys: the later pair wins.
        match field {
            SignedField::Identifier(f) => self.rid = Some(f),
            SignedField::Preferences(f) => self.pref = Some(f),
            SignedField::Email(f) => self.email = Some(f),
            SignedField::Salt(f) => self.salt = Some(f),
            SignedField::SecondaryIdentifier(f) => self.sid = Some(f),
        }
    }
}

fn fresh<T: FieldPayload>(
    field: Option<Signed<T>>,
    ctx: &EngineContext,
    now: DateTime<Utc>,
) -> Result<Option<Signed<T>>> {
    let Some(field) = field else {
        return Ok(None);
    };
    if field_validity(field.record.timestamp, ctx.retention)?.is_expired_at(now) {
        tracing::debug!(key = %T::KIND.key(), "dropping field past retention");
        return Ok(None);
    }
    Ok(Some(field))
}

fn entry<T: FieldPayload>(field: Signed<T>, ctx: &EngineContext) -> Result<FieldEntry<T>> {
    let validity = field_validity(field.record.timestamp, ctx.retention)?;
    Ok(FieldEntry::new(field, validity))
}

async fn decode_all<E: EngineEffects + ?Sized>(
    effects: &E,
    ctx: &EngineContext,
    pairs: &[StoragePair],
) -> Result<Decoded> {
    let mut decoded = Decoded::default();
    for pair in pairs {
        let Some(key) = pair.field_key() else {
            tracing::debug!(key = %pair.key, "discarding unrecognised key");
            continue;
        };
        match key {
            FieldKey::Val => {
                tracing::debug!("discarding stored val pair");
            }
            FieldKey::Stop => {
                let list = StopList::from_pair(pair)?;
                decoded.stop = (!list.is_empty()).then_some(list);
            }
            _ => {
                let Some(kind) = key.kind() else { continue };
                if let Some(field) = codec::decode_pair(effects, ctx.mode, kind, pair).await? {
                    decoded.place(field);
                }
            }
        }
    }
    Ok(decoded)
}

/// Assemble the record held in `pairs` at `now`.
pub async fn assemble<E: EngineEffects + ?Sized>(
    effects: &E,
    ctx: &EngineContext,
    pairs: &[StoragePair],
    state: Vec<String>,
    now: DateTime<Utc>,
) -> Result<Assembled<RawRecord>> {
    let decoded = decode_all(effects, ctx, pairs).await?;

    let pref = fresh(decoded.pref, ctx, now)?;
    let email = fresh(decoded.email, ctx, now)?;
    let salt = fresh(decoded.salt, ctx, now)?;
    let stored_sid = fresh(decoded.sid, ctx, now)?;

    let mut directives = Vec::new();
    let rid = match fresh(decoded.rid, ctx, now)? {
        Some(rid) => rid,
        None => {
            let rid = identifier::mint(effects, &ctx.domain, now).await?;
            directives.push(MergeDirective::new(
                FieldKey::Rid,
                MergePolicy::UseIfAbsent,
                swan_core::offset(now, ctx.retention)?.date_naive(),
                codec::encode_text(&rid)?,
            ));
            rid
        }
    };

    let email = email.map(|f| entry(f, ctx)).transpose()?;
    let salt = salt.map(|f| entry(f, ctx)).transpose()?;

    let sid = match (&email, &salt) {
        (Some(email), Some(salt)) => {
            let field = match stored_sid {
                Some(field) => field,
                None => {
                    sid::derive(
                        effects,
                        &ctx.domain,
                        &email.field.payload,
                        &salt.field.payload,
                        now,
                    )
                    .await?
                }
            };
            let expires = combined_expiry(&email.validity, &salt.validity);
            let created = field.record.timestamp;
            Some(FieldEntry::new(field, Validity::new(created, expires)))
        }
        _ => stored_sid.map(|f| entry(f, ctx)).transpose()?,
    };

    let rid = entry(rid, ctx)?;
    let pref = pref.map(|f| entry(f, ctx)).transpose()?;

    let expiries = std::iter::once(rid.validity.expires)
        .chain(pref.as_ref().map(|e| e.validity.expires))
        .chain(email.as_ref().map(|e| e.validity.expires))
        .chain(salt.as_ref().map(|e| e.validity.expires))
        .chain(sid.as_ref().map(|e| e.validity.expires));
    let val = record_validity(now, ctx.revalidate, expiries)?;

    tracing::debug!(
        minted = !directives.is_empty(),
        pref = pref.is_some(),
        sid = sid.is_some(),
        "assembled record"
    );

    Ok(Assembled {
        record: RawRecord {
            rid,
            pref,
            email,
            salt,
            sid,
            stop: decoded.stop.map(StopEntry),
            val,
            state,
        },
        directives,
    })
}
