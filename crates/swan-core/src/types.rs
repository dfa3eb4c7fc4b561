//! Storage pairs, results, stop lists and validity windows

use crate::errors::{Result, SwanError};
use crate::fields::FieldKey;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Separator used when a stop list crosses a text boundary.
pub const LIST_SEPARATOR: &str = " ";

/// Created/expires window attached to every field and to a whole record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Validity {
    /// Start of the window
    pub created: DateTime<Utc>,
    /// End of the window; always after `created`
    pub expires: DateTime<Utc>,
}

impl Validity {
    /// Create a validity window
    pub fn new(created: DateTime<Utc>, expires: DateTime<Utc>) -> Self {
        Self { created, expires }
    }

    /// Window of `length` starting at `created`.
    pub fn lasting(created: DateTime<Utc>, length: Duration) -> Result<Self> {
        Ok(Self::new(created, offset(created, length)?))
    }

    /// Whether the window has ended at `now`
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires <= now
    }
}

/// `at + by`, failing instead of overflowing the calendar.
pub fn offset(at: DateTime<Utc>, by: Duration) -> Result<DateTime<Utc>> {
    at.checked_add_signed(by)
        .ok_or_else(|| SwanError::internal(format!("{at} plus {by} is out of range")))
}

/// One key with its current value set, as exchanged with the storage network.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoragePair {
    /// Field key string; unrecognised keys are possible
    pub key: String,
    /// When the value was written
    pub created: DateTime<Utc>,
    /// When the storage network may purge the value
    pub expires: DateTime<Utc>,
    /// Current values; empty means the key holds nothing
    pub values: Vec<Vec<u8>>,
}

impl StoragePair {
    /// Create a storage pair
    pub fn new(
        key: impl Into<String>,
        created: DateTime<Utc>,
        expires: DateTime<Utc>,
        values: Vec<Vec<u8>>,
    ) -> Self {
        Self {
            key: key.into(),
            created,
            expires,
            values,
        }
    }

    /// Parsed field key, `None` when the key is not one the engine knows
    pub fn field_key(&self) -> Option<FieldKey> {
        self.key.parse().ok()
    }

    /// First value, if any
    pub fn first_value(&self) -> Option<&[u8]> {
        self.values.first().map(Vec::as_slice)
    }

    /// Whether the pair carries no value
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Validity window reported by storage
    pub fn validity(&self) -> Validity {
        Validity::new(self.created, self.expires)
    }
}

/// The outcome of a storage operation handed back to the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageResults {
    /// Current value set per key
    pub pairs: Vec<StoragePair>,
    /// Caller state, passed through unchanged
    #[serde(default)]
    pub state: Vec<String>,
    /// After this time the results may no longer be used
    pub expires: DateTime<Utc>,
}

impl StorageResults {
    /// Whether the results may still be used at `now`
    pub fn is_timestamp_valid(&self, now: DateTime<Utc>) -> bool {
        now < self.expires
    }
}

/// Ordered set of revoked domains.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StopList {
    /// Revoked domains, in storage order, without duplicates
    pub domains: Vec<String>,
    /// Validity reported by storage
    pub validity: Validity,
}

impl StopList {
    /// Build from a storage pair. Empty values are skipped.
    pub fn from_pair(pair: &StoragePair) -> Result<Self> {
        let mut domains: Vec<String> = Vec::with_capacity(pair.values.len());
        for value in pair.values.iter().filter(|v| !v.is_empty()) {
            let domain = std::str::from_utf8(value)
                .map_err(|_| SwanError::malformed(FieldKey::Stop.as_str(), "entry not utf-8"))?;
            if !domains.iter().any(|d| d == domain) {
                domains.push(domain.to_string());
            }
        }
        Ok(Self {
            domains,
            validity: pair.validity(),
        })
    }

    /// Space-joined rendering used for transport
    pub fn joined(&self) -> String {
        self.domains.join(LIST_SEPARATOR)
    }

    /// Whether no domains are stopped
    pub fn is_empty(&self) -> bool {
        self.domains.is_empty()
    }
}

/// Split a transported stop list into its validated entries.
///
/// Entries are separated by whitespace. Each must look like a domain name:
/// ASCII letters, digits, `-` and `.`, not starting or ending with `.`.
pub fn parse_stop_entries(text: &str) -> Result<Vec<String>> {
    let mut entries: Vec<String> = Vec::new();
    for entry in text.split_whitespace() {
        if !is_domain_like(entry) {
            return Err(SwanError::invalid_stop_entry(entry));
        }
        if !entries.iter().any(|e| e == entry) {
            entries.push(entry.to_string());
        }
    }
    Ok(entries)
}

fn is_domain_like(entry: &str) -> bool {
    entry.len() <= 253
        && !entry.starts_with('.')
        && !entry.ends_with('.')
        && !entry.contains("..")
        && entry
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'.')
}
