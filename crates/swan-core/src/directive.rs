//! Merge directives submitted to the storage network
//!
//! A directive tells every replica how to reconcile one key. The key string
//! sent to storage is `{field}{policy}{YYYY-MM-DD}`, e.g. `rid<2024-06-01`.

use crate::errors::{Result, SwanError};
use crate::fields::FieldKey;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Date format of a directive's effective date
pub const EFFECTIVE_DATE_FORMAT: &str = "%Y-%m-%d";

/// Conflict-resolution policy for a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MergePolicy {
    /// The newest value wins across replicas and concurrent writers
    UseIfNewer,
    /// Write only when no value exists yet
    UseIfAbsent,
    /// Union new entries with the existing ones
    Append,
}

impl MergePolicy {
    /// Symbol used in the directive key
    pub fn symbol(&self) -> char {
        match self {
            MergePolicy::UseIfNewer => '>',
            MergePolicy::UseIfAbsent => '<',
            MergePolicy::Append => '+',
        }
    }

    /// Inverse of [`MergePolicy::symbol`]
    pub fn from_symbol(symbol: char) -> Option<Self> {
        match symbol {
            '>' => Some(MergePolicy::UseIfNewer),
            '<' => Some(MergePolicy::UseIfAbsent),
            '+' => Some(MergePolicy::Append),
            _ => None,
        }
    }
}

impl fmt::Display for MergePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

/// One write with its conflict-resolution policy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergeDirective {
    /// Field being written; never `val`
    pub key: FieldKey,
    /// Conflict-resolution policy
    pub policy: MergePolicy,
    /// Date after which storage may purge the value
    pub effective_date: NaiveDate,
    /// Encoded value: base64 signed record, or a space-joined stop list
    pub value: String,
}

impl MergeDirective {
    /// Create a directive
    pub fn new(
        key: FieldKey,
        policy: MergePolicy,
        effective_date: NaiveDate,
        value: impl Into<String>,
    ) -> Self {
        Self {
            key,
            policy,
            effective_date,
            value: value.into(),
        }
    }

    /// Key string submitted to storage, e.g. `rid<2024-06-01`
    pub fn storage_key(&self) -> String {
        format!(
            "{}{}{}",
            self.key,
            self.policy.symbol(),
            self.effective_date.format(EFFECTIVE_DATE_FORMAT)
        )
    }

    /// Parse a storage key back into its parts.
    ///
    /// A read request carries a policy symbol but no date (`rid>`), which
    /// parses to `None` for the date.
    pub fn parse_storage_key(key: &str) -> Result<(FieldKey, MergePolicy, Option<NaiveDate>)> {
        let (index, symbol) = key
            .char_indices()
            .find(|(_, c)| MergePolicy::from_symbol(*c).is_some())
            .ok_or_else(|| SwanError::invalid(format!("no policy in key '{key}'")))?;
        let field: FieldKey = key[..index]
            .parse()
            .map_err(|e| SwanError::invalid(format!("{e}")))?;
        let policy = MergePolicy::from_symbol(symbol)
            .ok_or_else(|| SwanError::invalid(format!("no policy in key '{key}'")))?;
        let rest = &key[index + symbol.len_utf8()..];
        let date = if rest.is_empty() {
            None
        } else {
            Some(
                NaiveDate::parse_from_str(rest, EFFECTIVE_DATE_FORMAT)
                    .map_err(|e| SwanError::invalid(format!("bad date in key '{key}': {e}")))?,
            )
        };
        Ok((field, policy, date))
    }
}

/// A complete storage operation handed to the storage network.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageOperation {
    /// Where the browser returns once the operation completes
    pub return_url: String,
    /// Whether the home node alone may answer; false for writes
    pub use_home_node: bool,
    /// Caller state, passed through to the results
    pub state: Vec<String>,
    /// Writes to apply
    pub writes: Vec<MergeDirective>,
    /// Keys to read back with the newest-wins marker
    pub reads: Vec<FieldKey>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()
    }

    #[test]
    fn test_storage_key_format() {
        let d = MergeDirective::new(FieldKey::Rid, MergePolicy::UseIfAbsent, date(), "x");
        assert_eq!(d.storage_key(), "rid<2024-06-01");
        let d = MergeDirective::new(FieldKey::Stop, MergePolicy::Append, date(), "a.com");
        assert_eq!(d.storage_key(), "stop+2024-06-01");
        let d = MergeDirective::new(FieldKey::Pref, MergePolicy::UseIfNewer, date(), "x");
        assert_eq!(d.storage_key(), "pref>2024-06-01");
    }

    #[test]
    fn test_parse_storage_key() {
        assert_eq!(
            MergeDirective::parse_storage_key("email>2024-06-01").unwrap(),
            (FieldKey::Email, MergePolicy::UseIfNewer, Some(date()))
        );
        assert_eq!(
            MergeDirective::parse_storage_key("rid>").unwrap(),
            (FieldKey::Rid, MergePolicy::UseIfNewer, None)
        );
        assert!(MergeDirective::parse_storage_key("rid").is_err());
        assert!(MergeDirective::parse_storage_key("bogus<2024-06-01").is_err());
        assert!(MergeDirective::parse_storage_key("salt<June").is_err());
    }
}
