//! Swan Core - consent field model and effect interfaces
//!
//! This crate holds the pure data model that the Swan operator engine works
//! with. It performs no I/O of its own.
//!
//! # Contents
//!
//! - Field keys and the typed payloads carried by each consent field
//! - The signed-record wire format (`Signed<T>`, `SignedField`)
//! - Validity windows, storage pairs, storage results and stop lists
//! - Merge directives and their conflict-resolution policies
//! - The unified `SwanError` type
//! - Operator configuration
//! - Effect interfaces (signer, clock, randomness, storage network, access)
//!
//! Implementations of the effect interfaces live in `swan-effects` and
//! `swan-testkit`; the engine itself lives in `swan-operator`.

#![forbid(unsafe_code)]

/// Operator configuration
pub mod config;

/// Merge directives submitted to the storage network
pub mod directive;

/// Pure effect interfaces (no implementations)
pub mod effects;

/// Unified error handling
pub mod errors;

/// Field keys and typed field payloads
pub mod fields;

/// Content hashing used for secondary identifiers
pub mod hash;

/// Signed-record wire format
pub mod signed;

/// Storage pairs, results, stop lists and validity windows
pub mod types;

pub use config::{OperatorConfig, UiOptions, VerificationMode};
pub use directive::{MergeDirective, MergePolicy, StorageOperation};
pub use effects::{
    AccessEffects, EngineEffects, OperatorEffects, PhysicalTimeEffects, RandomEffects,
    SignerEffects, StorageEffects, TimeError,
};
pub use errors::{ErrorCategory, Result, SwanError};
pub use fields::{
    Email, FieldKey, FieldKind, FieldPayload, Identifier, Preferences, Salt, SecondaryId,
};
pub use signed::{header_timestamp, Signed, SignedField, SignedRecord, WireError};
pub use types::{offset, StopList, StoragePair, StorageResults, Validity};

/// URL-safe, unpadded base64 used for every value crossing a text boundary.
pub fn encode_base64(bytes: &[u8]) -> String {
    use base64::Engine as _;
    base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(bytes)
}

/// Inverse of [`encode_base64`].
pub fn decode_base64(text: &str) -> std::result::Result<Vec<u8>, base64::DecodeError> {
    use base64::Engine as _;
    base64::engine::general_purpose::URL_SAFE_NO_PAD.decode(text.trim())
}
