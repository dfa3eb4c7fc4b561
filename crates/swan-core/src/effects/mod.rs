//! Core effect trait definitions
//!
//! Pure trait definitions for every side effect the engine depends on.
//! This module defines **what** effects can be performed; handlers in
//! `swan-effects` and `swan-testkit` define **how**.
//!
//! # Effect Classification
//!
//! - **Signer**: external signing/verification service, keyed by domain
//! - **Time**, **Random**: infrastructure, swapped for deterministic
//!   handlers in tests
//! - **Storage**: the external storage network
//! - **Access**: the external access-control check
//!
//! Engine functions are parameterized by these traits (or the supertraits in
//! [`supertraits`]) instead of reaching for shared global state.

pub mod access;
pub mod random;
pub mod signer;
pub mod storage;
pub mod supertraits;
pub mod time;

pub use access::AccessEffects;
pub use random::RandomEffects;
pub use signer::SignerEffects;
pub use storage::StorageEffects;
pub use supertraits::{EngineEffects, OperatorEffects};
pub use time::{PhysicalTimeEffects, TimeError};
