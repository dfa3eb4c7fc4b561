//! Swan Testkit - deterministic test infrastructure
//!
//! Tests across the workspace construct a [`TestEffects`] bundle instead of
//! touching the wall clock, OS randomness or a real storage network. The
//! bundle is reproducible from a seed: the same seed always mints the same
//! identifiers and signs with the same keys.
//!
//! ```rust,ignore
//! use swan_testkit::{fixtures, TestEffects};
//!
//! let effects = TestEffects::new(42);
//! let rid = fixtures::signed_identifier(&effects, effects.now()).await?;
//! ```

#![forbid(unsafe_code)]

/// Deterministic effect bundle
pub mod effects;

/// Constants and builders for signed fields and storage pairs
pub mod fixtures;

/// Proptest strategies for consent data
pub mod strategies;

/// Controllable clock
pub mod time;

pub use effects::{SeededRandom, TestEffects};
pub use time::ControllableClock;
