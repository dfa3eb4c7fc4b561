//! Swan Effects - handlers for the operator's effect interfaces
//!
//! Each handler implements one effect trait from `swan_core::effects` and
//! owns no engine logic. Handlers are cheap to clone where they hold shared
//! state, so one instance can be shared by every request.
//!
//! - [`Ed25519SignerHandler`]: per-domain Ed25519 signing and verification
//! - [`RealTimeHandler`]: the system clock
//! - [`RealRandomHandler`]: operating system randomness
//! - [`StaticAccessHandler`]: fixed list of access keys
//! - [`MemoryStorageHandler`]: in-memory storage network applying merge
//!   directives

#![forbid(unsafe_code)]

/// Access-key handler
pub mod access;

/// Random handler
pub mod random;

/// Ed25519 signer handler
pub mod signer;

/// Storage network handlers
pub mod storage;

/// Clock handler
pub mod time;

pub use access::StaticAccessHandler;
pub use random::RealRandomHandler;
pub use signer::Ed25519SignerHandler;
pub use storage::MemoryStorageHandler;
pub use time::RealTimeHandler;
