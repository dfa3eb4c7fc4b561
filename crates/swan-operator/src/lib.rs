//! Swan Operator - consent-data transformation and merge-directive engine
//!
//! Turns the untyped key/value pairs held by the storage network into
//! typed, signed, time-bounded consent records, and turns caller updates
//! into merge directives the storage network applies across replicas.
//!
//! # Components
//!
//! - [`codec`]: storage pairs and inbound text to typed signed fields
//! - [`validity`]: field and record validity windows
//! - [`sid`]: secondary identifier from email and salt
//! - [`identifier`]: minting fresh identifiers
//! - [`directives`]: caller updates to merge directives
//! - [`assembler`]: storage pairs to a consent record
//! - [`record`]: public and raw output records
//! - [`operator`]: request-level service with access checks
//!
//! Every engine function takes its effects as a generic parameter bounded
//! by the traits in `swan_core::effects`; nothing reaches for global state.

#![forbid(unsafe_code)]

pub mod assembler;
pub mod codec;
pub mod context;
pub mod directives;
pub mod identifier;
pub mod logging;
pub mod operator;
pub mod record;
pub mod sid;
pub mod validity;

pub use assembler::{assemble, Assembled};
pub use context::EngineContext;
pub use directives::{build_directives, UpdateRequest};
pub use logging::init_tracing;
pub use operator::{Operator, RequestContext};
pub use record::{FieldEntry, PublicRecord, RawRecord, StopEntry};
