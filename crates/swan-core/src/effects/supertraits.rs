//! Supertraits for common effect combinations

use super::{
    AccessEffects, PhysicalTimeEffects, RandomEffects, SignerEffects, StorageEffects,
};

/// Effects needed to decode, derive, mint and build directives.
pub trait EngineEffects: SignerEffects + PhysicalTimeEffects + RandomEffects {}

/// Automatic implementation for types that satisfy the required bounds
impl<T> EngineEffects for T where T: SignerEffects + PhysicalTimeEffects + RandomEffects {}

/// Effects needed by the request-level operator service.
pub trait OperatorEffects: EngineEffects + StorageEffects + AccessEffects {}

/// Automatic implementation for types that satisfy the required bounds
impl<T> OperatorEffects for T where T: EngineEffects + StorageEffects + AccessEffects {}
