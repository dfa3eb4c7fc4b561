//! Per-request engine settings

use chrono::Duration;
use swan_core::{OperatorConfig, VerificationMode};

/// Read-only settings every engine component works from.
///
/// Built once per request from the operator configuration and the domain
/// the request arrived on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineContext {
    /// Domain of this operator for the request; used to sign new records
    pub domain: String,
    /// Whether signatures are checked
    pub mode: VerificationMode,
    /// How long a signed field remains valid after it was signed
    pub retention: Duration,
    /// Longest time a caller may trust a record before revalidating
    pub revalidate: Duration,
}

impl EngineContext {
    /// Settings for `domain` derived from `config`
    pub fn from_config(config: &OperatorConfig, domain: impl Into<String>) -> Self {
        Self {
            domain: domain.into(),
            mode: config.verification_mode(),
            retention: config.retention(),
            revalidate: config.revalidate_duration(),
        }
    }
}
