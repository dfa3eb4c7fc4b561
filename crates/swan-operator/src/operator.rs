//! Request-level operator service
//!
//! Every entry point checks the caller's access key before touching any
//! field, then drives the engine with effects supplied at construction.
//! Nothing is cached between requests: the configuration is read-only and
//! the effect handlers synchronise themselves.

use crate::assembler::{assemble, Assembled};
use crate::context::EngineContext;
use crate::directives::{build_directives, stop_directive, UpdateRequest};
use crate::identifier;
use crate::record::{FieldEntry, PublicRecord, RawRecord};
use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use swan_core::types::parse_stop_entries;
use swan_core::{
    ErrorCategory, FieldKey, Identifier, MergeDirective, OperatorConfig, OperatorEffects, Result,
    StorageOperation, SwanError, Validity,
};
use url::Url;

/// Name of the parameter carrying encoded storage results
pub const ENCRYPTED_PARAMETER: &str = "encrypted";

/// Who is asking, and through which domain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestContext {
    /// Domain the request arrived on; this operator signs as that domain
    pub host: String,
    /// Access key presented by the caller
    pub access_key: Option<String>,
}

impl RequestContext {
    /// Create a request context
    pub fn new(host: impl Into<String>, access_key: Option<&str>) -> Self {
        Self {
            host: host.into(),
            access_key: access_key.map(str::to_string),
        }
    }
}

/// A Swan operator bound to its configuration and effects.
#[derive(Debug)]
pub struct Operator<E> {
    config: OperatorConfig,
    effects: E,
}

impl<E: OperatorEffects> Operator<E> {
    /// Create an operator; the configuration must validate.
    pub fn new(config: OperatorConfig, effects: E) -> Result<Self> {
        config.validate()?;
        Ok(Self { config, effects })
    }

    /// Operator configuration
    pub fn config(&self) -> &OperatorConfig {
        &self.config
    }

    /// Effect handlers
    pub fn effects(&self) -> &E {
        &self.effects
    }

    fn engine(&self, request: &RequestContext) -> EngineContext {
        EngineContext::from_config(&self.config, request.host.as_str())
    }

    async fn now(&self) -> Result<DateTime<Utc>> {
        Ok(self.effects.physical_time().await?)
    }

    async fn authorize(&self, request: &RequestContext) -> Result<()> {
        let Some(key) = request.access_key.as_deref().filter(|k| !k.is_empty()) else {
            tracing::warn!(host = %request.host, "request without access key");
            return Err(SwanError::denied("access key required"));
        };
        if !self.effects.is_allowed(key).await? {
            tracing::warn!(host = %request.host, "access key not recognised");
            return Err(SwanError::denied("access key not recognised"));
        }
        Ok(())
    }

    /// A freshly minted identifier, valid for the retention period.
    pub async fn create_rid(&self, request: &RequestContext) -> Result<FieldEntry<Identifier>> {
        let result = async {
            self.authorize(request).await?;
            let now = self.now().await?;
            let rid = identifier::mint(&self.effects, &request.host, now).await?;
            let validity = Validity::new(rid.record.timestamp, self.config.delete_date(now)?);
            Ok::<_, SwanError>(FieldEntry::new(rid, validity))
        }
        .await;
        report("create_rid", result)
    }

    /// URL that reads the stored consent fields back.
    pub async fn fetch(
        &self,
        request: &RequestContext,
        return_url: &str,
        state: Vec<String>,
    ) -> Result<String> {
        let result = async {
            self.authorize(request).await?;
            validate_return_url(return_url)?;
            let operation = StorageOperation {
                return_url: return_url.to_string(),
                use_home_node: true,
                state,
                writes: Vec::new(),
                reads: FieldKey::READABLE.to_vec(),
            };
            tracing::info!(host = %request.host, "fetch");
            self.effects.submit(&request.host, operation).await
        }
        .await;
        report("fetch", result)
    }

    /// URL that writes the submitted fields to storage.
    pub async fn update(
        &self,
        request: &RequestContext,
        return_url: &str,
        state: Vec<String>,
        update: &UpdateRequest,
    ) -> Result<String> {
        let result = async {
            self.authorize(request).await?;
            validate_return_url(return_url)?;
            let now = self.now().await?;
            let writes = build_directives(&self.effects, &self.engine(request), update, now).await?;
            tracing::info!(host = %request.host, writes = writes.len(), "update");
            self.submit_writes(request, return_url, state, writes).await
        }
        .await;
        report("update", result)
    }

    /// URL that adds `domain` to the stop list.
    pub async fn stop(
        &self,
        request: &RequestContext,
        return_url: &str,
        state: Vec<String>,
        domain: &str,
    ) -> Result<String> {
        let result = async {
            self.authorize(request).await?;
            validate_return_url(return_url)?;
            let entries = parse_stop_entries(domain)?;
            if entries.len() != 1 {
                return Err(SwanError::invalid_stop_entry(domain));
            }
            let now = self.now().await?;
            let directive = stop_directive(&entries, self.config.delete_date(now)?.date_naive());
            tracing::info!(host = %request.host, "stop");
            self.submit_writes(request, return_url, state, vec![directive])
                .await
        }
        .await;
        report("stop", result)
    }

    async fn submit_writes(
        &self,
        request: &RequestContext,
        return_url: &str,
        state: Vec<String>,
        writes: Vec<MergeDirective>,
    ) -> Result<String> {
        let operation = StorageOperation {
            return_url: return_url.to_string(),
            use_home_node: false,
            state,
            writes,
            reads: FieldKey::READABLE.to_vec(),
        };
        self.effects.submit(&request.host, operation).await
    }

    async fn open_results(
        &self,
        request: &RequestContext,
        encrypted: Option<&str>,
    ) -> Result<Assembled<RawRecord>> {
        self.authorize(request).await?;
        let text = encrypted
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| SwanError::missing_parameter(ENCRYPTED_PARAMETER))?;
        let bytes = swan_core::decode_base64(text)
            .map_err(|_| SwanError::invalid("not url encoded base64 string"))?;
        let results = self.effects.decrypt(&request.host, &bytes).await?;
        let now = self.now().await?;
        if !results.is_timestamp_valid(now) {
            return Err(SwanError::expired("data expired and can no longer be used"));
        }
        assemble(
            &self.effects,
            &self.engine(request),
            &results.pairs,
            results.state,
            now,
        )
        .await
    }

    /// Public record held in the `encrypted` results, plus the write for
    /// any identifier minted while assembling it.
    pub async fn decrypt(
        &self,
        request: &RequestContext,
        encrypted: Option<&str>,
    ) -> Result<Assembled<PublicRecord>> {
        let result = self
            .open_results(request, encrypted)
            .await
            .map(Assembled::into_public);
        if result.is_ok() {
            tracing::info!(host = %request.host, "decrypt");
        }
        report("decrypt", result)
    }

    /// Flattened raw record for the editing user interface.
    pub async fn decrypt_raw(
        &self,
        request: &RequestContext,
        encrypted: Option<&str>,
    ) -> Result<Map<String, Value>> {
        let result = async {
            let assembled = self.open_results(request, encrypted).await?;
            tracing::info!(host = %request.host, "decrypt raw");
            assembled.record.to_ui_map(&self.config.ui_options())
        }
        .await;
        report("decrypt_raw", result)
    }

    /// Home node the browser is assigned to for this host.
    pub async fn home_node(&self, request: &RequestContext) -> Result<String> {
        let result = async {
            self.authorize(request).await?;
            self.effects.home_node(&request.host).await
        }
        .await;
        report("home_node", result)
    }

    /// Whether the storage network can take operations.
    pub async fn health(&self) -> Result<()> {
        if self.effects.is_alive().await {
            Ok(())
        } else {
            tracing::error!("storage network not alive");
            Err(SwanError::storage("storage network not alive"))
        }
    }
}

fn report<T>(operation: &str, result: Result<T>) -> Result<T> {
    if let Err(err) = &result {
        match err.category() {
            ErrorCategory::Server => {
                tracing::error!(operation, error = %err, "operation failed")
            }
            ErrorCategory::Validation => {
                tracing::warn!(operation, error = %err, "request rejected")
            }
            ErrorCategory::Authorization => tracing::debug!(operation, "request denied"),
        }
    }
    result
}

/// Return URLs must be absolute http or https URLs with a host.
///
/// Whitespace is refused outright rather than percent-encoded.
pub fn validate_return_url(url: &str) -> Result<()> {
    let refused = || SwanError::invalid("returnUrl must be an absolute http or https URL");
    if url.chars().any(char::is_whitespace) {
        return Err(refused());
    }
    let parsed = Url::parse(url).map_err(|_| refused())?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(refused());
    }
    match parsed.host_str() {
        Some(host) if !host.is_empty() => Ok(()),
        _ => Err(refused()),
    }
}
