use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::context::RequestContext;
use crate::diagnostics::{context_sink_resolver, DiagnosticSink, SinkResolver, TracingSink};
use crate::gate::Enforcer;
use crate::policy::{FallbackPolicy, PolicyTable};
use crate::scheme::AuthScheme;
use crate::validator::ValidationChain;
use crate::web::{NegotiatingWriter, ResponseWriter};

/// Serializable part of the enforcer configuration.
///
/// Validation chains are code, so only the fallback behaviour can come from
/// a config file. Loading the file is up to the host.
///
/// # Examples
///
/// ```
/// use scheme_gate::{EnforcerConfig, FallbackPolicy};
///
/// let config: EnforcerConfig = serde_json::from_str(r#"{ "fallback": "permit" }"#).unwrap();
/// assert_eq!(config.fallback, FallbackPolicy::Permit);
///
/// let config: EnforcerConfig = serde_json::from_str("{}").unwrap();
/// assert_eq!(config.fallback, FallbackPolicy::Deny);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EnforcerConfig {
    /// Behaviour for schemes with no registered chain.
    #[serde(default)]
    pub fallback: FallbackPolicy,
}

/// Builder for [`Enforcer`].
///
/// All configuration happens here. `build` consumes the builder, so the
/// policy table cannot change once requests are being served.
///
/// Defaults: fallback [`FallbackPolicy::Deny`], no policies, the
/// context-attached sink resolver, [`TracingSink`] as default sink and
/// [`NegotiatingWriter`] for rejection bodies.
///
/// # Examples
///
/// ```
/// use scheme_gate::{Enforcer, FallbackPolicy};
/// use scheme_gate::validator::{token_type, Validators};
///
/// let enforcer = Enforcer::builder()
///     .fallback(FallbackPolicy::Deny)
///     .policy("Bearer", Validators::new().with(token_type("jwt")))
///     .build();
///
/// assert_eq!(enforcer.fallback(), FallbackPolicy::Deny);
/// assert!(enforcer.policies().contains("Bearer"));
/// ```
pub struct EnforcerBuilder {
    fallback: FallbackPolicy,
    table: PolicyTable,
    resolver: SinkResolver,
    default_sink: Arc<dyn DiagnosticSink>,
    writer: Arc<dyn ResponseWriter>,
}

impl Default for EnforcerBuilder {
    fn default() -> Self {
        Self {
            fallback: FallbackPolicy::default(),
            table: PolicyTable::new(),
            resolver: context_sink_resolver(),
            default_sink: Arc::new(TracingSink),
            writer: Arc::new(NegotiatingWriter),
        }
    }
}

impl EnforcerBuilder {
    /// Creates a builder with the defaults listed above.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a builder seeded from a deserialized config.
    pub fn from_config(config: &EnforcerConfig) -> Self {
        Self::new().fallback(config.fallback)
    }

    /// Sets the behaviour for schemes with no registered chain.
    pub fn fallback(mut self, fallback: FallbackPolicy) -> Self {
        self.fallback = fallback;
        self
    }

    /// Registers a chain for `scheme`. A later registration for the same
    /// scheme replaces this one.
    pub fn policy(self, scheme: impl Into<AuthScheme>, chain: impl ValidationChain + 'static) -> Self {
        self.shared_policy(scheme, Arc::new(chain))
    }

    /// Registers an already shared chain for `scheme`.
    pub fn shared_policy(
        mut self,
        scheme: impl Into<AuthScheme>,
        chain: Arc<dyn ValidationChain>,
    ) -> Self {
        self.table.register(scheme, chain);
        self
    }

    /// Overrides how the per-request sink is found.
    pub fn sink_resolver<F>(mut self, resolver: F) -> Self
    where
        F: Fn(&RequestContext) -> Option<Arc<dyn DiagnosticSink>> + Send + Sync + 'static,
    {
        self.resolver = Arc::new(resolver);
        self
    }

    /// Sets the sink used when the resolver yields none.
    pub fn default_sink(mut self, sink: Arc<dyn DiagnosticSink>) -> Self {
        self.default_sink = sink;
        self
    }

    /// Sets the writer that renders rejections.
    pub fn response_writer(mut self, writer: impl ResponseWriter + 'static) -> Self {
        self.writer = Arc::new(writer);
        self
    }

    /// Finishes configuration.
    pub fn build(self) -> Enforcer {
        tracing::debug!(
            fallback = %self.fallback,
            schemes = self.table.len(),
            "built enforcer"
        );
        Enforcer::from_parts(
            self.fallback,
            self.table,
            self.resolver,
            self.default_sink,
            self.writer,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validator::{allow_all, Validators};

    #[test]
    fn defaults() {
        let enforcer = EnforcerBuilder::new().build();

        assert_eq!(enforcer.fallback(), FallbackPolicy::Deny);
        assert!(enforcer.policies().is_empty());
    }

    #[test]
    fn from_config_applies_fallback() {
        let config = EnforcerConfig {
            fallback: FallbackPolicy::Permit,
        };
        let enforcer = EnforcerBuilder::from_config(&config).build();

        assert_eq!(enforcer.fallback(), FallbackPolicy::Permit);
    }

    #[test]
    fn config_rejects_unknown_fields() {
        let result: Result<EnforcerConfig, _> =
            serde_json::from_str(r#"{ "fallback": "deny", "rules": [] }"#);
        assert!(result.is_err());
    }

    #[test]
    fn config_rejects_unknown_fallback() {
        let result: Result<EnforcerConfig, _> = serde_json::from_str(r#"{ "fallback": "maybe" }"#);
        assert!(result.is_err());
    }

    #[test]
    fn policies_accumulate_per_scheme() {
        let enforcer = EnforcerBuilder::new()
            .policy("Bearer", allow_all())
            .policy("Basic", Validators::new())
            .policy("Bearer", Validators::new())
            .build();

        let names: Vec<_> = enforcer.policies().schemes().iter().map(|s| s.as_str()).collect();
        assert_eq!(names, vec!["Basic", "Bearer"]);
    }
}
