use std::fmt;
use std::sync::Arc;

use http::{HeaderMap, Response, StatusCode};

use crate::config::EnforcerBuilder;
use crate::context::RequestContext;
use crate::diagnostics::{DiagnosticEvent, DiagnosticSink, Level, SinkResolver};
use crate::error::Denial;
use crate::policy::{FallbackPolicy, PolicyTable};
use crate::web::{Body, Enforced, ResponseWriter};

const NO_AUTHENTICATION: &str = "no authentication found";
const NO_RULES: &str = "no rules found for authorization";
const VALIDATION_FAILED: &str = "authorization validation failed";
const ACCEPTED: &str = "authentication accepted by enforcer";

/// Outcome of enforcing policy on one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    /// Forward the request to the next handler.
    Accept,
    /// Stop the request.
    Reject(Denial),
}

impl Decision {
    /// Returns `true` for [`Decision::Accept`].
    pub fn is_accept(&self) -> bool {
        matches!(self, Decision::Accept)
    }

    /// Returns the rejection status, or `None` when accepted.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Decision::Accept => None,
            Decision::Reject(denial) => Some(denial.status()),
        }
    }
}

/// The authorization enforcement gate.
///
/// Looks up the validation chain registered for a credential's scheme,
/// runs it, and decides whether the request may continue. Schemes with no
/// chain are handled by the [`FallbackPolicy`].
///
/// Every call to [`enforce`](Self::enforce) reports exactly one diagnostic
/// event: error level on rejection, debug level on acceptance.
///
/// An `Enforcer` is immutable once built. Clones share the same table.
///
/// # Examples
///
/// ```
/// use scheme_gate::{Credential, Decision, Enforcer, RequestContext, Token};
/// use scheme_gate::validator::{token_type, Validators};
///
/// # tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(async {
/// let enforcer = Enforcer::builder()
///     .policy("Bearer", Validators::new().with(token_type("jwt")))
///     .build();
///
/// let ctx = RequestContext::new("req-1")
///     .with_credential(Credential::new("Bearer", Token::new("jwt", "alice")));
///
/// assert_eq!(enforcer.enforce(&ctx).await, Decision::Accept);
/// # });
/// ```
#[derive(Clone)]
pub struct Enforcer {
    inner: Arc<Inner>,
}

struct Inner {
    fallback: FallbackPolicy,
    table: PolicyTable,
    resolver: SinkResolver,
    default_sink: Arc<dyn DiagnosticSink>,
    writer: Arc<dyn ResponseWriter>,
}

impl Enforcer {
    /// Starts configuring an enforcer.
    pub fn builder() -> EnforcerBuilder {
        EnforcerBuilder::new()
    }

    pub(crate) fn from_parts(
        fallback: FallbackPolicy,
        table: PolicyTable,
        resolver: SinkResolver,
        default_sink: Arc<dyn DiagnosticSink>,
        writer: Arc<dyn ResponseWriter>,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                fallback,
                table,
                resolver,
                default_sink,
                writer,
            }),
        }
    }

    /// Returns the configured fallback policy.
    pub fn fallback(&self) -> FallbackPolicy {
        self.inner.fallback
    }

    /// Returns the policy table.
    pub fn policies(&self) -> &PolicyTable {
        &self.inner.table
    }

    /// Decides whether the request described by `ctx` may proceed.
    ///
    /// The decision depends only on the context's credential and the
    /// enforcer's own immutable configuration.
    pub async fn enforce(&self, ctx: &RequestContext) -> Decision {
        let sink = (self.inner.resolver)(ctx)
            .unwrap_or_else(|| Arc::clone(&self.inner.default_sink));
        let (decision, event) = self.decide(ctx).await;
        sink.log(&event);
        decision
    }

    /// Renders a rejection with the configured response writer.
    ///
    /// 403 denials carry no body; 401 denials carry the serialized
    /// validation error.
    pub fn rejection(&self, denial: &Denial, request_headers: &HeaderMap) -> Response<Body> {
        self.inner
            .writer
            .write(denial.status(), denial.validation_error(), request_headers)
    }

    /// Wraps `next` so it only runs for accepted requests.
    pub fn decorate<H>(&self, next: H) -> Enforced<H> {
        Enforced::new(self.clone(), next)
    }

    async fn decide(&self, ctx: &RequestContext) -> (Decision, DiagnosticEvent) {
        let request_id = ctx.request_id();

        let Some(credential) = ctx.credential() else {
            return (
                Decision::Reject(Denial::Unauthenticated),
                DiagnosticEvent::new(Level::Error, request_id, NO_AUTHENTICATION),
            );
        };
        let scheme = credential.scheme();

        let Some(chain) = self.inner.table.get(scheme) else {
            let fallback = self.inner.fallback;
            return match fallback {
                FallbackPolicy::Deny => (
                    Decision::Reject(Denial::UnpolicedScheme {
                        scheme: scheme.clone(),
                        fallback,
                    }),
                    DiagnosticEvent::new(Level::Error, request_id, NO_RULES)
                        .with_field("authorization", scheme.as_str())
                        .with_field("behavior", fallback.to_string()),
                ),
                // Permitted requests report a single debug event that still
                // names the missing rules.
                FallbackPolicy::Permit => (
                    Decision::Accept,
                    DiagnosticEvent::new(Level::Debug, request_id, ACCEPTED)
                        .with_field("authorization", scheme.as_str())
                        .with_field("rules", "none")
                        .with_field("behavior", fallback.to_string()),
                ),
            };
        };

        match chain.evaluate(ctx, credential.token()).await {
            Ok(()) => (
                Decision::Accept,
                DiagnosticEvent::new(Level::Debug, request_id, ACCEPTED)
                    .with_field("authorization", scheme.as_str()),
            ),
            Err(err) => {
                let event = err.context().into_iter().fold(
                    DiagnosticEvent::new(Level::Error, request_id, VALIDATION_FAILED)
                        .with_field("authorization", scheme.as_str())
                        .with_field("errors", err.messages()),
                    |event, (key, value)| event.with_field(key, value),
                );
                (Decision::Reject(Denial::ValidationFailed(err)), event)
            }
        }
    }
}

impl fmt::Debug for Enforcer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Enforcer")
            .field("fallback", &self.inner.fallback)
            .field("table", &self.inner.table)
            .finish()
    }
}
