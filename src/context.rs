use std::fmt;
use std::sync::Arc;

use crate::credential::Credential;
use crate::diagnostics::DiagnosticSink;

/// Request-scoped context handed to the gate, validators and handlers.
///
/// The authentication stage creates one per request, attaches the
/// credential it extracted and, optionally, a request-specific diagnostic
/// sink. Everything downstream receives it by reference. Nothing here is
/// global and nothing outlives the request.
///
/// Accessors return `Option` so "absent" is always explicit.
///
/// # Examples
///
/// ```
/// use scheme_gate::{Credential, RequestContext, Token};
///
/// let anonymous = RequestContext::new("req-1");
/// assert!(anonymous.credential().is_none());
///
/// let ctx = RequestContext::new("req-2")
///     .with_credential(Credential::new("Bearer", Token::new("jwt", "alice")));
/// assert_eq!(ctx.credential().unwrap().scheme().as_str(), "Bearer");
/// ```
#[derive(Clone)]
pub struct RequestContext {
    request_id: String,
    credential: Option<Credential>,
    sink: Option<Arc<dyn DiagnosticSink>>,
}

impl RequestContext {
    /// Creates a context with no credential and no sink.
    pub fn new(request_id: impl Into<String>) -> Self {
        Self {
            request_id: request_id.into(),
            credential: None,
            sink: None,
        }
    }

    /// Attaches the authenticated credential.
    pub fn with_credential(mut self, credential: Credential) -> Self {
        self.credential = Some(credential);
        self
    }

    /// Attaches a request-specific diagnostic sink.
    pub fn with_sink(mut self, sink: Arc<dyn DiagnosticSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Returns the request ID used to correlate diagnostics.
    pub fn request_id(&self) -> &str {
        &self.request_id
    }

    /// Returns the credential, if authentication attached one.
    pub fn credential(&self) -> Option<&Credential> {
        self.credential.as_ref()
    }

    /// Returns the request-specific sink, if any.
    pub fn sink(&self) -> Option<Arc<dyn DiagnosticSink>> {
        self.sink.clone()
    }
}

impl fmt::Debug for RequestContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestContext")
            .field("request_id", &self.request_id)
            .field("credential", &self.credential)
            .field("has_sink", &self.sink.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credential::Token;
    use crate::diagnostics::MemorySink;

    #[test]
    fn new_context_is_empty() {
        let ctx = RequestContext::new("req-empty");

        assert_eq!(ctx.request_id(), "req-empty");
        assert!(ctx.credential().is_none());
        assert!(ctx.sink().is_none());
    }

    #[test]
    fn clone_shares_sink() {
        let sink = Arc::new(MemorySink::new());
        let ctx = RequestContext::new("req-1").with_sink(sink.clone());
        let copy = ctx.clone();

        let a = ctx.sink().expect("sink attached");
        let b = copy.sink().expect("sink attached");
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn debug_does_not_leak_token_attributes() {
        let token = Token::new("jwt", "alice").with_attribute("secret", "hunter2");
        let ctx = RequestContext::new("req-1").with_credential(Credential::new("Bearer", token));

        let out = format!("{:?}", ctx);
        assert!(out.contains("alice"));
        assert!(!out.contains("hunter2"));
    }
}
