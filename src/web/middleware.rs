use async_trait::async_trait;
use http::{Request, Response};

use crate::context::RequestContext;
use crate::gate::{Decision, Enforcer};

use super::{Body, Handler};

/// A handler guarded by an [`Enforcer`].
///
/// Built by [`Enforcer::decorate`]. Has the same signature as the handler
/// it wraps; the only new behaviour is the rejection branch.
///
/// # Examples
///
/// ```
/// use http::{Request, Response, StatusCode};
/// use scheme_gate::{Enforcer, RequestContext};
/// use scheme_gate::web::{handler_fn, Body, Handler};
///
/// # tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(async {
/// let app = handler_fn(|_ctx, _req: Request<Body>| async { Response::new(b"ok".to_vec()) });
/// let guarded = Enforcer::builder().build().decorate(app);
///
/// // No credential in the context: forbidden.
/// let response = guarded
///     .handle(&RequestContext::new("req-1"), Request::new(Vec::new()))
///     .await;
/// assert_eq!(response.status(), StatusCode::FORBIDDEN);
/// # });
/// ```
#[derive(Debug, Clone)]
pub struct Enforced<H> {
    enforcer: Enforcer,
    next: H,
}

impl<H> Enforced<H> {
    pub(crate) fn new(enforcer: Enforcer, next: H) -> Self {
        Self { enforcer, next }
    }

    /// Returns the wrapped handler.
    pub fn inner(&self) -> &H {
        &self.next
    }

    /// Returns the enforcer guarding this handler.
    pub fn enforcer(&self) -> &Enforcer {
        &self.enforcer
    }
}

#[async_trait]
impl<B, H> Handler<B> for Enforced<H>
where
    B: Send + 'static,
    H: Handler<B>,
{
    async fn handle(&self, ctx: &RequestContext, request: Request<B>) -> Response<Body> {
        match self.enforcer.enforce(ctx).await {
            Decision::Accept => self.next.handle(ctx, request).await,
            Decision::Reject(denial) => self.enforcer.rejection(&denial, request.headers()),
        }
    }
}
