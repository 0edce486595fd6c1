use std::future::Future;

use async_trait::async_trait;
use http::{Request, Response};

use crate::context::RequestContext;

/// Response body type produced by handlers and rejections.
pub type Body = Vec<u8>;

/// Something that serves a request.
#[async_trait]
pub trait Handler<B: Send + 'static>: Send + Sync {
    /// Serves `request` within `ctx`.
    async fn handle(&self, ctx: &RequestContext, request: Request<B>) -> Response<Body>;
}

/// Adapter turning an async closure into a [`Handler`].
#[derive(Debug, Clone)]
pub struct HandlerFn<F> {
    f: F,
}

/// Wraps a closure as a handler.
///
/// The closure receives an owned clone of the context so the returned
/// future does not borrow from the caller.
///
/// # Examples
///
/// ```
/// use http::{Request, Response};
/// use scheme_gate::web::{handler_fn, Body};
///
/// let hello = handler_fn(|ctx, _req: Request<Body>| async move {
///     Response::new(format!("hello from {}", ctx.request_id()).into_bytes())
/// });
/// # let _ = hello;
/// ```
pub fn handler_fn<B, F, Fut>(f: F) -> HandlerFn<F>
where
    F: Fn(RequestContext, Request<B>) -> Fut,
    Fut: Future<Output = Response<Body>>,
{
    HandlerFn { f }
}

#[async_trait]
impl<B, F, Fut> Handler<B> for HandlerFn<F>
where
    B: Send + 'static,
    F: Fn(RequestContext, Request<B>) -> Fut + Send + Sync,
    Fut: Future<Output = Response<Body>> + Send + 'static,
{
    async fn handle(&self, ctx: &RequestContext, request: Request<B>) -> Response<Body> {
        (self.f)(ctx.clone(), request).await
    }
}
