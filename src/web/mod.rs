//! Request-handler integration surface.
//!
//! The gate plugs into a request pipeline as a decorator:
//! [`Enforcer::decorate`](crate::Enforcer::decorate) wraps a [`Handler`] and
//! returns an [`Enforced`] handler with the same signature. Accepted
//! requests reach the wrapped handler untouched; rejected requests are
//! answered by the enforcer's [`ResponseWriter`].
//!
//! # Design Principles
//!
//! 1. **No Framework Dependencies**: only `http` types appear here. Framework
//!    adapters translate their request type into `http::Request` plus a
//!    [`RequestContext`](crate::RequestContext).
//!
//! 2. **Explicit Context**: the request context is an argument, never an
//!    extension or a thread-local.
//!
//! # Integration Flow
//!
//! ```text
//! HTTP Request
//!   ↓
//! Authentication stage builds RequestContext (credential attached)
//!   ↓
//! Enforced::handle → Enforcer::enforce
//!   ↓
//! Accept → next handler      Reject → 403 / 401 response
//! ```

mod handler;
mod middleware;
mod response;

pub use handler::{handler_fn, Body, Handler, HandlerFn};
pub use middleware::Enforced;
pub use response::{ErrorBody, NegotiatingWriter, ResponseWriter};
