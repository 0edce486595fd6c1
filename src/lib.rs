//! Scheme-keyed authorization enforcement for HTTP request handlers.
//!
//! This crate sits between an authentication stage and application code.
//! Authentication attaches a [`Credential`] to the request's
//! [`RequestContext`]; the [`Enforcer`] then:
//!
//! - rejects requests with no credential (403, empty body)
//! - looks up the [`ValidationChain`] registered for the credential's
//!   [`AuthScheme`]
//! - applies the [`FallbackPolicy`] when no chain is registered (403 or
//!   pass-through)
//! - runs the chain and rejects failures (401, body describing the error)
//! - forwards everything else to the wrapped handler, untouched
//!
//! Each request produces exactly one [`DiagnosticEvent`](diagnostics::DiagnosticEvent).
//!
//! # Core Types
//!
//! - [`Enforcer`]: the gate, built with [`Enforcer::builder`]
//! - [`PolicyTable`]: scheme to chain mapping, fixed once built
//! - [`ValidationError`]: single cause or aggregate of causes
//! - [`Denial`]: why a request was rejected, with its status code
//! - [`web::Enforced`]: a handler wrapped by the gate
//!
//! # Examples
//!
//! ```
//! use http::{Request, Response, StatusCode};
//! use scheme_gate::validator::{attribute_contains, token_type, Validators};
//! use scheme_gate::web::{handler_fn, Body, Handler};
//! use scheme_gate::{Credential, Enforcer, FallbackPolicy, RequestContext, Token};
//!
//! # tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(async {
//! let enforcer = Enforcer::builder()
//!     .fallback(FallbackPolicy::Deny)
//!     .policy(
//!         "Bearer",
//!         Validators::new()
//!             .with(token_type("jwt"))
//!             .with(attribute_contains("roles", ["admin"])),
//!     )
//!     .build();
//!
//! let app = enforcer.decorate(handler_fn(|_ctx, _req: Request<Body>| async {
//!     Response::new(b"welcome".to_vec())
//! }));
//!
//! let admin = Token::new("jwt", "alice").with_attribute("roles", "admin");
//! let ctx = RequestContext::new("req-123").with_credential(Credential::new("Bearer", admin));
//! let response = app.handle(&ctx, Request::new(Vec::new())).await;
//! assert_eq!(response.status(), StatusCode::OK);
//!
//! let reader = Token::new("jwt", "bob").with_attribute("roles", "reader");
//! let ctx = RequestContext::new("req-124").with_credential(Credential::new("Bearer", reader));
//! let response = app.handle(&ctx, Request::new(Vec::new())).await;
//! assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
//! # });
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod context;
mod credential;
pub mod diagnostics;
mod error;
mod gate;
mod policy;
mod scheme;
pub mod validator;
pub mod web;

pub use config::{EnforcerBuilder, EnforcerConfig};
pub use context::RequestContext;
pub use credential::{Credential, Token};
pub use error::{Cause, ConfigError, Denial, ValidationError};
pub use gate::{Decision, Enforcer};
pub use policy::{FallbackPolicy, PolicyTable};
pub use scheme::AuthScheme;
pub use validator::{ValidationChain, Validator};
