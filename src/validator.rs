//! Validation chains and the validators they are built from.
//!
//! The gate only knows about [`ValidationChain`]. Everything that
//! implements [`Validator`] is a chain of one, and the two combinators
//! ([`Validators`] and [`AnyOf`]) are validators themselves, so chains
//! nest freely.
//!
//! # Empty chains
//!
//! A combinator with no members fails with `"no validators configured"`.
//! Registering a scheme with an empty chain therefore rejects every
//! request for that scheme with a 401 instead of silently letting it in.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;

use crate::context::RequestContext;
use crate::credential::Token;
use crate::error::{Cause, ValidationError};

const NO_VALIDATORS: &str = "no validators configured";

/// The capability the gate consumes: decide whether a token passes.
#[async_trait]
pub trait ValidationChain: Send + Sync {
    /// Evaluates the chain against `token`.
    async fn evaluate(&self, ctx: &RequestContext, token: &Token) -> Result<(), ValidationError>;
}

/// One check in a chain.
///
/// Implementations may suspend, for example to consult a remote
/// revocation list.
#[async_trait]
pub trait Validator: Send + Sync {
    /// Checks `token`, returning the reason on failure.
    async fn check(&self, ctx: &RequestContext, token: &Token) -> Result<(), ValidationError>;
}

#[async_trait]
impl<V: Validator + ?Sized> ValidationChain for V {
    async fn evaluate(&self, ctx: &RequestContext, token: &Token) -> Result<(), ValidationError> {
        self.check(ctx, token).await
    }
}

/// Ordered all-of chain.
///
/// Members run in registration order. The first failure stops the chain and
/// is returned unchanged.
///
/// # Examples
///
/// ```
/// use scheme_gate::validator::{principal_in, token_type, Validators};
///
/// let chain = Validators::new()
///     .with(token_type("jwt"))
///     .with(principal_in(["alice", "bob"]));
/// assert_eq!(chain.len(), 2);
/// ```
#[derive(Clone, Default)]
pub struct Validators {
    members: Vec<Arc<dyn Validator>>,
}

impl Validators {
    /// Creates an empty chain.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a validator.
    pub fn with(mut self, validator: impl Validator + 'static) -> Self {
        self.members.push(Arc::new(validator));
        self
    }

    /// Appends an already shared validator.
    pub fn with_shared(mut self, validator: Arc<dyn Validator>) -> Self {
        self.members.push(validator);
        self
    }

    /// Returns the number of members.
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Returns `true` if the chain has no members.
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

impl fmt::Debug for Validators {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Validators")
            .field("members", &self.members.len())
            .finish()
    }
}

#[async_trait]
impl Validator for Validators {
    async fn check(&self, ctx: &RequestContext, token: &Token) -> Result<(), ValidationError> {
        if self.members.is_empty() {
            return Err(ValidationError::new(NO_VALIDATORS));
        }
        for member in &self.members {
            member.check(ctx, token).await?;
        }
        Ok(())
    }
}

/// Ordered any-of chain.
///
/// Succeeds on the first member that passes. When every member fails the
/// result is an aggregate of all failures, in member order.
#[derive(Clone, Default)]
pub struct AnyOf {
    members: Vec<Arc<dyn Validator>>,
}

impl AnyOf {
    /// Creates an empty chain.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a validator.
    pub fn with(mut self, validator: impl Validator + 'static) -> Self {
        self.members.push(Arc::new(validator));
        self
    }

    /// Returns the number of members.
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Returns `true` if the chain has no members.
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

impl fmt::Debug for AnyOf {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnyOf")
            .field("members", &self.members.len())
            .finish()
    }
}

#[async_trait]
impl Validator for AnyOf {
    async fn check(&self, ctx: &RequestContext, token: &Token) -> Result<(), ValidationError> {
        if self.members.is_empty() {
            return Err(ValidationError::new(NO_VALIDATORS));
        }
        let mut causes = Vec::new();
        for member in &self.members {
            match member.check(ctx, token).await {
                Ok(()) => return Ok(()),
                Err(ValidationError::Single(cause)) => causes.push(cause),
                Err(ValidationError::Aggregate(nested)) => causes.extend(nested),
            }
        }
        Err(ValidationError::aggregate(causes))
    }
}

/// Adapter turning a synchronous closure into a [`Validator`].
pub struct FnValidator<F> {
    check: F,
}

/// Wraps a closure as a validator.
///
/// # Examples
///
/// ```
/// use scheme_gate::ValidationError;
/// use scheme_gate::validator::validator_fn;
///
/// let not_root = validator_fn(|_ctx, token| {
///     if token.principal() == "root" {
///         Err(ValidationError::new("root may not call this service"))
///     } else {
///         Ok(())
///     }
/// });
/// # let _ = not_root;
/// ```
pub fn validator_fn<F>(check: F) -> FnValidator<F>
where
    F: Fn(&RequestContext, &Token) -> Result<(), ValidationError> + Send + Sync,
{
    FnValidator { check }
}

#[async_trait]
impl<F> Validator for FnValidator<F>
where
    F: Fn(&RequestContext, &Token) -> Result<(), ValidationError> + Send + Sync,
{
    async fn check(&self, ctx: &RequestContext, token: &Token) -> Result<(), ValidationError> {
        (self.check)(ctx, token)
    }
}

/// Accepts every token.
#[derive(Debug, Clone, Copy, Default)]
pub struct AllowAll;

/// Returns a validator that accepts every token.
pub fn allow_all() -> AllowAll {
    AllowAll
}

#[async_trait]
impl Validator for AllowAll {
    async fn check(&self, _ctx: &RequestContext, _token: &Token) -> Result<(), ValidationError> {
        Ok(())
    }
}

/// Requires a specific token type.
#[derive(Debug, Clone)]
pub struct TokenType {
    expected: String,
}

/// Returns a validator requiring `token.token_type() == expected`.
pub fn token_type(expected: impl Into<String>) -> TokenType {
    TokenType {
        expected: expected.into(),
    }
}

#[async_trait]
impl Validator for TokenType {
    async fn check(&self, _ctx: &RequestContext, token: &Token) -> Result<(), ValidationError> {
        if token.token_type() == self.expected {
            return Ok(());
        }
        Err(Cause::new("invalid token type")
            .with_context("expected", &self.expected)
            .with_context("actual", token.token_type())
            .into())
    }
}

/// Requires the principal to be one of an allowed set.
#[derive(Debug, Clone)]
pub struct PrincipalIn {
    allowed: Vec<String>,
}

/// Returns a validator accepting only the listed principals.
pub fn principal_in<I, S>(allowed: I) -> PrincipalIn
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    PrincipalIn {
        allowed: allowed.into_iter().map(Into::into).collect(),
    }
}

#[async_trait]
impl Validator for PrincipalIn {
    async fn check(&self, _ctx: &RequestContext, token: &Token) -> Result<(), ValidationError> {
        if self.allowed.iter().any(|p| p == token.principal()) {
            return Ok(());
        }
        Err(Cause::new("principal not allowed")
            .with_context("principal", token.principal())
            .into())
    }
}

/// Requires an attribute to hold an exact value.
#[derive(Debug, Clone)]
pub struct AttributeEquals {
    key: String,
    value: String,
}

/// Returns a validator requiring `token.attribute(key) == Some(value)`.
pub fn attribute_equals(key: impl Into<String>, value: impl Into<String>) -> AttributeEquals {
    AttributeEquals {
        key: key.into(),
        value: value.into(),
    }
}

#[async_trait]
impl Validator for AttributeEquals {
    async fn check(&self, _ctx: &RequestContext, token: &Token) -> Result<(), ValidationError> {
        match token.attribute(&self.key) {
            Some(actual) if actual == self.value => Ok(()),
            Some(_) => Err(Cause::new("attribute value mismatch")
                .with_context("attribute", &self.key)
                .into()),
            None => Err(Cause::new("missing attribute")
                .with_context("attribute", &self.key)
                .into()),
        }
    }
}

/// Requires a comma-separated list attribute to contain an allowed entry.
#[derive(Debug, Clone)]
pub struct AttributeContains {
    key: String,
    allowed: Vec<String>,
}

/// Returns a validator that splits `token.attribute(key)` on commas and
/// passes if any entry is in `allowed`.
///
/// # Examples
///
/// ```
/// use scheme_gate::validator::attribute_contains;
///
/// let admins_or_ops = attribute_contains("roles", ["admin", "ops"]);
/// # let _ = admins_or_ops;
/// ```
pub fn attribute_contains<I, S>(key: impl Into<String>, allowed: I) -> AttributeContains
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    AttributeContains {
        key: key.into(),
        allowed: allowed.into_iter().map(Into::into).collect(),
    }
}

#[async_trait]
impl Validator for AttributeContains {
    async fn check(&self, _ctx: &RequestContext, token: &Token) -> Result<(), ValidationError> {
        let Some(raw) = token.attribute(&self.key) else {
            return Err(Cause::new("missing attribute")
                .with_context("attribute", &self.key)
                .into());
        };
        let found = raw
            .split(',')
            .map(str::trim)
            .any(|entry| self.allowed.iter().any(|a| a == entry));
        if found {
            Ok(())
        } else {
            Err(Cause::new("attribute has no allowed value")
                .with_context("attribute", &self.key)
                .into())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx() -> RequestContext {
        RequestContext::new("req-validator")
    }

    fn jwt(principal: &str) -> Token {
        Token::new("jwt", principal)
    }

    #[tokio::test]
    async fn empty_validators_fail() {
        let err = Validators::new()
            .evaluate(&ctx(), &jwt("alice"))
            .await
            .unwrap_err();
        assert_eq!(err.primary_message(), NO_VALIDATORS);
    }

    #[tokio::test]
    async fn empty_any_of_fails() {
        let err = AnyOf::new().evaluate(&ctx(), &jwt("alice")).await.unwrap_err();
        assert_eq!(err.primary_message(), NO_VALIDATORS);
    }

    #[tokio::test]
    async fn validators_short_circuit_on_first_failure() {
        let chain = Validators::new()
            .with(token_type("basic"))
            .with(validator_fn(|_, _| panic!("second member must not run")));

        let err = chain.evaluate(&ctx(), &jwt("alice")).await.unwrap_err();
        assert_eq!(err.primary_message(), "invalid token type");
        assert_eq!(
            err.context(),
            vec![
                ("expected".to_string(), "basic".to_string()),
                ("actual".to_string(), "jwt".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn validators_pass_when_all_pass() {
        let chain = Validators::new()
            .with(token_type("jwt"))
            .with(principal_in(["alice"]))
            .with(allow_all());

        assert!(chain.evaluate(&ctx(), &jwt("alice")).await.is_ok());
    }

    #[tokio::test]
    async fn any_of_passes_on_one_success() {
        let chain = AnyOf::new()
            .with(principal_in(["bob"]))
            .with(token_type("jwt"));

        assert!(chain.evaluate(&ctx(), &jwt("alice")).await.is_ok());
    }

    #[tokio::test]
    async fn any_of_aggregates_all_failures() {
        let chain = AnyOf::new()
            .with(principal_in(["bob"]))
            .with(token_type("basic"));

        let err = chain.evaluate(&ctx(), &jwt("alice")).await.unwrap_err();
        assert_eq!(
            err.messages(),
            vec![
                "multiple errors: principal not allowed; invalid token type",
                "principal not allowed",
                "invalid token type",
            ]
        );
    }

    #[tokio::test]
    async fn nested_chains_compose() {
        let chain = Validators::new()
            .with(token_type("jwt"))
            .with(AnyOf::new().with(principal_in(["root"])).with(attribute_equals("tier", "pro")));

        let pro = jwt("alice").with_attribute("tier", "pro");
        let free = jwt("alice").with_attribute("tier", "free");

        assert!(chain.evaluate(&ctx(), &pro).await.is_ok());
        assert!(chain.evaluate(&ctx(), &free).await.is_err());
    }

    #[tokio::test]
    async fn attribute_contains_splits_list() {
        let check = attribute_contains("roles", ["admin"]);

        let ok = jwt("a").with_attribute("roles", "reader, admin");
        let no = jwt("a").with_attribute("roles", "reader,administrator");
        let missing = jwt("a");

        assert!(check.check(&ctx(), &ok).await.is_ok());
        assert_eq!(
            check.check(&ctx(), &no).await.unwrap_err().primary_message(),
            "attribute has no allowed value"
        );
        assert_eq!(
            check.check(&ctx(), &missing).await.unwrap_err().primary_message(),
            "missing attribute"
        );
    }

    #[tokio::test]
    async fn fn_validator_sees_context() {
        let check = validator_fn(|ctx, _| {
            if ctx.request_id() == "req-validator" {
                Ok(())
            } else {
                Err(ValidationError::new("wrong request"))
            }
        });

        assert!(check.check(&ctx(), &jwt("a")).await.is_ok());
    }
}
