use std::fmt;

use http::StatusCode;
use thiserror::Error;

use crate::policy::FallbackPolicy;
use crate::scheme::AuthScheme;

/// A single reason a credential was rejected.
///
/// A cause carries a message and, optionally, structured key/value context
/// that ends up on the diagnostic event for the request.
///
/// # Examples
///
/// ```
/// use scheme_gate::Cause;
///
/// let cause = Cause::new("token expired").with_context("expired_at", "2024-01-01T00:00:00Z");
/// assert_eq!(cause.message(), "token expired");
/// assert_eq!(cause.context()[0].0, "expired_at");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cause {
    message: String,
    context: Vec<(String, String)>,
}

impl Cause {
    /// Creates a cause with no structured context.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            context: Vec::new(),
        }
    }

    /// Attaches a key/value pair describing the failure.
    pub fn with_context(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.context.push((key.into(), value.into()));
        self
    }

    /// Returns the human-readable message.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns the structured context in insertion order.
    pub fn context(&self) -> &[(String, String)] {
        &self.context
    }
}

impl fmt::Display for Cause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// Failure returned by a validation chain.
///
/// Either one cause, or an aggregate of several causes collected by a chain
/// that evaluates more than one member. The aggregate case is a variant of
/// its own so callers never need to probe the error's type at runtime.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// Exactly one cause.
    #[error("{0}")]
    Single(Cause),
    /// Several causes, in the order they were produced.
    #[error("multiple errors: {}", join_messages(.0))]
    Aggregate(Vec<Cause>),
}

fn join_messages(causes: &[Cause]) -> String {
    causes
        .iter()
        .map(Cause::message)
        .collect::<Vec<_>>()
        .join("; ")
}

impl ValidationError {
    /// Shorthand for a single cause with no context.
    pub fn new(message: impl Into<String>) -> Self {
        Self::Single(Cause::new(message))
    }

    /// Builds an error from a list of causes.
    ///
    /// A one-element list collapses to [`ValidationError::Single`].
    pub fn aggregate(mut causes: Vec<Cause>) -> Self {
        if causes.len() == 1 {
            if let Some(cause) = causes.pop() {
                return Self::Single(cause);
            }
        }
        Self::Aggregate(causes)
    }

    /// Returns the primary message (the error's `Display` output).
    pub fn primary_message(&self) -> String {
        self.to_string()
    }

    /// Returns the secondary causes. Empty for a single cause.
    pub fn secondary(&self) -> &[Cause] {
        match self {
            Self::Single(_) => &[],
            Self::Aggregate(causes) => causes,
        }
    }

    /// Returns the primary message followed by each secondary message.
    ///
    /// # Examples
    ///
    /// ```
    /// use scheme_gate::{Cause, ValidationError};
    ///
    /// let err = ValidationError::aggregate(vec![Cause::new("expired"), Cause::new("wrong audience")]);
    /// assert_eq!(
    ///     err.messages(),
    ///     vec!["multiple errors: expired; wrong audience", "expired", "wrong audience"],
    /// );
    /// ```
    pub fn messages(&self) -> Vec<String> {
        let mut out = vec![self.primary_message()];
        out.extend(self.secondary().iter().map(|c| c.message().to_string()));
        out
    }

    /// Returns the structured context of every cause, in order.
    pub fn context(&self) -> Vec<(String, String)> {
        match self {
            Self::Single(cause) => cause.context().to_vec(),
            Self::Aggregate(causes) => causes
                .iter()
                .flat_map(|c| c.context().iter().cloned())
                .collect(),
        }
    }
}

impl From<Cause> for ValidationError {
    fn from(cause: Cause) -> Self {
        Self::Single(cause)
    }
}

/// Why the gate rejected a request.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Denial {
    /// The request context held no credential.
    #[error("no authentication found")]
    Unauthenticated,
    /// No validation chain is registered for the credential's scheme and
    /// the fallback policy denies.
    #[error("no rules found for authorization {scheme} (behavior: {fallback})")]
    UnpolicedScheme {
        /// The scheme the credential declared.
        scheme: AuthScheme,
        /// The fallback in force when the lookup missed.
        fallback: FallbackPolicy,
    },
    /// The scheme's validation chain rejected the credential.
    #[error(transparent)]
    ValidationFailed(ValidationError),
}

impl Denial {
    /// Returns the HTTP status this denial maps to.
    ///
    /// A 403 means no policy decision was reached; a 401 means a policy
    /// was evaluated and failed.
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Unauthenticated | Self::UnpolicedScheme { .. } => StatusCode::FORBIDDEN,
            Self::ValidationFailed(_) => StatusCode::UNAUTHORIZED,
        }
    }

    /// Returns the validation error carried by a 401 denial.
    pub fn validation_error(&self) -> Option<&ValidationError> {
        match self {
            Self::ValidationFailed(err) => Some(err),
            _ => None,
        }
    }
}

/// Errors raised while configuring an enforcer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// A fallback policy name was not `deny` or `permit`.
    #[error("unknown fallback policy '{0}' (expected 'deny' or 'permit')")]
    UnknownFallback(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_has_no_secondary() {
        let err = ValidationError::new("expired");

        assert_eq!(err.primary_message(), "expired");
        assert!(err.secondary().is_empty());
        assert_eq!(err.messages(), vec!["expired"]);
    }

    #[test]
    fn aggregate_of_one_collapses() {
        let err = ValidationError::aggregate(vec![Cause::new("only")]);
        assert_eq!(err, ValidationError::new("only"));
    }

    #[test]
    fn aggregate_context_is_flattened_in_order() {
        let err = ValidationError::aggregate(vec![
            Cause::new("a").with_context("k1", "v1"),
            Cause::new("b").with_context("k2", "v2").with_context("k3", "v3"),
        ]);

        let keys: Vec<_> = err.context().into_iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["k1", "k2", "k3"]);
    }

    #[test]
    fn denial_status_codes() {
        assert_eq!(Denial::Unauthenticated.status(), StatusCode::FORBIDDEN);
        assert_eq!(
            Denial::UnpolicedScheme {
                scheme: AuthScheme::from("Basic"),
                fallback: FallbackPolicy::Deny,
            }
            .status(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            Denial::ValidationFailed(ValidationError::new("nope")).status(),
            StatusCode::UNAUTHORIZED
        );
    }

    #[test]
    fn denial_display() {
        let denial = Denial::UnpolicedScheme {
            scheme: AuthScheme::from("Basic"),
            fallback: FallbackPolicy::Deny,
        };
        assert_eq!(
            denial.to_string(),
            "no rules found for authorization Basic (behavior: deny)"
        );
    }
}
