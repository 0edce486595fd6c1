use std::collections::BTreeMap;
use std::fmt;

use crate::scheme::AuthScheme;

/// The authenticated material a validator inspects.
///
/// Produced by the upstream authentication stage. A token has a type
/// (for example `"jwt"` or `"basic"`), the principal it was issued to,
/// and free-form string attributes such as roles or capabilities.
///
/// Attribute values may hold sensitive claims, so `Debug` prints only
/// the attribute keys.
///
/// # Examples
///
/// ```
/// use scheme_gate::Token;
///
/// let token = Token::new("jwt", "alice").with_attribute("roles", "admin,reader");
///
/// assert_eq!(token.principal(), "alice");
/// assert_eq!(token.attribute("roles"), Some("admin,reader"));
/// assert!(!format!("{:?}", token).contains("admin"));
/// ```
#[derive(Clone, PartialEq, Eq)]
pub struct Token {
    token_type: String,
    principal: String,
    attributes: BTreeMap<String, String>,
}

impl Token {
    /// Creates a token with no attributes.
    pub fn new(token_type: impl Into<String>, principal: impl Into<String>) -> Self {
        Self {
            token_type: token_type.into(),
            principal: principal.into(),
            attributes: BTreeMap::new(),
        }
    }

    /// Adds an attribute, replacing any previous value for `key`.
    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    /// Returns the token type.
    pub fn token_type(&self) -> &str {
        &self.token_type
    }

    /// Returns the principal the token was issued to.
    pub fn principal(&self) -> &str {
        &self.principal
    }

    /// Returns the value of an attribute, if present.
    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).map(String::as_str)
    }

    /// Returns all attributes in key order.
    pub fn attributes(&self) -> &BTreeMap<String, String> {
        &self.attributes
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Token")
            .field("token_type", &self.token_type)
            .field("principal", &self.principal)
            .field("attributes", &self.attributes.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// A scheme/token pair attached to a request by the authentication stage.
///
/// Immutable once built; the gate reads it but never changes it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credential {
    scheme: AuthScheme,
    token: Token,
}

impl Credential {
    /// Pairs a token with the scheme it was presented under.
    pub fn new(scheme: impl Into<AuthScheme>, token: Token) -> Self {
        Self {
            scheme: scheme.into(),
            token,
        }
    }

    /// Returns the declared scheme.
    pub fn scheme(&self) -> &AuthScheme {
        &self.scheme
    }

    /// Returns the token.
    pub fn token(&self) -> &Token {
        &self.token
    }
}
