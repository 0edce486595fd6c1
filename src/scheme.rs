use std::borrow::Borrow;
use std::fmt;

/// The declared category of a credential, such as `Bearer` or `Basic`.
///
/// `AuthScheme` is only ever used as a policy lookup key. Comparison is
/// exact: `"bearer"` and `"Bearer"` are different schemes.
///
/// # Examples
///
/// ```
/// use scheme_gate::AuthScheme;
///
/// let scheme = AuthScheme::new("Bearer");
/// assert_eq!(scheme, AuthScheme::from("Bearer"));
/// assert_ne!(scheme, AuthScheme::from("bearer"));
/// assert_eq!(scheme.to_string(), "Bearer");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AuthScheme(String);

impl AuthScheme {
    /// Creates a scheme from its name.
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Returns the scheme name.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AuthScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for AuthScheme {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for AuthScheme {
    fn from(name: String) -> Self {
        Self(name)
    }
}

impl Borrow<str> for AuthScheme {
    fn borrow(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn lookup_by_str_borrows() {
        let mut map = HashMap::new();
        map.insert(AuthScheme::from("Basic"), 1);

        assert_eq!(map.get("Basic"), Some(&1));
        assert_eq!(map.get("basic"), None);
    }
}
