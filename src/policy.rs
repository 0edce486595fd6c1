use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::scheme::AuthScheme;
use crate::validator::ValidationChain;

/// What the gate does when a credential's scheme has no registered chain.
///
/// `Permit` exists to support gradual rollout: a new scheme can be let
/// through while its policy is still being written.
///
/// # Examples
///
/// ```
/// use scheme_gate::FallbackPolicy;
///
/// assert_eq!(FallbackPolicy::default(), FallbackPolicy::Deny);
/// assert_eq!("permit".parse::<FallbackPolicy>().unwrap(), FallbackPolicy::Permit);
/// assert!("maybe".parse::<FallbackPolicy>().is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FallbackPolicy {
    /// Reject with 403.
    #[default]
    Deny,
    /// Forward to the next handler without running any chain.
    Permit,
}

impl fmt::Display for FallbackPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FallbackPolicy::Deny => write!(f, "deny"),
            FallbackPolicy::Permit => write!(f, "permit"),
        }
    }
}

impl FromStr for FallbackPolicy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "deny" | "forbid" => Ok(FallbackPolicy::Deny),
            "permit" | "allow" => Ok(FallbackPolicy::Permit),
            _ => Err(ConfigError::UnknownFallback(s.to_string())),
        }
    }
}

/// Scheme to validation chain mapping.
///
/// Entries are added with [`register`](Self::register) while the enforcer
/// is being built. Registering a scheme a second time replaces the earlier
/// chain. There is no removal operation, and once the table is moved into
/// an `Enforcer` it is only ever read.
#[derive(Clone, Default)]
pub struct PolicyTable {
    rules: HashMap<AuthScheme, Arc<dyn ValidationChain>>,
}

impl PolicyTable {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `chain` for `scheme`, replacing any previous chain.
    pub fn register(&mut self, scheme: impl Into<AuthScheme>, chain: Arc<dyn ValidationChain>) {
        let scheme = scheme.into();
        if self.rules.insert(scheme.clone(), chain).is_some() {
            tracing::debug!(%scheme, "replaced validation chain");
        }
    }

    /// Returns the chain registered for `scheme`.
    pub fn get(&self, scheme: &AuthScheme) -> Option<&Arc<dyn ValidationChain>> {
        self.rules.get(scheme)
    }

    /// Returns `true` if a chain is registered for `scheme`.
    pub fn contains(&self, scheme: &str) -> bool {
        self.rules.contains_key(scheme)
    }

    /// Returns the number of registered schemes.
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Returns `true` if no scheme is registered.
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Returns the registered schemes in sorted order.
    pub fn schemes(&self) -> Vec<&AuthScheme> {
        let mut schemes: Vec<_> = self.rules.keys().collect();
        schemes.sort();
        schemes
    }
}

impl fmt::Debug for PolicyTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PolicyTable")
            .field("schemes", &self.schemes())
            .finish()
    }
}
