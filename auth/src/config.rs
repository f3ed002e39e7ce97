//! Configuration for the auth context provider.

use jsonwebtoken::Algorithm;
use secrecy::SecretString;
use std::collections::HashMap;

/// Settings for JWT-based auth context validation.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// Key material for signature verification: a public key in PEM form
    /// for asymmetric algorithms, or a (optionally base64-encoded) shared
    /// secret for HMAC algorithms.
    pub key: SecretString,
    /// Algorithms accepted for token signatures; all must belong to the
    /// same key family.
    pub algorithms: Vec<Algorithm>,
    /// Claims every token must carry. A `None` value accepts any claim
    /// value; `Some(value)` additionally requires equality.
    pub required_claims: HashMap<String, Option<serde_json::Value>>,
    /// Renames applied to claims before building the context: a claim
    /// mapped to `Some(name)` is renamed, one mapped to `None` is dropped.
    /// Claims not mentioned here keep their names.
    pub claim_map: HashMap<String, Option<String>>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        let required_claims = ["name", "email", "iat", "exp"]
            .into_iter()
            .map(|claim| (claim.to_string(), None))
            .collect();
        Self {
            key: SecretString::from(String::new()),
            algorithms: vec![Algorithm::ES256, Algorithm::RS256],
            required_claims,
            claim_map: HashMap::new(),
        }
    }
}

impl AuthConfig {
    /// Create a config with the given key material and defaults otherwise.
    #[must_use]
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: SecretString::from(key.into()),
            ..Self::default()
        }
    }

    /// Set the accepted signature algorithms.
    #[must_use]
    pub fn with_algorithms(mut self, algorithms: Vec<Algorithm>) -> Self {
        self.algorithms = algorithms;
        self
    }

    /// Replace the set of required claims.
    #[must_use]
    pub fn with_required_claims(
        mut self,
        claims: HashMap<String, Option<serde_json::Value>>,
    ) -> Self {
        self.required_claims = claims;
        self
    }

    /// Require a claim to be present, optionally with an exact value.
    #[must_use]
    pub fn require_claim(
        mut self,
        claim: impl Into<String>,
        value: Option<serde_json::Value>,
    ) -> Self {
        self.required_claims.insert(claim.into(), value);
        self
    }

    /// Rename a claim to a differently named context attribute.
    #[must_use]
    pub fn map_claim(mut self, claim: impl Into<String>, attribute: impl Into<String>) -> Self {
        self.claim_map.insert(claim.into(), Some(attribute.into()));
        self
    }

    /// Exclude a claim from the auth context.
    #[must_use]
    pub fn drop_claim(mut self, claim: impl Into<String>) -> Self {
        self.claim_map.insert(claim.into(), None);
        self
    }
}
