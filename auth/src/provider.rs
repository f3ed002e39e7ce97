//! The JWT auth context provider.

use crate::config::AuthConfig;
use crate::error::AuthContextValidationError;
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};
use secrecy::ExposeSecret;
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use tracing::debug;

const fn is_hmac(algorithm: Algorithm) -> bool {
    matches!(
        algorithm,
        Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512
    )
}

/// Validates JSON web tokens and turns their claims into a typed context.
pub struct AuthProvider {
    key: DecodingKey,
    validation: Validation,
    required_claims: HashMap<String, Option<serde_json::Value>>,
    claim_map: HashMap<String, Option<String>>,
}

impl std::fmt::Debug for AuthProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthProvider")
            .field("key", &"<redacted>")
            .field("validation", &self.validation)
            .field("required_claims", &self.required_claims)
            .field("claim_map", &self.claim_map)
            .finish()
    }
}

impl AuthProvider {
    /// Build a provider from the given configuration.
    ///
    /// # Errors
    ///
    /// Fails when the configured key material cannot be parsed for the
    /// configured algorithms, or when shared-secret and public-key
    /// algorithms are mixed.
    pub fn new(config: AuthConfig) -> Result<Self, AuthContextValidationError> {
        let Some(&first) = config.algorithms.first() else {
            return Err(AuthContextValidationError::InvalidKey(
                "no signature algorithms configured".to_string(),
            ));
        };
        let all_hmac = config.algorithms.iter().copied().all(is_hmac);
        if !all_hmac && config.algorithms.iter().copied().any(is_hmac) {
            return Err(AuthContextValidationError::MixedAlgorithms(format!(
                "{:?}",
                config.algorithms
            )));
        }

        let material = config.key.expose_secret();
        let key = if all_hmac {
            // A shared secret may be given base64-encoded; fall back to the
            // raw bytes when it does not decode.
            DecodingKey::from_base64_secret(material)
                .unwrap_or_else(|_| DecodingKey::from_secret(material.as_bytes()))
        } else {
            DecodingKey::from_ec_pem(material.as_bytes())
                .or_else(|_| DecodingKey::from_rsa_pem(material.as_bytes()))
                .or_else(|_| DecodingKey::from_ed_pem(material.as_bytes()))
                .map_err(|error| AuthContextValidationError::InvalidKey(error.to_string()))?
        };

        let mut validation = Validation::new(first);
        validation.algorithms = config.algorithms.clone();
        validation.validate_aud = false;
        validation.validate_exp = config.required_claims.contains_key("exp");
        validation.required_spec_claims = if validation.validate_exp {
            ["exp".to_string()].into_iter().collect()
        } else {
            std::collections::HashSet::new()
        };

        Ok(Self {
            key,
            validation,
            required_claims: config.required_claims,
            claim_map: config.claim_map,
        })
    }

    /// Establish an auth context from a serialized and signed token.
    ///
    /// Claims are verified against the required set, then renamed or
    /// dropped per the claim map, then deserialized into `C`.
    ///
    /// # Errors
    ///
    /// Empty tokens, undecodable tokens, signature failures, missing or
    /// mismatching claims and context deserialization failures each map to
    /// their [`AuthContextValidationError`] variant.
    pub fn context<C: DeserializeOwned>(
        &self,
        token: &str,
    ) -> Result<C, AuthContextValidationError> {
        let mut claims = self.decode_claims(token)?;

        for (claim, expected) in &self.required_claims {
            let Some(value) = claims.get(claim) else {
                return Err(AuthContextValidationError::MissingClaim(claim.clone()));
            };
            if let Some(expected) = expected {
                if value != expected {
                    return Err(AuthContextValidationError::ClaimMismatch {
                        claim: claim.clone(),
                    });
                }
            }
        }

        for (claim, attribute) in &self.claim_map {
            let value = claims
                .remove(claim)
                .ok_or_else(|| AuthContextValidationError::MissingClaim(claim.clone()))?;
            if let Some(attribute) = attribute {
                claims.insert(attribute.clone(), value);
            }
        }

        let context = serde_json::from_value(serde_json::Value::Object(claims))
            .map_err(|error| AuthContextValidationError::InvalidContext(error.to_string()))?;
        debug!("auth context established");
        Ok(context)
    }

    fn decode_claims(
        &self,
        token: &str,
    ) -> Result<serde_json::Map<String, serde_json::Value>, AuthContextValidationError> {
        if token.is_empty() {
            return Err(AuthContextValidationError::EmptyToken);
        }
        decode(token, &self.key, &self.validation)
            .map(|data| data.claims)
            .map_err(|error| AuthContextValidationError::InvalidToken(error.to_string()))
    }
}
