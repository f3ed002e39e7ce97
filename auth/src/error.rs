//! Auth context validation errors.

use thiserror::Error;

/// A token could not establish a valid authentication context.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthContextValidationError {
    /// No usable signing key could be built from the configuration
    #[error("no valid token signing key found in the configuration: {0}")]
    InvalidKey(String),

    /// Shared-secret and public-key algorithms were configured together
    #[error("shared-secret and public-key algorithms cannot share key material: {0}")]
    MixedAlgorithms(String),

    /// The presented token was empty
    #[error("empty token")]
    EmptyToken,

    /// The token could not be decoded or its signature did not verify
    #[error("not a valid token: {0}")]
    InvalidToken(String),

    /// A claim required by the configuration was absent
    #[error("missing claim {0}")]
    MissingClaim(String),

    /// A claim was present but did not have its required value
    #[error("unexpected value for claim {claim}")]
    ClaimMismatch {
        /// The offending claim name
        claim: String,
    },

    /// The remapped claims did not deserialize into the context type
    #[error("invalid auth context: {0}")]
    InvalidContext(String),
}
