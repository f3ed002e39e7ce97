//! JWT-based authentication context provider.
//!
//! [`AuthProvider`] turns a serialized JSON web token into a caller-defined
//! auth context type: the token is decoded and signature-checked with
//! `jsonwebtoken`, required claims are verified, claims are optionally
//! renamed or dropped via an explicit claim map, and the result is
//! deserialized into the context struct. Every failure mode surfaces as an
//! [`AuthContextValidationError`] naming its cause.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod config;
pub mod error;
pub mod provider;

pub use config::AuthConfig;
pub use error::AuthContextValidationError;
pub use provider::AuthProvider;
