//! Connect-time credential verification.
//!
//! Clients present an opaque bearer token when opening the realtime
//! channel. Verification is a black box from the coordination engine's
//! point of view: token in, stable user identity out. Tokens are issued
//! by the collaborating account service, never here.

use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

/// Credential failures. Fatal for the connection attempt; the client must
/// reconnect with a fresh token.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("missing credential")]
    MissingToken,
    #[error("invalid or expired credential")]
    InvalidToken,
}

#[derive(Debug, Deserialize)]
struct Claims {
    sub: String,
}

/// HS256 token verifier. The `sub` claim carries the user identity.
pub struct TokenVerifier {
    key: DecodingKey,
    validation: Validation,
}

impl TokenVerifier {
    pub fn new(secret: &str) -> Self {
        Self {
            key: DecodingKey::from_secret(secret.as_bytes()),
            validation: Validation::new(Algorithm::HS256),
        }
    }

    /// Verify a token and extract the user identity.
    pub fn verify(&self, token: &str) -> Result<String, AuthError> {
        decode::<Claims>(token, &self.key, &self.validation)
            .map(|data| data.claims.sub)
            .map_err(|e| {
                debug!(error = %e, "token verification failed");
                AuthError::InvalidToken
            })
    }

    /// Verify an optional query-supplied token.
    pub fn verify_optional(&self, token: Option<&str>) -> Result<String, AuthError> {
        match token {
            Some(token) => self.verify(token),
            None => Err(AuthError::MissingToken),
        }
    }
}
