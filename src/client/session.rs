// src/client/session.rs

use std::{
    collections::HashSet,
    time::{SystemTime, UNIX_EPOCH},
};

use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};

use crate::utils::jwt::Claims;

/// Reads the claims of a token WITHOUT verifying its signature.
///
/// The result is a hint for local UI state (who appears to be signed in,
/// whether the token looks expired). It must never be used to authorize
/// anything; the server verifies every request on its own.
pub fn peek_unverified_claims(token: &str) -> Option<Claims> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.insecure_disable_signature_validation();
    validation.validate_exp = false;
    validation.validate_aud = false;
    validation.required_spec_claims = HashSet::new();

    decode::<Claims>(token, &DecodingKey::from_secret(&[]), &validation)
        .ok()
        .map(|data| data.claims)
}

fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

/// Bearer token held by one `ApiClient`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    token: String,
}

impl Session {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    /// Unverified claims of the held token, see [`peek_unverified_claims`].
    pub fn claims(&self) -> Option<Claims> {
        peek_unverified_claims(&self.token)
    }

    /// A token whose payload cannot be read counts as expired.
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(now_secs())
    }

    pub fn is_expired_at(&self, unix_secs: u64) -> bool {
        match self.claims() {
            Some(claims) => (claims.exp as u64) < unix_secs,
            None => true,
        }
    }
}
