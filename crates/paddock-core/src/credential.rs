//! Bearer token handling.
//!
//! Tokens are opaque to Paddock except for the `exp` claim of their JWT
//! payload, which decides whether a request is worth sending at all.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use chrono::{DateTime, Duration, TimeZone, Utc};
use serde::Deserialize;

use crate::traits::CredentialSource;
use crate::AppError;

#[derive(Debug, Deserialize)]
struct Claims {
    #[serde(default)]
    exp: Option<i64>,
}

/// An API token together with its decoded expiry.
#[derive(Clone)]
pub struct Credential {
    token: String,
    expires_at: Option<DateTime<Utc>>,
}

/// Snapshot of a credential's lifetime.
#[derive(Debug, Clone, PartialEq)]
pub struct Expiry {
    pub expires_at: DateTime<Utc>,
    pub remaining: Duration,
    pub expired: bool,
}

impl Credential {
    /// Parses a pasted token, accepting an optional `Bearer ` prefix.
    ///
    /// # Errors
    ///
    /// Returns `AppError::InvalidInput` if the token is empty or carries no
    /// decodable `exp` claim.
    pub fn parse(raw: &str) -> Result<Self, AppError> {
        let token = strip_bearer(raw);
        if token.is_empty() {
            return Err(AppError::InvalidInput("empty API token".to_string()));
        }

        let expires_at = decode_expiry(token).ok_or_else(|| {
            AppError::InvalidInput("API token has no readable expiry (exp) claim".to_string())
        })?;

        Ok(Self {
            token: token.to_string(),
            expires_at: Some(expires_at),
        })
    }

    /// Wraps a previously stored token without validating it.
    ///
    /// A token whose expiry cannot be decoded is treated as expired.
    pub fn from_stored(token: &str) -> Self {
        let token = strip_bearer(token);
        Self {
            token: token.to_string(),
            expires_at: decode_expiry(token),
        }
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.expires_at
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        match self.expires_at {
            Some(exp) => exp < now,
            None => true,
        }
    }

    pub fn expiry_at(&self, now: DateTime<Utc>) -> Option<Expiry> {
        let expires_at = self.expires_at?;
        let remaining = (expires_at - now).max(Duration::zero());
        Some(Expiry {
            expires_at,
            remaining,
            expired: self.is_expired_at(now),
        })
    }

    pub fn expiry(&self) -> Option<Expiry> {
        self.expiry_at(Utc::now())
    }
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credential")
            .field("token", &"<redacted>")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

impl CredentialSource for Credential {
    fn token(&self) -> Option<String> {
        Some(self.token.clone())
    }

    fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }
}

impl CredentialSource for Option<Credential> {
    fn token(&self) -> Option<String> {
        self.as_ref().map(|c| c.token.clone())
    }

    fn is_expired(&self) -> bool {
        self.as_ref().map_or(true, |c| c.is_expired())
    }
}

fn strip_bearer(raw: &str) -> &str {
    let trimmed = raw.trim();
    trimmed
        .strip_prefix("Bearer ")
        .map(str::trim)
        .unwrap_or(trimmed)
}

/// Reads the `exp` claim from the payload segment of a JWT.
fn decode_expiry(token: &str) -> Option<DateTime<Utc>> {
    let payload = token.split('.').nth(1)?;
    let bytes = URL_SAFE_NO_PAD.decode(payload.trim_end_matches('=')).ok()?;
    let claims: Claims = serde_json::from_slice(&bytes).ok()?;
    Utc.timestamp_opt(claims.exp?, 0).single()
}
