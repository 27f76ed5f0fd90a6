//! Signed bearer tokens.
//!
//! A token is `base64url(claims JSON) "." base64url(HMAC-SHA256(secret, claims part))`,
//! both parts unpadded. Access and refresh tokens share the format and are
//! told apart by the `kind` claim.

use std::time::Duration;

use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use thiserror::Error;

use marketstall_core::UserId;

use crate::config::TokenConfig;

/// Errors that can occur when issuing or verifying a token.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TokenError {
    /// The token is not two base64url parts around a dot, or the claims are not valid JSON.
    #[error("token is malformed")]
    Malformed,

    /// The signature does not match the claims.
    #[error("token signature is invalid")]
    BadSignature,

    /// The token's `exp` has passed.
    #[error("token has expired")]
    Expired,

    /// An access token was presented where a refresh token was expected, or vice versa.
    #[error("token has wrong type")]
    WrongKind,

    /// Claims could not be encoded or the key was rejected.
    #[error("token signing failed: {0}")]
    Signing(String),
}

/// Which endpoint a token is good for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Access,
    Refresh,
}

/// Payload carried by a token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// The user the token was issued to.
    pub sub: UserId,
    pub kind: TokenKind,
    /// Issued-at, seconds since the Unix epoch.
    pub iat: i64,
    /// Expiry, seconds since the Unix epoch.
    pub exp: i64,
}

/// An access/refresh token pair, as returned by `POST /token/`.
#[derive(Debug, Clone, Serialize)]
pub struct TokenPair {
    pub access: String,
    pub refresh: String,
}

/// Issues and verifies tokens with a shared HMAC secret.
#[derive(Clone)]
pub struct TokenSigner {
    secret: SecretString,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl std::fmt::Debug for TokenSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenSigner")
            .field("secret", &"[REDACTED]")
            .field("access_ttl", &self.access_ttl)
            .field("refresh_ttl", &self.refresh_ttl)
            .finish()
    }
}

impl TokenSigner {
    /// Create a signer from token configuration.
    #[must_use]
    pub fn new(config: &TokenConfig) -> Self {
        Self {
            secret: config.secret.clone(),
            access_ttl: config.access_ttl,
            refresh_ttl: config.refresh_ttl,
        }
    }

    /// Issue a fresh access/refresh pair for `user_id`.
    ///
    /// # Errors
    ///
    /// Returns `TokenError::Signing` if signing fails.
    pub fn issue_pair(&self, user_id: UserId) -> Result<TokenPair, TokenError> {
        let now = now_secs();
        Ok(TokenPair {
            access: self.issue(user_id, TokenKind::Access, now)?,
            refresh: self.issue(user_id, TokenKind::Refresh, now)?,
        })
    }

    /// Issue a single token of `kind`, valid from `now`.
    ///
    /// # Errors
    ///
    /// Returns `TokenError::Signing` if signing fails.
    pub fn issue(&self, user_id: UserId, kind: TokenKind, now: i64) -> Result<String, TokenError> {
        let ttl = match kind {
            TokenKind::Access => self.access_ttl,
            TokenKind::Refresh => self.refresh_ttl,
        };
        let ttl = i64::try_from(ttl.as_secs()).unwrap_or(i64::MAX);

        let claims = Claims {
            sub: user_id,
            kind,
            iat: now,
            exp: now.saturating_add(ttl),
        };

        let json = serde_json::to_vec(&claims).map_err(|e| TokenError::Signing(e.to_string()))?;
        let payload = URL_SAFE_NO_PAD.encode(json);
        let signature = self.sign(&payload)?;

        Ok(format!("{payload}.{signature}"))
    }

    /// Verify a token of the `expected` kind against the current time.
    ///
    /// # Errors
    ///
    /// Returns an error if the token is malformed, tampered with, expired, or
    /// of the wrong kind.
    pub fn verify(&self, token: &str, expected: TokenKind) -> Result<Claims, TokenError> {
        self.verify_at(token, expected, now_secs())
    }

    /// Verify a token of the `expected` kind as of `now`.
    ///
    /// # Errors
    ///
    /// Returns an error if the token is malformed, tampered with, expired, or
    /// of the wrong kind.
    pub fn verify_at(
        &self,
        token: &str,
        expected: TokenKind,
        now: i64,
    ) -> Result<Claims, TokenError> {
        let (payload, signature) = token.split_once('.').ok_or(TokenError::Malformed)?;
        if payload.is_empty() || signature.is_empty() {
            return Err(TokenError::Malformed);
        }

        let expected_signature = self.sign(payload)?;
        if !constant_time_compare(&expected_signature, signature) {
            return Err(TokenError::BadSignature);
        }

        let json = URL_SAFE_NO_PAD
            .decode(payload)
            .map_err(|_| TokenError::Malformed)?;
        let claims: Claims = serde_json::from_slice(&json).map_err(|_| TokenError::Malformed)?;

        if claims.kind != expected {
            return Err(TokenError::WrongKind);
        }
        if claims.exp <= now {
            return Err(TokenError::Expired);
        }

        Ok(claims)
    }

    fn sign(&self, payload: &str) -> Result<String, TokenError> {
        let mut mac = Hmac::<Sha256>::new_from_slice(self.secret.expose_secret().as_bytes())
            .map_err(|e| TokenError::Signing(e.to_string()))?;
        mac.update(payload.as_bytes());
        Ok(URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes()))
    }
}

fn now_secs() -> i64 {
    chrono::Utc::now().timestamp()
}

/// Constant-time string comparison to prevent timing attacks.
fn constant_time_compare(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut result: u8 = 0;
    for (x, y) in a.bytes().zip(b.bytes()) {
        result |= x ^ y;
    }

    result == 0
}
