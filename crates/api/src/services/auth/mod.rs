//! Authentication service.
//!
//! Password accounts with Argon2id hashes, and HMAC-signed bearer tokens
//! (see [`token`]) in place of server-side sessions.

mod error;
pub mod token;

pub use error::AuthError;
pub use token::{Claims, TokenError, TokenKind, TokenPair, TokenSigner};

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use sqlx::PgPool;

use marketstall_core::{Email, Role, Username};

use crate::db::RepositoryError;
use crate::db::users::UserRepository;
use crate::models::user::User;

/// Minimum password length.
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Authentication service.
///
/// Handles registration, password login, token refresh and resolving a
/// bearer token back to its user.
pub struct AuthService<'a> {
    users: UserRepository<'a>,
    signer: &'a TokenSigner,
}

impl<'a> AuthService<'a> {
    /// Create a new authentication service.
    #[must_use]
    pub const fn new(pool: &'a PgPool, signer: &'a TokenSigner) -> Self {
        Self {
            users: UserRepository::new(pool),
            signer,
        }
    }

    /// Register a new account.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::WeakPassword` if the password doesn't meet requirements.
    /// Returns `AuthError::UserAlreadyExists` if the username is taken.
    pub async fn register(
        &self,
        username: &Username,
        email: &Email,
        role: Role,
        password: &str,
    ) -> Result<User, AuthError> {
        validate_password(password)?;

        let password_hash = hash_password(password)?;

        self.users
            .create(username, email, role, &password_hash)
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(_) => AuthError::UserAlreadyExists,
                other => AuthError::Repository(other),
            })
    }

    /// Check a username and password and issue a token pair.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` if the username/password is wrong.
    pub async fn login(&self, username: &str, password: &str) -> Result<TokenPair, AuthError> {
        let (user, password_hash) = self
            .users
            .get_credentials(username)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        verify_password(password, &password_hash)?;

        Ok(self.signer.issue_pair(user.id)?)
    }

    /// Exchange a refresh token for a new access token.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidToken` if the refresh token is invalid or expired.
    /// Returns `AuthError::UserNotFound` if its user has been deleted.
    pub async fn refresh(&self, refresh_token: &str) -> Result<String, AuthError> {
        let claims = self.signer.verify(refresh_token, TokenKind::Refresh)?;

        // Deleted accounts cannot mint new access tokens
        if self.users.get_by_id(claims.sub).await?.is_none() {
            return Err(AuthError::UserNotFound);
        }

        Ok(self
            .signer
            .issue(claims.sub, TokenKind::Access, chrono::Utc::now().timestamp())?)
    }

    /// Resolve an access token to its user.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidToken` if the token is invalid or expired.
    /// Returns `AuthError::UserNotFound` if its user has been deleted.
    pub async fn authenticate(&self, access_token: &str) -> Result<User, AuthError> {
        let claims = self.signer.verify(access_token, TokenKind::Access)?;

        self.users
            .get_by_id(claims.sub)
            .await?
            .ok_or(AuthError::UserNotFound)
    }
}

/// Check that a password meets the minimum requirements.
///
/// # Errors
///
/// Returns `AuthError::WeakPassword` describing the failed requirement.
pub fn validate_password(password: &str) -> Result<(), AuthError> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(AuthError::WeakPassword(format!(
            "This password is too short. It must contain at least {MIN_PASSWORD_LENGTH} characters."
        )));
    }

    Ok(())
}

/// Hash a password using Argon2id.
///
/// # Errors
///
/// Returns `AuthError::PasswordHash` if hashing fails.
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AuthError::PasswordHash)
}

/// Verify a password against a hash.
fn verify_password(password: &str, hash: &str) -> Result<(), AuthError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| AuthError::InvalidCredentials)?;
    let argon2 = Argon2::default();

    argon2
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| AuthError::InvalidCredentials)
}
