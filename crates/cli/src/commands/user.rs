//! Account management commands.
//!
//! # Usage
//!
//! ```bash
//! MARKETSTALL_NEW_USER_PASSWORD='...' ms-cli user create -u shopkeeper -e shop@example.com -r Retailer
//! ```
//!
//! # Environment Variables
//!
//! - `MARKETSTALL_DATABASE_URL` - `PostgreSQL` connection string (falls back to `DATABASE_URL`)
//! - `MARKETSTALL_NEW_USER_PASSWORD` - Password for the new account

use secrecy::{ExposeSecret, SecretString};
use sqlx::PgPool;
use thiserror::Error;

use marketstall_api::db::{RepositoryError, UserRepository};
use marketstall_api::services::auth::{AuthError, hash_password, validate_password};
use marketstall_core::{Email, Role, UserId, Username};

const PASSWORD_ENV: &str = "MARKETSTALL_NEW_USER_PASSWORD";

/// Errors that can occur during account operations.
#[derive(Debug, Error)]
pub enum UserError {
    /// Required environment variable is missing.
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(&'static str),

    /// Database connection error.
    #[error("Database connection error: {0}")]
    Database(#[from] sqlx::Error),

    /// Invalid role.
    #[error("Invalid role: {0}. Valid roles: Customer, Retailer")]
    InvalidRole(String),

    /// Invalid username.
    #[error("Invalid username: {0}")]
    InvalidUsername(String),

    /// Invalid email.
    #[error("Invalid email: {0}")]
    InvalidEmail(String),

    /// Username already taken.
    #[error("A user already exists with username: {0}")]
    UserExists(String),

    /// Password rejected or could not be hashed.
    #[error("Password error: {0}")]
    Password(#[from] AuthError),

    /// Any other store failure.
    #[error("Repository error: {0}")]
    Repository(RepositoryError),
}

/// Create a new account.
///
/// # Arguments
///
/// * `username` - Login name
/// * `email` - Email address
/// * `role` - `Customer` or `Retailer`
///
/// # Returns
///
/// The ID of the created user.
pub async fn create(username: &str, email: &str, role: &str) -> Result<UserId, UserError> {
    let role: Role = role
        .parse()
        .map_err(|_| UserError::InvalidRole(role.to_owned()))?;
    let username =
        Username::parse(username).map_err(|e| UserError::InvalidUsername(e.to_string()))?;
    let email = Email::parse(email).map_err(|e| UserError::InvalidEmail(e.to_string()))?;

    let database_url =
        super::database_url().ok_or(UserError::MissingEnvVar("MARKETSTALL_DATABASE_URL"))?;
    let password = std::env::var(PASSWORD_ENV)
        .map(SecretString::from)
        .map_err(|_| UserError::MissingEnvVar(PASSWORD_ENV))?;

    validate_password(password.expose_secret())?;
    let password_hash = hash_password(password.expose_secret())?;

    tracing::info!("Connecting to database...");
    let pool = PgPool::connect(database_url.expose_secret()).await?;

    tracing::info!("Creating user: {} ({})", username, role);

    let user = UserRepository::new(&pool)
        .create(&username, &email, role, &password_hash)
        .await
        .map_err(|e| match e {
            RepositoryError::Conflict(_) => UserError::UserExists(username.to_string()),
            other => UserError::Repository(other),
        })?;

    tracing::info!(
        "User created successfully! ID: {}, Username: {}, Role: {}",
        user.id,
        user.username,
        user.role
    );

    Ok(user.id)
}
