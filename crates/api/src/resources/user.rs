//! Account payloads: registration, profile, and token exchange.

use serde::{Deserialize, Serialize};

use marketstall_core::{Email, Role, UserId, Username};

use super::{ValidationErrors, require};
use crate::models::{CurrentUser, User, UserChanges};
use crate::services::auth::validate_password;

const INVALID_EMAIL: &str = "Enter a valid email address.";

/// `POST /register/` body.
#[derive(Debug, Default, Deserialize)]
pub struct RegisterRequest {
    pub username: Option<String>,
    pub password: Option<String>,
    pub email: Option<String>,
    pub role: Option<String>,
}

/// A validated registration.
#[derive(Debug, Clone)]
pub struct Registration {
    pub username: Username,
    pub password: String,
    pub email: Email,
    pub role: Role,
}

impl RegisterRequest {
    /// Validate every field, collecting all failures.
    ///
    /// # Errors
    ///
    /// Returns the per-field validation messages.
    pub fn validate(self) -> Result<Registration, ValidationErrors> {
        let mut errors = ValidationErrors::new();

        let username = require(&mut errors, "username", self.username)
            .and_then(|raw| parse_username(&mut errors, &raw));
        let password = require(&mut errors, "password", self.password).and_then(|raw| {
            if raw.is_empty() {
                errors.add("password", super::BLANK);
                return None;
            }
            match validate_password(&raw) {
                Ok(()) => Some(raw),
                Err(crate::services::AuthError::WeakPassword(msg)) => {
                    errors.add("password", msg);
                    None
                }
                Err(other) => {
                    errors.add("password", other.to_string());
                    None
                }
            }
        });
        let email = require(&mut errors, "email", self.email)
            .and_then(|raw| parse_email(&mut errors, &raw));
        let role = require(&mut errors, "role", self.role)
            .and_then(|raw| parse_role(&mut errors, &raw));

        match (username, password, email, role) {
            (Some(username), Some(password), Some(email), Some(role)) if errors.is_empty() => {
                Ok(Registration {
                    username,
                    password,
                    email,
                    role,
                })
            }
            _ => Err(errors),
        }
    }
}

/// `PUT /user/` body. Every field is optional.
#[derive(Debug, Default, Deserialize)]
pub struct UserUpdateRequest {
    pub username: Option<String>,
    pub email: Option<String>,
    pub role: Option<String>,
}

impl UserUpdateRequest {
    /// Validate the fields that were supplied.
    ///
    /// # Errors
    ///
    /// Returns the per-field validation messages.
    pub fn validate(self) -> Result<UserChanges, ValidationErrors> {
        let mut errors = ValidationErrors::new();

        let changes = UserChanges {
            username: self
                .username
                .and_then(|raw| parse_username(&mut errors, &raw)),
            email: self.email.and_then(|raw| parse_email(&mut errors, &raw)),
            role: self.role.and_then(|raw| parse_role(&mut errors, &raw)),
        };

        errors.finish(|| changes)
    }
}

/// A user as returned by `GET /user/`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserResponse {
    pub id: UserId,
    pub username: Username,
    pub email: Email,
    pub role: Role,
}

impl From<&User> for UserResponse {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            email: user.email.clone(),
            role: user.role,
        }
    }
}

impl From<&CurrentUser> for UserResponse {
    fn from(user: &CurrentUser) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            email: user.email.clone(),
            role: user.role,
        }
    }
}

/// `POST /token/` body.
#[derive(Debug, Default, Deserialize)]
pub struct TokenRequest {
    pub username: Option<String>,
    pub password: Option<String>,
}

impl TokenRequest {
    /// Check both credentials were supplied.
    ///
    /// # Errors
    ///
    /// Returns "required" or "blank" messages for missing fields.
    pub fn validate(self) -> Result<(String, String), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        let username = non_blank(&mut errors, "username", self.username);
        let password = non_blank(&mut errors, "password", self.password);

        match (username, password) {
            (Some(username), Some(password)) => Ok((username, password)),
            _ => Err(errors),
        }
    }
}

/// `POST /token/refresh/` body.
#[derive(Debug, Default, Deserialize)]
pub struct RefreshRequest {
    pub refresh: Option<String>,
}

impl RefreshRequest {
    /// Check the refresh token was supplied.
    ///
    /// # Errors
    ///
    /// Returns "required" or "blank" for a missing token.
    pub fn validate(self) -> Result<String, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        non_blank(&mut errors, "refresh", self.refresh).ok_or(errors)
    }
}

/// `POST /token/refresh/` response.
#[derive(Debug, Clone, Serialize)]
pub struct AccessResponse {
    pub access: String,
}

fn non_blank(errors: &mut ValidationErrors, field: &str, value: Option<String>) -> Option<String> {
    let value = require(errors, field, value)?;
    if value.is_empty() {
        errors.add(field, super::BLANK);
        return None;
    }
    Some(value)
}

fn parse_username(errors: &mut ValidationErrors, raw: &str) -> Option<Username> {
    Username::parse(raw)
        .map_err(|e| errors.add("username", e.to_string()))
        .ok()
}

fn parse_email(errors: &mut ValidationErrors, raw: &str) -> Option<Email> {
    Email::parse(raw)
        .map_err(|_| errors.add("email", INVALID_EMAIL))
        .ok()
}

fn parse_role(errors: &mut ValidationErrors, raw: &str) -> Option<Role> {
    raw.parse::<Role>()
        .map_err(|e| errors.add("role", e.to_string()))
        .ok()
}
