//! User domain types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use marketstall_core::{Email, Role, UserId, Username};

/// A registered account (domain type).
#[derive(Debug, Clone)]
pub struct User {
    /// Unique user ID.
    pub id: UserId,
    /// Login name, unique across all accounts.
    pub username: Username,
    /// Contact address, used for order confirmations.
    pub email: Email,
    /// Customer or Retailer.
    pub role: Role,
    /// When the account was created.
    pub created_at: DateTime<Utc>,
    /// When the account was last updated.
    pub updated_at: DateTime<Utc>,
}

/// Partial update to a user's profile. `None` fields are left unchanged.
#[derive(Debug, Clone, Default)]
pub struct UserChanges {
    pub username: Option<Username>,
    pub email: Option<Email>,
    pub role: Option<Role>,
}

impl UserChanges {
    /// Whether the update would change nothing.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.username.is_none() && self.email.is_none() && self.role.is_none()
    }
}

/// The authenticated principal of a request.
///
/// Loaded fresh from the database on every request, so role changes and
/// account deletion take effect immediately.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentUser {
    /// User's database ID.
    pub id: UserId,
    /// User's login name.
    pub username: Username,
    /// User's email address.
    pub email: Email,
    /// User's role.
    pub role: Role,
}

impl From<User> for CurrentUser {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            role: user.role,
        }
    }
}
