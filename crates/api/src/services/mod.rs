//! Business logic services.
//!
//! # Services
//!
//! - `auth` - Password accounts and signed bearer tokens
//! - `email` - Order confirmation delivery via SMTP

pub mod auth;
pub mod email;

pub use auth::{AuthError, AuthService, TokenPair, TokenSigner};
pub use email::{EmailError, EmailService};
