//! CLI subcommands.

pub mod migrate;
pub mod user;

use secrecy::SecretString;

/// Read the database URL, falling back to the generic `DATABASE_URL`.
fn database_url() -> Option<SecretString> {
    dotenvy::dotenv().ok();

    std::env::var("MARKETSTALL_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
        .ok()
        .map(SecretString::from)
}
