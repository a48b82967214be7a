/// Credential Store
///
/// Persistence seam for user identity records. The orchestrator only ever
/// talks to the `CredentialStore` trait; production wires in the Postgres
/// implementation, tests use the in-memory one.
mod postgres;

pub use postgres::PgCredentialStore;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::auth::Role;
use crate::error::AppError;

/// A user identity record.
#[derive(Debug, Clone)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    pub roles: Vec<Role>,
    pub failed_login_attempts: i32,
    pub locked_until: Option<DateTime<Utc>>,
    /// The single honored refresh token. Rotation overwrites it; logout and
    /// password reset clear it.
    pub refresh_token: Option<String>,
    pub email_verified: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields required to create a user row.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    pub roles: Vec<Role>,
}

/// All mutations are single-row, single-account updates; concurrent calls for
/// the same account are last-write-wins.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, AppError>;

    async fn insert(&self, new_user: NewUser) -> Result<User, AppError>;

    /// Set or clear the single current refresh token.
    async fn update_refresh_token(&self, id: Uuid, token: Option<&str>) -> Result<(), AppError>;

    /// Persist a failed-login outcome (counter plus optional lock timestamp).
    async fn record_failed_login(
        &self,
        id: Uuid,
        attempts: i32,
        locked_until: Option<DateTime<Utc>>,
    ) -> Result<(), AppError>;

    /// Reset the failure counter and clear any lock after a successful login.
    async fn reset_login_failures(&self, id: Uuid) -> Result<(), AppError>;

    /// Replace the password hash and clear the refresh token in one update,
    /// so a password reset always invalidates existing sessions.
    async fn replace_password(&self, id: Uuid, password_hash: &str) -> Result<(), AppError>;

    async fn mark_email_verified(&self, id: Uuid) -> Result<(), AppError>;
}
