/// Postgres-backed credential store.
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::auth::Role;
use crate::error::{AppError, DatabaseError};
use crate::store::{CredentialStore, NewUser, User};

pub struct PgCredentialStore {
    pool: PgPool,
}

impl PgCredentialStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Raw row shape; `roles` comes back as text[] and is parsed into the closed
/// enum on the way out.
#[derive(sqlx::FromRow)]
struct UserRow {
    id: Uuid,
    email: String,
    password_hash: String,
    first_name: String,
    last_name: String,
    roles: Vec<String>,
    failed_login_attempts: i32,
    locked_until: Option<DateTime<Utc>>,
    refresh_token: Option<String>,
    email_verified: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = AppError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let mut roles = Vec::with_capacity(row.roles.len());
        for raw in &row.roles {
            let role = raw.parse::<Role>().map_err(|bad| {
                AppError::Database(DatabaseError::UnexpectedError(format!(
                    "unknown role '{}' stored for user {}",
                    bad, row.id
                )))
            })?;
            roles.push(role);
        }

        Ok(User {
            id: row.id,
            email: row.email,
            password_hash: row.password_hash,
            first_name: row.first_name,
            last_name: row.last_name,
            roles,
            failed_login_attempts: row.failed_login_attempts,
            locked_until: row.locked_until,
            refresh_token: row.refresh_token,
            email_verified: row.email_verified,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

const USER_COLUMNS: &str = "id, email, password_hash, first_name, last_name, roles, \
     failed_login_attempts, locked_until, refresh_token, email_verified, created_at, updated_at";

#[async_trait]
impl CredentialStore for PgCredentialStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {} FROM users WHERE email = $1",
            USER_COLUMNS
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        row.map(User::try_from).transpose()
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, AppError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {} FROM users WHERE id = $1",
            USER_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(User::try_from).transpose()
    }

    async fn insert(&self, new_user: NewUser) -> Result<User, AppError> {
        let roles: Vec<String> = new_user.roles.iter().map(|r| r.to_string()).collect();
        let now = Utc::now();

        let row = sqlx::query_as::<_, UserRow>(&format!(
            r#"
            INSERT INTO users
                (id, email, password_hash, first_name, last_name, roles,
                 failed_login_attempts, locked_until, refresh_token, email_verified,
                 created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, 0, NULL, NULL, FALSE, $7, $7)
            RETURNING {}
            "#,
            USER_COLUMNS
        ))
        .bind(Uuid::new_v4())
        .bind(&new_user.email)
        .bind(&new_user.password_hash)
        .bind(&new_user.first_name)
        .bind(&new_user.last_name)
        .bind(&roles)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;

        User::try_from(row)
    }

    async fn update_refresh_token(&self, id: Uuid, token: Option<&str>) -> Result<(), AppError> {
        sqlx::query("UPDATE users SET refresh_token = $1, updated_at = $2 WHERE id = $3")
            .bind(token)
            .bind(Utc::now())
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn record_failed_login(
        &self,
        id: Uuid,
        attempts: i32,
        locked_until: Option<DateTime<Utc>>,
    ) -> Result<(), AppError> {
        // A failure below the threshold must not clear an existing lock, so
        // the lock column is only written when a new lock engages.
        match locked_until {
            Some(until) => {
                sqlx::query(
                    "UPDATE users SET failed_login_attempts = $1, locked_until = $2, \
                     updated_at = $3 WHERE id = $4",
                )
                .bind(attempts)
                .bind(until)
                .bind(Utc::now())
                .bind(id)
                .execute(&self.pool)
                .await?;
            }
            None => {
                sqlx::query(
                    "UPDATE users SET failed_login_attempts = $1, updated_at = $2 WHERE id = $3",
                )
                .bind(attempts)
                .bind(Utc::now())
                .bind(id)
                .execute(&self.pool)
                .await?;
            }
        }
        Ok(())
    }

    async fn reset_login_failures(&self, id: Uuid) -> Result<(), AppError> {
        sqlx::query(
            "UPDATE users SET failed_login_attempts = 0, locked_until = NULL, \
             updated_at = $1 WHERE id = $2",
        )
        .bind(Utc::now())
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn replace_password(&self, id: Uuid, password_hash: &str) -> Result<(), AppError> {
        // Hash replacement and session invalidation happen in one statement.
        sqlx::query(
            "UPDATE users SET password_hash = $1, refresh_token = NULL, \
             updated_at = $2 WHERE id = $3",
        )
        .bind(password_hash)
        .bind(Utc::now())
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn mark_email_verified(&self, id: Uuid) -> Result<(), AppError> {
        sqlx::query("UPDATE users SET email_verified = TRUE, updated_at = $1 WHERE id = $2")
            .bind(Utc::now())
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
