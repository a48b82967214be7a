/// Patient profile collaborator.
///
/// Registration creates a patient profile as a best-effort side effect; the
/// auth flow must never fail because this did.
use async_trait::async_trait;
use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::AppError;

#[async_trait]
pub trait PatientDirectory: Send + Sync {
    async fn create_from_user(
        &self,
        user_id: Uuid,
        email: &str,
        first_name: &str,
        last_name: &str,
    ) -> Result<(), AppError>;
}

pub struct PgPatientDirectory {
    pool: PgPool,
}

impl PgPatientDirectory {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PatientDirectory for PgPatientDirectory {
    async fn create_from_user(
        &self,
        user_id: Uuid,
        email: &str,
        first_name: &str,
        last_name: &str,
    ) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO patients (id, user_id, email, first_name, last_name, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $6)
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(email)
        .bind(first_name)
        .bind(last_name)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

#[cfg(test)]
pub mod mock {
    use super::*;
    use std::sync::Mutex;

    /// Recording directory for orchestrator tests.
    pub struct MockPatientDirectory {
        pub created: Mutex<Vec<Uuid>>,
        pub fail: bool,
    }

    impl MockPatientDirectory {
        pub fn new() -> Self {
            Self {
                created: Mutex::new(Vec::new()),
                fail: false,
            }
        }

        pub fn failing() -> Self {
            Self {
                created: Mutex::new(Vec::new()),
                fail: true,
            }
        }

        pub fn created_count(&self) -> usize {
            self.created.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl PatientDirectory for MockPatientDirectory {
        async fn create_from_user(
            &self,
            user_id: Uuid,
            _email: &str,
            _first_name: &str,
            _last_name: &str,
        ) -> Result<(), AppError> {
            if self.fail {
                return Err(AppError::Internal(
                    "patient profile creation failed".to_string(),
                ));
            }
            self.created.lock().unwrap().push(user_id);
            Ok(())
        }
    }
}
