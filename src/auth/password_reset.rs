/// Password reset flow.
///
/// Reset tokens are 1-hour single-purpose JWTs delivered as a link to the
/// frontend. The request endpoint answers identically whether or not the
/// email exists; redemption replaces the hash and kills every session by
/// clearing the stored refresh token.
use crate::auth::claims::TokenPurpose;
use crate::auth::jwt::{generate_purpose_token, validate_purpose_token};
use crate::auth::password::hash_password;
use crate::auth::service::AuthService;
use crate::error::{AppError, ValidationError};
use crate::validators::is_valid_email;

pub const RESET_REQUESTED_MESSAGE: &str =
    "If the email exists, a password reset link has been sent";
pub const RESET_DONE_MESSAGE: &str = "Password has been reset successfully";

fn reset_email_body(frontend_url: &str, token: &str) -> String {
    let link = format!("{}/reset-password?token={}", frontend_url, token);
    format!(
        "<p>A password reset was requested for your account.</p>\
         <p>Click the link below to choose a new password. \
         The link expires in 1 hour.</p>\
         <p><a href=\"{}\">Reset password</a></p>\
         <p>If you did not request this, you can ignore this email.</p>",
        link
    )
}

impl AuthService {
    /// Request a reset link. The response is the same generic message for
    /// existing and unknown emails; a failed email dispatch is logged and
    /// swallowed so it cannot change that answer either.
    pub async fn request_password_reset(&self, email: &str) -> Result<&'static str, AppError> {
        let email = is_valid_email(email)?;

        if let Some(user) = self.store().find_by_email(&email).await? {
            let token =
                generate_purpose_token(user.id, TokenPurpose::PasswordReset, self.jwt_settings())?;
            let body = reset_email_body(self.frontend_url(), &token);

            if let Err(e) = self
                .mailer()
                .send_email(&user.email, "Reset your password", &body)
                .await
            {
                tracing::error!(user_id = %user.id, error = %e, "Failed to send reset email");
            } else {
                tracing::info!(user_id = %user.id, "Password reset email sent");
            }
        }

        Ok(RESET_REQUESTED_MESSAGE)
    }

    /// Redeem a reset token. On success the new hash is stored and the
    /// refresh token cleared in one update, invalidating all sessions.
    pub async fn reset_password(
        &self,
        token: &str,
        new_password: &str,
    ) -> Result<&'static str, AppError> {
        let claims =
            validate_purpose_token(token, TokenPurpose::PasswordReset, self.jwt_settings())
                .map_err(|_| invalid_reset_token())?;

        let user_id = claims.user_id().map_err(|_| invalid_reset_token())?;
        let user = self
            .store()
            .find_by_id(user_id)
            .await?
            .ok_or_else(invalid_reset_token)?;

        let password_hash = hash_password(new_password)?;
        self.store().replace_password(user.id, &password_hash).await?;

        tracing::info!(user_id = %user.id, "Password reset completed");
        Ok(RESET_DONE_MESSAGE)
    }
}

fn invalid_reset_token() -> AppError {
    AppError::Validation(ValidationError::InvalidFormat(
        "Invalid or expired reset token".to_string(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::service::{AuthService, Registration};
    use crate::auth::Role;
    use crate::configuration::JwtSettings;
    use crate::email_client::mock::MockMailer;
    use crate::patients::mock::MockPatientDirectory;
    use crate::store::memory::InMemoryCredentialStore;
    use crate::store::{CredentialStore, NewUser};
    use std::sync::Arc;
    use uuid::Uuid;

    fn jwt_settings() -> JwtSettings {
        JwtSettings {
            access_secret: "access-test-secret-at-least-32-chars".to_string(),
            refresh_secret: "refresh-test-secret-at-least-32-chars".to_string(),
            access_token_expiry: 900,
            refresh_token_expiry: 604800,
            issuer: "hospital-api-test".to_string(),
        }
    }

    fn harness_with_mailer(
        mailer: Arc<MockMailer>,
    ) -> (AuthService, Arc<InMemoryCredentialStore>) {
        let store = Arc::new(InMemoryCredentialStore::new());
        let service = AuthService::new(
            store.clone(),
            Arc::new(MockPatientDirectory::new()),
            mailer,
            jwt_settings(),
            "http://localhost:3000".to_string(),
        );
        (service, store)
    }

    async fn seed_user(store: &InMemoryCredentialStore) -> crate::store::User {
        store
            .insert(NewUser {
                email: "a@b.com".to_string(),
                password_hash: "$2b$12$hash".to_string(),
                first_name: "John".to_string(),
                last_name: "Doe".to_string(),
                roles: vec![Role::Patient],
            })
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn same_message_for_existing_and_unknown_emails() {
        let mailer = Arc::new(MockMailer::new());
        let (service, store) = harness_with_mailer(mailer.clone());
        seed_user(&store).await;

        let known = service.request_password_reset("a@b.com").await.unwrap();
        let unknown = service
            .request_password_reset("ghost@example.com")
            .await
            .unwrap();

        assert_eq!(known, unknown);
        // But only the existing account got an email.
        assert_eq!(mailer.sent_count(), 1);
        assert_eq!(mailer.last_sent().unwrap().recipient, "a@b.com");
    }

    #[tokio::test]
    async fn mailer_failure_does_not_change_the_response() {
        let mailer = Arc::new(MockMailer::failing());
        let (service, store) = harness_with_mailer(mailer);
        seed_user(&store).await;

        let message = service.request_password_reset("a@b.com").await.unwrap();
        assert_eq!(message, RESET_REQUESTED_MESSAGE);
    }

    #[tokio::test]
    async fn reset_password_replaces_hash_and_clears_refresh_token() {
        let (service, store) = harness_with_mailer(Arc::new(MockMailer::new()));
        let user = seed_user(&store).await;
        store
            .update_refresh_token(user.id, Some("live-refresh-token"))
            .await
            .unwrap();

        let token =
            generate_purpose_token(user.id, TokenPurpose::PasswordReset, &jwt_settings()).unwrap();
        let message = service.reset_password(&token, "NewPass@123").await.unwrap();
        assert_eq!(message, RESET_DONE_MESSAGE);

        let stored = store.get(user.id).unwrap();
        assert_ne!(stored.password_hash, "$2b$12$hash");
        assert!(stored.refresh_token.is_none());
    }

    #[tokio::test]
    async fn reset_invalidates_previously_issued_refresh_tokens() {
        let (service, store) = harness_with_mailer(Arc::new(MockMailer::new()));

        // Register through the service so a real refresh token is persisted.
        let (tokens, user) = service
            .register(Registration {
                email: "b@c.com".to_string(),
                password: "Patient@123".to_string(),
                first_name: "Jane".to_string(),
                last_name: "Doe".to_string(),
            })
            .await
            .unwrap();
        assert!(store.get(user.id).unwrap().refresh_token.is_some());

        let reset_token =
            generate_purpose_token(user.id, TokenPurpose::PasswordReset, &jwt_settings()).unwrap();
        service
            .reset_password(&reset_token, "NewPass@123")
            .await
            .unwrap();

        // The rotation check now fails: stored value is gone.
        assert!(service.refresh_token(&tokens.refresh_token).await.is_err());

        // And the new password is the one that logs in.
        assert!(service.login("b@c.com", "Patient@123").await.is_err());
        assert!(service.login("b@c.com", "NewPass@123").await.is_ok());
    }

    #[tokio::test]
    async fn garbage_reset_token_rejected() {
        let (service, _) = harness_with_mailer(Arc::new(MockMailer::new()));
        let err = service
            .reset_password("not.a.token", "NewPass@123")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn verification_token_cannot_reset_a_password() {
        let (service, store) = harness_with_mailer(Arc::new(MockMailer::new()));
        let user = seed_user(&store).await;

        let token =
            generate_purpose_token(user.id, TokenPurpose::EmailVerification, &jwt_settings())
                .unwrap();
        assert!(service.reset_password(&token, "NewPass@123").await.is_err());
    }

    #[tokio::test]
    async fn reset_token_for_deleted_account_rejected() {
        let (service, _) = harness_with_mailer(Arc::new(MockMailer::new()));
        let token =
            generate_purpose_token(Uuid::new_v4(), TokenPurpose::PasswordReset, &jwt_settings())
                .unwrap();
        assert!(service.reset_password(&token, "NewPass@123").await.is_err());
    }

    #[tokio::test]
    async fn weak_new_password_rejected() {
        let (service, store) = harness_with_mailer(Arc::new(MockMailer::new()));
        let user = seed_user(&store).await;

        let token =
            generate_purpose_token(user.id, TokenPurpose::PasswordReset, &jwt_settings()).unwrap();
        let err = service.reset_password(&token, "weakpass").await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));

        // Nothing was written.
        assert_eq!(store.get(user.id).unwrap().password_hash, "$2b$12$hash");
    }
}
