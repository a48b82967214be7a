/// Auth Orchestrator
///
/// Coordinates the credential store, password hasher, lockout policy and
/// token issuer for registration, login, refresh, logout, admin user
/// creation and profile lookup. The password-reset and email-verification
/// flows live in their own impl blocks (`password_reset.rs`,
/// `verification.rs`).
use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use crate::auth::claims::TokenPurpose;
use crate::auth::jwt::{
    generate_access_token, generate_purpose_token, generate_refresh_token, validate_refresh_token,
};
use crate::auth::lockout::{self, LockState};
use crate::auth::password::{hash_password, verify_password};
use crate::auth::roles::{parse_roles, Role};
use crate::configuration::JwtSettings;
use crate::email_client::Mailer;
use crate::error::{AppError, AuthError};
use crate::patients::PatientDirectory;
use crate::store::{CredentialStore, NewUser, User};
use crate::validators::{is_valid_email, is_valid_name};

/// A freshly minted access/refresh pair.
#[derive(Debug, Clone)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

pub struct AuthService {
    store: Arc<dyn CredentialStore>,
    patients: Arc<dyn PatientDirectory>,
    mailer: Arc<dyn Mailer>,
    jwt: JwtSettings,
    frontend_url: String,
}

/// Validated registration input.
pub struct Registration {
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
}

impl AuthService {
    pub fn new(
        store: Arc<dyn CredentialStore>,
        patients: Arc<dyn PatientDirectory>,
        mailer: Arc<dyn Mailer>,
        jwt: JwtSettings,
        frontend_url: String,
    ) -> Self {
        Self {
            store,
            patients,
            mailer,
            jwt,
            frontend_url,
        }
    }

    pub(super) fn jwt_settings(&self) -> &JwtSettings {
        &self.jwt
    }

    pub(super) fn store(&self) -> &dyn CredentialStore {
        self.store.as_ref()
    }

    pub(super) fn mailer(&self) -> &Arc<dyn Mailer> {
        &self.mailer
    }

    pub(super) fn frontend_url(&self) -> &str {
        &self.frontend_url
    }

    /// Self-registration. The account always gets exactly the Patient role;
    /// elevated roles only come from the admin path.
    pub async fn register(&self, input: Registration) -> Result<(TokenPair, User), AppError> {
        let user = self
            .create_account(input, vec![Role::Patient])
            .await?;

        // Best-effort patient profile; registration succeeds regardless.
        if let Err(e) = self
            .patients
            .create_from_user(user.id, &user.email, &user.first_name, &user.last_name)
            .await
        {
            tracing::error!(user_id = %user.id, error = %e, "Failed to create patient profile");
        }

        let tokens = self.issue_and_persist_tokens(&user).await?;
        self.dispatch_verification_email(&user);

        tracing::info!(user_id = %user.id, "User registered");
        Ok((tokens, user))
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<(TokenPair, User), AppError> {
        let email = is_valid_email(email)?;

        // Unknown email gets the same generic error as a wrong password.
        let user = self
            .store
            .find_by_email(&email)
            .await?
            .ok_or(AppError::Auth(AuthError::InvalidCredentials))?;

        let now = Utc::now();
        if let LockState::Locked { minutes_remaining } = lockout::check(user.locked_until, now) {
            return Err(AppError::Auth(AuthError::AccountLocked(minutes_remaining)));
        }

        if !verify_password(password, &user.password_hash)? {
            let outcome = lockout::record_failure(user.failed_login_attempts, now);
            self.store
                .record_failed_login(user.id, outcome.attempts, outcome.locked_until)
                .await?;

            if outcome.locked_until.is_some() {
                tracing::warn!(user_id = %user.id, "Account locked after repeated failures");
                return Err(AppError::Auth(AuthError::AccountLocked(
                    lockout::LOCKOUT_DURATION_MINUTES,
                )));
            }
            return Err(AppError::Auth(AuthError::InvalidCredentials));
        }

        if user.failed_login_attempts > 0 || user.locked_until.is_some() {
            self.store.reset_login_failures(user.id).await?;
        }

        let tokens = self.issue_and_persist_tokens(&user).await?;

        tracing::info!(user_id = %user.id, "User logged in");
        Ok((tokens, user))
    }

    /// Rotate a refresh token. The presented token must verify against the
    /// refresh secret AND equal the stored current value; a rotated-out token
    /// is rejected even while cryptographically valid.
    pub async fn refresh_token(&self, presented: &str) -> Result<TokenPair, AppError> {
        let claims = validate_refresh_token(presented, &self.jwt)
            .map_err(|_| AppError::Auth(AuthError::InvalidRefreshToken))?;
        let user_id = claims
            .user_id()
            .map_err(|_| AppError::Auth(AuthError::InvalidRefreshToken))?;

        let user = self
            .store
            .find_by_id(user_id)
            .await?
            .ok_or(AppError::Auth(AuthError::InvalidRefreshToken))?;

        if user.refresh_token.as_deref() != Some(presented) {
            tracing::warn!(user_id = %user.id, "Superseded or cleared refresh token presented");
            return Err(AppError::Auth(AuthError::InvalidRefreshToken));
        }

        let tokens = self.issue_and_persist_tokens(&user).await?;

        tracing::info!(user_id = %user.id, "Refresh token rotated");
        Ok(tokens)
    }

    /// Clear the stored refresh token. Idempotent; the presented access
    /// token stays valid until its own expiry.
    pub async fn logout(&self, user_id: Uuid) -> Result<(), AppError> {
        self.store.update_refresh_token(user_id, None).await?;
        tracing::info!(user_id = %user_id, "User logged out");
        Ok(())
    }

    /// Admin-only creation of accounts with arbitrary role sets drawn from
    /// the closed enumeration.
    pub async fn create_user_with_role(
        &self,
        input: Registration,
        raw_roles: &[String],
        admin_id: Uuid,
    ) -> Result<(TokenPair, User), AppError> {
        if raw_roles.is_empty() {
            return Err(AppError::Conflict(
                "At least one role must be specified".to_string(),
            ));
        }
        let roles = parse_roles(raw_roles).map_err(AppError::Conflict)?;

        let user = self.create_account(input, roles).await?;

        tracing::info!(
            admin_id = %admin_id,
            user_id = %user.id,
            roles = ?user.roles,
            "User created by admin"
        );

        let tokens = self.issue_and_persist_tokens(&user).await?;
        self.dispatch_verification_email(&user);

        Ok((tokens, user))
    }

    pub async fn get_profile(&self, user_id: Uuid) -> Result<User, AppError> {
        self.store
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))
    }

    /// Shared validation/creation path for registration and admin creation.
    async fn create_account(
        &self,
        input: Registration,
        roles: Vec<Role>,
    ) -> Result<User, AppError> {
        let email = is_valid_email(&input.email)?;
        let first_name = is_valid_name("firstName", &input.first_name)?;
        let last_name = is_valid_name("lastName", &input.last_name)?;
        let password_hash = hash_password(&input.password)?;

        if self.store.find_by_email(&email).await?.is_some() {
            return Err(AppError::Conflict(
                "User with this email already exists".to_string(),
            ));
        }

        self.store
            .insert(NewUser {
                email,
                password_hash,
                first_name,
                last_name,
                roles,
            })
            .await
    }

    async fn issue_and_persist_tokens(&self, user: &User) -> Result<TokenPair, AppError> {
        let access_token = generate_access_token(user.id, &user.roles, &self.jwt)?;
        let refresh_token = generate_refresh_token(user.id, &user.roles, &self.jwt)?;

        self.store
            .update_refresh_token(user.id, Some(&refresh_token))
            .await?;

        Ok(TokenPair {
            access_token,
            refresh_token,
        })
    }

    /// Fire-and-forget verification email; failure is logged and swallowed.
    fn dispatch_verification_email(&self, user: &User) {
        let token = match generate_purpose_token(user.id, TokenPurpose::EmailVerification, &self.jwt)
        {
            Ok(token) => token,
            Err(e) => {
                tracing::error!(user_id = %user.id, error = %e, "Failed to mint verification token");
                return;
            }
        };

        let mailer = Arc::clone(&self.mailer);
        let recipient = user.email.clone();
        let body = super::verification::verification_email_body(&self.frontend_url, &token);
        let user_id = user.id;

        tokio::spawn(async move {
            if let Err(e) = mailer
                .send_email(&recipient, "Verify your email address", &body)
                .await
            {
                tracing::error!(user_id = %user_id, error = %e, "Failed to send verification email");
            }
        });
    }
}
