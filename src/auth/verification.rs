/// Email verification flow.
///
/// Verification tokens are 24-hour single-purpose JWTs delivered as a link
/// to the frontend; redemption flips `email_verified` on the account.
use uuid::Uuid;

use crate::auth::claims::TokenPurpose;
use crate::auth::jwt::{generate_purpose_token, validate_purpose_token};
use crate::auth::service::AuthService;
use crate::error::{AppError, ValidationError};

pub(super) fn verification_email_body(frontend_url: &str, token: &str) -> String {
    let link = format!("{}/verify-email?token={}", frontend_url, token);
    format!(
        "<p>Welcome!</p>\
         <p>Please confirm your email address by clicking the link below. \
         The link expires in 24 hours.</p>\
         <p><a href=\"{}\">Verify email</a></p>",
        link
    )
}

impl AuthService {
    /// Mint and send a verification link. Core send path: does not care
    /// whether the address is already verified.
    pub async fn send_verification_email(&self, user_id: Uuid) -> Result<(), AppError> {
        let user = self
            .store()
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

        let token =
            generate_purpose_token(user.id, TokenPurpose::EmailVerification, self.jwt_settings())?;
        let body = verification_email_body(self.frontend_url(), &token);

        self.mailer()
            .send_email(&user.email, "Verify your email address", &body)
            .await?;

        tracing::info!(user_id = %user.id, "Verification email sent");
        Ok(())
    }

    /// Boundary wrapper for the resend endpoint: an already-verified account
    /// is rejected here, not in the send path.
    pub async fn resend_verification(&self, user_id: Uuid) -> Result<(), AppError> {
        let user = self
            .store()
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

        if user.email_verified {
            return Err(AppError::Validation(ValidationError::InvalidFormat(
                "Email is already verified".to_string(),
            )));
        }

        self.send_verification_email(user_id).await
    }

    /// Redeem a verification token. Any token failure or unknown account
    /// collapses to one generic error.
    pub async fn verify_email(&self, token: &str) -> Result<(), AppError> {
        let claims = validate_purpose_token(
            token,
            TokenPurpose::EmailVerification,
            self.jwt_settings(),
        )
        .map_err(|_| invalid_verification_token())?;

        let user_id = claims.user_id().map_err(|_| invalid_verification_token())?;
        let user = self
            .store()
            .find_by_id(user_id)
            .await?
            .ok_or_else(invalid_verification_token)?;

        self.store().mark_email_verified(user.id).await?;

        tracing::info!(user_id = %user.id, "Email verified");
        Ok(())
    }
}

fn invalid_verification_token() -> AppError {
    AppError::Validation(ValidationError::InvalidFormat(
        "Invalid or expired verification token".to_string(),
    ))
}
