/// Email verification routes

use actix_web::{web, HttpResponse};
use serde::Deserialize;
use serde_json::json;

use crate::auth::{AuthService, Claims};
use crate::error::AppError;

#[derive(Deserialize)]
pub struct VerifyEmailRequest {
    pub token: String,
}

/// POST /auth/resend-verification
///
/// # Errors
/// - 400: email already verified
/// - 404: account behind the token no longer exists
pub async fn resend_verification(
    claims: web::ReqData<Claims>,
    service: web::Data<AuthService>,
) -> Result<HttpResponse, AppError> {
    let user_id = claims.user_id()?;
    service.resend_verification(user_id).await?;

    Ok(HttpResponse::Ok().json(json!({ "message": "Verification email sent" })))
}

/// POST /auth/verify-email
///
/// # Errors
/// - 400: invalid or expired verification token
pub async fn verify_email(
    form: web::Json<VerifyEmailRequest>,
    service: web::Data<AuthService>,
) -> Result<HttpResponse, AppError> {
    service.verify_email(&form.token).await?;

    Ok(HttpResponse::Ok().json(json!({ "message": "Email verified successfully" })))
}
