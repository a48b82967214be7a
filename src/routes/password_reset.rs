/// Password reset routes
///
/// The forgot-password endpoint answers identically whether or not the
/// address is registered, so responses cannot be used to enumerate
/// accounts.

use actix_web::{web, HttpResponse};
use serde::Deserialize;
use serde_json::json;

use crate::auth::AuthService;
use crate::error::AppError;

#[derive(Deserialize)]
pub struct ForgotPasswordRequest {
    pub email: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetPasswordRequest {
    pub token: String,
    pub new_password: String,
}

/// POST /auth/forgot-password
///
/// # Errors
/// - 400: malformed email address
pub async fn forgot_password(
    form: web::Json<ForgotPasswordRequest>,
    service: web::Data<AuthService>,
) -> Result<HttpResponse, AppError> {
    let message = service.request_password_reset(&form.email).await?;

    Ok(HttpResponse::Ok().json(json!({ "message": message })))
}

/// POST /auth/reset-password
///
/// # Errors
/// - 400: invalid or expired reset token, or new password fails policy
pub async fn reset_password(
    form: web::Json<ResetPasswordRequest>,
    service: web::Data<AuthService>,
) -> Result<HttpResponse, AppError> {
    let message = service
        .reset_password(&form.token, &form.new_password)
        .await?;

    Ok(HttpResponse::Ok().json(json!({ "message": message })))
}
