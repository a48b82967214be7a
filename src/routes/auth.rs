/// Authentication routes
///
/// Handles registration, login, token refresh, logout, profile lookup,
/// and admin-driven account creation.

use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};

use crate::auth::{AuthService, Claims, Registration, Role, TokenPair};
use crate::error::AppError;
use crate::store::User;

/// User registration request
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
}

/// User login request
#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Token refresh request
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    pub refresh_token: String,
}

/// Admin account creation request
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserRequest {
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    pub roles: Vec<String>,
}

/// Sanitized user view. Never exposes the password hash or the stored
/// refresh token.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub roles: Vec<Role>,
    pub email_verified: bool,
    pub created_at: String,
    pub updated_at: String,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id.to_string(),
            email: user.email,
            first_name: user.first_name,
            last_name: user.last_name,
            roles: user.roles,
            email_verified: user.email_verified,
            created_at: user.created_at.to_rfc3339(),
            updated_at: user.updated_at.to_rfc3339(),
        }
    }
}

/// Authentication response with both tokens and the account they belong to
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub user: UserResponse,
}

impl AuthResponse {
    fn new(tokens: TokenPair, user: User) -> Self {
        Self {
            access_token: tokens.access_token,
            refresh_token: tokens.refresh_token,
            user: user.into(),
        }
    }
}

/// Token-only response for the refresh endpoint
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenPairResponse {
    pub access_token: String,
    pub refresh_token: String,
}

impl From<TokenPair> for TokenPairResponse {
    fn from(tokens: TokenPair) -> Self {
        Self {
            access_token: tokens.access_token,
            refresh_token: tokens.refresh_token,
        }
    }
}

/// POST /auth/register
///
/// Self-service registration. Every account created here carries the
/// Patient role; staff roles are assigned through the admin endpoint.
///
/// # Errors
/// - 400: invalid email, name, or password policy violation
/// - 409: email already registered
pub async fn register(
    form: web::Json<RegisterRequest>,
    service: web::Data<AuthService>,
) -> Result<HttpResponse, AppError> {
    let form = form.into_inner();
    let (tokens, user) = service
        .register(Registration {
            email: form.email,
            password: form.password,
            first_name: form.first_name,
            last_name: form.last_name,
        })
        .await?;

    Ok(HttpResponse::Created().json(AuthResponse::new(tokens, user)))
}

/// POST /auth/login
///
/// # Errors
/// - 401: unknown email or wrong password (same message for both), or
///   account currently locked after repeated failures
pub async fn login(
    form: web::Json<LoginRequest>,
    service: web::Data<AuthService>,
) -> Result<HttpResponse, AppError> {
    let (tokens, user) = service.login(&form.email, &form.password).await?;

    Ok(HttpResponse::Ok().json(AuthResponse::new(tokens, user)))
}

/// POST /auth/refresh
///
/// Rotates the refresh token: the presented token must match the one on
/// record, and a fresh pair replaces it. A token that has already been
/// rotated out is rejected.
///
/// # Errors
/// - 401: invalid, expired, or superseded refresh token
pub async fn refresh(
    form: web::Json<RefreshRequest>,
    service: web::Data<AuthService>,
) -> Result<HttpResponse, AppError> {
    let tokens = service.refresh_token(&form.refresh_token).await?;

    Ok(HttpResponse::Ok().json(TokenPairResponse::from(tokens)))
}

/// POST /auth/logout
///
/// Clears the stored refresh token for the authenticated user. The request
/// body (clients conventionally send the refresh token) is ignored:
/// revocation is keyed on the authenticated user. Idempotent: logging out
/// twice succeeds both times.
pub async fn logout(
    claims: web::ReqData<Claims>,
    service: web::Data<AuthService>,
) -> Result<HttpResponse, AppError> {
    let user_id = claims.user_id()?;
    service.logout(user_id).await?;

    Ok(HttpResponse::NoContent().finish())
}

/// GET /auth/profile
///
/// # Errors
/// - 404: account behind the token no longer exists
pub async fn get_profile(
    claims: web::ReqData<Claims>,
    service: web::Data<AuthService>,
) -> Result<HttpResponse, AppError> {
    let user_id = claims.user_id()?;
    let user = service.get_profile(user_id).await?;

    Ok(HttpResponse::Ok().json(UserResponse::from(user)))
}

/// POST /auth/admin/create-user
///
/// Admin-only. Creates an account with an explicit role set.
///
/// # Errors
/// - 403: caller does not hold the Admin role
/// - 409: duplicate email, empty role list, or unknown role name
pub async fn admin_create_user(
    claims: web::ReqData<Claims>,
    form: web::Json<CreateUserRequest>,
    service: web::Data<AuthService>,
) -> Result<HttpResponse, AppError> {
    claims.require_role(Role::Admin)?;
    let admin_id = claims.user_id()?;

    let form = form.into_inner();
    let (tokens, user) = service
        .create_user_with_role(
            Registration {
                email: form.email,
                password: form.password,
                first_name: form.first_name,
                last_name: form.last_name,
            },
            &form.roles,
            admin_id,
        )
        .await?;

    Ok(HttpResponse::Created().json(AuthResponse::new(tokens, user)))
}
