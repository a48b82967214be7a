/// JWT Claims structures
///
/// `Claims` is the payload shared by access and refresh tokens (they differ
/// only in signing secret and lifetime). `PurposeClaims` is the payload of
/// the single-purpose email-verification and password-reset tokens; the two
/// shapes deliberately do not overlap, so one kind can never deserialize as
/// the other.
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::roles::Role;
use crate::error::{AppError, AuthError};

/// Claims for access and refresh tokens
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Subject (user ID as UUID string)
    pub sub: String,
    /// Unique token id. `iat`/`exp` have second granularity, so without this
    /// two tokens minted for the same account in the same second would be
    /// byte-identical and rotation could not distinguish old from new.
    pub jti: String,
    /// Roles held by the account at issuance time
    pub roles: Vec<Role>,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Issuer
    pub iss: String,
}

impl Claims {
    pub fn new(user_id: Uuid, roles: Vec<Role>, expiry_seconds: i64, issuer: String) -> Self {
        let now = chrono::Utc::now().timestamp();
        Self {
            sub: user_id.to_string(),
            jti: Uuid::new_v4().to_string(),
            roles,
            exp: now + expiry_seconds,
            iat: now,
            iss: issuer,
        }
    }

    /// Extract the user ID from the subject claim.
    pub fn user_id(&self) -> Result<Uuid, AppError> {
        Uuid::parse_str(&self.sub)
            .map_err(|_| AppError::Internal("Invalid user ID in token".to_string()))
    }

    /// Fails with a 403-class error unless the claims carry the given role.
    pub fn require_role(&self, role: Role) -> Result<(), AppError> {
        if self.roles.contains(&role) {
            Ok(())
        } else {
            Err(AppError::Auth(AuthError::InsufficientRole))
        }
    }
}

/// Purpose tag carried by out-of-band tokens. Validation checks the tag, so
/// a reset token can never redeem a verification flow or vice versa.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TokenPurpose {
    EmailVerification,
    PasswordReset,
}

/// Claims for email-verification and password-reset tokens
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct PurposeClaims {
    pub sub: String,
    pub purpose: TokenPurpose,
    pub exp: i64,
    pub iat: i64,
    pub iss: String,
}

impl PurposeClaims {
    pub fn new(user_id: Uuid, purpose: TokenPurpose, expiry_seconds: i64, issuer: String) -> Self {
        let now = chrono::Utc::now().timestamp();
        Self {
            sub: user_id.to_string(),
            purpose,
            exp: now + expiry_seconds,
            iat: now,
            iss: issuer,
        }
    }

    pub fn user_id(&self) -> Result<Uuid, AppError> {
        Uuid::parse_str(&self.sub)
            .map_err(|_| AppError::Internal("Invalid user ID in token".to_string()))
    }
}
