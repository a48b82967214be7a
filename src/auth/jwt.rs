/// Token Issuer
///
/// Mints and validates the three token kinds:
/// - access tokens: short-lived, signed with the access secret
/// - refresh tokens: long-lived, signed with the distinct refresh secret
/// - purpose tokens: email-verification (24h) and password-reset (1h)
///
/// Validation always selects the secret for the token's declared kind;
/// a token presented to the wrong validator fails closed.
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use uuid::Uuid;

use crate::auth::claims::{Claims, PurposeClaims, TokenPurpose};
use crate::auth::roles::Role;
use crate::configuration::JwtSettings;
use crate::error::{AppError, AuthError};

/// Lifetime of email-verification tokens (24 hours).
pub const VERIFICATION_TOKEN_EXPIRY_SECONDS: i64 = 24 * 60 * 60;
/// Lifetime of password-reset tokens (1 hour).
pub const RESET_TOKEN_EXPIRY_SECONDS: i64 = 60 * 60;

pub fn generate_access_token(
    user_id: Uuid,
    roles: &[Role],
    config: &JwtSettings,
) -> Result<String, AppError> {
    let claims = Claims::new(
        user_id,
        roles.to_vec(),
        config.access_token_expiry,
        config.issuer.clone(),
    );
    sign(&claims, &config.access_secret)
}

pub fn generate_refresh_token(
    user_id: Uuid,
    roles: &[Role],
    config: &JwtSettings,
) -> Result<String, AppError> {
    let claims = Claims::new(
        user_id,
        roles.to_vec(),
        config.refresh_token_expiry,
        config.issuer.clone(),
    );
    sign(&claims, &config.refresh_secret)
}

/// Mint a single-purpose token (email verification or password reset).
pub fn generate_purpose_token(
    user_id: Uuid,
    purpose: TokenPurpose,
    config: &JwtSettings,
) -> Result<String, AppError> {
    let expiry = match purpose {
        TokenPurpose::EmailVerification => VERIFICATION_TOKEN_EXPIRY_SECONDS,
        TokenPurpose::PasswordReset => RESET_TOKEN_EXPIRY_SECONDS,
    };
    let claims = PurposeClaims::new(user_id, purpose, expiry, config.issuer.clone());
    sign(&claims, &config.access_secret)
}

pub fn validate_access_token(token: &str, config: &JwtSettings) -> Result<Claims, AppError> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(config.access_secret.as_bytes()),
        &validation(&config.issuer),
    )
    .map(|data| data.claims)
    .map_err(|e| {
        tracing::warn!("Access token validation failed: {}", e);
        AppError::Auth(AuthError::TokenInvalid)
    })
}

pub fn validate_refresh_token(token: &str, config: &JwtSettings) -> Result<Claims, AppError> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(config.refresh_secret.as_bytes()),
        &validation(&config.issuer),
    )
    .map(|data| data.claims)
    .map_err(|e| {
        tracing::warn!("Refresh token validation failed: {}", e);
        AppError::Auth(AuthError::InvalidRefreshToken)
    })
}

/// Validate a purpose token and check its declared purpose.
pub fn validate_purpose_token(
    token: &str,
    expected: TokenPurpose,
    config: &JwtSettings,
) -> Result<PurposeClaims, AppError> {
    let claims = decode::<PurposeClaims>(
        token,
        &DecodingKey::from_secret(config.access_secret.as_bytes()),
        &validation(&config.issuer),
    )
    .map(|data| data.claims)
    .map_err(|e| {
        tracing::warn!("Purpose token validation failed: {}", e);
        AppError::Auth(AuthError::TokenInvalid)
    })?;

    if claims.purpose != expected {
        tracing::warn!(
            presented = ?claims.purpose,
            expected = ?expected,
            "Purpose token presented to the wrong flow"
        );
        return Err(AppError::Auth(AuthError::TokenInvalid));
    }

    Ok(claims)
}

fn sign<T: serde::Serialize>(claims: &T, secret: &str) -> Result<String, AppError> {
    encode(
        &Header::default(),
        claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| AppError::Internal(format!("Token generation failed: {}", e)))
}

fn validation(issuer: &str) -> Validation {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_issuer(&[issuer]);
    validation
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> JwtSettings {
        JwtSettings {
            access_secret: "access-test-secret-at-least-32-chars".to_string(),
            refresh_secret: "refresh-test-secret-at-least-32-chars".to_string(),
            access_token_expiry: 900,
            refresh_token_expiry: 604800,
            issuer: "hospital-api-test".to_string(),
        }
    }

    #[test]
    fn access_token_round_trip() {
        let config = test_config();
        let user_id = Uuid::new_v4();

        let token = generate_access_token(user_id, &[Role::Patient], &config).unwrap();
        let claims = validate_access_token(&token, &config).unwrap();

        assert_eq!(claims.sub, user_id.to_string());
        assert_eq!(claims.roles, vec![Role::Patient]);
        assert_eq!(claims.iss, "hospital-api-test");
    }

    #[test]
    fn refresh_token_round_trip() {
        let config = test_config();
        let user_id = Uuid::new_v4();

        let token = generate_refresh_token(user_id, &[Role::Doctor, Role::Admin], &config).unwrap();
        let claims = validate_refresh_token(&token, &config).unwrap();

        assert_eq!(claims.user_id().unwrap(), user_id);
        assert_eq!(claims.roles, vec![Role::Doctor, Role::Admin]);
    }

    #[test]
    fn tokens_minted_in_the_same_second_are_distinct() {
        let config = test_config();
        let user_id = Uuid::new_v4();

        // Identical account, roles and (second-granularity) timestamps; the
        // jti still makes each issuance a different string, which rotation
        // relies on to tell old tokens from new ones.
        let t1 = generate_refresh_token(user_id, &[Role::Patient], &config).unwrap();
        let t2 = generate_refresh_token(user_id, &[Role::Patient], &config).unwrap();
        assert_ne!(t1, t2);

        let a1 = generate_access_token(user_id, &[Role::Patient], &config).unwrap();
        let a2 = generate_access_token(user_id, &[Role::Patient], &config).unwrap();
        assert_ne!(a1, a2);
    }

    #[test]
    fn access_token_rejected_by_refresh_validator() {
        let config = test_config();
        let token = generate_access_token(Uuid::new_v4(), &[Role::Patient], &config).unwrap();
        assert!(validate_refresh_token(&token, &config).is_err());
    }

    #[test]
    fn refresh_token_rejected_by_access_validator() {
        let config = test_config();
        let token = generate_refresh_token(Uuid::new_v4(), &[Role::Patient], &config).unwrap();
        assert!(validate_access_token(&token, &config).is_err());
    }

    #[test]
    fn tampered_token_fails() {
        let config = test_config();
        let token = generate_access_token(Uuid::new_v4(), &[Role::Patient], &config).unwrap();
        let tampered = format!("{}X", token);
        assert!(validate_access_token(&tampered, &config).is_err());
    }

    #[test]
    fn wrong_issuer_fails() {
        let config = test_config();
        let token = generate_access_token(Uuid::new_v4(), &[Role::Patient], &config).unwrap();

        let mut other = test_config();
        other.issuer = "someone-else".to_string();
        assert!(validate_access_token(&token, &other).is_err());
    }

    #[test]
    fn expired_token_fails() {
        let mut config = test_config();
        config.access_token_expiry = -120; // iat in the past, exp further past
        let token = generate_access_token(Uuid::new_v4(), &[Role::Patient], &config).unwrap();

        let config = test_config();
        assert!(validate_access_token(&token, &config).is_err());
    }

    #[test]
    fn purpose_token_round_trip() {
        let config = test_config();
        let user_id = Uuid::new_v4();

        let token =
            generate_purpose_token(user_id, TokenPurpose::PasswordReset, &config).unwrap();
        let claims =
            validate_purpose_token(&token, TokenPurpose::PasswordReset, &config).unwrap();

        assert_eq!(claims.user_id().unwrap(), user_id);
        assert_eq!(claims.purpose, TokenPurpose::PasswordReset);
    }

    #[test]
    fn wrong_purpose_fails_closed() {
        let config = test_config();
        let token =
            generate_purpose_token(Uuid::new_v4(), TokenPurpose::EmailVerification, &config)
                .unwrap();
        assert!(validate_purpose_token(&token, TokenPurpose::PasswordReset, &config).is_err());
    }

    #[test]
    fn access_token_is_not_a_purpose_token() {
        let config = test_config();
        let token = generate_access_token(Uuid::new_v4(), &[Role::Patient], &config).unwrap();
        // Same secret, but the claim shape has no purpose field.
        assert!(
            validate_purpose_token(&token, TokenPurpose::EmailVerification, &config).is_err()
        );
    }

    #[test]
    fn purpose_token_is_not_an_access_token() {
        let config = test_config();
        let token =
            generate_purpose_token(Uuid::new_v4(), TokenPurpose::EmailVerification, &config)
                .unwrap();
        // No roles claim, so the access validator fails to deserialize it.
        assert!(validate_access_token(&token, &config).is_err());
    }
}
