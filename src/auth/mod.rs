/// Authentication module
///
/// JWT issuance/validation, password hashing, the account lockout policy,
/// and the AuthService orchestrator with its password-reset and
/// email-verification flows.
mod claims;
mod jwt;
mod lockout;
mod password;
mod password_reset;
mod roles;
mod service;
mod verification;

pub use claims::{Claims, PurposeClaims, TokenPurpose};
pub use jwt::{
    generate_access_token, generate_purpose_token, generate_refresh_token, validate_access_token,
    validate_purpose_token, validate_refresh_token,
};
pub use lockout::{FailedLogin, LockState, LOCKOUT_DURATION_MINUTES, MAX_FAILED_LOGIN_ATTEMPTS};
pub use password::{hash_password, verify_password};
pub use roles::{parse_roles, Role};
pub use service::{AuthService, Registration, TokenPair};
