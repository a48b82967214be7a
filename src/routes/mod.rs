mod auth;
mod health_check;
mod password_reset;
mod verification;

pub use auth::{admin_create_user, get_profile, login, logout, refresh, register};
pub use health_check::health_check;
pub use password_reset::{forgot_password, reset_password};
pub use verification::{resend_verification, verify_email};
