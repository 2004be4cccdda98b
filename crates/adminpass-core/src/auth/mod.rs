//! Authentication module for the admin credential lifecycle.
//!
//! This module provides:
//! - `TokenStore`: the bearer credential, kept in a primary store and
//!   mirrored into an expiring cookie
//! - `SessionGuard`: redirects away from protected pages without a session
//! - `LoginFlow`: credential submission, token capture and logout
//!
//! Session state is never cached; every check re-reads storage.

pub mod login;
pub mod session;
pub mod token;

use std::time::Duration;

pub use login::{Field, LoginFlow, LoginOutcome, LoginState, SubmitControl};
pub use session::{GuardOutcome, SessionGuard};
pub use token::{is_well_formed, TokenStore};

/// Storage key and cookie name for the credential
pub const TOKEN_KEY: &str = "admin_token";

/// Delay before leaving a page after a 401
pub const EXPIRED_REDIRECT_DELAY: Duration = Duration::from_millis(2000);

/// Delay before leaving a protected page without a session
pub const GUARD_REDIRECT_DELAY: Duration = Duration::from_millis(1000);

/// Delay before moving on after login or logout
pub const LOGIN_REDIRECT_DELAY: Duration = Duration::from_millis(1000);

/// Time given to other page setup before the session check runs
pub const GUARD_SETTLE_DELAY: Duration = Duration::from_millis(100);

/// User-facing messages.
pub mod messages {
    pub const SESSION_EXPIRED: &str = "Session expired, please log in again";
    pub const PLEASE_LOG_IN: &str = "Please log in first";
    pub const ENTER_USERNAME: &str = "Please enter username";
    pub const ENTER_PASSWORD: &str = "Please enter password";
    pub const LOGIN_PENDING: &str = "Logging in...";
    pub const LOGIN_SUCCESS: &str = "Login successful, redirecting...";
    pub const NO_TOKEN: &str = "Login succeeded but no token received";
    pub const LOGIN_FAILED: &str = "Login failed";
    pub const BAD_CREDENTIALS: &str = "Wrong username or password";
    pub const UNREACHABLE: &str = "Cannot reach server";
    pub const LOGGED_OUT: &str = "Logged out";
}
