//! REST API client module for the admin server.
//!
//! This module provides the `AdminClient` and the middleware that runs
//! around each of its requests:
//! - `AuthInterceptor`: bearer-token injection and 401 handling
//! - `LoadingOverlay`: loading indicator while a request is in flight
//!
//! The admin API authenticates with a bearer token obtained from the login
//! endpoint, mirrored into an `admin_token` cookie for cookie-based checks.

pub mod authorizer;
pub mod client;
pub mod cookies;
pub mod error;
pub mod interceptor;

pub use authorizer::{Authorization, RequestAuthorizer};
pub use client::{AdminClient, AdminClientBuilder, Middleware, RequestInfo};
pub use error::ApiError;
pub use interceptor::{AuthInterceptor, ExpiryGate, LoadingOverlay};
