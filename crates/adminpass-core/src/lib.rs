//! Client-side admin session handling.
//!
//! The admin panel authenticates with a bearer token issued by its login
//! endpoint. This crate keeps that token in local storage (with a cookie
//! mirror), attaches it to every API request, ends the session when the
//! server answers 401, and gates protected pages on a present token.
//!
//! Presentation (notices, loading indicator, page navigation) is left to the
//! front end through the traits in [`presenter`].

pub mod api;
pub mod auth;
pub mod config;
pub mod context;
pub mod presenter;
pub mod storage;
pub mod utils;

pub use context::AdminContext;
