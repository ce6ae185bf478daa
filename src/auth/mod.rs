//! # Auth Module
//!
//! This module handles all authentication-related functionality including:
//! - Google OAuth authorization-code login
//! - JWT session tokens carried in a cookie or Bearer header
//! - AuthedUser extractor for protected routes

pub mod extractors;
pub mod handlers;
pub mod identity;
pub mod models;
pub mod routes;
pub mod session;

#[cfg(test)]
mod tests;

pub use extractors::AuthedUser;
pub use identity::{IdentityVerifier, VerifiedIdentity};
pub use routes::auth_routes;
