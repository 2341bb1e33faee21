//! Authentication primitives.
//!
//! - [`password`] -- Argon2id password hashing and verification.
//! - [`jwt`] -- JWT access-token generation and validation.

pub mod jwt;
pub mod password;

/// Role carried by tokens issued through the admin login.
pub const ROLE_ADMIN: &str = "admin";
