//! Request extractors for authenticated routes.

pub mod auth;
pub mod rbac;
