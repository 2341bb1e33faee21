pub mod auth;
pub mod classify;
pub mod dashboard;
pub mod health;
pub mod issues;
pub mod uploads;
