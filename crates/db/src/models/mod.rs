//! Row types for the `issues` table.
//!
//! Rows are decoded leniently into [`campus_core::Issue`]; writes take the
//! canonical core types directly.

pub mod issue;
