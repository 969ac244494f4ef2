//! Shared types for dpitune - empirical bypass-strategy selection
//!
//! Pure data model and aggregation logic, kept free of I/O so the
//! binary crate and its tests can exercise it directly.

pub mod errors;
pub mod input;
pub mod model;
pub mod ranking;
