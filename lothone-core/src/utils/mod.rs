//! Shared helpers

pub mod date;
pub mod log_sanitizer;
