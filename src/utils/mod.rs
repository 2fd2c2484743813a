//! Shared helpers: input validation and numeric conversions.

pub mod validation;
