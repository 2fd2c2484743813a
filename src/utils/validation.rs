//! Centralized validation and helper functions.

use std::path::{Path, PathBuf};

/// Maximum number of references allowed in a single index (DOS protection)
pub const MAX_REFERENCES: usize = 1_000_000;

/// Check if adding another reference would exceed the maximum allowed.
///
/// Call this with the current count BEFORE adding a new reference.
/// Returns an error message if adding would exceed the limit, None if safe to add.
///
/// # Example
/// ```ignore
/// if check_reference_limit(references.len()).is_some() {
///     return Err(...);
/// }
/// references.push(new_reference); // Safe to add
/// ```
#[must_use]
pub fn check_reference_limit(count: usize) -> Option<String> {
    if count >= MAX_REFERENCES {
        Some(format!(
            "Too many references: adding another would exceed maximum of {MAX_REFERENCES}"
        ))
    } else {
        None
    }
}

/// Maximum length of a single reference, in bases (DOS protection)
///
/// Each position of a reference costs four bytes of depth counters, so this
/// bounds one coverage profile at 16 GiB.
pub const MAX_REFERENCE_LENGTH: u64 = 1 << 32;

/// Check that a reference length is within [`MAX_REFERENCE_LENGTH`].
///
/// Returns an error message if the length exceeds the limit, None if safe to allocate.
#[must_use]
pub fn check_reference_length(length: u64) -> Option<String> {
    if length > MAX_REFERENCE_LENGTH {
        Some(format!(
            "Reference length {length} exceeds maximum of {MAX_REFERENCE_LENGTH}"
        ))
    } else {
        None
    }
}

/// Helper function to convert count to f64 with explicit precision loss allowance
#[inline]
#[must_use]
pub fn count_to_f64(count: u64) -> f64 {
    #[allow(clippy::cast_precision_loss)]
    {
        count as f64
    }
}

/// Input file validation error types
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error("Input file does not exist: {}", .0.display())]
    MissingFile(PathBuf),
    #[error("Input file is empty: {}", .0.display())]
    EmptyFile(PathBuf),
}

/// Check that an input path names an existing, non-empty file
///
/// # Errors
///
/// Returns `ValidationError::MissingFile` if the path is not a file, or
/// `ValidationError::EmptyFile` if it has zero length.
pub fn validate_input_file(path: &Path) -> Result<(), ValidationError> {
    match std::fs::metadata(path) {
        Ok(meta) if meta.is_file() => {
            if meta.len() == 0 {
                Err(ValidationError::EmptyFile(path.to_path_buf()))
            } else {
                Ok(())
            }
        }
        _ => Err(ValidationError::MissingFile(path.to_path_buf())),
    }
}
