//! Identifier safety for dynamically assembled SQL.
//!
//! Table and column names arrive from the UI layer at runtime, so they are
//! interpolated into statement text rather than bound as parameters. Every
//! identifier must pass this allow-list before interpolation; literal values
//! never go through here, they are always bound.

use crate::error::DataError;

/// MySQL caps identifiers at 64 characters.
const MAX_IDENT_LEN: usize = 64;

/// True if `s` matches `[A-Za-z_][A-Za-z0-9_]*` and fits the length cap.
pub fn is_safe_identifier(s: &str) -> bool {
    if s.is_empty() || s.len() > MAX_IDENT_LEN {
        return false;
    }
    let mut chars = s.chars();
    let first = chars.next().expect("non-empty checked above");
    if !(first.is_ascii_alphabetic() || first == '_') {
        return false;
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Pass `s` through if it is safe to interpolate, error otherwise.
pub fn ensure_identifier(s: &str) -> Result<&str, DataError> {
    if is_safe_identifier(s) {
        Ok(s)
    } else {
        Err(DataError::InvalidIdentifier { ident: s.to_owned() })
    }
}
