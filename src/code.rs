//! Domain error codes
//!
//! An [`ErrorCode`] identifies the application-level meaning of an error,
//! independent of its HTTP status. Callers may use either numeric codes
//! (as defined in their error documentation) or symbolic names.

use serde::{Serialize, Serializer};
use std::fmt;

/// Reserved code reported when constructor arguments fail validation.
pub const INVALID_ARGUMENTS_CODE: i64 = 1_000_200;

/// Caller-defined domain error code.
///
/// Serializes as a bare JSON number or string, matching the wire shape
/// consumed by downstream log processors.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    /// Numeric code, e.g. `1000` for "user not found"
    Number(i64),
    /// Symbolic code, e.g. `"user-not-found"`
    Name(String),
}

impl ErrorCode {
    /// Whether this code satisfies the construction contract.
    ///
    /// Numeric codes are always acceptable; symbolic codes must be non-empty.
    pub fn is_valid(&self) -> bool {
        match self {
            ErrorCode::Number(_) => true,
            ErrorCode::Name(name) => !name.is_empty(),
        }
    }
}

impl From<i64> for ErrorCode {
    fn from(code: i64) -> Self {
        ErrorCode::Number(code)
    }
}

impl From<&str> for ErrorCode {
    fn from(name: &str) -> Self {
        ErrorCode::Name(name.to_string())
    }
}

impl From<String> for ErrorCode {
    fn from(name: String) -> Self {
        ErrorCode::Name(name)
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorCode::Number(code) => write!(f, "{}", code),
            ErrorCode::Name(name) => write!(f, "{}", name),
        }
    }
}

impl Serialize for ErrorCode {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            ErrorCode::Number(code) => serializer.serialize_i64(*code),
            ErrorCode::Name(name) => serializer.serialize_str(name),
        }
    }
}
