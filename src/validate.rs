//! Constructor argument validation
//!
//! Validation is a pure function over the three required arguments. All
//! checks run unconditionally and every failing check contributes one
//! phrase, in a fixed order, so the synthesized failure message is
//! deterministic regardless of which combination of arguments is bad.

use crate::code::ErrorCode;

/// Phrase reported when `message` is missing or empty.
pub const INVALID_MESSAGE: &str = "Invalid value for message parameter";
/// Phrase reported when `statusCode` is missing or out of range.
pub const INVALID_STATUS_CODE: &str = "Invalid value for statusCode parameter";
/// Phrase reported when `errorCode` is missing or empty.
pub const INVALID_ERROR_CODE: &str = "Invalid value for errorCode parameter";

/// Inclusive range of acceptable HTTP-style status codes.
pub const STATUS_CODE_RANGE: std::ops::RangeInclusive<i64> = 200..=600;

/// Arguments that passed validation, with the `Option` layer stripped.
#[derive(Debug)]
pub(crate) struct Validated {
    pub message: String,
    pub status_code: i64,
    pub error_code: ErrorCode,
}

/// Check the three required constructor arguments.
///
/// Returns the unwrapped arguments on success, or the list of violation
/// phrases in the fixed order message → statusCode → errorCode.
pub(crate) fn validate(
    message: Option<String>,
    status_code: Option<i64>,
    error_code: Option<ErrorCode>,
) -> Result<Validated, Vec<&'static str>> {
    let mut violations = Vec::new();

    if !matches!(&message, Some(m) if !m.is_empty()) {
        violations.push(INVALID_MESSAGE);
    }
    if !matches!(status_code, Some(c) if STATUS_CODE_RANGE.contains(&c)) {
        violations.push(INVALID_STATUS_CODE);
    }
    if !matches!(&error_code, Some(c) if c.is_valid()) {
        violations.push(INVALID_ERROR_CODE);
    }

    match (message, status_code, error_code) {
        (Some(message), Some(status_code), Some(error_code)) if violations.is_empty() => {
            Ok(Validated {
                message,
                status_code,
                error_code,
            })
        }
        _ => Err(violations),
    }
}
