//! The structured error value and its construction pipeline
//!
//! [`ErrorCustom`] is immutable once built. Construction validates the
//! caller's arguments, assigns a UUID, attaches the optional cause, then
//! routes exactly one occurrence record through the emission pipeline.
//! When validation fails the same pipeline runs for the synthesized
//! meta-error, which is handed back on the `Err` side so no construction
//! attempt ever surfaces an untyped fault.

use crate::code::{ErrorCode, INVALID_ARGUMENTS_CODE};
use crate::sink::{global_emitter, Emitter, LogFunction};
use crate::validate::{validate, Validated};
use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};
use std::backtrace::Backtrace;
use std::error::Error as StdError;
use std::fmt;
use uuid::Uuid;

/// Status code carried by the synthesized validation meta-error.
pub const VALIDATION_FAILURE_STATUS: i64 = 500;

/// Boxed caller-supplied cause.
pub type BoxedCause = Box<dyn StdError + Send + Sync + 'static>;

// ============================================================================
// ErrorArgs
// ============================================================================

/// Argument bundle for [`ErrorCustom::build`].
///
/// The three required fields are `Option`s so that a missing argument can be
/// expressed and reported, not just an invalid one. [`ErrorArgs::new`] fills
/// all three; the chainable setters add the optional cause and log function.
///
/// # Example
///
/// ```no_run
/// use error_custom::{ErrorArgs, ErrorCustom};
///
/// let io_error = std::io::Error::new(std::io::ErrorKind::Other, "disk on fire");
/// let error = ErrorCustom::build(
///     ErrorArgs::new("Update failed", 500, 101).base_error(io_error),
/// );
/// assert!(error.is_ok());
/// ```
#[derive(Default)]
pub struct ErrorArgs {
    /// Human-readable description; required, non-empty.
    pub message: Option<String>,
    /// HTTP-style status code; required, within [200, 600].
    pub status_code: Option<i64>,
    /// Domain error code; required.
    pub error_code: Option<ErrorCode>,
    /// Causal error being wrapped, if any.
    pub base_error: Option<BoxedCause>,
    /// Caller-selected occurrence sink.
    pub log_function: Option<LogFunction>,
}

impl ErrorArgs {
    /// Bundle the three required arguments.
    pub fn new(
        message: impl Into<String>,
        status_code: i64,
        error_code: impl Into<ErrorCode>,
    ) -> Self {
        ErrorArgs {
            message: Some(message.into()),
            status_code: Some(status_code),
            error_code: Some(error_code.into()),
            base_error: None,
            log_function: None,
        }
    }

    /// Attach the causal error to wrap.
    pub fn base_error(mut self, cause: impl Into<BoxedCause>) -> Self {
        self.base_error = Some(cause.into());
        self
    }

    /// Select the occurrence sink for this construction.
    pub fn log_function(mut self, log_function: LogFunction) -> Self {
        self.log_function = Some(log_function);
        self
    }
}

impl fmt::Debug for ErrorArgs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ErrorArgs")
            .field("message", &self.message)
            .field("status_code", &self.status_code)
            .field("error_code", &self.error_code)
            .field("base_error", &self.base_error.as_ref().map(|e| e.to_string()))
            .field("log_function", &self.log_function)
            .finish()
    }
}

// ============================================================================
// ErrorCustom
// ============================================================================

/// Structured, validated error with an autogenerated UUID.
///
/// Every instance is either the caller's validated values or the synthesized
/// validation meta-error (status 500, code 1000200); in both cases exactly
/// one occurrence record has been emitted by the time construction returns.
#[derive(Debug)]
pub struct ErrorCustom {
    message: String,
    status_code: i64,
    error_code: ErrorCode,
    id: String,
    inner_exception: Option<BoxedCause>,
    manually_thrown: bool,
    stack: Backtrace,
}

impl ErrorCustom {
    /// Construct from the three required arguments, using the process-wide
    /// emitter.
    ///
    /// # Errors
    ///
    /// Returns the synthesized validation meta-error when any argument
    /// violates its contract. The meta-error has been emitted through the
    /// same pipeline as a successful construction would be.
    pub fn new(
        message: impl Into<String>,
        status_code: i64,
        error_code: impl Into<ErrorCode>,
    ) -> Result<Self, Box<Self>> {
        Self::build(ErrorArgs::new(message, status_code, error_code))
    }

    /// Construct from a full argument bundle, using the process-wide emitter.
    ///
    /// # Errors
    ///
    /// See [`ErrorCustom::new`].
    pub fn build(args: ErrorArgs) -> Result<Self, Box<Self>> {
        Self::build_with(args, global_emitter())
    }

    /// Construct with an explicit emitter.
    ///
    /// This is the seam for tests and for applications that resolve their
    /// configuration somewhere other than the environment.
    ///
    /// # Errors
    ///
    /// See [`ErrorCustom::new`].
    pub fn build_with(args: ErrorArgs, emitter: &Emitter) -> Result<Self, Box<Self>> {
        let ErrorArgs {
            message,
            status_code,
            error_code,
            base_error,
            log_function,
        } = args;

        match validate(message, status_code, error_code) {
            Ok(Validated {
                message,
                status_code,
                error_code,
            }) => {
                let error = Self::assemble(message, status_code, error_code, base_error);
                emitter.emit(&error, log_function.as_ref());
                Ok(error)
            }
            Err(violations) => {
                // The original cause is kept even when the caller's intended
                // error is replaced, so context is not lost. The caller's log
                // function is not: a meta-error only ever goes to the
                // configured remote URL or the default channel.
                let meta = Self::assemble(
                    violations.join(", "),
                    VALIDATION_FAILURE_STATUS,
                    ErrorCode::Number(INVALID_ARGUMENTS_CODE),
                    base_error,
                );
                emitter.emit(&meta, None);
                Err(Box::new(meta))
            }
        }
    }

    fn assemble(
        message: String,
        status_code: i64,
        error_code: ErrorCode,
        inner_exception: Option<BoxedCause>,
    ) -> Self {
        ErrorCustom {
            message,
            status_code,
            error_code,
            id: Uuid::new_v4().to_string(),
            inner_exception,
            manually_thrown: true,
            stack: Backtrace::force_capture(),
        }
    }

    /// Human-readable description.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// HTTP-style status code.
    pub fn status_code(&self) -> i64 {
        self.status_code
    }

    /// Domain error code.
    pub fn error_code(&self) -> &ErrorCode {
        &self.error_code
    }

    /// UUID assigned at construction.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Wrapped causal error, if one was supplied.
    pub fn inner_exception(&self) -> Option<&(dyn StdError + Send + Sync + 'static)> {
        self.inner_exception.as_deref()
    }

    /// `true` for every instance produced through the public constructors.
    ///
    /// Lets downstream handlers tell a deliberately raised structured
    /// diagnostic apart from an incidental runtime fault reaching the same
    /// boundary.
    pub fn manually_thrown(&self) -> bool {
        self.manually_thrown
    }

    /// Call stack captured at the point of construction.
    pub fn stack(&self) -> &Backtrace {
        &self.stack
    }

    /// Whether this instance is the synthesized validation meta-error.
    pub fn is_validation_failure(&self) -> bool {
        self.error_code == ErrorCode::Number(INVALID_ARGUMENTS_CODE)
            && self.status_code == VALIDATION_FAILURE_STATUS
    }
}

impl fmt::Display for ErrorCustom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl StdError for ErrorCustom {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.inner_exception
            .as_ref()
            .map(|cause| cause.as_ref() as &(dyn StdError + 'static))
    }
}

// Wire field names match the original log-processor contract, so documents
// written by different services land in the same index shape.
impl Serialize for ErrorCustom {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let fields = if self.inner_exception.is_some() { 7 } else { 6 };
        let mut state = serializer.serialize_struct("ErrorCustom", fields)?;
        state.serialize_field("message", &self.message)?;
        state.serialize_field("statusCode", &self.status_code)?;
        state.serialize_field("errorCode", &self.error_code)?;
        state.serialize_field("id", &self.id)?;
        state.serialize_field("manuallyThrown", &self.manually_thrown)?;
        match &self.inner_exception {
            Some(cause) => state.serialize_field("innerException", &cause.to_string())?,
            None => state.skip_field("innerException")?,
        }
        state.serialize_field("stack", &self.stack.to_string())?;
        state.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::Emitter;
    use crate::SinkConfig;
    use std::io;

    fn quiet_emitter() -> Emitter {
        Emitter::new(SinkConfig::default(), crate::sink::discarding_transport())
    }

    fn build(args: ErrorArgs) -> Result<ErrorCustom, Box<ErrorCustom>> {
        ErrorCustom::build_with(args, &quiet_emitter())
    }

    #[test]
    fn test_constructing_the_instance() {
        let error = build(ErrorArgs::new("Error Message", 400, 1000)).unwrap();
        assert_eq!(error.message(), "Error Message");
        assert_eq!(error.status_code(), 400);
        assert_eq!(error.error_code(), &ErrorCode::Number(1000));
        assert!(error.manually_thrown());
        assert!(!error.id().is_empty());
        assert!(error.inner_exception().is_none());
    }

    #[test]
    fn test_missing_message_fails() {
        let args = ErrorArgs {
            status_code: Some(200),
            error_code: Some(1_000_000.into()),
            ..Default::default()
        };
        let error = build(args).unwrap_err();
        assert_eq!(error.message(), "Invalid value for message parameter");
        assert_eq!(error.status_code(), 500);
        assert_eq!(error.error_code(), &ErrorCode::Number(1_000_200));
        assert!(error.manually_thrown());
        assert!(error.is_validation_failure());
    }

    #[test]
    fn test_missing_status_and_error_code_joined() {
        let args = ErrorArgs {
            message: Some("message".to_string()),
            ..Default::default()
        };
        let error = build(args).unwrap_err();
        assert_eq!(
            error.message(),
            "Invalid value for statusCode parameter, Invalid value for errorCode parameter"
        );
    }

    #[test]
    fn test_all_arguments_missing() {
        let error = build(ErrorArgs::default()).unwrap_err();
        assert_eq!(
            error.message(),
            "Invalid value for message parameter, Invalid value for statusCode parameter, \
             Invalid value for errorCode parameter"
        );
    }

    #[test]
    fn test_base_error_preserved() {
        let cause = io::Error::new(io::ErrorKind::Other, "underlying failure");
        let error = build(ErrorArgs::new("It blew up", 500, 101).base_error(cause)).unwrap();
        assert_eq!(
            error.inner_exception().map(|e| e.to_string()),
            Some("underlying failure".to_string())
        );
        assert_eq!(error.source().map(|e| e.to_string()), Some("underlying failure".to_string()));
    }

    #[test]
    fn test_base_error_preserved_on_validation_failure() {
        let cause = io::Error::new(io::ErrorKind::Other, "underlying failure");
        let args = ErrorArgs {
            base_error: Some(Box::new(cause)),
            ..Default::default()
        };
        let error = build(args).unwrap_err();
        assert!(error.is_validation_failure());
        assert_eq!(
            error.inner_exception().map(|e| e.to_string()),
            Some("underlying failure".to_string())
        );
    }

    #[test]
    fn test_stack_captured() {
        let error = build(ErrorArgs::new("Error Message", 400, 1000)).unwrap();
        assert!(!error.stack().to_string().is_empty());
    }

    #[test]
    fn test_display_is_the_message() {
        let error = build(ErrorArgs::new("Error Message", 400, 1000)).unwrap();
        assert_eq!(error.to_string(), "Error Message");
    }

    #[test]
    fn test_serialized_wire_field_names() {
        let cause = io::Error::new(io::ErrorKind::Other, "root cause");
        let error = build(ErrorArgs::new("Error Message", 400, 1000).base_error(cause)).unwrap();
        let value = serde_json::to_value(&error).unwrap();

        assert_eq!(value["message"], "Error Message");
        assert_eq!(value["statusCode"], 400);
        assert_eq!(value["errorCode"], 1000);
        assert_eq!(value["id"], error.id());
        assert_eq!(value["manuallyThrown"], true);
        assert_eq!(value["innerException"], "root cause");
        assert!(value["stack"].is_string());
    }

    #[test]
    fn test_serialization_omits_absent_inner_exception() {
        let error = build(ErrorArgs::new("Error Message", 400, 1000)).unwrap();
        let value = serde_json::to_value(&error).unwrap();
        assert!(value.get("innerException").is_none());
    }

    #[test]
    fn test_string_error_code_round_trips() {
        let error = build(ErrorArgs::new("Error Message", 400, "not-found")).unwrap();
        let value = serde_json::to_value(&error).unwrap();
        assert_eq!(value["errorCode"], "not-found");
    }

    #[test]
    fn test_ids_are_unique() {
        use std::collections::HashSet;

        let mut seen = HashSet::new();
        let emitter = quiet_emitter();
        for _ in 0..10_000 {
            let error =
                ErrorCustom::build_with(ErrorArgs::new("Error Message", 400, 1000), &emitter)
                    .unwrap();
            assert!(seen.insert(error.id().to_string()));
        }
    }
}
