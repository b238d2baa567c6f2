//! error-custom — structured, validated error values with occurrence logging
//!
//! This crate provides a single reusable error type, [`ErrorCustom`],
//! carrying an HTTP-style status code, a domain [`ErrorCode`], an optional
//! wrapped cause, and a UUID assigned at construction. Constructing one
//! validates the arguments, then routes exactly one occurrence record to a
//! caller-supplied callback, the local `error-custom` log channel, or an
//! Elasticsearch-compatible indexing backend (fire-and-forget).
//!
//! # Quick Start
//!
//! ```no_run
//! use error_custom::ErrorCustom;
//!
//! fn update_user() -> Result<(), Box<dyn std::error::Error>> {
//!     let error = ErrorCustom::new("User update failed", 400, 1000)
//!         .unwrap_or_else(|validation_failure| *validation_failure);
//!     Err(Box::new(error))
//! }
//! ```
//!
//! Invalid arguments never surface as an untyped fault: the constructor
//! returns a synthesized `ErrorCustom` (status 500, code 1000200) describing
//! every violated field, with the original cause still attached.
//!
//! # Remote logging
//!
//! Setting `ELASTIC_LOGGING_URL` routes every occurrence to that endpoint,
//! one index per service per day (`logs-<service>-<YYYY-MM-DD>`). See
//! [`SinkConfig`] for the full environment surface. The send is scheduled on
//! a background writer; construction never waits on the network.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod code;
pub mod config;
pub mod error;
pub mod sink;
pub mod validate;

mod elastic;

pub use code::{ErrorCode, INVALID_ARGUMENTS_CODE};
pub use config::{SinkConfig, DEFAULT_SERVICE_NAME};
pub use error::{BoxedCause, ErrorArgs, ErrorCustom, VALIDATION_FAILURE_STATUS};
pub use sink::{route, Emitter, LogCallback, LogFunction, RemoteTransport, Route, LOG_CHANNEL};
pub use validate::{INVALID_ERROR_CODE, INVALID_MESSAGE, INVALID_STATUS_CODE, STATUS_CODE_RANGE};
