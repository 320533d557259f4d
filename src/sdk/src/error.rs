// Copyright Materialize, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

//! Errors surfaced by resource handlers.
//!
//! ```text
//! Error
//!   ├── Validation(ValidationErrors)   - bad input, never reaches the driver
//!   ├── Render(RenderError)            - bad field table, aborts before I/O
//!   ├── Decode(DecodeError)            - unexpected row shape
//!   ├── ObjectNotExistOrAuthorized     ┐
//!   ├── ObjectAlreadyExists            ├ translated driver errors
//!   ├── ObjectNotFound / TooManyRows   ┘
//!   ├── Driver(DriverError)            - anything else from the driver
//!   └── Config(ConfigError)
//! ```

use std::fmt;

use thiserror::Error;
use wh_ddl::{RenderError, ValidationErrors};

use crate::config::ConfigError;
use crate::row::DecodeError;

/// A failure reported by the database driver, independent of which driver
/// produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DriverError {
    pub message: String,
    pub code: Option<String>,
}

impl DriverError {
    pub fn new(message: impl Into<String>) -> Self {
        DriverError {
            message: message.into(),
            code: None,
        }
    }

    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }
}

impl fmt::Display for DriverError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.code {
            Some(code) => write!(f, "{} ({})", self.message, code),
            None => f.write_str(&self.message),
        }
    }
}

impl std::error::Error for DriverError {}

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Validation(#[from] ValidationErrors),
    #[error("failed to render statement: {0}")]
    Render(#[from] RenderError),
    #[error("failed to decode row: {0}")]
    Decode(#[from] DecodeError),
    #[error("object does not exist or not authorized")]
    ObjectNotExistOrAuthorized,
    #[error("object already exists")]
    ObjectAlreadyExists,
    #[error("{object} not found")]
    ObjectNotFound { object: String },
    #[error("expected exactly one row, found {count}")]
    TooManyRows { count: usize },
    #[error("database error: {0}")]
    Driver(DriverError),
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// The closed set of error kinds, for callers that branch on the kind of
/// failure rather than on its details.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Validation,
    Render,
    Decode,
    ObjectNotExistOrAuthorized,
    ObjectAlreadyExists,
    ObjectNotFound,
    TooManyRows,
    Driver,
    Config,
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Validation(_) => ErrorKind::Validation,
            Error::Render(_) => ErrorKind::Render,
            Error::Decode(_) => ErrorKind::Decode,
            Error::ObjectNotExistOrAuthorized => ErrorKind::ObjectNotExistOrAuthorized,
            Error::ObjectAlreadyExists => ErrorKind::ObjectAlreadyExists,
            Error::ObjectNotFound { .. } => ErrorKind::ObjectNotFound,
            Error::TooManyRows { .. } => ErrorKind::TooManyRows,
            Error::Driver(_) => ErrorKind::Driver,
            Error::Config(_) => ErrorKind::Config,
        }
    }

    /// Whether the object targeted by a statement is missing, however the
    /// absence was detected.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::ObjectNotFound | ErrorKind::ObjectNotExistOrAuthorized
        )
    }

    pub fn not_found(object: impl fmt::Display) -> Self {
        Error::ObjectNotFound {
            object: object.to_string(),
        }
    }
}

/// Translates a driver error into a sentinel when its message contains a
/// known fragment, and passes it through unchanged otherwise.
pub fn decode_driver_error(err: DriverError) -> Error {
    let translated = if err.message.contains("does not exist or not authorized") {
        Error::ObjectNotExistOrAuthorized
    } else if err.message.contains("already exists") {
        Error::ObjectAlreadyExists
    } else {
        return Error::Driver(err);
    };
    tracing::debug!(%err, "translated driver error");
    translated
}

impl From<DriverError> for Error {
    fn from(err: DriverError) -> Self {
        decode_driver_error(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn translates_known_fragments() {
        let err = decode_driver_error(DriverError::new(
            "SQL compilation error:\nSequence 'DB.SCH.SEQ' does not exist or not authorized.",
        ));
        assert_eq!(err.kind(), ErrorKind::ObjectNotExistOrAuthorized);
        assert!(err.is_not_found());

        let err = decode_driver_error(
            DriverError::new("Object 'X' already exists.").with_code("002002"),
        );
        assert_eq!(err.kind(), ErrorKind::ObjectAlreadyExists);
    }

    #[test]
    fn passes_unknown_errors_through() {
        let driver = DriverError::new("syntax error at position 7").with_code("42601");
        let err = Error::from(driver.clone());
        match err {
            Error::Driver(inner) => assert_eq!(inner, driver),
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(
            Error::Driver(driver).to_string(),
            "database error: syntax error at position 7 (42601)"
        );
    }

    #[test]
    fn validation_errors_render_transparently() {
        let err = Error::from(ValidationErrors::from(
            wh_ddl::ValidationError::NilOptions,
        ));
        assert_eq!(err.to_string(), "options cannot be nil");
        assert_eq!(err.kind(), ErrorKind::Validation);
    }
}
