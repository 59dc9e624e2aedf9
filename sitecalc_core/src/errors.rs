//! # Error Types
//!
//! Structured error types for sitecalc_core. Validation errors carry the
//! offending field and a user-facing message so the shell can refocus the
//! input that produced them; dispatcher and store errors carry enough
//! context to be handled programmatically.
//!
//! ## Example
//!
//! ```rust
//! use sitecalc_core::errors::{CalcError, CalcResult};
//!
//! fn validate_unit_weight(gamma: f64) -> CalcResult<()> {
//!     if !(0.1..=40.0).contains(&gamma) {
//!         return Err(CalcError::invalid_parameters(
//!             "unit_weight",
//!             gamma.to_string(),
//!             "Unit weight must be between 0.1 and 40 kN/m³",
//!         ));
//!     }
//!     Ok(())
//! }
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias for sitecalc_core operations
pub type CalcResult<T> = Result<T, CalcError>;

/// Structured error type for calculation operations.
#[derive(Error, Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "details")]
pub enum CalcError {
    /// One or more fields outside their valid range or otherwise inconsistent
    #[error("Invalid parameter '{field}': {value} - {reason}")]
    InvalidParameters {
        field: String,
        value: String,
        reason: String,
    },

    /// A combination not covered by any formula
    #[error("Unsupported case for {kind}: {detail}")]
    UnsupportedCase { kind: String, detail: String },

    /// Crane-spec lookup returned no feasible configuration
    #[error("No matching capacity for {crane} ({condition}): {detail}")]
    NoMatchingCapacity {
        crane: String,
        condition: String,
        detail: String,
    },

    /// The document back end refused to write or close
    #[error("Report error on '{path}': {reason}")]
    ReportIo { path: String, reason: String },

    /// Crane-spec database error
    #[error("Crane database error: {reason}")]
    Database { reason: String },

    /// Project file I/O error
    #[error("File error: {operation} on '{path}' - {reason}")]
    FileError {
        operation: String,
        path: String,
        reason: String,
    },

    /// JSON serialization/deserialization error
    #[error("Serialization error: {reason}")]
    SerializationError { reason: String },

    /// Project file schema version mismatch
    #[error("Version mismatch: file version {file_version}, expected {expected_version}")]
    VersionMismatch {
        file_version: String,
        expected_version: String,
    },

    /// Numeric domain errors that slipped past validation; includes diagnostic context
    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl CalcError {
    /// Create an InvalidParameters error
    pub fn invalid_parameters(
        field: impl Into<String>,
        value: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        CalcError::InvalidParameters {
            field: field.into(),
            value: value.into(),
            reason: reason.into(),
        }
    }

    /// Create an UnsupportedCase error
    pub fn unsupported_case(kind: impl Into<String>, detail: impl Into<String>) -> Self {
        CalcError::UnsupportedCase {
            kind: kind.into(),
            detail: detail.into(),
        }
    }

    /// Create a NoMatchingCapacity error
    pub fn no_matching_capacity(
        crane: impl Into<String>,
        condition: impl Into<String>,
        detail: impl Into<String>,
    ) -> Self {
        CalcError::NoMatchingCapacity {
            crane: crane.into(),
            condition: condition.into(),
            detail: detail.into(),
        }
    }

    /// Create a ReportIo error
    pub fn report_io(path: impl Into<String>, reason: impl Into<String>) -> Self {
        CalcError::ReportIo {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Create a FileError
    pub fn file_error(
        operation: impl Into<String>,
        path: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        CalcError::FileError {
            operation: operation.into(),
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Create an Internal error
    pub fn internal(message: impl Into<String>) -> Self {
        CalcError::Internal {
            message: message.into(),
        }
    }

    /// Check if this error leaves a cached calculation result valid.
    ///
    /// Report errors are non-fatal to the calculation result; a capacity
    /// lookup miss is a recoverable verdict, not a hard failure.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            CalcError::ReportIo { .. } | CalcError::NoMatchingCapacity { .. }
        )
    }

    /// Get a short error code for programmatic handling
    pub fn error_code(&self) -> &'static str {
        match self {
            CalcError::InvalidParameters { .. } => "INVALID_PARAMETERS",
            CalcError::UnsupportedCase { .. } => "UNSUPPORTED_CASE",
            CalcError::NoMatchingCapacity { .. } => "NO_MATCHING_CAPACITY",
            CalcError::ReportIo { .. } => "REPORT_IO",
            CalcError::Database { .. } => "DATABASE",
            CalcError::FileError { .. } => "FILE_ERROR",
            CalcError::SerializationError { .. } => "SERIALIZATION_ERROR",
            CalcError::VersionMismatch { .. } => "VERSION_MISMATCH",
            CalcError::Internal { .. } => "INTERNAL_ERROR",
        }
    }
}

impl From<rusqlite::Error> for CalcError {
    fn from(e: rusqlite::Error) -> Self {
        CalcError::Database {
            reason: e.to_string(),
        }
    }
}
