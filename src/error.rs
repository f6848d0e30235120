//! Error handling for the cleaning pipeline.
//!
//! Errors fall into three groups:
//!
//! - **Construction errors** ([`CleaningError::Config`]) are raised while building a
//!   [`CleaningConfig`](crate::config::CleaningConfig) and are always fatal.
//! - **Precondition errors** ([`CleaningError::Unfitted`], [`CleaningError::NotTabular`],
//!   [`CleaningError::MissingColumns`]) are raised at the call site of a stage or pipeline.
//! - **Runtime errors** ([`CleaningError::DataProcessing`], [`CleaningError::StageFailed`])
//!   come out of a stage while it runs. Inside a full pipeline run these are caught and the
//!   stage is skipped, see [`Pipeline::transform`](crate::pipeline::Pipeline::transform).
//!
//! Per-value conversion problems (an unparsable minutes string, a bad date) never become
//! errors. They are converted to null/zero and reported through
//! [`Diagnostics`](crate::diagnostics::Diagnostics).
//!
//! ```
//! use boxscore_cleaner::error::CleaningError;
//!
//! fn describe(err: &CleaningError) -> &'static str {
//!     match err {
//!         CleaningError::Config(_) => "bad configuration",
//!         CleaningError::Unfitted { .. } => "call fit first",
//!         _ => "other",
//!     }
//! }
//! # assert_eq!(describe(&CleaningError::Config("x".to_owned())), "bad configuration");
//! ```

use std::fmt;

/// Main error type for cleaning operations.
#[derive(Debug)]
pub enum CleaningError {
    /// Invalid configuration value (unknown outlier method/action, bad threshold)
    Config(String),

    /// `transform` was called before `fit`
    Unfitted { stage: String },

    /// Input could not be interpreted as a table of records
    NotTabular(String),

    /// Strict validation is on and columns seen at fit time are gone
    MissingColumns { stage: String, columns: Vec<String> },

    /// Polars or value processing failure
    DataProcessing(String),

    /// A stage reported a failure of its own
    StageFailed { stage: String, message: String },

    /// Generic error with context
    Other(String),
}

impl fmt::Display for CleaningError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(msg) => write!(f, "Configuration error: {msg}"),
            Self::Unfitted { stage } => {
                write!(f, "Stage '{stage}' must be fitted before transform")
            }
            Self::NotTabular(msg) => write!(f, "Input is not tabular: {msg}"),
            Self::MissingColumns { stage, columns } => write!(
                f,
                "Stage '{stage}' is missing required columns: {}",
                columns.join(", ")
            ),
            Self::DataProcessing(msg) => write!(f, "Data processing error: {msg}"),
            Self::StageFailed { stage, message } => write!(f, "Stage '{stage}' failed: {message}"),
            Self::Other(msg) => write!(f, "{msg}"),
        }
    }
}

impl std::error::Error for CleaningError {}

impl From<polars::error::PolarsError> for CleaningError {
    fn from(err: polars::error::PolarsError) -> Self {
        Self::DataProcessing(err.to_string())
    }
}

impl From<serde_json::Error> for CleaningError {
    fn from(err: serde_json::Error) -> Self {
        Self::Config(format!("JSON error: {err}"))
    }
}

/// Result type alias for cleaning operations.
pub type Result<T> = std::result::Result<T, CleaningError>;

/// Extension trait to add context to results.
pub trait ResultExt<T> {
    /// Add context to an error.
    fn context(self, msg: impl Into<String>) -> Result<T>;

    /// Add context using a closure (lazy evaluation).
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;
}

impl<T, E> ResultExt<T> for std::result::Result<T, E>
where
    E: Into<CleaningError>,
{
    fn context(self, msg: impl Into<String>) -> Result<T> {
        self.map_err(|e| {
            let err: CleaningError = e.into();
            CleaningError::Other(format!("{}: {}", msg.into(), err))
        })
    }

    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| {
            let err: CleaningError = e.into();
            CleaningError::Other(format!("{}: {}", f(), err))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = CleaningError::Unfitted {
            stage: "outlier_detection".to_owned(),
        };
        assert_eq!(
            err.to_string(),
            "Stage 'outlier_detection' must be fitted before transform"
        );
    }

    #[test]
    fn test_missing_columns_lists_names() {
        let err = CleaningError::MissingColumns {
            stage: "validation".to_owned(),
            columns: vec!["fgm".to_owned(), "fga".to_owned()],
        };
        assert_eq!(
            err.to_string(),
            "Stage 'validation' is missing required columns: fgm, fga"
        );
    }

    #[test]
    fn test_polars_error_conversion() {
        let polars_err = polars::error::PolarsError::ColumnNotFound("pts".into());
        let err: CleaningError = polars_err.into();
        assert!(matches!(err, CleaningError::DataProcessing(_)));
    }

    #[test]
    fn test_result_context() {
        let result: std::result::Result<(), CleaningError> =
            Err(CleaningError::DataProcessing("bad cast".to_owned()));

        let result: Result<()> = result.context("Failed to coerce types");
        assert!(
            result
                .unwrap_err()
                .to_string()
                .contains("Failed to coerce types")
        );
    }
}
