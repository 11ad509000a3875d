//! Error types for health-check registration and evaluation.

use strum::{AsRefStr, IntoStaticStr};
use thiserror::Error;

use crate::config::HealthConfigBuilderError;

/// Type alias for boxed dynamic errors that can be sent across threads.
///
/// This is the error type returned by check bodies and section producers.
/// Any error implementing the standard `Error` trait (or a plain `String`)
/// converts into it with `?` or `.into()`.
pub type BoxedError = Box<dyn std::error::Error + Send + Sync>;

/// Type alias for Results with our custom Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Categories of errors that can occur in vitals-core operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, AsRefStr, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum ErrorKind {
    /// A custom section name is already registered.
    NameConflict,
    /// Configuration failed validation.
    InvalidConfig,
    /// A check body returned an error or panicked.
    CheckFault,
    /// A check did not complete before its deadline.
    CheckTimeout,
    /// A custom section producer returned an error or panicked.
    SectionFault,
}

/// A structured error type for vitals-core operations.
///
/// Only [`ErrorKind::NameConflict`] and [`ErrorKind::InvalidConfig`] are ever
/// returned to callers. The fault kinds are contained inside an evaluation
/// and only show up in logs and in translated check results.
#[derive(Debug, Error)]
#[error("{kind:?}{}", message.as_ref().map(|m| format!(": {}", m)).unwrap_or_default())]
pub struct Error {
    /// The kind of error that occurred.
    pub kind: ErrorKind,
    /// Optional error message.
    pub message: Option<String>,
    /// Optional source error.
    #[source]
    pub source: Option<BoxedError>,
}

impl Error {
    /// Creates a new error with the given kind.
    pub fn new(kind: ErrorKind) -> Self {
        Self {
            kind,
            message: None,
            source: None,
        }
    }

    /// Adds a message to this error.
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// Adds a source error to this error.
    pub fn with_source(mut self, source: impl Into<BoxedError>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Creates a new name conflict error for the given section name.
    pub fn name_conflict(name: &str) -> Self {
        Self::new(ErrorKind::NameConflict)
            .with_message(format!("the name \"{name}\" is already taken"))
    }

    /// Creates a new invalid configuration error.
    pub fn invalid_config() -> Self {
        Self::new(ErrorKind::InvalidConfig)
    }

    /// Creates a new check fault error.
    pub fn check_fault() -> Self {
        Self::new(ErrorKind::CheckFault)
    }

    /// Creates a new check timeout error.
    pub fn check_timeout() -> Self {
        Self::new(ErrorKind::CheckTimeout)
    }

    /// Creates a new section fault error.
    pub fn section_fault() -> Self {
        Self::new(ErrorKind::SectionFault)
    }

    /// Returns the error kind.
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Returns the error kind as a string.
    pub fn kind_str(&self) -> &'static str {
        self.kind.into()
    }
}

impl From<HealthConfigBuilderError> for Error {
    fn from(error: HealthConfigBuilderError) -> Self {
        Self::invalid_config()
            .with_message(error.to_string())
            .with_source(error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_conflict_message() {
        let error = Error::name_conflict("version");

        assert_eq!(error.kind(), ErrorKind::NameConflict);
        assert_eq!(error.kind_str(), "name_conflict");
        assert_eq!(
            error.to_string(),
            "NameConflict: the name \"version\" is already taken"
        );
    }

    #[test]
    fn test_error_without_message() {
        let error = Error::check_timeout();
        assert_eq!(error.to_string(), "CheckTimeout");
        assert!(error.source.is_none());
    }

    #[test]
    fn test_error_with_source() {
        let error = Error::section_fault().with_source("producer exploded");

        let source = std::error::Error::source(&error).map(ToString::to_string);
        assert_eq!(source.as_deref(), Some("producer exploded"));
    }
}
