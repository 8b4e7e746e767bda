//! Error types for the educational center site.
//!
//! This module defines the error hierarchy for configuration loading,
//! content synchronization, the contact form, the admin gate and the AI
//! outline service.

use std::path::PathBuf;

use edu_remote::{Operation, RemoteError};

use crate::model::Table;

/// A specialized `Result` type for site operations.
pub type Result<T> = std::result::Result<T, SiteError>;

/// Errors that can occur while serving or editing site content.
///
/// Variants are grouped by subsystem and carry a suggestion where the
/// operator can act on them.
#[derive(Debug, thiserror::Error)]
pub enum SiteError {
    // ========================================================================
    // Configuration Errors
    // ========================================================================
    /// Invalid JSON syntax in the configuration file.
    #[error("Invalid JSON in config file '{path}': {message}\n\nSuggestion: Validate your edu-site.json with a JSON linter")]
    ConfigParseError {
        /// Path to the configuration file.
        path: PathBuf,
        /// Description of the parse error.
        message: String,
    },

    /// Configuration validation failed.
    #[error("Invalid configuration: {message}\n\nSuggestion: {suggestion}")]
    ConfigValidationError {
        /// Description of the validation failure.
        message: String,
        /// Actionable suggestion for the operator.
        suggestion: String,
    },

    // ========================================================================
    // Content Mirror Errors
    // ========================================================================
    /// The startup load has not settled yet.
    #[error("Site content is still loading")]
    NotReady,

    /// A remote write was rejected or could not be delivered.
    ///
    /// The local mirror is left as it was before the attempt.
    #[error("Failed to {operation} '{table}': {source}")]
    RemoteWrite {
        /// Collection the write targeted.
        table: Table,
        /// The attempted operation.
        operation: Operation,
        /// Underlying remote failure.
        #[source]
        source: RemoteError,
    },

    /// A row returned by the remote store does not have the expected shape.
    #[error("Unexpected row shape in '{table}': {message}")]
    RowDecode {
        /// Collection the row came from.
        table: Table,
        /// Description of the mismatch.
        message: String,
    },

    /// The remote store confirmed a write without assigning an id.
    #[error("Remote store returned a '{table}' row without an id")]
    MissingRemoteId {
        /// Collection the row belongs to.
        table: Table,
    },

    /// A keyed write was requested for a record that has no id yet.
    #[error("Cannot {operation} a '{table}' record without an id")]
    UnassignedId {
        /// Collection the record belongs to.
        table: Table,
        /// The attempted operation.
        operation: Operation,
    },

    // ========================================================================
    // Public Form Errors
    // ========================================================================
    /// A required contact form field is blank.
    #[error("Please fill in the '{field}' field")]
    FormIncomplete {
        /// Name of the blank field.
        field: &'static str,
    },

    // ========================================================================
    // Outline Generator Errors
    // ========================================================================
    /// An outline was requested without a course title.
    #[error("A course title is required to draft an outline")]
    EmptyOutlineTitle,

    /// The AI service returned an error (authentication, rate limiting, etc.).
    #[error("AI service error ({kind}): {message}\n\nSuggestion: {suggestion}")]
    LlmApiError {
        /// The kind of API error.
        kind: LlmErrorKind,
        /// Detailed error message from the service.
        message: String,
        /// Actionable suggestion for the operator.
        suggestion: String,
    },

    /// The AI service answered with something that is not an outline.
    #[error("AI service returned an unreadable outline: {message}")]
    OutlineMalformed {
        /// Description of the parse failure.
        message: String,
    },

    /// The AI service returned fewer chapters than required.
    #[error("AI service returned {count} chapters, at least {min} are required")]
    OutlineTooShort {
        /// Number of chapters returned.
        count: usize,
        /// Required minimum.
        min: usize,
    },

    // ========================================================================
    // Admin Gate Errors
    // ========================================================================
    /// Login attempt with wrong credentials.
    #[error("Invalid username or password")]
    InvalidCredentials,

    /// An admin route was called without a valid session.
    #[error("Admin session missing or expired\n\nSuggestion: Log in again")]
    Unauthorized,

    // ========================================================================
    // Local Preference Errors
    // ========================================================================
    /// The preference file could not be written.
    #[error("Failed to save preferences to '{path}': {message}\n\nSuggestion: Check write permissions for the preferences file")]
    PreferenceWrite {
        /// Path of the preference file.
        path: PathBuf,
        /// Description of the write failure.
        message: String,
    },

    // ========================================================================
    // General Errors
    // ========================================================================
    /// General I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Categories of AI service errors for structured error handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LlmErrorKind {
    /// Authentication failure (invalid API key).
    Authentication,
    /// Rate limit or quota exceeded.
    RateLimit,
    /// Server error (5xx responses).
    Server,
    /// Network connectivity issues or timeouts.
    Network,
    /// Other unclassified errors.
    Other,
}

impl std::fmt::Display for LlmErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Authentication => write!(f, "authentication"),
            Self::RateLimit => write!(f, "rate_limit"),
            Self::Server => write!(f, "server"),
            Self::Network => write!(f, "network"),
            Self::Other => write!(f, "other"),
        }
    }
}

impl LlmErrorKind {
    /// Classifies an HTTP status returned by the AI service.
    #[must_use]
    pub const fn from_status(status: u16) -> Self {
        match status {
            401 | 403 => Self::Authentication,
            429 => Self::RateLimit,
            500..=599 => Self::Server,
            _ => Self::Other,
        }
    }

    /// Returns a suggestion message for this error kind.
    #[must_use]
    pub const fn suggestion(&self) -> &'static str {
        match self {
            Self::Authentication => "Check the AI API key (ai.apiKey or EDU_AI_KEY)",
            Self::RateLimit => "Wait a moment and try again",
            Self::Server => "Try again later; the AI service may be experiencing issues",
            Self::Network => "Check your network connection",
            Self::Other => "Check the AI service status page",
        }
    }
}

impl SiteError {
    /// Creates a new `ConfigParseError` with the given path and message.
    #[must_use]
    pub fn config_parse(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::ConfigParseError {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Creates a new `ConfigValidationError` with the given message and suggestion.
    #[must_use]
    pub fn config_validation(message: impl Into<String>, suggestion: impl Into<String>) -> Self {
        Self::ConfigValidationError {
            message: message.into(),
            suggestion: suggestion.into(),
        }
    }

    /// Creates a new `RemoteWrite` error.
    #[must_use]
    pub fn remote_write(table: Table, operation: Operation, source: RemoteError) -> Self {
        Self::RemoteWrite {
            table,
            operation,
            source,
        }
    }

    /// Creates a new `RowDecode` error.
    #[must_use]
    pub fn row_decode(table: Table, message: impl Into<String>) -> Self {
        Self::RowDecode {
            table,
            message: message.into(),
        }
    }

    /// Creates a new `LlmApiError` with automatic suggestion based on error kind.
    #[must_use]
    pub fn llm_api_error(kind: LlmErrorKind, message: impl Into<String>) -> Self {
        let suggestion = kind.suggestion().to_string();
        Self::LlmApiError {
            kind,
            message: message.into(),
            suggestion,
        }
    }

    /// Creates a new `OutlineMalformed` error.
    #[must_use]
    pub fn outline_malformed(message: impl Into<String>) -> Self {
        Self::OutlineMalformed {
            message: message.into(),
        }
    }

    /// Creates a new `PreferenceWrite` error.
    #[must_use]
    pub fn preference_write(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::PreferenceWrite {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Returns `true` if the error came from a collaborator outside this
    /// process (remote store or AI service) rather than from the request.
    #[must_use]
    pub const fn is_upstream(&self) -> bool {
        matches!(
            self,
            Self::RemoteWrite { .. }
                | Self::RowDecode { .. }
                | Self::MissingRemoteId { .. }
                | Self::LlmApiError { .. }
                | Self::OutlineMalformed { .. }
                | Self::OutlineTooShort { .. }
        )
    }
}
