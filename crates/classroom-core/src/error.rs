//! Error types for the Classroom core library.
//!
//! Covers configuration loading, the chat relay channel, lesson gating and
//! course data fetching. Every user-facing variant carries a suggestion.

use std::path::PathBuf;

/// A specialized `Result` type for Classroom operations.
pub type Result<T> = std::result::Result<T, ClassroomError>;

/// Errors that can occur in the chat session, lesson gate or their collaborators.
#[derive(Debug, thiserror::Error)]
pub enum ClassroomError {
    // ========================================================================
    // Configuration Errors
    // ========================================================================
    /// Invalid JSON syntax in configuration file.
    #[error("Invalid JSON in config file '{path}': {message}\n\nSuggestion: Validate your classroom.json with a JSON linter")]
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
        /// Actionable suggestion for the user.
        suggestion: String,
    },

    // ========================================================================
    // Chat Relay Errors
    // ========================================================================
    /// The relay endpoint could not be reached.
    #[error("Cannot connect to chat relay '{endpoint}': {message}\n\nSuggestion: Check that the relay is running (try 'classroom serve') and relayEndpoint is correct")]
    ConnectionError {
        /// The endpoint that was dialed.
        endpoint: String,
        /// Description of the connection failure.
        message: String,
    },

    /// An outbound chat message could not be handed to the relay channel.
    #[error("Failed to send chat message: {message}")]
    SendFailure {
        /// Description of the send failure.
        message: String,
    },

    /// A chat message with no visible text was submitted.
    #[error("Chat message is empty")]
    EmptyMessage,

    // ========================================================================
    // Lesson Gate Errors
    // ========================================================================
    /// The user tried to play a video that is still locked.
    #[error("Lesson {video} in section {section} is locked\n\nSuggestion: Complete the previous lesson first")]
    LockedSelection {
        /// Section index of the rejected selection.
        section: usize,
        /// Video index of the rejected selection.
        video: usize,
    },

    /// The selection does not reference an existing video.
    #[error("No lesson {video} in section {section}")]
    SelectionOutOfRange {
        /// Requested section index.
        section: usize,
        /// Requested video index.
        video: usize,
    },

    // ========================================================================
    // Course Data Errors
    // ========================================================================
    /// The course data provider failed.
    #[error("Course data request failed: {message}\n\nSuggestion: Check apiBaseUrl and that the catalog server is reachable")]
    ProviderError {
        /// Description of the provider failure.
        message: String,
    },

    // ========================================================================
    // General I/O Errors
    // ========================================================================
    /// General I/O error during file operations.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ClassroomError {
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

    /// Creates a new `ConnectionError`.
    #[must_use]
    pub fn connection(endpoint: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ConnectionError {
            endpoint: endpoint.into(),
            message: message.into(),
        }
    }

    /// Creates a new `SendFailure`.
    #[must_use]
    pub fn send_failure(message: impl Into<String>) -> Self {
        Self::SendFailure {
            message: message.into(),
        }
    }

    /// Creates a new `ProviderError`.
    #[must_use]
    pub fn provider(message: impl Into<String>) -> Self {
        Self::ProviderError {
            message: message.into(),
        }
    }

    /// Returns `true` if this error is transient and may be retried.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::ConnectionError { .. } | Self::SendFailure { .. } | Self::ProviderError { .. }
        )
    }

    /// Returns `true` if this error is fatal and requires immediate termination.
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::ConfigParseError { .. } | Self::ConfigValidationError { .. }
        )
    }
}
