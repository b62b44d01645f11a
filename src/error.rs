//! Error types for survey-synth
//!
//! Provides structured error handling with:
//! - Numeric error codes for machine parsing
//! - User-friendly messages with suggestions
//! - Retryable/fatal classification for the submission loop
//! - Exit codes for CLI

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for survey-synth operations
pub type Result<T> = std::result::Result<T, Error>;

/// Numeric error codes for machine parsing and documentation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u16)]
pub enum ErrorCode {
    // Configuration errors (1xx)
    ConfigNotFound = 100,
    ConfigParseError = 101,
    ConfigValidation = 102,

    // IO errors (2xx)
    IoRead = 200,
    IoWrite = 201,
    IoPermission = 202,
    IoNotFound = 203,
    Serialization = 204,

    // Sink errors (3xx)
    SinkRequestFailed = 300,
    SinkTimeout = 301,
    SinkRejected = 302,
    SinkUnavailable = 303,

    // Generation precondition errors (4xx)
    PoolSizeMismatch = 400,
    EmptyItemCatalog = 401,
    InvalidPlan = 402,

    // Internal errors (9xx)
    InternalError = 900,
    NotSupported = 902,
}

impl ErrorCode {
    /// Get the string code (e.g., "E100")
    pub fn as_str(&self) -> String {
        format!("E{}", *self as u16)
    }

    /// Get the exit code for CLI
    pub fn exit_code(&self) -> i32 {
        match *self as u16 {
            100..=199 => 10, // Config errors
            200..=299 => 20, // IO errors
            300..=399 => 30, // Sink errors
            400..=499 => 40, // Generation preconditions
            900..=999 => 90, // Internal errors
            _ => 1,
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Main error type
#[derive(Error, Debug)]
pub enum Error {
    // ─────────────────────────────────────────────────────────────
    // Configuration Errors
    // ─────────────────────────────────────────────────────────────

    /// Configuration file not found
    #[error("Configuration file not found: {path}")]
    ConfigNotFound {
        path: PathBuf,
        #[source]
        source: Option<std::io::Error>,
    },

    /// Configuration parse error
    #[error("Failed to parse configuration: {message}")]
    ConfigParse {
        message: String,
        #[source]
        source: Option<toml::de::Error>,
    },

    /// Configuration validation error
    #[error("Configuration validation failed: {message}")]
    ConfigValidation { message: String, field: Option<String> },

    // ─────────────────────────────────────────────────────────────
    // IO Errors
    // ─────────────────────────────────────────────────────────────

    /// File read error
    #[error("Failed to read file: {path}")]
    IoRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// File write error
    #[error("Failed to write file: {path}")]
    IoWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Generic IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// TOML serialization error
    #[error("TOML serialization error: {0}")]
    Toml(#[from] toml::ser::Error),

    /// JSON encoding of a record failed
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    // ─────────────────────────────────────────────────────────────
    // Sink Errors
    // ─────────────────────────────────────────────────────────────

    /// Request to the data service could not be completed
    #[error("Request to table '{table}' failed: {message}")]
    SinkRequest { table: String, message: String },

    /// Request timed out
    #[error("Request to table '{table}' timed out after {timeout_secs}s")]
    SinkTimeout { table: String, timeout_secs: u64 },

    /// Data service answered with a non-success status
    #[error("Data service rejected write to '{table}' (HTTP {status}): {body}")]
    SinkRejected {
        table: String,
        status: u16,
        body: String,
    },

    /// Generic sink error
    #[error("Sink error: {0}")]
    Sink(String),

    // ─────────────────────────────────────────────────────────────
    // Generation Precondition Errors
    // ─────────────────────────────────────────────────────────────

    /// An attribute pool does not cover the population exactly
    #[error("{stakeholder} pool '{field}' holds {actual} entries, population size is {expected}")]
    PoolSizeMismatch {
        stakeholder: String,
        field: String,
        expected: usize,
        actual: usize,
    },

    /// A rating section has no items
    #[error("No rating items defined for {stakeholder} section {section}")]
    EmptyItemCatalog { stakeholder: String, section: String },

    /// Any other inconsistency in the generation inputs
    #[error("Invalid generation plan: {0}")]
    InvalidPlan(String),

    // ─────────────────────────────────────────────────────────────
    // Internal Errors
    // ─────────────────────────────────────────────────────────────

    /// Feature not supported
    #[error("Not supported: {0}")]
    NotSupported(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    // ─────────────────────────────────────────────────────────────
    // Error Classification
    // ─────────────────────────────────────────────────────────────

    /// Get the numeric error code
    pub fn code(&self) -> ErrorCode {
        match self {
            Error::ConfigNotFound { .. } => ErrorCode::ConfigNotFound,
            Error::ConfigParse { .. } => ErrorCode::ConfigParseError,
            Error::ConfigValidation { .. } => ErrorCode::ConfigValidation,

            Error::IoRead { .. } => ErrorCode::IoRead,
            Error::IoWrite { .. } => ErrorCode::IoWrite,
            Error::Io(e) => match e.kind() {
                std::io::ErrorKind::NotFound => ErrorCode::IoNotFound,
                std::io::ErrorKind::PermissionDenied => ErrorCode::IoPermission,
                _ => ErrorCode::IoRead,
            },
            Error::Toml(_) => ErrorCode::Serialization,
            Error::Json(_) => ErrorCode::Serialization,

            Error::SinkRequest { .. } => ErrorCode::SinkRequestFailed,
            Error::SinkTimeout { .. } => ErrorCode::SinkTimeout,
            Error::SinkRejected { .. } => ErrorCode::SinkRejected,
            Error::Sink(_) => ErrorCode::SinkUnavailable,

            Error::PoolSizeMismatch { .. } => ErrorCode::PoolSizeMismatch,
            Error::EmptyItemCatalog { .. } => ErrorCode::EmptyItemCatalog,
            Error::InvalidPlan(_) => ErrorCode::InvalidPlan,

            Error::NotSupported(_) => ErrorCode::NotSupported,
            Error::Internal(_) => ErrorCode::InternalError,
        }
    }

    /// Check if the failed operation can be attempted again
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::SinkRequest { .. } | Error::SinkTimeout { .. } | Error::Sink(_) => true,
            // Rate limits and server-side hiccups
            Error::SinkRejected { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }

    /// Check if the error must stop the run before anything is generated
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Error::ConfigNotFound { .. }
                | Error::ConfigParse { .. }
                | Error::ConfigValidation { .. }
                | Error::PoolSizeMismatch { .. }
                | Error::EmptyItemCatalog { .. }
                | Error::InvalidPlan(_)
                | Error::Internal(_)
        )
    }

    /// Get the exit code for CLI
    pub fn exit_code(&self) -> i32 {
        self.code().exit_code()
    }

    // ─────────────────────────────────────────────────────────────
    // User-Friendly Messages
    // ─────────────────────────────────────────────────────────────

    /// Get a user-friendly suggestion for how to fix this error
    pub fn suggestion(&self) -> Option<&'static str> {
        match self {
            Error::ConfigNotFound { .. } => Some(
                "Run 'survey-synth config init' to create a default configuration file."
            ),
            Error::ConfigParse { .. } => Some(
                "Check your configuration file syntax. Run 'survey-synth config validate' to see details."
            ),
            Error::ConfigValidation { .. } => Some(
                "Review the configuration file and fix the invalid values. Run 'survey-synth config show' to see effective settings."
            ),

            Error::SinkRequest { .. } => Some(
                "Check your network connection and verify [sink] base_url points at the data service."
            ),
            Error::SinkTimeout { .. } => Some(
                "The data service may be slow or unreachable. Raise [sink] timeout_secs or retry later."
            ),
            Error::SinkRejected { status: 401, .. } | Error::SinkRejected { status: 403, .. } => Some(
                "The data service refused the API key. Set [sink] api_key or SURVEY_SYNTH_API_KEY."
            ),
            Error::SinkRejected { status: 429, .. } => Some(
                "Rate limited. Lower [submission] pause_every or raise pause_ms."
            ),
            Error::SinkRejected { .. } => Some(
                "The data service refused the rows. Check that the tables and columns exist."
            ),

            Error::PoolSizeMismatch { .. } => Some(
                "Every attribute pool must hold exactly one entry per persona. Adjust the pool counts or the population size."
            ),
            Error::EmptyItemCatalog { .. } => Some(
                "Each stakeholder type needs at least one item in every section."
            ),

            _ => None,
        }
    }

    /// Format the error for terminal display with colors
    pub fn format_for_terminal(&self) -> String {
        let code = self.code();
        let suggestion = self.suggestion();

        let mut output = format!(
            "\x1b[31mError [{}]\x1b[0m: {}\n",
            code.as_str(),
            self
        );

        if let Some(hint) = suggestion {
            output.push_str(&format!("\n\x1b[33mHint\x1b[0m: {}\n", hint));
        }

        output
    }

    /// Format the error for logging (no colors)
    pub fn format_for_log(&self) -> String {
        let code = self.code();
        format!("[{}] {}", code.as_str(), self)
    }
}

// ─────────────────────────────────────────────────────────────────
// Error Constructors (for ergonomic error creation)
// ─────────────────────────────────────────────────────────────────

impl Error {
    /// Create a config not found error
    pub fn config_not_found(path: impl Into<PathBuf>) -> Self {
        Error::ConfigNotFound {
            path: path.into(),
            source: None,
        }
    }

    /// Create a config validation error
    pub fn config_validation(message: impl Into<String>) -> Self {
        Error::ConfigValidation {
            message: message.into(),
            field: None,
        }
    }

    /// Create a config validation error with field name
    pub fn config_field_invalid(field: impl Into<String>, message: impl Into<String>) -> Self {
        Error::ConfigValidation {
            message: message.into(),
            field: Some(field.into()),
        }
    }

    /// Create a sink request error
    pub fn sink_request(table: impl Into<String>, message: impl Into<String>) -> Self {
        Error::SinkRequest {
            table: table.into(),
            message: message.into(),
        }
    }

    /// Create a pool size mismatch error
    pub fn pool_mismatch(
        stakeholder: impl fmt::Display,
        field: impl Into<String>,
        expected: usize,
        actual: usize,
    ) -> Self {
        Error::PoolSizeMismatch {
            stakeholder: stakeholder.to_string(),
            field: field.into(),
            expected,
            actual,
        }
    }
}

// ─────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────
