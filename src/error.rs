//! Error types for pgdash.
//!
//! Defines the main error enum used throughout the application.

use thiserror::Error;

/// Main error type for pgdash operations.
#[derive(Error, Debug)]
pub enum PgdashError {
    /// Database connection errors (missing credentials, host unreachable, auth failed, etc.)
    #[error("Connection error: {0}")]
    Connection(String),

    /// Query execution errors (syntax errors, constraint violations, refused statements, etc.)
    #[error("Query error: {0}")]
    Query(String),

    /// Configuration errors (invalid config file, unparseable environment values, etc.)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Export errors (CSV encoding, unwritable output file, etc.)
    #[error("Export error: {0}")]
    Export(String),

    /// Internal application errors (terminal failures, unexpected states, etc.)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl PgdashError {
    /// Creates a connection error with the given message.
    pub fn connection(msg: impl Into<String>) -> Self {
        Self::Connection(msg.into())
    }

    /// Creates a query error with the given message.
    pub fn query(msg: impl Into<String>) -> Self {
        Self::Query(msg.into())
    }

    /// Creates a configuration error with the given message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Creates an export error with the given message.
    pub fn export(msg: impl Into<String>) -> Self {
        Self::Export(msg.into())
    }

    /// Creates an internal error with the given message.
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Returns the error category as a string for display purposes.
    pub fn category(&self) -> &'static str {
        match self {
            Self::Connection(_) => "Connection Error",
            Self::Query(_) => "Query Error",
            Self::Config(_) => "Configuration Error",
            Self::Export(_) => "Export Error",
            Self::Internal(_) => "Internal Error",
        }
    }

    /// Returns the message without the category prefix.
    pub fn message(&self) -> &str {
        match self {
            Self::Connection(msg)
            | Self::Query(msg)
            | Self::Config(msg)
            | Self::Export(msg)
            | Self::Internal(msg) => msg,
        }
    }

    /// Returns true if no database handle could be obtained.
    pub fn is_connection(&self) -> bool {
        matches!(self, Self::Connection(_))
    }
}

impl From<csv::Error> for PgdashError {
    fn from(e: csv::Error) -> Self {
        Self::Export(e.to_string())
    }
}

/// Result type alias using PgdashError.
pub type Result<T> = std::result::Result<T, PgdashError>;
