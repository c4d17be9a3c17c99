/// Centralized error types for type-context using thiserror
///
/// Unresolvable or external types are not errors here: they are resolution
/// outcomes the driver skips or renders as leaf cards.
use thiserror::Error;

/// Main error type for context extraction
#[derive(Error, Debug)]
pub enum ContextError {
    #[error("No declaration in '{path}' matches signature `{signature}`")]
    SignatureMismatch { path: String, signature: String },

    #[error("Signature could not be parsed: {0}")]
    InvalidSignature(String),

    #[error("Unsupported language: {0}")]
    UnsupportedLanguage(String),

    #[error("Extraction was cancelled")]
    Cancelled,

    #[error("Symbol provider error: {0}")]
    Provider(#[from] ProviderError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

/// Errors raised by a symbol provider backend
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("Query '{query}' timed out after {millis} ms")]
    Timeout { query: String, millis: u64 },

    #[error("Symbol provider unavailable: {0}")]
    Unavailable(String),

    #[error("Symbol provider was queried before it was started")]
    NotStarted,

    #[error("Failed to parse '{path}': {reason}")]
    ParseFailed { path: String, reason: String },

    #[error("File not found in workspace: {0}")]
    FileNotFound(String),
}

/// Errors related to configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to load configuration file: {0}")]
    LoadFailed(String),

    #[error("Failed to parse configuration: {0}")]
    ParseFailed(String),

    #[error("Invalid configuration value for '{key}': {reason}")]
    InvalidValue { key: String, reason: String },

    #[error("Failed to save configuration: {0}")]
    SaveFailed(String),

    #[error("Configuration file not found: {0}")]
    FileNotFound(String),
}

/// Errors related to input validation
#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("Path does not exist: {0}")]
    PathNotFound(String),

    #[error("Path is not a directory: {0}")]
    NotADirectory(String),

    #[error("Invalid path: {0}")]
    InvalidPath(String),

    #[error("Empty {0}")]
    Empty(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

// Conversion from anyhow::Error to ContextError
impl From<anyhow::Error> for ContextError {
    fn from(err: anyhow::Error) -> Self {
        ContextError::Other(format!("{:#}", err))
    }
}

impl ContextError {
    /// Create a new error from a string message
    pub fn other(msg: impl Into<String>) -> Self {
        ContextError::Other(msg.into())
    }

    /// Check if this is a user error (bad input) vs system error
    pub fn is_user_error(&self) -> bool {
        matches!(
            self,
            ContextError::SignatureMismatch { .. }
                | ContextError::InvalidSignature(_)
                | ContextError::UnsupportedLanguage(_)
                | ContextError::Validation(_)
                | ContextError::Config(ConfigError::InvalidValue { .. })
        )
    }

    /// Check if retrying the same call could succeed
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ContextError::Provider(ProviderError::Timeout { .. })
                | ContextError::Provider(ProviderError::Unavailable(_))
                | ContextError::Io(_)
        )
    }

    /// Shorthand for a provider timeout
    pub fn timeout(query: impl Into<String>, millis: u64) -> Self {
        ContextError::Provider(ProviderError::Timeout {
            query: query.into(),
            millis,
        })
    }
}
