//! Error types for book lookups

/// Result type for lookup operations
pub type Result<T> = std::result::Result<T, LookupError>;

/// Error types for lookup operations.
///
/// A source that was reached but had no matching book is not an error;
/// see [`crate::sources::SourceLookup::NotFound`].
#[derive(thiserror::Error, Debug)]
pub enum LookupError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Source {source_name} unavailable: {message}")]
    SourceUnavailable {
        source_name: String,
        message: String,
    },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl LookupError {
    pub fn unavailable(source_name: impl Into<String>, message: impl ToString) -> Self {
        Self::SourceUnavailable {
            source_name: source_name.into(),
            message: message.to_string(),
        }
    }

    /// Whether the caller made a mistake (maps to a 4xx response)
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::InvalidInput(_))
    }
}
