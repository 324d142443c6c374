//! Error types for the testbench harness.

/// Result type alias for testbench operations.
pub type Result<T> = std::result::Result<T, TestbenchError>;

/// Main error type for the testbench harness.
#[derive(Debug, thiserror::Error)]
pub enum TestbenchError {
    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// TOML parse errors
    #[error("TOML parse error: {0}")]
    TomlDe(#[from] toml::de::Error),

    /// TOML write errors
    #[error("TOML write error: {0}")]
    TomlSer(#[from] toml::ser::Error),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid input errors
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Not found errors
    #[error("Not found: {resource} {id}")]
    NotFound { resource: String, id: String },

    /// Generator backend errors
    #[error("Generator error: {0}")]
    Generator(String),

    /// Non-success HTTP response from a backend
    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    /// Timeout errors
    #[error("Operation timed out: {0}")]
    Timeout(String),

    /// Generic internal errors
    #[error("Internal error: {0}")]
    Internal(String),
}

impl TestbenchError {
    /// Create a new config error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a new invalid input error
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Create a new not found error
    pub fn not_found(resource: impl Into<String>, id: impl Into<String>) -> Self {
        Self::NotFound {
            resource: resource.into(),
            id: id.into(),
        }
    }

    /// Create a new generator error
    pub fn generator(msg: impl Into<String>) -> Self {
        Self::Generator(msg.into())
    }

    /// Create a new HTTP status error
    pub fn http(status: u16, body: impl Into<String>) -> Self {
        Self::Http {
            status,
            body: body.into(),
        }
    }

    /// Create a new timeout error
    pub fn timeout(msg: impl Into<String>) -> Self {
        Self::Timeout(msg.into())
    }

    /// Create a new internal error
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Whether a retry has a chance of succeeding.
    ///
    /// Rate limiting (429), server errors (5xx) and timeouts are transient.
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::Http { status, .. } => *status == 429 || *status >= 500,
            Self::Timeout(_) => true,
            _ => false,
        }
    }

    /// Check if this is a not found error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recoverable_classification() {
        assert!(TestbenchError::http(429, "slow down").is_recoverable());
        assert!(TestbenchError::http(503, "unavailable").is_recoverable());
        assert!(TestbenchError::timeout("api call").is_recoverable());

        assert!(!TestbenchError::http(401, "bad key").is_recoverable());
        assert!(!TestbenchError::config("missing key").is_recoverable());
        assert!(!TestbenchError::generator("empty response").is_recoverable());
    }

    #[test]
    fn test_display() {
        let err = TestbenchError::not_found("session", "7");
        assert_eq!(err.to_string(), "Not found: session 7");
        assert!(err.is_not_found());

        let err = TestbenchError::http(500, "boom");
        assert_eq!(err.to_string(), "HTTP 500: boom");
    }
}
