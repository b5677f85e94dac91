//! # Error Types
//!
//! Error taxonomy for the Watson output registry using `thiserror`.

/// Custom result type for Watson operations
pub type Result<T> = std::result::Result<T, WatsonError>;

/// Main error type for the Watson registry
#[derive(thiserror::Error, Debug)]
pub enum WatsonError {
    /// Configuration errors
    #[error("Configuration error: {message}")]
    Config {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Database and storage errors
    #[error("Database error: {context}")]
    Database {
        #[source]
        source: sqlx::Error,
        context: String,
    },

    /// I/O errors with additional context
    #[error("I/O error: {context}")]
    Io {
        #[source]
        source: std::io::Error,
        context: String,
    },

    /// Serialization/deserialization errors
    #[error("Serialization error: {context}")]
    Serialization {
        #[source]
        source: serde_json::Error,
        context: String,
    },

    /// Validation errors, raised before anything is persisted
    #[error("Validation error: {message}")]
    Validation { message: String, field: Option<String> },

    /// Encryption or decryption of a sensitive value failed
    #[error("Cipher error: {message}")]
    Cipher { message: String },

    /// Errors talking to a remote Watson server
    #[error("HTTP error: {message} (status: {status})")]
    Http { message: String, status: u16 },

    /// Internal server errors
    #[error("Internal server error: {message}")]
    Internal {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Resource not found errors
    #[error("{message}")]
    NotFound { resource_type: String, id: String, message: String },

    /// Uniqueness or integrity conflicts reported by the store
    #[error("Resource conflict: {message}")]
    Conflict { message: String, resource_type: String },
}

impl WatsonError {
    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config { message: message.into(), source: None }
    }

    /// Create a configuration error with source
    pub fn config_with_source<S: Into<String>>(
        message: S,
        source: Box<dyn std::error::Error + Send + Sync>,
    ) -> Self {
        Self::Config { message: message.into(), source: Some(source) }
    }

    /// Create a database error with context
    pub fn database<S: Into<String>>(source: sqlx::Error, context: S) -> Self {
        Self::Database { source, context: context.into() }
    }

    /// Create a validation error
    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation { message: message.into(), field: None }
    }

    /// Create a validation error with field information
    pub fn validation_field<S: Into<String>, F: Into<String>>(message: S, field: F) -> Self {
        Self::Validation { message: message.into(), field: Some(field.into()) }
    }

    /// Create a cipher error
    pub fn cipher<S: Into<String>>(message: S) -> Self {
        Self::Cipher { message: message.into() }
    }

    /// Create an HTTP error
    pub fn http<S: Into<String>>(message: S, status: u16) -> Self {
        Self::Http { message: message.into(), status }
    }

    /// Create an internal server error
    pub fn internal<S: Into<String>>(message: S) -> Self {
        Self::Internal { message: message.into(), source: None }
    }

    /// Create a not found error
    pub fn not_found<R: Into<String>, I: Into<String>>(resource_type: R, id: I) -> Self {
        let (resource_type, id) = (resource_type.into(), id.into());
        let message = format!("Resource not found: {} '{}'", resource_type, id);
        Self::NotFound { resource_type, id, message }
    }

    /// Create a not found error for a missing output key
    pub fn output_not_found<K: Into<String>>(key: K) -> Self {
        let id = key.into();
        let message = format!("'{}' is not present in the outputs.", id);
        Self::NotFound { resource_type: "output".to_string(), id, message }
    }

    /// Create a conflict error
    pub fn conflict<M: Into<String>, R: Into<String>>(message: M, resource_type: R) -> Self {
        Self::Conflict { message: message.into(), resource_type: resource_type.into() }
    }

    /// Get the HTTP status code that should be returned for this error
    pub fn status_code(&self) -> u16 {
        match self {
            WatsonError::Config { .. } => 500,
            WatsonError::Database { .. } => 500,
            WatsonError::Io { .. } => 500,
            WatsonError::Serialization { .. } => 500,
            WatsonError::Validation { .. } => 400,
            WatsonError::Cipher { .. } => 500,
            WatsonError::Http { status, .. } => *status,
            WatsonError::Internal { .. } => 500,
            WatsonError::NotFound { .. } => 404,
            WatsonError::Conflict { .. } => 409,
        }
    }
}

// Error conversions for common external error types
impl From<sqlx::Error> for WatsonError {
    fn from(error: sqlx::Error) -> Self {
        Self::Database { source: error, context: "Database operation failed".to_string() }
    }
}

impl From<std::io::Error> for WatsonError {
    fn from(error: std::io::Error) -> Self {
        Self::Io { source: error, context: "I/O operation failed".to_string() }
    }
}

impl From<serde_json::Error> for WatsonError {
    fn from(error: serde_json::Error) -> Self {
        Self::Serialization { source: error, context: "JSON serialization failed".to_string() }
    }
}

impl From<validator::ValidationErrors> for WatsonError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let message = errors
            .field_errors()
            .iter()
            .map(|(field, field_errors)| {
                let error_messages: Vec<String> = field_errors
                    .iter()
                    .map(|e| {
                        e.message.as_ref().map_or("Invalid value".to_string(), |m| m.to_string())
                    })
                    .collect();
                format!("{}: {}", field, error_messages.join(", "))
            })
            .collect::<Vec<_>>()
            .join("; ");

        Self::validation(format!("Validation failed: {}", message))
    }
}
