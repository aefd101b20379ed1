//! Error handling types
//!
//! One enum covers the whole surface taxonomy; the server layer maps each
//! variant to an HTTP envelope via [`Error::code`].

use thiserror::Error;

/// Result type alias for operations that can fail
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the VortexDB gateway
#[derive(Error, Debug)]
pub enum Error {
    /// RBAC/ABAC rejection
    #[error("Access denied: {reason}")]
    AccessDenied {
        /// Human-readable reason, suitable for audit
        reason: String,
    },

    /// Missing or invalid credentials
    #[error("Unauthorized: {message}")]
    Unauthorized {
        /// Description of the authentication failure
        message: String,
    },

    /// Schema or parameter validation failure
    #[error("Invalid request: {message}")]
    InvalidRequest {
        /// Description of the invalid input
        message: String,
    },

    /// Defense engine rejection (injection or vector anomaly)
    #[error("Anomaly detected: {reason}")]
    AnomalyDetected {
        /// Which detector fired and why
        reason: String,
    },

    /// Sliding-window rate limit exceeded
    #[error("Rate limit exceeded")]
    RateLimited,

    /// Daily export quota exhausted
    #[error("Quota exceeded: {message}")]
    QuotaExceeded {
        /// Current usage vs the tier cap
        message: String,
    },

    /// Resource not found error
    #[error("Not found: {resource}")]
    NotFound {
        /// The resource that was not found
        resource: String,
    },

    /// External backend (vector store / redis) unreachable
    #[error("Upstream unavailable: {message}")]
    Upstream {
        /// Description of the upstream failure
        message: String,
        /// Optional source error
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Encryption or decryption failure; the affected write is aborted
    #[error("Encryption failure: {message}")]
    Encryption {
        /// Description of the failure (never includes key material)
        message: String,
    },

    /// Job accepted but handing it to a worker failed
    #[error("Job dispatch failure: {message}")]
    JobDispatch {
        /// Description of the dispatch failure
        message: String,
    },

    /// A job of this type is already queued or running, or inside cooldown
    #[error("Job skipped: {message}")]
    JobSkipped {
        /// Why the enqueue was skipped
        message: String,
    },

    /// Embedding or cross-encoder provider error
    #[error("Encoder error: {message}")]
    Encoder {
        /// Description of the encoder failure
        message: String,
    },

    /// Database-related error
    #[error("Database error: {message}")]
    Database {
        /// Description of the database error
        message: String,
        /// Optional source error
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Configuration-related error
    #[error("Configuration error: {message}")]
    Config {
        /// Description of the configuration error
        message: String,
    },

    /// I/O operation error
    #[error("I/O error: {message}")]
    Io {
        /// Description of the I/O error
        message: String,
        /// Optional source error
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// JSON parsing or serialization error
    #[error("JSON error: {source}")]
    Json {
        /// The underlying JSON error
        #[from]
        source: serde_json::Error,
    },

    /// Internal system error
    #[error("Internal error: {message}")]
    Internal {
        /// Description of the internal error
        message: String,
    },
}

impl Error {
    /// Stable machine-readable code for the error envelope
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::AccessDenied { .. } => "ACCESS_DENIED",
            Self::Unauthorized { .. } => "UNAUTHORIZED",
            Self::InvalidRequest { .. } => "INVALID_REQUEST",
            Self::AnomalyDetected { .. } => "ANOMALY_DETECTED",
            Self::RateLimited => "RATE_LIMITED",
            Self::QuotaExceeded { .. } => "QUOTA_EXCEEDED",
            Self::NotFound { .. } => "DOCUMENT_NOT_FOUND",
            Self::Upstream { .. } => "UPSTREAM_UNAVAILABLE",
            Self::Encryption { .. } => "ENCRYPTION_FAILURE",
            Self::JobDispatch { .. } => "JOB_DISPATCH_FAILURE",
            Self::JobSkipped { .. } => "JOB_SKIPPED",
            Self::Encoder { .. } | Self::Internal { .. } => "INTERNAL_ERROR",
            Self::Database { .. } => "INTERNAL_ERROR",
            Self::Config { .. } => "INVALID_CONFIG",
            Self::Io { .. } => "INTERNAL_ERROR",
            Self::Json { .. } => "INVALID_FORMAT",
        }
    }
}

// Error creation methods
impl Error {
    /// Create an access denied error
    pub fn access_denied<S: Into<String>>(reason: S) -> Self {
        Self::AccessDenied {
            reason: reason.into(),
        }
    }

    /// Create an unauthorized error
    pub fn unauthorized<S: Into<String>>(message: S) -> Self {
        Self::Unauthorized {
            message: message.into(),
        }
    }

    /// Create an invalid request error
    pub fn invalid_request<S: Into<String>>(message: S) -> Self {
        Self::InvalidRequest {
            message: message.into(),
        }
    }

    /// Create an anomaly detected error
    pub fn anomaly<S: Into<String>>(reason: S) -> Self {
        Self::AnomalyDetected {
            reason: reason.into(),
        }
    }

    /// Create a quota exceeded error
    pub fn quota_exceeded<S: Into<String>>(message: S) -> Self {
        Self::QuotaExceeded {
            message: message.into(),
        }
    }

    /// Create a not found error
    pub fn not_found<S: Into<String>>(resource: S) -> Self {
        Self::NotFound {
            resource: resource.into(),
        }
    }

    /// Create an upstream error
    pub fn upstream<S: Into<String>>(message: S) -> Self {
        Self::Upstream {
            message: message.into(),
            source: None,
        }
    }

    /// Create an upstream error with source
    pub fn upstream_with_source<S: Into<String>, E: std::error::Error + Send + Sync + 'static>(
        message: S,
        source: E,
    ) -> Self {
        Self::Upstream {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create an encryption error
    pub fn encryption<S: Into<String>>(message: S) -> Self {
        Self::Encryption {
            message: message.into(),
        }
    }

    /// Create a job dispatch error
    pub fn job_dispatch<S: Into<String>>(message: S) -> Self {
        Self::JobDispatch {
            message: message.into(),
        }
    }

    /// Create a job skipped error
    pub fn job_skipped<S: Into<String>>(message: S) -> Self {
        Self::JobSkipped {
            message: message.into(),
        }
    }

    /// Create an encoder error
    pub fn encoder<S: Into<String>>(message: S) -> Self {
        Self::Encoder {
            message: message.into(),
        }
    }

    /// Create a database error
    pub fn database<S: Into<String>>(message: S) -> Self {
        Self::Database {
            message: message.into(),
            source: None,
        }
    }

    /// Create a database error with source
    pub fn database_with_source<S: Into<String>, E: std::error::Error + Send + Sync + 'static>(
        message: S,
        source: E,
    ) -> Self {
        Self::Database {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create an I/O error
    pub fn io<S: Into<String>>(message: S) -> Self {
        Self::Io {
            message: message.into(),
            source: None,
        }
    }

    /// Create an I/O error with source
    pub fn io_with_source<S: Into<String>, E: std::error::Error + Send + Sync + 'static>(
        message: S,
        source: E,
    ) -> Self {
        Self::Io {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create an internal error
    pub fn internal<S: Into<String>>(message: S) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }
}
