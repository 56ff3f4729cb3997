//! Error types for visitorip hosts and handler modules

use http::StatusCode;
use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// Result type alias for request handling
pub type Result<T, E = ApiError> = std::result::Result<T, E>;

/// Error returned by a handler in the chain
///
/// The host turns it into a JSON error response once it leaves the
/// outermost middleware.
#[derive(Debug, Clone)]
pub struct ApiError {
    /// HTTP status code
    pub status: StatusCode,
    /// Error type identifier
    pub error_type: String,
    /// Human-readable error message
    pub message: String,
    /// Internal details, kept out of the response body
    pub(crate) internal: Option<String>,
}

impl ApiError {
    /// Create a new API error
    pub fn new(status: StatusCode, error_type: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            status,
            error_type: error_type.into(),
            message: message.into(),
            internal: None,
        }
    }

    /// Create a 400 Bad Request error
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "bad_request", message)
    }

    /// Create a 404 Not Found error
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, "not_found", message)
    }

    /// Create a 500 Internal Server Error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "internal_error", message)
    }

    /// Create a 503 Service Unavailable error
    pub fn service_unavailable(message: impl Into<String>) -> Self {
        Self::new(StatusCode::SERVICE_UNAVAILABLE, "service_unavailable", message)
    }

    /// Add internal details (logged by the host, never sent to the client)
    pub fn with_internal(mut self, details: impl Into<String>) -> Self {
        self.internal = Some(details.into());
        self
    }

    /// Internal details, if any
    pub fn internal_details(&self) -> Option<&str> {
        self.internal.as_deref()
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.error_type, self.message)
    }
}

impl std::error::Error for ApiError {}

/// JSON representation of an error response
#[derive(Serialize)]
pub(crate) struct ErrorResponse {
    pub error: ErrorBody,
}

#[derive(Serialize)]
pub(crate) struct ErrorBody {
    #[serde(rename = "type")]
    pub error_type: String,
    pub message: String,
}

impl From<ApiError> for ErrorResponse {
    fn from(err: ApiError) -> Self {
        Self {
            error: ErrorBody {
                error_type: err.error_type,
                message: err.message,
            },
        }
    }
}

impl From<std::io::Error> for ApiError {
    fn from(err: std::io::Error) -> Self {
        ApiError::internal("I/O error").with_internal(err.to_string())
    }
}

impl From<hyper::Error> for ApiError {
    fn from(err: hyper::Error) -> Self {
        ApiError::internal("HTTP error").with_internal(err.to_string())
    }
}

/// Load-time error: registration, parsing, provisioning or validation
///
/// Any of these aborts loading of the module instance it belongs to.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The module rejected its configuration while provisioning
    #[error("{0}")]
    Provision(String),

    /// The provisioned module is not in a usable state
    #[error("{0}")]
    Validation(String),

    /// A directive line carried too few or too many arguments
    #[error("{file}:{line} - Error during parsing: Wrong argument count or unexpected line ending after '{token}'")]
    ArgCount {
        file: String,
        line: usize,
        token: String,
    },

    /// Malformed textual configuration
    #[error("{file}:{line} - Error during parsing: {message}")]
    Syntax {
        file: String,
        line: usize,
        message: String,
    },

    /// A directive keyword with no registered parser
    #[error("{file}:{line}: unrecognized directive: {name}")]
    UnknownDirective {
        file: String,
        line: usize,
        name: String,
    },

    /// No module registered under this id
    #[error("unknown module: {0}")]
    UnknownModule(String),

    #[error("module already registered: {0}")]
    DuplicateModule(String),

    #[error("directive already registered: {0}")]
    DuplicateDirective(String),

    #[error("invalid module id '{id}': {reason}")]
    InvalidModuleId { id: String, reason: &'static str },

    /// JSON module configuration could not be decoded
    #[error("decoding module configuration: {0}")]
    Json(#[from] serde_json::Error),
}

impl ConfigError {
    /// Create a provisioning error
    pub fn provision(message: impl Into<String>) -> Self {
        Self::Provision(message.into())
    }

    /// Create a validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Whether this is an argument-count parse error
    pub fn is_arg_count(&self) -> bool {
        matches!(self, Self::ArgCount { .. })
    }
}
