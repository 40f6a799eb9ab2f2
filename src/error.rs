//! Crate error type
//!
//! Every fallible operation in the crate returns [`Result`]. Handler code can
//! raise an explicit HTTP status with [`Error::status_with_message`] or the
//! [`Error::bad_request`] shorthand; everything else is reported as a 500 by
//! the dispatcher.

use hyper::StatusCode;
use thiserror::Error;

/// Errors produced by the application, the server and the request/response
/// model.
#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("invalid listen address '{0}'")]
    InvalidAddress(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("unsupported media type '{0}'")]
    UnsupportedMediaType(String),

    #[error("malformed request body: {0}")]
    MalformedBody(String),

    #[error("invalid header value for '{0}'")]
    InvalidHeader(String),

    /// An explicit HTTP status raised by handler code. The dispatcher turns
    /// this into a response with the given status and a JSON error body.
    #[error("{message}")]
    Status { status: StatusCode, message: String },
}

impl Error {
    /// Raise an explicit HTTP status from a handler.
    pub fn status_with_message(status: StatusCode, message: impl Into<String>) -> Self {
        Self::Status {
            status,
            message: message.into(),
        }
    }

    /// Shorthand for a 400 Bad Request with a message.
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::status_with_message(StatusCode::BAD_REQUEST, message)
    }

    /// The response status this error maps to.
    ///
    /// Explicitly raised statuses keep their code; body decoding problems map
    /// to client errors; everything else is an internal error.
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Status { status, .. } => *status,
            Self::UnsupportedMediaType(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            Self::MalformedBody(_) | Self::Json(_) | Self::Yaml(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, Error>;
