//! Error types.
//!
//! [`Error`] covers infrastructure failures: binding to a port, reading
//! configuration. [`ApiError`] covers everything that can go wrong while
//! answering one request, and knows how to render itself.

use serde::Serialize;
use tracing::{error, warn};

use crate::response::{IntoResponse, Json, Response};
use crate::status::Status;

/// The error type returned by the server's fallible setup operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("io: {0}")]
    Io(#[from] std::io::Error),

    #[error("config: {0}")]
    Config(#[from] ::config::ConfigError),
}

/// A request-level failure.
///
/// Pipeline stages resolve these locally with [`ApiError::reject`], which
/// answers with a bare `{"message": …}` body. When a handler returns one as
/// `Err`, the error responder renders the envelope
/// `{"status": "error", "message": …}` instead.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ApiError {
    #[error("Unauthorized: Invalid API key")]
    Unauthorized,

    #[error("{0}")]
    Validation(String),

    #[error("Malformed JSON body: {0}")]
    MalformedBody(String),

    #[error("Product not found")]
    NotFound,

    #[error("Route not found")]
    RouteNotFound,

    #[error("Method not allowed")]
    MethodNotAllowed,

    #[error("Request body exceeds {limit} bytes")]
    BodyTooLarge { limit: usize },

    /// `None` answers with the generic message.
    #[error("{}", .0.as_deref().unwrap_or("Internal Server Error"))]
    Internal(Option<String>),
}

impl ApiError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn status(&self) -> Status {
        match self {
            Self::Unauthorized => Status::Unauthorized,
            Self::Validation(_) | Self::MalformedBody(_) => Status::BadRequest,
            Self::NotFound | Self::RouteNotFound => Status::NotFound,
            Self::MethodNotAllowed => Status::MethodNotAllowed,
            Self::BodyTooLarge { .. } => Status::ContentTooLarge,
            Self::Internal(_) => Status::InternalServerError,
        }
    }

    /// Answers the request directly with `{"message": …}`.
    pub fn reject(self) -> Response {
        Response::message(self.status(), self.to_string())
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(e: serde_json::Error) -> Self {
        Self::MalformedBody(e.to_string())
    }
}

#[derive(Serialize)]
struct Envelope<'a> {
    status: &'static str,
    message: &'a str,
}

/// The error responder.
impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = self.to_string();
        let code = u16::from(status);
        if code >= 500 {
            error!(status = code, "Error: {message}");
        } else {
            warn!(status = code, "Error: {message}");
        }
        Json(Envelope { status: "error", message: &message }).with_status(status)
    }
}
