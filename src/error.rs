use thiserror::Error;

use crate::wire::ApiErrorBody;

/// Errors that can occur when using the khulnasoft library.
///
/// The remote family (`BadRequest` through `InternalServer`) is in
/// one-to-one correspondence with the HTTP status codes the API reports,
/// each carrying the server-supplied message. `MissingApiKey` and `Init`
/// are raised locally before any request is made.
#[derive(Error, Debug)]
pub enum Error {
    /// No API key was passed explicitly and the environment lookup found
    /// none. Raised from client construction, never from the server.
    #[error("missing API key: pass one explicitly or set {}", crate::config::API_KEY_ENV)]
    MissingApiKey,

    /// The HTTP transport handle could not be constructed.
    #[error("failed to initialize client: {0}")]
    Init(#[source] reqwest::Error),

    /// HTTP 400.
    #[error("bad request: {0}")]
    BadRequest(String),

    /// HTTP 401.
    #[error("authentication failed: {0}")]
    Authentication(String),

    /// HTTP 403.
    #[error("permission denied: {0}")]
    PermissionDenied(String),

    /// HTTP 404.
    #[error("not found: {0}")]
    NotFound(String),

    /// HTTP 409.
    #[error("conflict: {0}")]
    Conflict(String),

    /// HTTP 422.
    #[error("unprocessable entity: {0}")]
    UnprocessableEntity(String),

    /// HTTP 429.
    #[error("rate limit exceeded: {0}")]
    RateLimit(String),

    /// HTTP 500.
    #[error("internal server error: {0}")]
    InternalServer(String),

    /// Remote failure with a status code outside the fixed mapping.
    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("failed to decode API response: {0}")]
    Json(#[from] serde_json::Error),

    #[error("streaming error: {0}")]
    Streaming(String),
}

impl Error {
    /// Translate a remote HTTP status code into the matching error kind,
    /// carrying the server-supplied message.
    pub fn from_status(status: u16, message: impl Into<String>) -> Self {
        let message = message.into();
        match status {
            400 => Error::BadRequest(message),
            401 => Error::Authentication(message),
            403 => Error::PermissionDenied(message),
            404 => Error::NotFound(message),
            409 => Error::Conflict(message),
            422 => Error::UnprocessableEntity(message),
            429 => Error::RateLimit(message),
            500 => Error::InternalServer(message),
            _ => Error::Api { status, message },
        }
    }

    /// Translate a non-success response, extracting the message from the
    /// API's error document when the body carries one, else using the raw
    /// body text.
    pub(crate) fn from_response(status: u16, body: &str) -> Self {
        let message = serde_json::from_str::<ApiErrorBody>(body)
            .map(|document| document.error.message)
            .unwrap_or_else(|_| body.trim().to_string());
        Error::from_status(status, message)
    }

    pub fn streaming(message: impl Into<String>) -> Self {
        Error::Streaming(message.into())
    }
}
