//! Failures raised while selecting, resolving and invoking a handler.
//!
//! Every variant that can happen while a request is in flight is recovered at
//! the dispatch boundary and rendered as an [`ErrorEnvelope`](crate::response::ErrorEnvelope).
//! The remaining variants only surface from configuration loading and from
//! [`Router::listen`](crate::Router::listen).

use hyper::StatusCode;

/// A type-erased error returned by handlers and custom extractors.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Result alias used across the crate.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Errors produced by the dispatcher and its collaborators.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// No controller, handler and pattern combination accepted the request.
    #[error("No matching listener")]
    NoMatch,

    /// A required parameter resolved to an empty value.
    #[error("Parameter index {index} cannot be null!")]
    Validation { index: usize },

    /// Reading the request body failed.
    #[error("failed to read request body: {0}")]
    Body(#[source] hyper::Error),

    /// A `json` request body could not be parsed.
    #[error("malformed JSON body: {0}")]
    Json(#[from] serde_json::Error),

    /// A custom extractor failed.
    #[error("parameter extraction failed: {0}")]
    Extract(#[source] BoxError),

    /// The handler itself returned an error.
    #[error("handler failed: {0}")]
    Handler(#[source] BoxError),

    #[error("invalid configuration: {0}")]
    Config(#[from] toml::de::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// The listener could not be bound or the server stopped with an error.
    #[error("server error: {0}")]
    Serve(#[source] hyper::Error),
}

impl Error {
    /// The status reported in the error envelope.
    ///
    /// `current` is the status the response carried when the failure was
    /// caught; it wins for failures that have no status of their own.
    pub fn status(&self, current: Option<StatusCode>) -> StatusCode {
        match self {
            Error::NoMatch => current.unwrap_or(StatusCode::NOT_FOUND),
            Error::Validation { .. } => StatusCode::UNAUTHORIZED,
            Error::Body(_) | Error::Json(_) => StatusCode::BAD_REQUEST,
            _ => current.unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
        }
    }

    /// Whether the failure is part of normal routing rather than a fault.
    pub fn is_routing(&self) -> bool {
        matches!(self, Error::NoMatch | Error::Validation { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_match_envelope_text() {
        assert_eq!(Error::NoMatch.to_string(), "No matching listener");
        assert_eq!(
            Error::Validation { index: 2 }.to_string(),
            "Parameter index 2 cannot be null!"
        );
    }

    #[test]
    fn no_match_keeps_current_status() {
        assert_eq!(Error::NoMatch.status(None), StatusCode::NOT_FOUND);
        assert_eq!(
            Error::NoMatch.status(Some(StatusCode::IM_A_TEAPOT)),
            StatusCode::IM_A_TEAPOT
        );
    }

    #[test]
    fn validation_is_always_unauthorized() {
        let err = Error::Validation { index: 0 };
        assert_eq!(err.status(Some(StatusCode::OK)), StatusCode::UNAUTHORIZED);
        assert!(err.is_routing());
    }

    #[test]
    fn faults_default_to_server_error() {
        let err = Error::Handler("boom".into());
        assert_eq!(err.status(None), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!err.is_routing());
    }
}
