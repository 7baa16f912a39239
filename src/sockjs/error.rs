//! SockJS service errors.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

/// Errors surfaced by [`SockJsService::handle_request`](super::SockJsService::handle_request).
#[derive(Debug, Error)]
pub enum SockJsError {
    /// Writing the response failed. Never retried.
    #[error("Failed to write to the response")]
    Io {
        #[source]
        source: std::io::Error,
    },

    /// A transport collaborator failed while serving a session.
    #[error("Transport failure for session {session_id}: {message}")]
    Transport { session_id: String, message: String },
}

impl SockJsError {
    pub fn transport(session_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Transport {
            session_id: session_id.into(),
            message: message.into(),
        }
    }

    /// Session the failure belongs to, if any.
    pub fn session_id(&self) -> Option<&str> {
        match self {
            Self::Io { .. } => None,
            Self::Transport { session_id, .. } => Some(session_id),
        }
    }
}

impl From<std::io::Error> for SockJsError {
    fn from(source: std::io::Error) -> Self {
        Self::Io { source }
    }
}

/// Clients only ever see a bare 500; details stay in the server log.
impl IntoResponse for SockJsError {
    fn into_response(self) -> Response {
        StatusCode::INTERNAL_SERVER_ERROR.into_response()
    }
}

/// Result type for SockJS operations.
pub type SockJsResult<T> = Result<T, SockJsError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn test_io_error_keeps_cause() {
        let err = SockJsError::from(std::io::Error::new(std::io::ErrorKind::BrokenPipe, "peer gone"));
        assert_eq!(err.to_string(), "Failed to write to the response");
        assert_eq!(err.source().unwrap().to_string(), "peer gone");
        assert!(err.session_id().is_none());
    }

    #[test]
    fn test_into_response_hides_details() {
        let response = SockJsError::transport("abc", "boom").into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
