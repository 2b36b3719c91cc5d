//! Gateway error type and its HTTP mapping.

use axum::http::StatusCode;
use axum::response::IntoResponse;
use tracing::error;

use stow_router::RouterError;
use stow_store::StoreError;

/// Errors returned by gateway handlers.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// No object under the requested key, or the key itself is not a
    /// name this gateway routes.
    #[error("no such object: {key}")]
    NotFound {
        /// The requested key.
        key: String,
    },

    /// The router could not serve the request.
    #[error("routing failed: {0}")]
    Router(#[from] RouterError),

    /// The node's local store could not serve the request.
    #[error("store failed: {0}")]
    Store(#[from] StoreError),

    /// Authentication failed.
    #[error("access denied")]
    AccessDenied,
}

impl GatewayError {
    /// Map to an HTTP status code.
    fn status_code(&self) -> StatusCode {
        match self {
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::Router(e) => match e {
                RouterError::NotFound { .. } => StatusCode::NOT_FOUND,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::AccessDenied => StatusCode::FORBIDDEN,
        }
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> axum::response::Response {
        let status = self.status_code();
        if status.is_server_error() {
            error!(error = %self, "request failed");
        }
        (status, self.to_string()).into_response()
    }
}
