use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use cinevault_auth_types::password::PasswordError;
use cinevault_auth_types::token::TokenError;
use cinevault_domain::credential::CredentialError;

/// Auth service domain error variants.
///
/// Adapter failures (database, cache, mail, provider) are converted to
/// `UpstreamUnavailable` at the adapter boundary; the chain is logged, never
/// returned to the client.
#[derive(Debug, thiserror::Error)]
pub enum AuthServiceError {
    #[error("{0}")]
    InvalidInput(String),
    #[error("user already exists")]
    DuplicateUser,
    #[error("user not found")]
    NotFound,
    #[error("{0}")]
    Token(#[from] TokenError),
    #[error("invalid or expired reset code")]
    CodeInvalid,
    #[error("invalid request token")]
    InvalidRequestToken,
    #[error("provider rejected the credentials")]
    CredentialsRejected,
    #[error("provider session not found")]
    SessionNotFound,
    #[error("upstream service unavailable")]
    UpstreamUnavailable(#[source] anyhow::Error),
    #[error("internal error")]
    Internal(#[source] anyhow::Error),
}

impl AuthServiceError {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidInput(_) => "INVALID_INPUT",
            Self::DuplicateUser => "DUPLICATE_USER",
            Self::NotFound => "NOT_FOUND",
            Self::Token(TokenError::InvalidSignature) => "INVALID_SIGNATURE",
            Self::Token(TokenError::Expired) => "EXPIRED",
            Self::Token(TokenError::Malformed) => "MALFORMED",
            Self::Token(TokenError::InvalidKey(_) | TokenError::Signing(_)) => "INTERNAL",
            Self::CodeInvalid => "CODE_INVALID",
            Self::InvalidRequestToken => "INVALID_REQUEST_TOKEN",
            Self::CredentialsRejected => "CREDENTIALS_REJECTED",
            Self::SessionNotFound => "SESSION_NOT_FOUND",
            Self::UpstreamUnavailable(_) => "UPSTREAM_UNAVAILABLE",
            Self::Internal(_) => "INTERNAL",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::InvalidInput(_) | Self::CodeInvalid => StatusCode::BAD_REQUEST,
            Self::DuplicateUser => StatusCode::CONFLICT,
            Self::NotFound | Self::SessionNotFound => StatusCode::NOT_FOUND,
            Self::Token(TokenError::InvalidKey(_) | TokenError::Signing(_)) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            Self::Token(_) | Self::InvalidRequestToken | Self::CredentialsRejected => {
                StatusCode::UNAUTHORIZED
            }
            Self::UpstreamUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Wrap an adapter failure.
    pub fn upstream(error: impl Into<anyhow::Error>) -> Self {
        Self::UpstreamUnavailable(error.into())
    }
}

impl From<CredentialError> for AuthServiceError {
    fn from(e: CredentialError) -> Self {
        Self::InvalidInput(e.to_string())
    }
}

impl From<PasswordError> for AuthServiceError {
    fn from(e: PasswordError) -> Self {
        Self::Internal(e.into())
    }
}

impl IntoResponse for AuthServiceError {
    fn into_response(self) -> Response {
        let status = self.status();
        // 4xx are expected client outcomes and already recorded by TraceLayer.
        // 5xx carry the adapter error chain, which stays in the logs.
        match &self {
            Self::UpstreamUnavailable(e) => {
                tracing::error!(error = ?e, kind = self.kind(), "upstream failure");
            }
            Self::Internal(e) => {
                tracing::error!(error = ?e, kind = self.kind(), "internal error");
            }
            Self::Token(e @ (TokenError::InvalidKey(_) | TokenError::Signing(_))) => {
                tracing::error!(error = %e, kind = self.kind(), "token codec failure");
            }
            _ => {}
        }
        let message = match &self {
            Self::UpstreamUnavailable(_) => self.to_string(),
            _ if status.is_server_error() => "internal error".to_owned(),
            _ => self.to_string(),
        };
        let body = serde_json::json!({
            "kind": self.kind(),
            "message": message,
        });
        (status, axum::Json(body)).into_response()
    }
}
