use std::sync::Arc;

use axum::{
    Json,
    extract::State,
    http::{HeaderMap, HeaderName, HeaderValue, StatusCode},
    response::IntoResponse,
};

use cinevault_auth_types::bearer::BearerToken;
use cinevault_auth_types::token::{TokenCodec, TokenError};

use crate::error::AuthServiceError;

pub const X_TOKEN_EXPIRES: &str = "x-cinevault-token-expires";

// ── GET /api/v1/authentication/token ─────────────────────────────────────────

pub async fn check_token(
    State(codec): State<Arc<TokenCodec>>,
    bearer: Result<BearerToken, StatusCode>,
) -> Result<impl IntoResponse, AuthServiceError> {
    let BearerToken(token) = bearer.map_err(|_| TokenError::Malformed)?;
    let info = codec.validate(&token)?;

    let mut headers = HeaderMap::new();
    headers.insert(
        HeaderName::from_static(X_TOKEN_EXPIRES),
        HeaderValue::from(info.expires_at),
    );
    Ok((StatusCode::OK, headers, Json(info)))
}
