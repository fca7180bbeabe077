use axum::{Json, extract::State};
use serde::Deserialize;

use crate::domain::types::{ProviderRequestToken, ProviderSession, SessionWithLogin};
use crate::error::AuthServiceError;
use crate::state::AppState;
use crate::usecase::provider_session::{
    CreateRequestTokenUseCase, CreateSessionUseCase, CreateSessionWithLoginUseCase,
    SessionWithLoginInput,
};

// ── GET /api/v1/authentication/create-token ──────────────────────────────────

pub async fn create_token(
    State(state): State<AppState>,
) -> Result<Json<ProviderRequestToken>, AuthServiceError> {
    let usecase = CreateRequestTokenUseCase {
        provider: state.provider.clone(),
    };
    Ok(Json(usecase.execute().await?))
}

// ── POST /api/v1/authentication/create-session ───────────────────────────────

#[derive(Deserialize)]
pub struct CreateSessionRequest {
    pub request_token: String,
}

pub async fn create_session(
    State(state): State<AppState>,
    Json(body): Json<CreateSessionRequest>,
) -> Result<Json<ProviderSession>, AuthServiceError> {
    let usecase = CreateSessionUseCase {
        provider: state.provider.clone(),
        cache: state.cache(),
        session_ttl_secs: state.provider_session_ttl_secs,
    };
    Ok(Json(usecase.execute(&body.request_token).await?))
}

// ── POST /api/v1/authentication/create-session-with-login ────────────────────

#[derive(Deserialize)]
pub struct CreateSessionWithLoginRequest {
    pub request_token: String,
    pub username: String,
    pub password: String,
}

pub async fn create_session_with_login(
    State(state): State<AppState>,
    Json(body): Json<CreateSessionWithLoginRequest>,
) -> Result<Json<SessionWithLogin>, AuthServiceError> {
    let usecase = CreateSessionWithLoginUseCase {
        provider: state.provider.clone(),
        cache: state.cache(),
        session_ttl_secs: state.provider_session_ttl_secs,
        cache_key_secret: state.cache_key_secret.clone(),
    };
    let out = usecase
        .execute(SessionWithLoginInput {
            request_token: body.request_token,
            username: body.username,
            password: body.password,
        })
        .await?;
    Ok(Json(out))
}
