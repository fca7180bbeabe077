use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use serde::{Deserialize, Serialize};

use crate::domain::types::UserProfile;
use crate::error::AuthServiceError;
use crate::state::AppState;
use crate::usecase::account::{
    AuthenticateInput, AuthenticateUseCase, RegisterInput, RegisterUseCase,
    ValidationEmailInput, ValidationEmailUseCase,
};

// ── POST /api/v1/authentication/register ─────────────────────────────────────

#[derive(Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
}

pub async fn register(
    State(state): State<AppState>,
    Json(body): Json<RegisterRequest>,
) -> Result<impl IntoResponse, AuthServiceError> {
    let usecase = RegisterUseCase {
        users: state.credential_store(),
        hasher: state.password_hasher.clone(),
    };
    let profile = usecase
        .execute(RegisterInput {
            email: body.email,
            password: body.password,
            first_name: body.first_name,
            last_name: body.last_name,
        })
        .await?;
    Ok((StatusCode::CREATED, Json(profile)))
}

// ── POST /api/v1/authentication/authenticate ─────────────────────────────────

#[derive(Deserialize)]
pub struct AuthenticateRequest {
    pub email: String,
    pub password: String,
}

#[derive(Serialize)]
pub struct AuthenticateResponse {
    pub user: UserProfile,
    pub token: String,
    pub token_expires_at: u64,
}

pub async fn authenticate(
    State(state): State<AppState>,
    Json(body): Json<AuthenticateRequest>,
) -> Result<Json<AuthenticateResponse>, AuthServiceError> {
    let usecase = AuthenticateUseCase {
        users: state.credential_store(),
        hasher: state.password_hasher.clone(),
        codec: state.token_codec.clone(),
    };
    let out = usecase
        .execute(AuthenticateInput {
            email: body.email,
            password: body.password,
        })
        .await?;
    Ok(Json(AuthenticateResponse {
        user: out.user,
        token: out.token,
        token_expires_at: out.token_expires_at,
    }))
}

// ── POST /api/v1/authentication/validation-email ─────────────────────────────

#[derive(Deserialize)]
pub struct ValidationEmailRequest {
    pub email: String,
    #[serde(default)]
    pub name: Option<String>,
}

pub async fn validation_email(
    State(state): State<AppState>,
    Json(body): Json<ValidationEmailRequest>,
) -> Result<StatusCode, AuthServiceError> {
    let usecase = ValidationEmailUseCase {
        mailer: state.mailer.clone(),
    };
    usecase
        .execute(ValidationEmailInput {
            email: body.email,
            name: body.name,
        })
        .await?;
    Ok(StatusCode::ACCEPTED)
}
