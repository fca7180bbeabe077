use axum::{Json, extract::State, http::StatusCode};
use serde::Deserialize;

use crate::error::AuthServiceError;
use crate::state::AppState;
use crate::usecase::password::{
    RequestPasswordResetUseCase, ResetRequestOutcome, UpdatePasswordInput, UpdatePasswordUseCase,
};

// ── POST /api/v1/authentication/reset-password ───────────────────────────────

#[derive(Deserialize)]
pub struct ResetPasswordRequest {
    pub email: String,
}

/// Answers 202 whether or not the account exists. A malformed email or a
/// failed lookup is reported. Failures after the lookup only happen for a
/// known address, so they are logged and answered with 202.
pub async fn reset_password(
    State(state): State<AppState>,
    Json(body): Json<ResetPasswordRequest>,
) -> Result<StatusCode, AuthServiceError> {
    let usecase = RequestPasswordResetUseCase {
        users: state.credential_store(),
        cache: state.cache(),
        mailer: state.mailer.clone(),
        code_ttl_secs: state.reset_code_ttl_secs,
    };
    if let ResetRequestOutcome::Undelivered(e) = usecase.execute(&body.email).await? {
        tracing::error!(error = ?e, kind = e.kind(), "password reset code not delivered");
    }
    Ok(StatusCode::ACCEPTED)
}

// ── POST /api/v1/authentication/update-password ──────────────────────────────

#[derive(Deserialize)]
pub struct UpdatePasswordRequest {
    pub email: String,
    pub code: String,
    pub new_password: String,
}

pub async fn update_password(
    State(state): State<AppState>,
    Json(body): Json<UpdatePasswordRequest>,
) -> Result<StatusCode, AuthServiceError> {
    let usecase = UpdatePasswordUseCase {
        users: state.credential_store(),
        cache: state.cache(),
        hasher: state.password_hasher.clone(),
        code_ttl_secs: state.reset_code_ttl_secs,
    };
    usecase
        .execute(UpdatePasswordInput {
            email: body.email,
            code: body.code,
            new_password: body.new_password,
        })
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
