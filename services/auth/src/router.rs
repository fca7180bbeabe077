use axum::{
    Router,
    routing::{get, post},
};
use tower::ServiceBuilder;

use cinevault_core::health::healthz;
use cinevault_core::middleware::{propagate_request_id_layer, request_id_layer, trace_layer};

use crate::handlers::{
    account::{authenticate, register, validation_email},
    health::readyz,
    password::{reset_password, update_password},
    provider_session::{create_session, create_session_with_login, create_token},
    token::check_token,
};
use crate::state::AppState;

pub const API_PREFIX: &str = "/api/v1/authentication";

pub fn authentication_routes() -> Router<AppState> {
    Router::new()
        // Accounts
        .route("/register", post(register))
        .route("/authenticate", post(authenticate))
        .route("/token", get(check_token))
        .route("/validation-email", post(validation_email))
        // Password reset
        .route("/reset-password", post(reset_password))
        .route("/update-password", post(update_password))
        // Provider session
        .route("/create-token", get(create_token))
        .route("/create-session", post(create_session))
        .route("/create-session-with-login", post(create_session_with_login))
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        // Health
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        .nest(API_PREFIX, authentication_routes())
        .layer(
            ServiceBuilder::new()
                .layer(request_id_layer())
                .layer(trace_layer())
                .layer(propagate_request_id_layer()),
        )
        .with_state(state)
}
