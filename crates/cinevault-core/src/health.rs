use axum::Json;
use axum::http::StatusCode;
use serde::Serialize;

/// `GET /healthz`: liveness only, touches no dependency.
pub async fn healthz() -> StatusCode {
    StatusCode::OK
}

#[derive(Debug, Serialize)]
pub struct ReadinessReport {
    pub ready: bool,
    pub checks: Vec<DependencyCheck>,
}

#[derive(Debug, Serialize)]
pub struct DependencyCheck {
    pub name: &'static str,
    pub ok: bool,
}

/// Fold dependency probes into a `/readyz` response: 200 when every check
/// passed, 503 otherwise.
pub fn readiness(checks: Vec<DependencyCheck>) -> (StatusCode, Json<ReadinessReport>) {
    let ready = checks.iter().all(|c| c.ok);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (status, Json(ReadinessReport { ready, checks }))
}
