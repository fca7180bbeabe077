use axum::{Json, extract::State, http::StatusCode};

use cinevault_core::health::{DependencyCheck, ReadinessReport, readiness};

use crate::state::AppState;

/// `GET /readyz`: database and Redis must both answer.
pub async fn readyz(State(state): State<AppState>) -> (StatusCode, Json<ReadinessReport>) {
    let store = state.credential_store();
    let redis = state.cache();
    let (db, cache) = tokio::join!(store.ping(), redis.ping());
    for (name, result) in [("database", &db), ("cache", &cache)] {
        if let Err(e) = result {
            tracing::warn!(error = ?e, dependency = name, "readiness check failed");
        }
    }
    readiness(vec![
        DependencyCheck {
            name: "database",
            ok: db.is_ok(),
        },
        DependencyCheck {
            name: "cache",
            ok: cache.is_ok(),
        },
    ])
}
