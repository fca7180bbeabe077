use std::sync::Arc;

use axum::extract::FromRef;
use deadpool_redis::Pool as RedisPool;
use sea_orm::DatabaseConnection;
use secrecy::SecretString;

use cinevault_auth_types::password::PasswordHasher;
use cinevault_auth_types::token::TokenCodec;

use crate::infra::cache::RedisCache;
use crate::infra::db::DbCredentialStore;
use crate::infra::mail::SmtpMailSender;
use crate::infra::provider::TmdbProviderClient;

/// Shared application state passed to every handler via axum `State`.
#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub redis: RedisPool,
    pub token_codec: Arc<TokenCodec>,
    pub password_hasher: PasswordHasher,
    pub provider: TmdbProviderClient,
    pub mailer: SmtpMailSender,
    pub reset_code_ttl_secs: u64,
    pub provider_session_ttl_secs: u64,
    /// HMAC key for credential digests in cache keys.
    pub cache_key_secret: SecretString,
}

impl AppState {
    pub fn credential_store(&self) -> DbCredentialStore {
        DbCredentialStore {
            db: self.db.clone(),
        }
    }

    pub fn cache(&self) -> RedisCache {
        RedisCache {
            pool: self.redis.clone(),
        }
    }
}

impl FromRef<AppState> for Arc<TokenCodec> {
    fn from_ref(state: &AppState) -> Self {
        Arc::clone(&state.token_codec)
    }
}
