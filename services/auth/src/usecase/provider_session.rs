use anyhow::anyhow;
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use serde::de::DeserializeOwned;
use sha2::Sha256;
use tracing::{debug, info, warn};

use crate::domain::repository::{Cache, ProviderClient};
use crate::domain::types::{
    ProviderLogin, ProviderRequestToken, ProviderSession, SessionWithLogin,
};
use crate::error::AuthServiceError;

fn session_key(request_token: &str) -> String {
    format!("provider_session:{request_token}")
}

type HmacSha256 = Hmac<Sha256>;

/// Credentials enter the key only as an HMAC under a server-side secret.
fn login_key(
    secret: &SecretString,
    session_id: &str,
    login: &ProviderLogin,
) -> Result<String, AuthServiceError> {
    let mut mac = HmacSha256::new_from_slice(secret.expose_secret().as_bytes())
        .map_err(|e| AuthServiceError::Internal(anyhow!("invalid cache key secret: {e}")))?;
    mac.update(login.username.as_bytes());
    mac.update(&[0u8]);
    mac.update(login.password.as_bytes());
    let digest = hex::encode(mac.finalize().into_bytes());
    Ok(format!("provider_login:{session_id}:{digest}"))
}

fn require_request_token(raw: &str) -> Result<&str, AuthServiceError> {
    let token = raw.trim();
    if token.is_empty() {
        return Err(AuthServiceError::InvalidInput(
            "request_token must not be empty".to_owned(),
        ));
    }
    Ok(token)
}

/// Seconds an entry may stay cached: the configured bound, cut short by the
/// provider's own expiry. `None` means do not cache.
fn cache_ttl(
    max_ttl_secs: u64,
    expires_at: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> Option<u64> {
    let ttl = match expires_at {
        Some(at) => {
            let remaining = (at - now).num_seconds();
            max_ttl_secs.min(u64::try_from(remaining).unwrap_or(0))
        }
        None => max_ttl_secs,
    };
    (ttl > 0).then_some(ttl)
}

fn earliest(a: Option<DateTime<Utc>>, b: Option<DateTime<Utc>>) -> Option<DateTime<Utc>> {
    match (a, b) {
        (Some(a), Some(b)) => Some(a.min(b)),
        (a, b) => a.or(b),
    }
}

async fn load<C: Cache, T: DeserializeOwned>(
    cache: &C,
    key: &str,
) -> Result<Option<T>, AuthServiceError> {
    let Some(raw) = cache.get(key).await? else {
        return Ok(None);
    };
    match serde_json::from_str(&raw) {
        Ok(value) => Ok(Some(value)),
        Err(e) => {
            warn!(error = %e, "ignoring undecodable cache entry");
            Ok(None)
        }
    }
}

/// Cache `value` unless another request already did; the first entry
/// written wins and is what every caller gets back.
///
/// The provider has already committed the session when this runs, so a
/// failed write only costs a future cache miss.
async fn settle<C, T>(cache: &C, key: &str, value: T, ttl: Option<u64>) -> T
where
    C: Cache,
    T: Serialize + DeserializeOwned,
{
    let Some(ttl) = ttl else {
        return value;
    };
    let raw = match serde_json::to_string(&value) {
        Ok(raw) => raw,
        Err(e) => {
            warn!(error = %e, "failed to encode cache entry");
            return value;
        }
    };
    match cache.set_nx_ex(key, &raw, ttl).await {
        Ok(true) => value,
        Ok(false) => match load::<_, T>(cache, key).await {
            Ok(Some(existing)) => {
                debug!("concurrent request cached first, reusing its entry");
                existing
            }
            // Gone or undecodable: ours replaces it.
            Ok(None) => {
                if let Err(e) = cache.set_ex(key, &raw, ttl).await {
                    warn!(error = ?e, "failed to cache provider session");
                }
                value
            }
            Err(e) => {
                warn!(error = ?e, "failed to read back provider session");
                value
            }
        },
        Err(e) => {
            warn!(error = ?e, "failed to cache provider session");
            value
        }
    }
}

// ── CreateRequestToken ───────────────────────────────────────────────────────

pub struct CreateRequestTokenUseCase<P: ProviderClient> {
    pub provider: P,
}

impl<P: ProviderClient> CreateRequestTokenUseCase<P> {
    pub async fn execute(&self) -> Result<ProviderRequestToken, AuthServiceError> {
        let token = self.provider.request_token().await?;
        info!(expires_at = %token.expires_at, "provider request token issued");
        Ok(token)
    }
}

// ── CreateSession ────────────────────────────────────────────────────────────

pub struct CreateSessionUseCase<P: ProviderClient, C: Cache> {
    pub provider: P,
    pub cache: C,
    pub session_ttl_secs: u64,
}

impl<P: ProviderClient, C: Cache> CreateSessionUseCase<P, C> {
    pub async fn execute(&self, request_token: &str) -> Result<ProviderSession, AuthServiceError> {
        let request_token = require_request_token(request_token)?;
        let key = session_key(request_token);

        if let Some(session) = load::<_, ProviderSession>(&self.cache, &key).await? {
            debug!("provider session served from cache");
            return Ok(session);
        }

        let session = self.provider.create_session(request_token).await?;
        let ttl = cache_ttl(self.session_ttl_secs, session.expires_at, Utc::now());
        let session = settle(&self.cache, &key, session, ttl).await;

        info!("provider session created");
        Ok(session)
    }
}

// ── CreateSessionWithLogin ───────────────────────────────────────────────────

pub struct SessionWithLoginInput {
    pub request_token: String,
    pub username: String,
    pub password: String,
}

pub struct CreateSessionWithLoginUseCase<P: ProviderClient, C: Cache> {
    pub provider: P,
    pub cache: C,
    pub session_ttl_secs: u64,
    /// Keys the credential digest in cache keys.
    pub cache_key_secret: SecretString,
}

impl<P: ProviderClient, C: Cache> CreateSessionWithLoginUseCase<P, C> {
    pub async fn execute(
        &self,
        input: SessionWithLoginInput,
    ) -> Result<SessionWithLogin, AuthServiceError> {
        let request_token = require_request_token(&input.request_token)?;
        let username = input.username.trim();
        if username.is_empty() || input.password.is_empty() {
            return Err(AuthServiceError::InvalidInput(
                "username and password are required".to_owned(),
            ));
        }

        let base: ProviderSession = load(&self.cache, &session_key(request_token))
            .await?
            .ok_or(AuthServiceError::SessionNotFound)?;

        let login = ProviderLogin {
            username: username.to_owned(),
            password: input.password,
        };
        let key = login_key(&self.cache_key_secret, &base.session_id, &login)?;
        if let Some(hit) = load::<_, SessionWithLogin>(&self.cache, &key).await? {
            debug!("provider login served from cache");
            return Ok(hit);
        }

        let grant = self
            .provider
            .create_session_with_login(request_token, &login)
            .await?;
        let bound = SessionWithLogin {
            session_id: base.session_id,
            request_token: grant.request_token,
            expires_at: earliest(grant.expires_at, base.expires_at),
        };
        let ttl = cache_ttl(self.session_ttl_secs, bound.expires_at, Utc::now());
        let bound = settle(&self.cache, &key, bound, ttl).await;

        info!("provider session bound to login");
        Ok(bound)
    }
}
