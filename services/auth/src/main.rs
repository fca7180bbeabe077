use std::sync::Arc;

use anyhow::Context as _;
use sea_orm::Database;
use tracing::{error, info, warn};

use cinevault_auth::config::AuthConfig;
use cinevault_auth::infra::mail::SmtpMailSender;
use cinevault_auth::infra::provider::TmdbProviderClient;
use cinevault_auth::router::build_router;
use cinevault_auth::state::AppState;
use cinevault_auth_migration::{Migrator, MigratorTrait};
use cinevault_auth_types::password::PasswordHasher;
use cinevault_core::tracing::{LogFormat, init_tracing};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing("info,cinevault_auth=debug", LogFormat::from_env());

    let config = AuthConfig::from_env().context("load configuration")?;

    let db = Database::connect(&config.database_url)
        .await
        .context("connect to database")?;
    // Serving with a stale schema beats not serving; the failure is visible
    // in the logs and in later query errors.
    if let Err(e) = Migrator::up(&db, None).await {
        error!(error = %e, "database migration failed");
    }

    if config.cache_key_secret.is_none() {
        warn!("CACHE_KEY_SECRET unset, provider login cache entries will not survive a restart");
    }

    let redis_cfg = deadpool_redis::Config::from_url(&config.redis_url);
    let redis = redis_cfg
        .create_pool(Some(deadpool_redis::Runtime::Tokio1))
        .context("create Redis pool")?;

    let state = AppState {
        db,
        redis,
        token_codec: Arc::new(config.token_codec()?),
        password_hasher: PasswordHasher::new().context("initialise password hasher")?,
        provider: TmdbProviderClient::new(
            &config.provider_base_url,
            config.provider_api_key.clone(),
            config.provider_timeout,
        )?,
        mailer: SmtpMailSender::new(&config.smtp_settings())?,
        reset_code_ttl_secs: config.reset_code_ttl_secs,
        provider_session_ttl_secs: config.provider_session_ttl_secs,
        cache_key_secret: config.cache_key_secret(),
    };

    let router = build_router(state);
    let addr = format!("0.0.0.0:{}", config.auth_port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("bind {addr}"))?;

    info!("auth service listening on {addr}");
    axum::serve(listener, router).await.context("server error")?;
    Ok(())
}
