use std::fmt::Display;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context as _, anyhow, bail, ensure};
use jsonwebtoken::Algorithm;
use rand::RngExt;
use secrecy::{ExposeSecret, SecretString};

use cinevault_auth_types::token::{SigningKey, TokenCodec, parse_algorithm};

use crate::domain::types::{
    DEFAULT_PROVIDER_SESSION_TTL_SECS, DEFAULT_RESET_CODE_TTL_SECS, DEFAULT_TOKEN_TTL_SECS,
};
use crate::infra::mail::SmtpSettings;

pub const DEFAULT_PROVIDER_BASE_URL: &str = "https://api.themoviedb.org/3/";

/// Auth service configuration loaded from environment variables.
#[derive(Debug)]
pub struct AuthConfig {
    /// PostgreSQL connection URL.
    pub database_url: String,
    /// Redis connection URL.
    pub redis_url: String,
    /// Token signing algorithm. Env var: `JWT_ALGORITHM` (default HS256).
    pub jwt_algorithm: Algorithm,
    /// Shared secret for HS* algorithms. Env var: `JWT_SECRET`.
    pub jwt_secret: Option<SecretString>,
    /// PEM key pair for asymmetric algorithms.
    /// Env vars: `JWT_PRIVATE_KEY_PATH`, `JWT_PUBLIC_KEY_PATH`.
    pub jwt_key_paths: Option<(PathBuf, PathBuf)>,
    pub token_ttl_secs: u64,
    pub reset_code_ttl_secs: u64,
    pub provider_base_url: String,
    pub provider_api_key: SecretString,
    pub provider_timeout: Duration,
    pub provider_session_ttl_secs: u64,
    pub smtp_host: String,
    pub smtp_port: u16,
    pub smtp_username: Option<String>,
    pub smtp_password: Option<SecretString>,
    pub mail_from: String,
    /// HMAC key for credential digests in cache keys. Env var: `CACHE_KEY_SECRET`.
    pub cache_key_secret: Option<SecretString>,
    /// TCP port to listen on (default 5000). Env var: `AUTH_PORT`.
    pub auth_port: u16,
}

impl AuthConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from an arbitrary variable source. Blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        let required = |name: &str| get(name).with_context(|| format!("{name} must be set"));
        let parsed_or = |name: &str, default: u64| parse_or(name, get(name), default);
        // Redis refuses SETEX with 0; a zero timeout or token lifetime is never usable.
        let positive = |name: &str, default: u64| -> anyhow::Result<u64> {
            let value = parsed_or(name, default)?;
            ensure!(value > 0, "{name} must be greater than zero");
            Ok(value)
        };

        let jwt_algorithm = match get("JWT_ALGORITHM") {
            Some(name) => parse_algorithm(&name).context("JWT_ALGORITHM")?,
            None => Algorithm::HS256,
        };
        let jwt_key_paths = match (get("JWT_PRIVATE_KEY_PATH"), get("JWT_PUBLIC_KEY_PATH")) {
            (Some(private), Some(public)) => Some((private.into(), public.into())),
            (None, None) => None,
            _ => bail!("JWT_PRIVATE_KEY_PATH and JWT_PUBLIC_KEY_PATH must be set together"),
        };

        let smtp_username = get("SMTP_USERNAME");
        let smtp_password = get("SMTP_PASSWORD").map(SecretString::from);
        if smtp_username.is_some() != smtp_password.is_some() {
            bail!("SMTP_USERNAME and SMTP_PASSWORD must be set together");
        }

        Ok(Self {
            database_url: required("DATABASE_URL")?,
            redis_url: required("REDIS_URL")?,
            jwt_algorithm,
            jwt_secret: get("JWT_SECRET").map(SecretString::from),
            jwt_key_paths,
            token_ttl_secs: positive("TOKEN_TTL_SECS", DEFAULT_TOKEN_TTL_SECS)?,
            reset_code_ttl_secs: positive("RESET_CODE_TTL_SECS", DEFAULT_RESET_CODE_TTL_SECS)?,
            provider_base_url: get("PROVIDER_BASE_URL")
                .unwrap_or_else(|| DEFAULT_PROVIDER_BASE_URL.to_owned()),
            provider_api_key: required("PROVIDER_API_KEY")?.into(),
            provider_timeout: Duration::from_secs(positive("PROVIDER_TIMEOUT_SECS", 10)?),
            provider_session_ttl_secs: positive(
                "PROVIDER_SESSION_TTL_SECS",
                DEFAULT_PROVIDER_SESSION_TTL_SECS,
            )?,
            smtp_host: required("SMTP_HOST")?,
            smtp_port: parse_or("SMTP_PORT", get("SMTP_PORT"), 587)?,
            smtp_username,
            smtp_password,
            mail_from: required("MAIL_FROM")?,
            cache_key_secret: get("CACHE_KEY_SECRET").map(SecretString::from),
            auth_port: parse_or("AUTH_PORT", get("AUTH_PORT"), 5000)?,
        })
    }

    /// Build the token codec, reading PEM files for asymmetric algorithms.
    pub fn token_codec(&self) -> anyhow::Result<TokenCodec> {
        let key = match (&self.jwt_secret, &self.jwt_key_paths) {
            (Some(secret), _) if is_hmac(self.jwt_algorithm) => {
                SigningKey::Secret(secret.expose_secret().as_bytes().to_vec())
            }
            (_, Some((private, public))) if !is_hmac(self.jwt_algorithm) => SigningKey::Pem {
                private_pem: std::fs::read(private)
                    .with_context(|| format!("read {}", private.display()))?,
                public_pem: std::fs::read(public)
                    .with_context(|| format!("read {}", public.display()))?,
            },
            _ if is_hmac(self.jwt_algorithm) => bail!("JWT_SECRET must be set"),
            _ => bail!("JWT_PRIVATE_KEY_PATH and JWT_PUBLIC_KEY_PATH must be set"),
        };
        TokenCodec::new(self.jwt_algorithm, key, self.token_ttl_secs)
            .context("build token codec")
    }

    /// The configured cache key secret, or a random one for this process.
    pub fn cache_key_secret(&self) -> SecretString {
        match &self.cache_key_secret {
            Some(secret) => secret.clone(),
            None => SecretString::from(hex::encode(rand::rng().random::<[u8; 32]>())),
        }
    }

    pub fn smtp_settings(&self) -> SmtpSettings {
        SmtpSettings {
            host: self.smtp_host.clone(),
            port: self.smtp_port,
            credentials: self.smtp_username.clone().zip(self.smtp_password.clone()),
            from: self.mail_from.clone(),
        }
    }
}

fn is_hmac(algorithm: Algorithm) -> bool {
    matches!(
        algorithm,
        Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512
    )
}

fn parse_or<T>(name: &str, raw: Option<String>, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: Display,
{
    match raw {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| anyhow!("{name}: cannot parse {raw:?}: {e}")),
        None => Ok(default),
    }
}
