use std::time::Duration;

use anyhow::{Context as _, anyhow};
use chrono::{DateTime, NaiveDateTime, Utc};
use reqwest::{RequestBuilder, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::domain::repository::ProviderClient;
use crate::domain::types::{
    ProviderLogin, ProviderLoginGrant, ProviderRequestToken, ProviderSession,
};
use crate::error::AuthServiceError;

const EXPIRES_AT_FORMAT: &str = "%Y-%m-%d %H:%M:%S UTC";

/// TMDB v3 authentication endpoints.
///
/// The API key travels in the query string, so request URLs are stripped
/// from every error before it can reach a log line.
#[derive(Clone)]
pub struct TmdbProviderClient {
    http: reqwest::Client,
    base_url: Url,
    api_key: SecretString,
}

#[derive(Deserialize)]
struct RequestTokenBody {
    success: bool,
    expires_at: String,
    request_token: String,
}

#[derive(Deserialize)]
struct SessionBody {
    success: bool,
    session_id: String,
}

#[derive(Serialize)]
struct NewSessionRequest<'a> {
    request_token: &'a str,
}

#[derive(Serialize)]
struct LoginRequest<'a> {
    username: &'a str,
    password: &'a str,
    request_token: &'a str,
}

impl TmdbProviderClient {
    pub fn new(base_url: &str, api_key: SecretString, timeout: Duration) -> anyhow::Result<Self> {
        let mut base_url = Url::parse(base_url).context("parse provider base url")?;
        // `Url::join` replaces the last segment unless the base ends in '/'.
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("build provider http client")?;
        Ok(Self {
            http,
            base_url,
            api_key,
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url, AuthServiceError> {
        let mut url = self
            .base_url
            .join(path)
            .with_context(|| format!("join provider path {path}"))
            .map_err(AuthServiceError::Internal)?;
        url.query_pairs_mut()
            .append_pair("api_key", self.api_key.expose_secret());
        Ok(url)
    }

    async fn call<T: DeserializeOwned>(
        &self,
        op: &'static str,
        request: RequestBuilder,
        rejected: impl FnOnce() -> AuthServiceError,
    ) -> Result<T, AuthServiceError> {
        let response = request
            .send()
            .await
            .map_err(|e| AuthServiceError::upstream(anyhow::Error::new(e.without_url()).context(op)))?;
        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::NOT_FOUND {
            tracing::debug!(op, %status, "provider rejected request");
            return Err(rejected());
        }
        if !status.is_success() {
            return Err(AuthServiceError::upstream(anyhow!(
                "{op}: provider returned {status}"
            )));
        }
        response
            .json::<T>()
            .await
            .map_err(|e| AuthServiceError::upstream(anyhow::Error::new(e.without_url()).context(op)))
    }
}

impl ProviderClient for TmdbProviderClient {
    async fn request_token(&self) -> Result<ProviderRequestToken, AuthServiceError> {
        let url = self.endpoint("authentication/token/new")?;
        let body: RequestTokenBody = self
            .call("request token", self.http.get(url), || {
                AuthServiceError::upstream(anyhow!("provider rejected the api key"))
            })
            .await?;
        if !body.success {
            return Err(AuthServiceError::upstream(anyhow!(
                "provider refused to issue a request token"
            )));
        }
        Ok(ProviderRequestToken {
            expires_at: parse_expires_at(&body.expires_at)?,
            request_token: body.request_token,
        })
    }

    async fn create_session(
        &self,
        request_token: &str,
    ) -> Result<ProviderSession, AuthServiceError> {
        let url = self.endpoint("authentication/session/new")?;
        let request = self.http.post(url).json(&NewSessionRequest { request_token });
        let body: SessionBody = self
            .call("create session", request, || AuthServiceError::InvalidRequestToken)
            .await?;
        if !body.success {
            return Err(AuthServiceError::InvalidRequestToken);
        }
        Ok(ProviderSession {
            session_id: body.session_id,
            expires_at: None,
        })
    }

    async fn create_session_with_login(
        &self,
        request_token: &str,
        login: &ProviderLogin,
    ) -> Result<ProviderLoginGrant, AuthServiceError> {
        let url = self.endpoint("authentication/token/validate_with_login")?;
        let request = self.http.post(url).json(&LoginRequest {
            username: &login.username,
            password: &login.password,
            request_token,
        });
        let body: RequestTokenBody = self
            .call("validate with login", request, || {
                AuthServiceError::CredentialsRejected
            })
            .await?;
        if !body.success {
            return Err(AuthServiceError::CredentialsRejected);
        }
        Ok(ProviderLoginGrant {
            expires_at: Some(parse_expires_at(&body.expires_at)?),
            request_token: body.request_token,
        })
    }
}

fn parse_expires_at(raw: &str) -> Result<DateTime<Utc>, AuthServiceError> {
    NaiveDateTime::parse_from_str(raw, EXPIRES_AT_FORMAT)
        .map(|naive| naive.and_utc())
        .with_context(|| format!("parse provider expires_at {raw:?}"))
        .map_err(AuthServiceError::upstream)
}
