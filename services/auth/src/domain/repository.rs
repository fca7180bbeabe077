#![allow(async_fn_in_trait)]

use uuid::Uuid;

use cinevault_domain::credential::Email;

use crate::domain::types::{
    AuthUser, MailMessage, NewUser, ProviderLogin, ProviderLoginGrant, ProviderRequestToken,
    ProviderSession,
};
use crate::error::AuthServiceError;

/// Persistent user records.
pub trait CredentialStore: Send + Sync {
    async fn find_by_email(&self, email: &Email) -> Result<Option<AuthUser>, AuthServiceError>;

    /// Insert a new user. Fails with `DuplicateUser` if the email is taken.
    async fn create(&self, user: &NewUser) -> Result<(), AuthServiceError>;

    /// Replace the stored password hash. Returns once the write is durable.
    async fn update_password(
        &self,
        user_id: Uuid,
        password_hash: &str,
    ) -> Result<(), AuthServiceError>;
}

/// Flat key/value store with per-key TTL (Redis).
pub trait Cache: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, AuthServiceError>;

    /// Set `key` to `value`, replacing any existing value, expiring after `ttl_secs`.
    async fn set_ex(&self, key: &str, value: &str, ttl_secs: u64) -> Result<(), AuthServiceError>;

    /// Set `key` only if it is absent. Returns `false` when a value was already there.
    async fn set_nx_ex(&self, key: &str, value: &str, ttl_secs: u64)
    -> Result<bool, AuthServiceError>;

    /// Atomically delete `key` only if it currently holds `expected`.
    /// Returns `true` for exactly one caller per stored value.
    async fn remove_if_eq(&self, key: &str, expected: &str) -> Result<bool, AuthServiceError>;
}

/// Outbound email.
pub trait MailSender: Send + Sync {
    async fn send(&self, message: &MailMessage) -> Result<(), AuthServiceError>;
}

/// External movie-catalog provider's token/session handshake.
pub trait ProviderClient: Send + Sync {
    async fn request_token(&self) -> Result<ProviderRequestToken, AuthServiceError>;

    /// Fails with `InvalidRequestToken` if the provider rejects the token.
    async fn create_session(&self, request_token: &str)
    -> Result<ProviderSession, AuthServiceError>;

    /// Fails with `CredentialsRejected` if the provider rejects the login.
    async fn create_session_with_login(
        &self,
        request_token: &str,
        login: &ProviderLogin,
    ) -> Result<ProviderLoginGrant, AuthServiceError>;
}
