pub mod account;
pub mod password;
pub mod provider_session;

use cinevault_auth_types::password::PasswordHasher;

use crate::error::AuthServiceError;

// Argon2 is CPU-bound; keep it off the async workers.

pub(crate) async fn hash_password(
    hasher: &PasswordHasher,
    password: &str,
) -> Result<String, AuthServiceError> {
    let hasher = hasher.clone();
    let password = password.to_owned();
    let hash = tokio::task::spawn_blocking(move || hasher.hash(&password))
        .await
        .map_err(|e| AuthServiceError::Internal(e.into()))??;
    Ok(hash)
}

pub(crate) async fn verify_password(
    hasher: &PasswordHasher,
    password: &str,
    hash: Option<&str>,
) -> Result<bool, AuthServiceError> {
    let hasher = hasher.clone();
    let password = password.to_owned();
    let hash = hash.map(str::to_owned);
    let matched = tokio::task::spawn_blocking(move || match hash {
        Some(hash) => hasher.verify(&password, &hash),
        None => Ok(hasher.verify_decoy(&password)),
    })
    .await
    .map_err(|e| AuthServiceError::Internal(e.into()))??;
    Ok(matched)
}
