use rand::RngExt;
use sha2::{Digest, Sha256};
use tracing::{debug, info, warn};

use cinevault_auth_types::password::PasswordHasher;
use cinevault_domain::credential::{Email, check_password_strength};

use crate::domain::repository::{Cache, CredentialStore, MailSender};
use crate::domain::types::{AuthUser, MailMessage, RESET_CODE_LEN};
use crate::error::AuthServiceError;
use crate::usecase::hash_password;

/// Charset for reset codes (uppercase alphanumeric).
const CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

fn generate_code() -> String {
    let mut rng = rand::rng();
    (0..RESET_CODE_LEN)
        .map(|_| CHARSET[rng.random_range(0..CHARSET.len())] as char)
        .collect()
}

/// Only the digest of a reset code is ever stored.
fn code_digest(code: &str) -> String {
    hex::encode(Sha256::digest(code.as_bytes()))
}

fn reset_key(email: &Email) -> String {
    format!("password_reset:{email}")
}

// ── RequestPasswordReset ─────────────────────────────────────────────────────

/// Result of a reset request that got past the account lookup.
#[derive(Debug)]
pub enum ResetRequestOutcome {
    /// No account has this email. Nothing was stored or sent.
    UnknownEmail,
    CodeSent,
    /// The account exists but the code could not be stored or mailed.
    Undelivered(AuthServiceError),
}

impl ResetRequestOutcome {
    pub fn code_sent(&self) -> bool {
        matches!(self, Self::CodeSent)
    }
}

pub struct RequestPasswordResetUseCase<S, C, M>
where
    S: CredentialStore,
    C: Cache,
    M: MailSender,
{
    pub users: S,
    pub cache: C,
    pub mailer: M,
    pub code_ttl_secs: u64,
}

impl<S, C, M> RequestPasswordResetUseCase<S, C, M>
where
    S: CredentialStore,
    C: Cache,
    M: MailSender,
{
    /// Errors only on a malformed email or a failed lookup. Failures after
    /// the lookup come back as [`ResetRequestOutcome::Undelivered`].
    pub async fn execute(&self, email: &str) -> Result<ResetRequestOutcome, AuthServiceError> {
        let email = Email::parse(email)?;
        let Some(user) = self.users.find_by_email(&email).await? else {
            debug!("password reset requested for unknown email");
            return Ok(ResetRequestOutcome::UnknownEmail);
        };

        match self.issue_code(&email, &user).await {
            Ok(()) => {
                info!(user_id = %user.id, "password reset code issued");
                Ok(ResetRequestOutcome::CodeSent)
            }
            Err(err) => Ok(ResetRequestOutcome::Undelivered(err)),
        }
    }

    async fn issue_code(&self, email: &Email, user: &AuthUser) -> Result<(), AuthServiceError> {
        let code = generate_code();
        let digest = code_digest(&code);
        let key = reset_key(email);
        // Overwrites any pending code, which is thereby invalidated.
        self.cache.set_ex(&key, &digest, self.code_ttl_secs).await?;

        let greeting = match user.first_name.as_deref() {
            Some(name) => format!("Hello {name},"),
            None => "Hello,".to_owned(),
        };
        let message = MailMessage {
            to: user.email.clone(),
            subject: "Your Cinevault password reset code".to_owned(),
            body: format!(
                "{greeting}\n\n\
                 Use this code to choose a new password: {code}\n\n\
                 It expires in {} minutes. If you did not ask for a reset, \
                 ignore this message.\n",
                self.code_ttl_secs.div_ceil(60),
            ),
        };
        if let Err(err) = self.mailer.send(&message).await {
            // Only our own code is removed; a newer one stays valid.
            if let Err(cleanup) = self.cache.remove_if_eq(&key, &digest).await {
                warn!(error = ?cleanup, "failed to discard unsent reset code");
            }
            return Err(err);
        }
        Ok(())
    }
}

// ── UpdatePassword ───────────────────────────────────────────────────────────

pub struct UpdatePasswordInput {
    pub email: String,
    pub code: String,
    pub new_password: String,
}

pub struct UpdatePasswordUseCase<S, C>
where
    S: CredentialStore,
    C: Cache,
{
    pub users: S,
    pub cache: C,
    pub hasher: PasswordHasher,
    /// Lifetime given to a code put back after a failed write.
    pub code_ttl_secs: u64,
}

impl<S, C> UpdatePasswordUseCase<S, C>
where
    S: CredentialStore,
    C: Cache,
{
    pub async fn execute(&self, input: UpdatePasswordInput) -> Result<(), AuthServiceError> {
        check_password_strength(&input.new_password)?;

        let email = Email::parse(&input.email).map_err(|_| AuthServiceError::CodeInvalid)?;
        let code = input.code.trim().to_ascii_uppercase();
        if code.len() != RESET_CODE_LEN {
            return Err(AuthServiceError::CodeInvalid);
        }
        let user = self
            .users
            .find_by_email(&email)
            .await?
            .ok_or(AuthServiceError::CodeInvalid)?;

        // Hash first: once the code is consumed nothing else may fail
        // except the write itself.
        let password_hash = hash_password(&self.hasher, &input.new_password).await?;

        let key = reset_key(&email);
        let digest = code_digest(&code);
        let consumed = self.cache.remove_if_eq(&key, &digest).await?;
        if !consumed {
            debug!(user_id = %user.id, "reset code rejected");
            return Err(AuthServiceError::CodeInvalid);
        }

        if let Err(err) = self.users.update_password(user.id, &password_hash).await {
            // Put the code back unless a newer one was issued meanwhile.
            match self.cache.set_nx_ex(&key, &digest, self.code_ttl_secs).await {
                Ok(true) => debug!(user_id = %user.id, "reset code restored after failed write"),
                Ok(false) => debug!(user_id = %user.id, "newer reset code present, not restoring"),
                Err(restore) => warn!(error = ?restore, "failed to restore reset code"),
            }
            return Err(err);
        }
        info!(user_id = %user.id, "password updated");
        Ok(())
    }
}
