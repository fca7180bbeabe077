use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info};
use uuid::Uuid;

use cinevault_auth_types::password::PasswordHasher;
use cinevault_auth_types::token::{TokenCodec, TokenSubject};
use cinevault_domain::credential::{Email, check_password_strength, normalize_name};
use cinevault_domain::user::UserRole;

use crate::domain::repository::{CredentialStore, MailSender};
use crate::domain::types::{MailMessage, NewUser, UserProfile};
use crate::error::AuthServiceError;
use crate::usecase::{hash_password, verify_password};

// ── Register ─────────────────────────────────────────────────────────────────

pub struct RegisterInput {
    pub email: String,
    pub password: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

pub struct RegisterUseCase<S: CredentialStore> {
    pub users: S,
    pub hasher: PasswordHasher,
}

impl<S: CredentialStore> RegisterUseCase<S> {
    pub async fn execute(&self, input: RegisterInput) -> Result<UserProfile, AuthServiceError> {
        let email = Email::parse(&input.email)?;
        check_password_strength(&input.password)?;
        let first_name = optional_name("first_name", input.first_name.as_deref())?;
        let last_name = optional_name("last_name", input.last_name.as_deref())?;

        if self.users.find_by_email(&email).await?.is_some() {
            return Err(AuthServiceError::DuplicateUser);
        }

        let user = NewUser {
            id: Uuid::now_v7(),
            email,
            password_hash: hash_password(&self.hasher, &input.password).await?,
            first_name,
            last_name,
            role: UserRole::default(),
            created_at: Utc::now(),
        };
        // A concurrent registration that got past the lookup still loses on
        // the unique index and surfaces as DuplicateUser here.
        self.users.create(&user).await?;

        info!(user_id = %user.id, "user registered");
        Ok(user.into_user().profile())
    }
}

/// Display names may be omitted, but a supplied one must not be blank.
fn optional_name(
    field: &'static str,
    raw: Option<&str>,
) -> Result<Option<String>, AuthServiceError> {
    raw.map(|name| normalize_name(field, name))
        .transpose()
        .map_err(AuthServiceError::from)
}

// ── Authenticate ─────────────────────────────────────────────────────────────

pub struct AuthenticateInput {
    pub email: String,
    pub password: String,
}

#[derive(Debug)]
pub struct AuthenticateOutput {
    pub user: UserProfile,
    pub token: String,
    pub token_expires_at: u64,
}

pub struct AuthenticateUseCase<S: CredentialStore> {
    pub users: S,
    pub hasher: PasswordHasher,
    pub codec: Arc<TokenCodec>,
}

impl<S: CredentialStore> AuthenticateUseCase<S> {
    pub async fn execute(
        &self,
        input: AuthenticateInput,
    ) -> Result<AuthenticateOutput, AuthServiceError> {
        // A malformed address cannot match an account; it is answered like an
        // unknown one.
        let user = match Email::parse(&input.email) {
            Ok(email) => self.users.find_by_email(&email).await?,
            Err(_) => None,
        };

        let stored_hash = user.as_ref().map(|u| u.password_hash.as_str());
        let matched = verify_password(&self.hasher, &input.password, stored_hash).await?;
        let user = match user {
            Some(user) if matched => user,
            _ => {
                debug!("authentication rejected");
                return Err(AuthServiceError::NotFound);
            }
        };

        let issued = self.codec.issue(&TokenSubject {
            user_id: user.id,
            email: &user.email,
            role: user.role.as_u8(),
        })?;

        info!(user_id = %user.id, "user authenticated");
        Ok(AuthenticateOutput {
            user: user.profile(),
            token: issued.token,
            token_expires_at: issued.expires_at,
        })
    }
}

// ── ValidationEmail ──────────────────────────────────────────────────────────

pub struct ValidationEmailInput {
    pub email: String,
    pub name: Option<String>,
}

pub struct ValidationEmailUseCase<M: MailSender> {
    pub mailer: M,
}

impl<M: MailSender> ValidationEmailUseCase<M> {
    pub async fn execute(&self, input: ValidationEmailInput) -> Result<(), AuthServiceError> {
        let email = Email::parse(&input.email)?;
        let greeting = match input.name.as_deref().map(str::trim) {
            Some(name) if !name.is_empty() => format!("Hello {name},"),
            _ => "Hello,".to_owned(),
        };
        let message = MailMessage {
            to: email.to_string(),
            subject: "Confirm your Cinevault email address".to_owned(),
            body: format!(
                "{greeting}\n\n\
                 This address was just used to connect a movie provider account \
                 to Cinevault. If that was you, no further action is needed.\n\n\
                 If it was not, you can ignore this message.\n"
            ),
        };
        self.mailer.send(&message).await?;
        info!("validation email sent");
        Ok(())
    }
}
