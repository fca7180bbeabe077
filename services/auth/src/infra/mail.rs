use anyhow::Context as _;
use lettre::message::Mailbox;
use lettre::message::header::ContentType;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use secrecy::{ExposeSecret, SecretString};

use crate::domain::repository::MailSender;
use crate::domain::types::MailMessage;
use crate::error::AuthServiceError;

/// SMTP relay settings.
pub struct SmtpSettings {
    pub host: String,
    pub port: u16,
    /// Relay login. Without it the transport speaks plain SMTP, which is
    /// only suitable for a local mail catcher.
    pub credentials: Option<(String, SecretString)>,
    pub from: String,
}

#[derive(Clone)]
pub struct SmtpMailSender {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpMailSender {
    pub fn new(settings: &SmtpSettings) -> anyhow::Result<Self> {
        let from: Mailbox = settings
            .from
            .parse()
            .with_context(|| format!("parse MAIL_FROM {:?}", settings.from))?;
        let transport = match &settings.credentials {
            Some((username, password)) => {
                AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&settings.host)
                    .context("configure smtp relay")?
                    .port(settings.port)
                    .credentials(Credentials::new(
                        username.clone(),
                        password.expose_secret().to_owned(),
                    ))
                    .build()
            }
            None => AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&settings.host)
                .port(settings.port)
                .build(),
        };
        Ok(Self { transport, from })
    }
}

impl MailSender for SmtpMailSender {
    async fn send(&self, message: &MailMessage) -> Result<(), AuthServiceError> {
        let to: Mailbox = message
            .to
            .parse()
            .context("parse recipient address")
            .map_err(AuthServiceError::Internal)?;
        let email = Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(message.subject.as_str())
            .header(ContentType::TEXT_PLAIN)
            .body(message.body.clone())
            .context("build email")
            .map_err(AuthServiceError::Internal)?;
        self.transport
            .send(email)
            .await
            .context("smtp send")
            .map_err(AuthServiceError::upstream)?;
        tracing::info!(subject = %message.subject, "email sent");
        Ok(())
    }
}
