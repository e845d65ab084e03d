use anyhow::Context;
use async_trait::async_trait;
use lettre::{
    message::header::ContentType, transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use tracing::debug;
use uuid::Uuid;

use crate::config::SmtpConfig;

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send_email(&self, to: &str, subject: &str, body: &str) -> anyhow::Result<()>;
}

#[derive(Clone)]
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: String,
}

impl SmtpMailer {
    /// Implicit-TLS relay, as used on port 465.
    pub fn new(cfg: &SmtpConfig) -> anyhow::Result<Self> {
        let transport = AsyncSmtpTransport::<Tokio1Executor>::relay(&cfg.host)
            .with_context(|| format!("smtp relay {}", cfg.host))?
            .port(cfg.port)
            .credentials(Credentials::new(cfg.username.clone(), cfg.password.clone()))
            .build();
        Ok(Self {
            transport,
            from: cfg.from.clone(),
        })
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send_email(&self, to: &str, subject: &str, body: &str) -> anyhow::Result<()> {
        let message = Message::builder()
            .from(self.from.parse().context("parse from address")?)
            .to(to.parse().context("parse recipient address")?)
            .subject(subject)
            .header(ContentType::TEXT_PLAIN)
            .body(body.to_string())
            .context("build message")?;
        self.transport.send(message).await.context("smtp send")?;
        debug!(%to, %subject, "email sent");
        Ok(())
    }
}

pub struct VerificationEmail {
    pub subject: String,
    pub body: String,
}

/// Client page that confirms the address; it calls `POST /verifyEmail/:userId` itself.
pub const VERIFY_EMAIL_PAGE: &str = "verify-email";

pub fn verification_email(client_url: &str, first_name: &str, user_id: Uuid) -> VerificationEmail {
    let link = format!(
        "{}/{VERIFY_EMAIL_PAGE}/{user_id}",
        client_url.trim_end_matches('/')
    );
    VerificationEmail {
        subject: "Verify your Spendthrift email".into(),
        body: format!(
            "Hi {first_name},\n\n\
             Thanks for signing up to Spendthrift. Confirm your email address by visiting:\n\n\
             {link}\n\n\
             If you did not create this account you can ignore this message.\n"
        ),
    }
}
