//! Email sending
//!
//! Thin wrapper over lettre's async SMTP transport. Used for approval
//! notifications to subscribed readers and for password reset links.

use anyhow::{anyhow, Result};
use lettre::{
    message::header::ContentType,
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};

use crate::config::SmtpConfig;

/// Email sender backed by an SMTP relay
pub struct EmailSender {
    config: SmtpConfig,
}

impl EmailSender {
    pub fn new(config: SmtpConfig) -> Self {
        Self { config }
    }

    /// Check whether the sender has enough configuration to deliver mail
    pub fn is_configured(&self) -> bool {
        self.config.is_configured()
    }

    /// Send a single HTML email
    pub async fn send_html(&self, to_email: &str, subject: &str, html_body: &str) -> Result<()> {
        self.send(to_email, subject, html_body, ContentType::TEXT_HTML)
            .await
    }

    /// Send a single plain-text email
    pub async fn send_plain(&self, to_email: &str, subject: &str, body: &str) -> Result<()> {
        self.send(to_email, subject, body, ContentType::TEXT_PLAIN)
            .await
    }

    async fn send(
        &self,
        to_email: &str,
        subject: &str,
        body: &str,
        content_type: ContentType,
    ) -> Result<()> {
        if !self.is_configured() {
            return Err(anyhow!(
                "SMTP host not configured. Please configure SMTP settings first."
            ));
        }

        let from = format!("{} <{}>", self.config.from_name, self.config.from);

        let email = Message::builder()
            .from(from.parse().map_err(|e| anyhow!("Invalid from address: {}", e))?)
            .to(to_email.parse().map_err(|e| anyhow!("Invalid to address: {}", e))?)
            .subject(subject)
            .header(content_type)
            .body(body.to_string())
            .map_err(|e| anyhow!("Failed to build email: {}", e))?;

        let mut transport = AsyncSmtpTransport::<Tokio1Executor>::relay(&self.config.host)
            .map_err(|e| anyhow!("Failed to create SMTP transport: {}", e))?
            .port(self.config.port);

        if !self.config.username.is_empty() {
            let creds = Credentials::new(self.config.username.clone(), self.config.password.clone());
            transport = transport.credentials(creds);
        }

        let mailer: AsyncSmtpTransport<Tokio1Executor> = transport.build();

        mailer
            .send(email)
            .await
            .map_err(|e| anyhow!("Failed to send email: {}", e))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unconfigured_sender_reports_itself() {
        let sender = EmailSender::new(SmtpConfig::default());
        assert!(!sender.is_configured());
    }

    #[tokio::test]
    async fn test_send_without_config_fails() {
        let sender = EmailSender::new(SmtpConfig::default());
        let result = sender.send_plain("reader@example.com", "Hello", "Body").await;
        assert!(result.is_err());
    }
}
