//! Notification mail.
//!
//! Mail is best-effort: a failed send is logged and counted, never returned
//! to the caller of the request that triggered it.

use std::sync::Arc;

use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use thiserror::Error;
use tracing::{info, warn};

use crate::config::MailConfig;
use crate::metrics;

#[derive(Debug, Error)]
pub enum MailError {
    #[error("Invalid address: {0}")]
    Address(#[from] lettre::address::AddressError),

    #[error("Invalid message: {0}")]
    Message(#[from] lettre::error::Error),

    #[error("SMTP error: {0}")]
    Smtp(#[from] lettre::transport::smtp::Error),
}

/// A single HTML mail.
#[derive(Debug, Clone, PartialEq)]
pub struct Mail {
    pub from: String,
    pub to: String,
    pub subject: String,
    pub html_body: String,
}

#[async_trait]
pub trait MailTransport: Send + Sync {
    async fn send(&self, mail: Mail) -> Result<(), MailError>;
}

/// Send and only log failures.
pub async fn send_best_effort(transport: &dyn MailTransport, mail: Mail) {
    let to = mail.to.clone();
    match transport.send(mail).await {
        Ok(()) => {
            metrics::record_mail(true);
            info!(to = %to, "Mail sent");
        }
        Err(e) => {
            metrics::record_mail(false);
            warn!(to = %to, error = %e, "Failed to send mail");
        }
    }
}

/// SMTP delivery over STARTTLS.
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
}

impl SmtpMailer {
    pub fn new(host: &str, config: &MailConfig) -> Result<Self, MailError> {
        let mut builder =
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(host)?.port(config.smtp_port);
        if let (Some(user), Some(pass)) = (&config.smtp_username, &config.smtp_password) {
            builder = builder.credentials(Credentials::new(user.clone(), pass.clone()));
        }
        Ok(Self {
            transport: builder.build(),
        })
    }
}

#[async_trait]
impl MailTransport for SmtpMailer {
    async fn send(&self, mail: Mail) -> Result<(), MailError> {
        let message = Message::builder()
            .from(mail.from.parse()?)
            .to(mail.to.parse()?)
            .subject(mail.subject)
            .header(ContentType::TEXT_HTML)
            .body(mail.html_body)?;
        self.transport.send(message).await?;
        Ok(())
    }
}

/// Stand-in when no SMTP host is configured: logs instead of sending.
#[derive(Debug, Clone, Default)]
pub struct LogMailer;

#[async_trait]
impl MailTransport for LogMailer {
    async fn send(&self, mail: Mail) -> Result<(), MailError> {
        info!(to = %mail.to, subject = %mail.subject, "SMTP not configured, mail dropped");
        Ok(())
    }
}

/// Pick the transport the configuration asks for.
pub fn from_config(config: &MailConfig) -> Result<Arc<dyn MailTransport>, MailError> {
    match &config.smtp_host {
        Some(host) => Ok(Arc::new(SmtpMailer::new(host, config)?)),
        None => Ok(Arc::new(LogMailer)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Failing;

    #[async_trait]
    impl MailTransport for Failing {
        async fn send(&self, mail: Mail) -> Result<(), MailError> {
            mail.to.parse::<lettre::Address>()?;
            Ok(())
        }
    }

    fn mail(to: &str) -> Mail {
        Mail {
            from: "SweetJobs <no-reply@sweetjobs.local>".to_string(),
            to: to.to_string(),
            subject: "Hello".to_string(),
            html_body: "<p>Hi</p>".to_string(),
        }
    }

    #[tokio::test]
    async fn test_best_effort_swallows_errors() {
        send_best_effort(&Failing, mail("not an address")).await;
        send_best_effort(&LogMailer, mail("anna@example.com")).await;
    }

    #[test]
    fn test_from_config_without_host_logs_only() {
        assert!(from_config(&MailConfig::default()).is_ok());
    }
}
