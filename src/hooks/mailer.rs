// src/hooks/mailer.rs

//! Mail delivery for the notification hook.
//!
//! The hook decides *whether* and *what* to send; delivery goes through
//! [`MailTransport`] so tests can record mails instead of talking SMTP.

use std::fmt;

use anyhow::{Context, Result};
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Message, SmtpTransport, Transport};

/// SMTP server the alert is sent through.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SmtpServer {
    pub host: String,
    /// `None` keeps the SMTP default port.
    pub port: Option<u16>,
    pub credentials: Option<SmtpCredentials>,
}

#[derive(Clone, PartialEq, Eq)]
pub struct SmtpCredentials {
    pub login: String,
    pub password: String,
}

impl fmt::Debug for SmtpCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SmtpCredentials")
            .field("login", &self.login)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// A fully prepared alert mail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlertMessage {
    pub from: Mailbox,
    pub to: Vec<Mailbox>,
    pub subject: String,
    pub html_body: String,
}

impl AlertMessage {
    /// Recipients rendered as a comma-separated list, for logs.
    pub fn recipients(&self) -> String {
        self.to
            .iter()
            .map(|m| m.email.to_string())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

pub trait MailTransport: Send + Sync {
    fn send(&self, server: &SmtpServer, message: &AlertMessage) -> Result<()>;
}

/// Plain SMTP delivery through `lettre`.
#[derive(Debug, Default, Clone, Copy)]
pub struct SmtpMailer;

impl MailTransport for SmtpMailer {
    fn send(&self, server: &SmtpServer, message: &AlertMessage) -> Result<()> {
        let mut builder = Message::builder()
            .from(message.from.clone())
            .subject(message.subject.clone())
            .header(ContentType::TEXT_HTML);
        for to in &message.to {
            builder = builder.to(to.clone());
        }
        let email = builder
            .body(message.html_body.clone())
            .context("building alert mail")?;

        let mut transport = SmtpTransport::builder_dangerous(server.host.as_str());
        if let Some(port) = server.port {
            transport = transport.port(port);
        }
        if let Some(ref credentials) = server.credentials {
            transport = transport.credentials(Credentials::new(
                credentials.login.clone(),
                credentials.password.clone(),
            ));
        }

        transport
            .build()
            .send(&email)
            .with_context(|| format!("sending alert mail through {}", server.host))?;
        Ok(())
    }
}
