// src/hooks/email.rs

use std::fmt;
use std::sync::Arc;

use lettre::message::Mailbox;
use tracing::{debug, error};

use crate::config::Settings;
use crate::errors::{Result, RunAsError};

use super::mailer::{AlertMessage, MailTransport, SmtpCredentials, SmtpServer};
use super::ServiceControl;

/// Subject used when `email/subject` is not configured. `{0}` is replaced by
/// the service display name.
pub const DEFAULT_SUBJECT: &str = "Warning: {0} [Service] - Process has exited!";

/// Send an email when an unwanted exit is detected.
///
/// Mandatory settings: `email/smtp/host`, `email/address/to` (comma-separated
/// or a list), `email/address/from` and the command `executable`. Optional:
/// `email/smtp/port`, `email/smtp/login` + `email/smtp/password`,
/// `email/subject`.
pub struct EmailNotifyHook {
    mailer: Arc<dyn MailTransport>,
    server: Option<SmtpServer>,
    message: Option<AlertMessage>,
}

impl EmailNotifyHook {
    pub fn new(mailer: Arc<dyn MailTransport>) -> Self {
        Self {
            mailer,
            server: None,
            message: None,
        }
    }

    pub fn server(&self) -> Option<&SmtpServer> {
        self.server.as_ref()
    }

    pub fn message(&self) -> Option<&AlertMessage> {
        self.message.as_ref()
    }

    pub(super) fn configure(&mut self, settings: &Settings, service: &dyn ServiceControl) -> Result<()> {
        self.server = Some(smtp_server(settings)?);
        self.message = Some(prepare_message(settings, service.display_name())?);
        Ok(())
    }

    pub(super) fn execute(&mut self) -> bool {
        let (Some(server), Some(message)) = (&self.server, &self.message) else {
            debug!("email can't be sent: not well configured");
            return false;
        };

        match self.mailer.send(server, message) {
            Ok(()) => {
                debug!(server = %server.host, to = %message.recipients(), "alert mail sent");
                true
            }
            Err(e) => {
                error!(server = %server.host, error = %e, "alert mail can't be sent");
                false
            }
        }
    }
}

impl fmt::Debug for EmailNotifyHook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EmailNotifyHook")
            .field("server", &self.server)
            .field("message", &self.message)
            .finish_non_exhaustive()
    }
}

fn smtp_server(settings: &Settings) -> Result<SmtpServer> {
    let host = settings.value("email/smtp/host").trim().to_string();
    if host.is_empty() {
        return Err(RunAsError::ConfigError(
            "cannot send an email: the smtp host is unknown".to_string(),
        ));
    }

    let port = settings.parse_value::<u16>("email/smtp/port").map_err(|e| {
        RunAsError::ConfigError(format!(
            "cannot send an email: the smtp port is not well defined: {e}"
        ))
    })?;

    let login = settings.value("email/smtp/login");
    let password = settings.value("email/smtp/password");
    let credentials = (!login.is_empty() && !password.is_empty())
        .then_some(SmtpCredentials { login, password });

    Ok(SmtpServer {
        host,
        port,
        credentials,
    })
}

fn prepare_message(settings: &Settings, service_name: &str) -> Result<AlertMessage> {
    let to: Vec<String> = settings
        .values("email/address/to")
        .iter()
        .flat_map(|entry| entry.split(','))
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect();
    if to.is_empty() {
        return Err(RunAsError::ConfigError(
            "cannot send an email: the recipient address is empty".to_string(),
        ));
    }

    let from = settings.value("email/address/from").trim().to_string();
    if from.is_empty() {
        return Err(RunAsError::ConfigError(
            "cannot send an email: the sender address is empty".to_string(),
        ));
    }

    let executable = settings.value("executable");
    if executable.trim().is_empty() {
        return Err(RunAsError::ConfigError(
            "cannot send an email: the executable is empty".to_string(),
        ));
    }

    let subject = settings.value("email/subject");
    let subject = if subject.trim().is_empty() {
        DEFAULT_SUBJECT
    } else {
        subject.as_str()
    };

    Ok(AlertMessage {
        from: parse_mailbox(&from)?,
        to: to.iter().map(|s| parse_mailbox(s)).collect::<Result<_>>()?,
        subject: subject.replace("{0}", service_name),
        html_body: format!(
            "<html><body>Executed command : <b>{executable}</b><br><br>\
             This process may have been killed.<br>\
             If necessary, please restart the &quot;{service_name}&quot; service.<br>\
             </body></html>"
        ),
    })
}

fn parse_mailbox(address: &str) -> Result<Mailbox> {
    address
        .parse::<Mailbox>()
        .map_err(|e| RunAsError::ConfigError(format!("invalid email address '{address}': {e}")))
}
