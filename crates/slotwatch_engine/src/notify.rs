use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use engine_logging::engine_info;
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Address, AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use slotwatch_core::{compose_alert, AlertMessage, ProbeResult};

/// Implicit-TLS submission port.
const SMTPS_PORT: u16 = 465;

#[async_trait]
pub trait Notifier: Send + Sync {
    /// Deliver one consolidated alert for `results`.
    async fn notify(&self, results: &[ProbeResult]) -> Result<(), NotifyError>;
}

#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("invalid mail address `{address}`: {source}")]
    Address {
        address: String,
        source: lettre::address::AddressError,
    },
    #[error("failed to build message: {0}")]
    Build(#[from] lettre::error::Error),
    #[error("smtp delivery failed: {0}")]
    Transport(#[from] lettre::transport::smtp::Error),
}

#[derive(Clone)]
pub struct MailSettings {
    pub smtp_host: String,
    pub smtp_port: u16,
    pub sender: String,
    pub sender_name: String,
    pub password: String,
    pub recipient: String,
    pub recipient_name: String,
    pub timeout: Duration,
}

impl MailSettings {
    pub const DEFAULT_HOST: &'static str = "smtp.qq.com";
    pub const DEFAULT_PORT: u16 = SMTPS_PORT;
    pub const DEFAULT_SENDER_NAME: &'static str = "抢票助手";
    pub const DEFAULT_RECIPIENT_NAME: &'static str = "管理员";
}

impl fmt::Debug for MailSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MailSettings")
            .field("smtp_host", &self.smtp_host)
            .field("smtp_port", &self.smtp_port)
            .field("sender", &self.sender)
            .field("sender_name", &self.sender_name)
            .field("password", &"<redacted>")
            .field("recipient", &self.recipient)
            .field("recipient_name", &self.recipient_name)
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Sends alerts through one authenticated SMTP relay.
pub struct SmtpNotifier {
    from: Mailbox,
    to: Mailbox,
    transport: AsyncSmtpTransport<Tokio1Executor>,
}

impl SmtpNotifier {
    /// Validate addresses and prepare the transport. No connection is made here.
    pub fn new(settings: &MailSettings) -> Result<Self, NotifyError> {
        let from = mailbox(&settings.sender_name, &settings.sender)?;
        let to = mailbox(&settings.recipient_name, &settings.recipient)?;

        let builder = if settings.smtp_port == SMTPS_PORT {
            AsyncSmtpTransport::<Tokio1Executor>::relay(&settings.smtp_host)?
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&settings.smtp_host)?
        };
        let transport = builder
            .port(settings.smtp_port)
            .credentials(Credentials::new(
                settings.sender.clone(),
                settings.password.clone(),
            ))
            .timeout(Some(settings.timeout))
            .build();

        Ok(Self { from, to, transport })
    }

    pub fn recipient(&self) -> &Mailbox {
        &self.to
    }

    pub fn build_message(&self, alert: &AlertMessage) -> Result<Message, NotifyError> {
        Ok(Message::builder()
            .from(self.from.clone())
            .to(self.to.clone())
            .subject(alert.subject.clone())
            .header(ContentType::TEXT_HTML)
            .body(alert.html_body.clone())?)
    }
}

#[async_trait]
impl Notifier for SmtpNotifier {
    async fn notify(&self, results: &[ProbeResult]) -> Result<(), NotifyError> {
        let alert = compose_alert(results, &chrono::Local::now());
        let message = self.build_message(&alert)?;
        engine_info!("sending alert for {} activities to {}", results.len(), self.to);
        self.transport.send(message).await?;
        Ok(())
    }
}

fn mailbox(name: &str, address: &str) -> Result<Mailbox, NotifyError> {
    let parsed: Address = address.trim().parse().map_err(|source| NotifyError::Address {
        address: address.to_string(),
        source,
    })?;
    let name = name.trim();
    Ok(Mailbox::new(
        (!name.is_empty()).then(|| name.to_string()),
        parsed,
    ))
}
