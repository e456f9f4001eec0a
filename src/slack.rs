use std::cell::RefCell;

use reqwest::blocking::Client;
use serde_json::{json, Value};
use thiserror::Error;
use tracing::{debug, info};

use crate::{certificate::CertificateRecord, config::AlertConfig};

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("Webhook request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("Webhook returned status {status}: {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },
    #[error("No webhook configured")]
    MissingWebhook,
}

type Result<T> = std::result::Result<T, NotifyError>;

const USERNAME: &str = "push-cert-alert";
const DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S UTC";

pub trait Notifier {
    fn notify(
        &self,
        message: &str,
        certificate: Option<&CertificateRecord>,
        config: &AlertConfig,
    ) -> Result<()>;
}

impl<N: Notifier + ?Sized> Notifier for &N {
    fn notify(
        &self,
        message: &str,
        certificate: Option<&CertificateRecord>,
        config: &AlertConfig,
    ) -> Result<()> {
        (**self).notify(message, certificate, config)
    }
}

fn field(title: &str, value: impl Into<Value>) -> Value {
    json!({
        "title": title,
        "value": value.into(),
        "short": true
    })
}

/// Channels without a `#` or `@` prefix are treated as public channels.
pub fn normalize_channel(channel: &str) -> String {
    if channel.starts_with('#') || channel.starts_with('@') {
        channel.to_string()
    } else {
        format!("#{}", channel)
    }
}

/// Certificate fields are attached only when a record is present, expired or not.
pub fn build_payload(
    message: &str,
    certificate: Option<&CertificateRecord>,
    config: &AlertConfig,
) -> Value {
    let mut fields = vec![
        field("App Identifier", config.app_identifier.as_str()),
        field("Type", config.kind.as_str()),
    ];

    if let Some(cert) = certificate {
        fields.push(field(
            "Expires at",
            cert.expires_at.format(DATE_FORMAT).to_string(),
        ));
        fields.push(field("Name", cert.name.as_str()));
    }

    let mut payload = json!({
        "text": message,
        "username": USERNAME,
        "attachments": [
            {
                "fallback": message,
                "text": message,
                "color": "danger",
                "fields": fields
            }
        ]
    });

    if let Some(channel) = config.slack.as_ref().and_then(|s| s.channel.as_deref()) {
        payload["channel"] = Value::String(normalize_channel(channel));
    }

    payload
}

#[derive(Debug, Default)]
pub struct SlackNotifier {
    client: Client,
}

impl SlackNotifier {
    pub fn new() -> Self {
        SlackNotifier {
            client: Client::new(),
        }
    }
}

impl Notifier for SlackNotifier {
    fn notify(
        &self,
        message: &str,
        certificate: Option<&CertificateRecord>,
        config: &AlertConfig,
    ) -> Result<()> {
        let slack = config.slack.as_ref().ok_or(NotifyError::MissingWebhook)?;
        let payload = build_payload(message, certificate, config);
        debug!(payload = %payload, "Posting webhook payload");

        let response = self.client.post(&slack.url).json(&payload).send()?;

        if !response.status().is_success() {
            return Err(NotifyError::Status {
                status: response.status(),
                body: response.text()?,
            });
        }

        info!("Successfully sent Slack notification");
        Ok(())
    }
}

/// Notifier that keeps every message instead of sending it.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    sent: RefCell<Vec<(String, Option<CertificateRecord>)>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent(&self) -> Vec<(String, Option<CertificateRecord>)> {
        self.sent.borrow().clone()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(
        &self,
        message: &str,
        certificate: Option<&CertificateRecord>,
        _config: &AlertConfig,
    ) -> Result<()> {
        self.sent
            .borrow_mut()
            .push((message.to_string(), certificate.cloned()));
        Ok(())
    }
}
