use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Value of active_days_limit must be a positive integer, got {0}")]
    InvalidActiveDaysLimit(i64),
    #[error("Options development and website_push are mutually exclusive")]
    ConflictingKinds,
    #[error("Invalid URL, must start with https://: {0}")]
    InvalidWebhookUrl(String),
    #[error("Missing required value: {0}")]
    MissingField(&'static str),
    #[error("A webhook URL is required unless notifications are skipped")]
    MissingWebhook,
}

type Result<T> = std::result::Result<T, ConfigError>;

pub const DEFAULT_ACTIVE_DAYS_LIMIT: u32 = 30;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CertificateKind {
    #[serde(rename = "development_push", alias = "development")]
    Development,
    #[serde(rename = "website_push", alias = "website")]
    WebsitePush,
    #[default]
    #[serde(rename = "production_push", alias = "production")]
    Production,
}

impl CertificateKind {
    /// Picks the certificate pool from the two command line switches.
    pub fn select(development: bool, website_push: bool) -> Result<Self> {
        match (development, website_push) {
            (true, true) => Err(ConfigError::ConflictingKinds),
            (true, false) => Ok(Self::Development),
            (false, true) => Ok(Self::WebsitePush),
            (false, false) => Ok(Self::Production),
        }
    }

    /// Label shown in notifications.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Development => "development",
            Self::WebsitePush => "website",
            Self::Production => "production",
        }
    }

    /// Pool name understood by the certificate service.
    pub fn pool(&self) -> &'static str {
        match self {
            Self::Development => "development_push",
            Self::WebsitePush => "website_push",
            Self::Production => "production_push",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlackConfig {
    pub url: String,
    pub channel: Option<String>,
}

impl SlackConfig {
    pub fn new(url: &str, channel: Option<&str>) -> Result<Self> {
        if !url.starts_with("https://") {
            return Err(ConfigError::InvalidWebhookUrl(url.to_string()));
        }

        Ok(SlackConfig {
            url: url.to_string(),
            channel: channel.filter(|c| !c.is_empty()).map(str::to_string),
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AlertConfig {
    pub app_identifier: String,
    pub username: String,
    pub password: Option<String>,
    pub team_id: Option<String>,
    pub kind: CertificateKind,
    pub active_days_limit: u32,
    pub skip_notification: bool,
    pub slack: Option<SlackConfig>,
}

pub struct AlertConfigBuilder {
    app_identifier: String,
    username: Option<String>,
    password: Option<String>,
    team_id: Option<String>,
    development: bool,
    website_push: bool,
    active_days_limit: i64,
    skip_notification: bool,
    slack_url: Option<String>,
    slack_channel: Option<String>,
}

impl AlertConfigBuilder {
    pub fn new(app_identifier: &str) -> Self {
        AlertConfigBuilder {
            app_identifier: app_identifier.to_string(),
            username: None,
            password: None,
            team_id: None,
            development: false,
            website_push: false,
            active_days_limit: DEFAULT_ACTIVE_DAYS_LIMIT as i64,
            skip_notification: false,
            slack_url: None,
            slack_channel: None,
        }
    }

    pub fn username(mut self, username: &str) -> Self {
        self.username = Some(username.to_string());
        self
    }

    pub fn password(mut self, password: Option<&str>) -> Self {
        self.password = password.map(str::to_string);
        self
    }

    pub fn team_id(mut self, team_id: Option<&str>) -> Self {
        self.team_id = team_id.filter(|t| !t.is_empty()).map(str::to_string);
        self
    }

    pub fn development(mut self, development: bool) -> Self {
        self.development = development;
        self
    }

    pub fn website_push(mut self, website_push: bool) -> Self {
        self.website_push = website_push;
        self
    }

    pub fn active_days_limit(mut self, limit: i64) -> Self {
        self.active_days_limit = limit;
        self
    }

    pub fn skip_notification(mut self, skip: bool) -> Self {
        self.skip_notification = skip;
        self
    }

    pub fn slack_url(mut self, url: Option<&str>) -> Self {
        self.slack_url = url.filter(|u| !u.is_empty()).map(str::to_string);
        self
    }

    pub fn slack_channel(mut self, channel: Option<&str>) -> Self {
        self.slack_channel = channel.map(str::to_string);
        self
    }

    pub fn build(self) -> Result<AlertConfig> {
        if self.app_identifier.is_empty() {
            return Err(ConfigError::MissingField("app_identifier"));
        }

        let username = self
            .username
            .filter(|u| !u.is_empty())
            .ok_or(ConfigError::MissingField("username"))?;

        let active_days_limit = u32::try_from(self.active_days_limit)
            .ok()
            .filter(|limit| *limit > 0)
            .ok_or(ConfigError::InvalidActiveDaysLimit(self.active_days_limit))?;

        let kind = CertificateKind::select(self.development, self.website_push)?;

        let slack = self
            .slack_url
            .as_deref()
            .map(|url| SlackConfig::new(url, self.slack_channel.as_deref()))
            .transpose()?;

        if slack.is_none() && !self.skip_notification {
            return Err(ConfigError::MissingWebhook);
        }

        Ok(AlertConfig {
            app_identifier: self.app_identifier,
            username,
            password: self.password,
            team_id: self.team_id,
            kind,
            active_days_limit,
            skip_notification: self.skip_notification,
            slack,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn builder() -> AlertConfigBuilder {
        AlertConfigBuilder::new("com.example.app")
            .username("ci@example.com")
            .slack_url(Some("https://hooks.slack.com/services/T/B/X"))
    }

    #[test]
    fn defaults_to_production_and_thirty_days() {
        let config = builder().build().unwrap();

        assert_eq!(config.kind, CertificateKind::Production);
        assert_eq!(config.active_days_limit, 30);
        assert!(!config.skip_notification);
        assert_eq!(config.team_id, None);
    }

    #[test]
    fn rejects_development_and_website_push_together() {
        let result = builder().development(true).website_push(true).build();

        assert_eq!(result, Err(ConfigError::ConflictingKinds));
    }

    #[test]
    fn selects_kind_from_switches() {
        assert_eq!(
            builder().development(true).build().unwrap().kind,
            CertificateKind::Development
        );
        assert_eq!(
            builder().website_push(true).build().unwrap().kind,
            CertificateKind::WebsitePush
        );
    }

    #[test]
    fn rejects_non_positive_limit() {
        assert_eq!(
            builder().active_days_limit(0).build(),
            Err(ConfigError::InvalidActiveDaysLimit(0))
        );
        assert_eq!(
            builder().active_days_limit(-5).build(),
            Err(ConfigError::InvalidActiveDaysLimit(-5))
        );
    }

    #[test]
    fn rejects_plain_http_webhook() {
        let result = builder()
            .slack_url(Some("http://hooks.slack.com/services/T/B/X"))
            .build();

        assert!(matches!(result, Err(ConfigError::InvalidWebhookUrl(_))));
    }

    #[test]
    fn webhook_is_optional_when_skipping_notifications() {
        let config = AlertConfigBuilder::new("com.example.app")
            .username("ci@example.com")
            .skip_notification(true)
            .build()
            .unwrap();

        assert_eq!(config.slack, None);

        let result = AlertConfigBuilder::new("com.example.app")
            .username("ci@example.com")
            .build();
        assert_eq!(result, Err(ConfigError::MissingWebhook));
    }

    #[test]
    fn requires_username_and_app_identifier() {
        let result = AlertConfigBuilder::new("com.example.app")
            .skip_notification(true)
            .build();
        assert_eq!(result, Err(ConfigError::MissingField("username")));

        let result = AlertConfigBuilder::new("")
            .username("ci@example.com")
            .skip_notification(true)
            .build();
        assert_eq!(result, Err(ConfigError::MissingField("app_identifier")));
    }

    #[test]
    fn kind_labels() {
        assert_eq!(CertificateKind::WebsitePush.as_str(), "website");
        assert_eq!(CertificateKind::Development.pool(), "development_push");
        assert_eq!(CertificateKind::Production.pool(), "production_push");
    }
}
