use chrono::{DateTime, Duration, SecondsFormat, Utc};
use push_cert_alert::{config::SlackConfig, AlertConfig, AlertConfigBuilder};

pub const APP_IDENTIFIER: &str = "com.example.app";

pub fn create_test_config(webhook_url: &str) -> AlertConfig {
    let mut config = AlertConfigBuilder::new(APP_IDENTIFIER)
        .username("ci@example.com")
        .team_id(Some("TEAM42"))
        .slack_url(Some("https://hooks.slack.com/services/T/B/X"))
        .build()
        .unwrap();

    config.slack = Some(SlackConfig {
        url: webhook_url.to_string(),
        channel: None,
    });
    config
}

pub fn certificate_json(owner: &str, name: &str, expires_in: Duration) -> serde_json::Value {
    let expires_at: DateTime<Utc> = Utc::now() + expires_in;

    serde_json::json!({
        "ownerIdentifier": owner,
        "expiresAt": expires_at.to_rfc3339_opts(SecondsFormat::Secs, true),
        "name": name,
        "type": "production_push"
    })
}
