use std::process::{Command, ExitCode};

use anyhow::Context;
use clap::Parser;
use push_cert_alert::{
    session::HttpLogin, slack::SlackNotifier, AlertConfigBuilder, AlertError, Hooks, PushCertAlert,
};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "push-cert-alert")]
#[command(about = "Create alerts for APNS push certificate expiration", long_about = None)]
struct Cli {
    /// The bundle identifier of your app
    #[arg(short = 'a', long, env = "PEM_APP_IDENTIFIER")]
    app_identifier: String,

    /// Username on the certificate service
    #[arg(short = 'u', long, env = "PEM_USERNAME")]
    username: String,

    #[arg(long, env = "PEM_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    /// The ID of your team if you're in multiple teams
    #[arg(short = 'b', long, env = "PEM_TEAM_ID")]
    team_id: Option<String>,

    /// Check the development push certificate instead of the production one
    #[arg(long, env = "PEM_DEVELOPMENT", default_value_t = false)]
    development: bool,

    /// Check the website push certificate
    #[arg(
        long,
        env = "PEM_WEBSITE_PUSH",
        default_value_t = false,
        conflicts_with = "development"
    )]
    website_push: bool,

    /// Alert when the certificate is valid for less than this number of days
    #[arg(
        long,
        env = "PEM_ACTIVE_DAYS_LIMIT",
        default_value_t = 30,
        allow_negative_numbers = true
    )]
    active_days_limit: i64,

    /// Skip sending an alert to Slack
    #[arg(long, default_value_t = false)]
    skip_slack: bool,

    /// Incoming WebHook for your Slack group
    #[arg(short = 'i', long, env = "SLACK_URL", hide_env_values = true)]
    slack_url: Option<String>,

    /// #channel or @username
    #[arg(short = 'e', long, env = "SCAN_SLACK_CHANNEL")]
    slack_channel: Option<String>,

    /// Base URL of the certificate service
    #[arg(long, env = "PEM_SERVICE_URL")]
    service_url: String,

    /// Shell command run when the certificate expires within the limit
    #[arg(long)]
    on_expiring_soon: Option<String>,

    /// Shell command run when the certificate is expired or missing
    #[arg(long)]
    on_expired: Option<String>,

    /// Exit with status 2 unless the certificate is healthy
    #[arg(long, default_value_t = false)]
    fail_on_alert: bool,
}

fn trace_init() -> anyhow::Result<()> {
    let env_filter = EnvFilter::try_from_env("PUSH_CERT_ALERT_LOG")
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init()
        .map_err(|e| anyhow::anyhow!("{}", e))
        .context("tracing shouldn't already have been set up")
}

fn run_hook(command: &str, envs: &[(&str, String)]) {
    info!("Running hook: {}", command);

    match Command::new("sh")
        .arg("-c")
        .arg(command)
        .envs(envs.iter().map(|(k, v)| (*k, v.as_str())))
        .status()
    {
        Ok(status) if status.success() => {}
        Ok(status) => warn!("Hook '{}' exited with {}", command, status),
        Err(e) => warn!("Failed to run hook '{}': {}", command, e),
    }
}

fn hooks(cli: &Cli) -> Hooks {
    let mut hooks = Hooks::new();

    if let Some(command) = cli.on_expiring_soon.clone() {
        hooks = hooks.on_expiring_soon(move |cert, days| {
            run_hook(
                &command,
                &[
                    ("PUSH_CERT_NAME", cert.name.clone()),
                    ("PUSH_CERT_EXPIRES_AT", cert.expires_at.to_rfc3339()),
                    ("PUSH_CERT_DAYS_REMAINING", days.to_string()),
                ],
            )
        });
    }

    if let Some(command) = cli.on_expired.clone() {
        hooks = hooks.on_expired_or_missing(move || run_hook(&command, &[]));
    }

    hooks
}

fn run(cli: &Cli) -> Result<ExitCode, AlertError> {
    let config = AlertConfigBuilder::new(&cli.app_identifier)
        .username(&cli.username)
        .password(cli.password.as_deref())
        .team_id(cli.team_id.as_deref())
        .development(cli.development)
        .website_push(cli.website_push)
        .active_days_limit(cli.active_days_limit)
        .skip_notification(cli.skip_slack)
        .slack_url(cli.slack_url.as_deref())
        .slack_channel(cli.slack_channel.as_deref())
        .build()?;

    let alert = PushCertAlert::new(HttpLogin::new(&cli.service_url), SlackNotifier::new());
    let evaluation = alert.run(&config, &hooks(cli))?;
    info!(result = evaluation.as_str(), "Push certificate check finished");

    if cli.fail_on_alert && !evaluation.is_healthy() {
        return Ok(ExitCode::from(2));
    }

    Ok(ExitCode::SUCCESS)
}

fn main() -> anyhow::Result<ExitCode> {
    trace_init()?;
    let cli = Cli::parse();

    match run(&cli) {
        Ok(code) => Ok(code),
        Err(e) => {
            error!("{}", e);
            Ok(ExitCode::FAILURE)
        }
    }
}
