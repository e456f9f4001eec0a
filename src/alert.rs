use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::{info, warn};

use crate::{
    certificate::{find_current_certificate, CertificateRecord},
    config::{AlertConfig, ConfigError},
    directory::{CertificateDirectory, HttpDirectory, LookupError},
    session::{AuthError, Login, Session},
    slack::{Notifier, NotifyError},
};

#[derive(Debug, Error)]
pub enum AlertError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("Authentication error: {0}")]
    Auth(#[from] AuthError),
    #[error("Lookup error: {0}")]
    Lookup(#[from] LookupError),
    #[error("Notification error: {0}")]
    Notify(#[from] NotifyError),
}

type Result<T> = std::result::Result<T, AlertError>;

pub const EXPIRED_OR_MISSING_MESSAGE: &str =
    "An APNS push certificate has expired or cannot be found";

/// Whole day counts keep one decimal, so 10 days reads "10.0".
pub fn format_days(days: f64) -> String {
    if days.fract() == 0.0 {
        format!("{:.1}", days)
    } else {
        days.to_string()
    }
}

pub fn expiring_soon_message(remaining_days: f64) -> String {
    format!(
        "An APNS push certificate expires in {} days",
        format_days(remaining_days)
    )
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Evaluation {
    NoCertificateFound,
    CertificateExpired,
    CertificateExpiringSoon(f64),
    CertificateHealthy(f64),
}

impl Evaluation {
    pub fn is_healthy(&self) -> bool {
        matches!(self, Self::CertificateHealthy(_))
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NoCertificateFound => "missing",
            Self::CertificateExpired => "expired",
            Self::CertificateExpiringSoon(_) => "expiring_soon",
            Self::CertificateHealthy(_) => "healthy",
        }
    }
}

/// Zero is already expired; a certificate exactly at the limit is healthy.
pub fn classify(
    certificate: Option<&CertificateRecord>,
    remaining_days: f64,
    limit: u32,
) -> Evaluation {
    match certificate {
        None => Evaluation::NoCertificateFound,
        Some(_) if remaining_days <= 0.0 => Evaluation::CertificateExpired,
        Some(_) if remaining_days < f64::from(limit) => {
            Evaluation::CertificateExpiringSoon(remaining_days)
        }
        Some(_) => Evaluation::CertificateHealthy(remaining_days),
    }
}

pub type ExpiringSoonHook = Box<dyn Fn(&CertificateRecord, f64)>;
pub type ExpiredHook = Box<dyn Fn()>;

/// Optional callbacks fired before the webhook notification.
#[derive(Default)]
pub struct Hooks {
    pub on_expiring_soon: Option<ExpiringSoonHook>,
    pub on_expired_or_missing: Option<ExpiredHook>,
}

impl Hooks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_expiring_soon(mut self, hook: impl Fn(&CertificateRecord, f64) + 'static) -> Self {
        self.on_expiring_soon = Some(Box::new(hook));
        self
    }

    pub fn on_expired_or_missing(mut self, hook: impl Fn() + 'static) -> Self {
        self.on_expired_or_missing = Some(Box::new(hook));
        self
    }
}

impl std::fmt::Debug for Hooks {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.debug_struct("Hooks")
            .field("on_expiring_soon", &self.on_expiring_soon.is_some())
            .field("on_expired_or_missing", &self.on_expired_or_missing.is_some())
            .finish()
    }
}

/// Looks up the current certificate, classifies it at `now` and fires the
/// matching hook and notification.
pub fn evaluate<D, N>(
    directory: &D,
    notifier: &N,
    config: &AlertConfig,
    hooks: &Hooks,
    now: DateTime<Utc>,
) -> Result<Evaluation>
where
    D: CertificateDirectory + ?Sized,
    N: Notifier + ?Sized,
{
    let certificate = find_current_certificate(directory, config)?;
    let remaining = certificate
        .as_ref()
        .map_or(0.0, |cert| cert.remaining_days(now));

    let evaluation = classify(certificate.as_ref(), remaining, config.active_days_limit);

    match evaluation {
        Evaluation::CertificateExpiringSoon(days) => {
            if let Some(cert) = certificate.as_ref() {
                info!(
                    "The push notification certificate for '{}' is valid for {} days",
                    cert.owner_identifier,
                    days.round()
                );
                warn!(
                    "The push notification certificate is valid for less than the limit of {} days",
                    config.active_days_limit
                );

                if let Some(hook) = &hooks.on_expiring_soon {
                    hook(cert, days);
                }

                if !config.skip_notification {
                    notifier.notify(&expiring_soon_message(days), Some(cert), config)?;
                }
            }
        }
        Evaluation::NoCertificateFound | Evaluation::CertificateExpired => {
            match certificate {
                Some(_) => warn!("The push notification certificate has expired"),
                None => warn!("A push notification certificate cannot be found"),
            }

            if let Some(hook) = &hooks.on_expired_or_missing {
                hook();
            }

            if !config.skip_notification {
                notifier.notify(EXPIRED_OR_MISSING_MESSAGE, certificate.as_ref(), config)?;
            }
        }
        Evaluation::CertificateHealthy(days) => {
            info!(
                "The push notification certificate for '{}' is valid for {} days",
                config.app_identifier,
                days.round()
            );
        }
    }

    Ok(evaluation)
}

/// Builds the directory client once a session is established.
pub type ConnectHttp = fn(Session) -> HttpDirectory;

/// One full run against the remote service: login, lookup, evaluate.
pub struct PushCertAlert<L, N, C = ConnectHttp> {
    login: L,
    notifier: N,
    connect: C,
}

impl<L: Login, N: Notifier> PushCertAlert<L, N> {
    pub fn new(login: L, notifier: N) -> Self {
        PushCertAlert {
            login,
            notifier,
            connect: HttpDirectory::new,
        }
    }
}

impl<L, N, C, D> PushCertAlert<L, N, C>
where
    L: Login,
    N: Notifier,
    C: Fn(Session) -> D,
    D: CertificateDirectory,
{
    pub fn with_directory(login: L, notifier: N, connect: C) -> Self {
        PushCertAlert {
            login,
            notifier,
            connect,
        }
    }

    pub fn run(&self, config: &AlertConfig, hooks: &Hooks) -> Result<Evaluation> {
        let session = self.login.login(
            &config.username,
            config.password.as_deref(),
            config.team_id.as_deref(),
        )?;
        let directory = (self.connect)(session);

        evaluate(&directory, &self.notifier, config, hooks, Utc::now())
    }
}
