use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
    config::{AlertConfig, CertificateKind},
    directory::{CertificateDirectory, LookupError},
};

const SECONDS_PER_DAY: f64 = 86_400.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CertificateRecord {
    pub owner_identifier: String,
    pub expires_at: DateTime<Utc>,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: CertificateKind,
}

impl CertificateRecord {
    /// Days until `expires_at`, rounded to two decimals. Negative once expired.
    pub fn remaining_days(&self, now: DateTime<Utc>) -> f64 {
        remaining_days(self, now)
    }
}

pub fn remaining_days(record: &CertificateRecord, now: DateTime<Utc>) -> f64 {
    let seconds = (record.expires_at - now).num_milliseconds() as f64 / 1000.0;
    (seconds / SECONDS_PER_DAY * 100.0).round() / 100.0
}

/// Returns the latest-expiring certificate issued for `config.app_identifier`
/// in the pool selected by `config.kind`.
pub fn find_current_certificate<D>(
    directory: &D,
    config: &AlertConfig,
) -> Result<Option<CertificateRecord>, LookupError>
where
    D: CertificateDirectory + ?Sized,
{
    let mut certificates = directory.list(config.kind)?;
    debug!(
        count = certificates.len(),
        pool = config.kind.pool(),
        "Listed push certificates"
    );

    certificates.sort_by(|a, b| b.expires_at.cmp(&a.expires_at));

    Ok(certificates
        .into_iter()
        .find(|c| c.owner_identifier == config.app_identifier))
}
