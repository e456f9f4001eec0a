use std::cell::RefCell;

use thiserror::Error;
use tracing::info;

use crate::{certificate::CertificateRecord, config::CertificateKind, session::Session};

#[derive(Debug, Error)]
pub enum LookupError {
    #[error("Request error: {0}")]
    Request(#[from] reqwest::Error),
    #[error("Certificate listing failed: {status:?}, {body:?}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },
    #[error("Json error: {0}")]
    Json(#[from] serde_json::Error),
}

type DirectoryResult<T> = std::result::Result<T, LookupError>;

/// Remote listing of push certificates, one pool at a time.
pub trait CertificateDirectory {
    fn list(&self, kind: CertificateKind) -> DirectoryResult<Vec<CertificateRecord>>;
}

impl<D: CertificateDirectory + ?Sized> CertificateDirectory for &D {
    fn list(&self, kind: CertificateKind) -> DirectoryResult<Vec<CertificateRecord>> {
        (**self).list(kind)
    }
}

pub struct HttpDirectory {
    session: Session,
}

impl HttpDirectory {
    pub fn new(session: Session) -> Self {
        HttpDirectory { session }
    }
}

impl CertificateDirectory for HttpDirectory {
    fn list(&self, kind: CertificateKind) -> DirectoryResult<Vec<CertificateRecord>> {
        info!("Attempting to fetch an existing push certificate");

        let response = self
            .session
            .client
            .get(self.session.endpoint("certificates"))
            .query(&[("type", kind.pool())])
            .bearer_auth(&self.session.token)
            .send()?;

        if !response.status().is_success() {
            return Err(LookupError::Status {
                status: response.status(),
                body: response.text()?,
            });
        }

        let body = response.bytes()?;
        Ok(serde_json::from_slice(&body)?)
    }
}

/// In-memory directory that remembers which pools were asked for.
#[derive(Debug, Default)]
pub struct MockDirectory {
    certificates: Vec<CertificateRecord>,
    requested: RefCell<Vec<CertificateKind>>,
}

impl MockDirectory {
    pub fn new(certificates: Vec<CertificateRecord>) -> Self {
        MockDirectory {
            certificates,
            requested: RefCell::new(Vec::new()),
        }
    }

    pub fn requested(&self) -> Vec<CertificateKind> {
        self.requested.borrow().clone()
    }
}

impl CertificateDirectory for MockDirectory {
    fn list(&self, kind: CertificateKind) -> DirectoryResult<Vec<CertificateRecord>> {
        self.requested.borrow_mut().push(kind);
        Ok(self.certificates.clone())
    }
}
