pub mod alert;
pub mod certificate;
pub mod config;
pub mod directory;
pub mod session;
pub mod slack;

pub use alert::{evaluate, AlertError, Evaluation, Hooks, PushCertAlert};
pub use certificate::CertificateRecord;
pub use config::{AlertConfig, AlertConfigBuilder, CertificateKind};
