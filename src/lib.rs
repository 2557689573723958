pub mod config;
pub mod http_client;
pub mod mailer;
pub mod monitor;
pub mod probe;
pub mod report;
pub mod retry;
pub mod secret;

pub use config::{Config, ConfigError, Service};
pub use http_client::{HttpClient, MockHttpClient, ReqwestHttpClient};
pub use mailer::{MailError, Mailer, MailerConfig, MockMailer, SmtpMailer};
pub use monitor::HealthMonitor;
pub use probe::{ProbeError, Prober};
pub use report::{CheckOutcome, Report};
pub use retry::Retry;
pub use secret::Secret;
