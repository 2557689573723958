use std::sync::Arc;

use thiserror::Error;

use crate::config::Service;
use crate::http_client::{BoxError, HttpClient};
use crate::report::CheckOutcome;

/// Why a check came back unhealthy.
#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("GET {url} failed: {source}")]
    Transport { url: String, source: BoxError },
    #[error("got status {got}, want one of {want:?}")]
    UnexpectedStatus { got: u16, want: Vec<u16> },
}

/// Checks the health of one service with a single HTTP GET. Retrying is the
/// caller's business.
#[derive(Clone)]
pub struct Prober {
    http_client: Arc<dyn HttpClient>,
}

impl Prober {
    pub fn new(http_client: Arc<dyn HttpClient>) -> Self {
        Self { http_client }
    }

    pub async fn probe(&self, service: &Service) -> CheckOutcome {
        let url = service.endpoint.as_str();
        match self.http_client.get(url, service.timeout).await {
            Ok(status) if service.accepts(status) => CheckOutcome::healthy(&service.name),
            Ok(status) => CheckOutcome::unhealthy(
                &service.name,
                ProbeError::UnexpectedStatus {
                    got: status,
                    want: service.codes.clone(),
                },
            ),
            Err(source) => CheckOutcome::unhealthy(
                &service.name,
                ProbeError::Transport {
                    url: url.to_string(),
                    source,
                },
            ),
        }
    }
}
