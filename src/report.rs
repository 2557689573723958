use std::fmt::Write as _;
use std::sync::{Mutex, MutexGuard};

use tracing::info;

use crate::mailer::{MailError, Mailer};
use crate::probe::ProbeError;

pub const REPORT_SUBJECT: &str = "Service health report";

/// Verdict for one service once its retry budget is settled.
#[derive(Debug)]
pub struct CheckOutcome {
    pub service_name: String,
    pub healthy: bool,
    pub error: Option<ProbeError>,
}

impl CheckOutcome {
    pub fn healthy(service_name: impl Into<String>) -> Self {
        Self {
            service_name: service_name.into(),
            healthy: true,
            error: None,
        }
    }

    pub fn unhealthy(service_name: impl Into<String>, error: ProbeError) -> Self {
        Self {
            service_name: service_name.into(),
            healthy: false,
            error: Some(error),
        }
    }
}

#[derive(Debug, Default)]
struct Entries {
    outcomes: Vec<CheckOutcome>,
    successful: usize,
    failed: usize,
}

/// Run-scoped aggregate of check outcomes, shared by all check tasks during
/// a run. The entry list and both counters move together under one lock, so
/// `successful + failed` always equals the number of entries.
#[derive(Debug, Default)]
pub struct Report {
    inner: Mutex<Entries>,
}

impl Report {
    pub fn new() -> Self {
        Self::default()
    }

    fn inner(&self) -> MutexGuard<'_, Entries> {
        self.inner.lock().expect("report lock poisoned")
    }

    /// Records one outcome. Safe under concurrent calls from check tasks.
    pub fn add(&self, outcome: CheckOutcome) {
        let mut inner = self.inner();
        if outcome.healthy {
            inner.successful += 1;
        } else {
            inner.failed += 1;
        }
        inner.outcomes.push(outcome);
    }

    pub fn successful(&self) -> usize {
        self.inner().successful
    }

    pub fn failed(&self) -> usize {
        self.inner().failed
    }

    pub fn total(&self) -> usize {
        let inner = self.inner();
        inner.successful + inner.failed
    }

    /// Whether any recorded outcome is unhealthy.
    pub fn any_unhealthy(&self) -> bool {
        self.inner().outcomes.iter().any(|outcome| !outcome.healthy)
    }

    /// Renders the textual summary. Entries appear in insertion order, which
    /// is whatever order the check tasks finished in.
    pub fn render(&self) -> String {
        let inner = self.inner();
        let mut out = String::new();
        let _ = writeln!(out, "SUCCESSFUL: {}", inner.successful);
        let _ = writeln!(out, "FAILED: {}", inner.failed);
        let _ = writeln!(out, "TOTAL: {}", inner.successful + inner.failed);
        let _ = writeln!(out);
        for outcome in &inner.outcomes {
            if outcome.healthy {
                let _ = writeln!(out, "GET {} -> OK", outcome.service_name);
            } else {
                let reason = outcome
                    .error
                    .as_ref()
                    .map(ToString::to_string)
                    .unwrap_or_else(|| "unhealthy".to_string());
                let _ = writeln!(out, "GET {} -> ERROR: {}", outcome.service_name, reason);
            }
        }
        out
    }

    /// Hands the rendered report to the mailer when at least one service is
    /// unhealthy. Returns whether a mail went out.
    pub async fn email_if_unhealthy(
        &self,
        mailer: &dyn Mailer,
        to: &str,
    ) -> Result<bool, MailError> {
        if !self.any_unhealthy() {
            info!("all services healthy, skipping email");
            return Ok(false);
        }
        mailer.send(to, REPORT_SUBJECT, &self.render()).await?;
        Ok(true)
    }
}
