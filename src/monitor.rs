use std::sync::Arc;

use tracing::{error, info};

use crate::config::Config;
use crate::http_client::HttpClient;
use crate::probe::Prober;
use crate::report::{CheckOutcome, Report};
use crate::retry::Retry;

/// Fans one check task out per configured service and gathers the outcomes
/// into a single report.
pub struct HealthMonitor {
    prober: Prober,
}

impl HealthMonitor {
    pub fn new(http_client: Arc<dyn HttpClient>) -> Self {
        Self {
            prober: Prober::new(http_client),
        }
    }

    /// Checks every configured service exactly once, concurrently, and
    /// returns only after all checks have settled. One service exhausting
    /// its retry budget never affects another service's check.
    pub async fn check_all(&self, config: &Config) -> Report {
        let report = Arc::new(Report::new());
        let mut tasks = Vec::with_capacity(config.services.len());

        for service in config.services.values() {
            let service = service.clone();
            let prober = self.prober.clone();
            let report = Arc::clone(&report);
            // Fresh retry state per task; attempt counters must not be
            // shared across services.
            let retry = Retry::new(config.attempts);

            tasks.push(tokio::spawn(async move {
                let outcome = retry
                    .run(
                        service,
                        |service| {
                            let prober = prober.clone();
                            async move { prober.probe(&service).await }
                        },
                        |outcome: &CheckOutcome| !outcome.healthy,
                    )
                    .await;
                info!(
                    service = %outcome.service_name,
                    healthy = outcome.healthy,
                    "check finished"
                );
                report.add(outcome);
            }));
        }

        for task in tasks {
            if let Err(err) = task.await {
                error!("check task failed: {err}");
            }
        }

        Arc::into_inner(report).expect("all check tasks have completed")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Service;
    use crate::http_client::MockHttpClient;
    use reqwest::Url;
    use std::collections::HashMap;
    use std::time::Duration;

    fn service(name: &str, url: &str) -> Service {
        Service {
            name: name.to_string(),
            endpoint: Url::parse(url).unwrap(),
            codes: vec![200],
            timeout: Duration::from_secs(1),
        }
    }

    fn config(attempts: u32, services: Vec<Service>) -> Config {
        Config {
            email: "ops@example.com".to_string(),
            attempts,
            services: services
                .into_iter()
                .map(|service| (service.name.clone(), service))
                .collect(),
        }
    }

    #[tokio::test]
    async fn accounts_for_every_service_exactly_once() {
        let mut client = MockHttpClient::new();
        let mut services = Vec::new();
        for i in 0..5 {
            let url = format!("http://svc-{i}.test/health");
            client = client.with_status(&url, if i % 2 == 0 { 200 } else { 503 });
            services.push(service(&format!("svc-{i}"), &url));
        }

        let monitor = HealthMonitor::new(Arc::new(client));
        let report = monitor.check_all(&config(1, services)).await;

        assert_eq!(report.successful() + report.failed(), 5);
        assert_eq!(report.successful(), 3);
        assert_eq!(report.failed(), 2);
    }

    #[tokio::test]
    async fn mixed_outcomes_show_up_in_the_rendered_report() {
        let client = MockHttpClient::new()
            .with_status("http://good.test/health", 200)
            .with_status("http://bad.test/health", 503);
        let services = vec![
            service("good", "http://good.test/health"),
            service("bad", "http://bad.test/health"),
        ];

        let monitor = HealthMonitor::new(Arc::new(client));
        let report = monitor.check_all(&config(1, services)).await;

        assert_eq!(report.successful(), 1);
        assert_eq!(report.failed(), 1);
        assert!(report.any_unhealthy());

        let rendered = report.render();
        assert!(rendered.contains("SUCCESSFUL: 1"));
        assert!(rendered.contains("FAILED: 1"));
        assert!(rendered.contains("TOTAL: 2"));
        assert!(rendered.contains("GET good -> OK"));
        assert!(rendered.contains("GET bad -> ERROR: got status 503, want one of [200]"));
    }

    #[tokio::test]
    async fn retries_until_the_endpoint_recovers() {
        let url = "http://api.test/health";
        let client = Arc::new(MockHttpClient::new().with_statuses(url, &[500, 500, 200]));

        let monitor = HealthMonitor::new(client.clone());
        let report = monitor.check_all(&config(3, vec![service("api", url)])).await;

        assert_eq!(report.successful(), 1);
        assert_eq!(report.failed(), 0);
        assert_eq!(client.calls(url), 3);
    }

    #[tokio::test]
    async fn reports_the_last_failure_once_attempts_are_exhausted() {
        let url = "http://api.test/health";
        let client = Arc::new(MockHttpClient::new().with_status(url, 500));

        let monitor = HealthMonitor::new(client.clone());
        let report = monitor.check_all(&config(3, vec![service("api", url)])).await;

        assert_eq!(report.failed(), 1);
        assert_eq!(client.calls(url), 3);
        assert!(report
            .render()
            .contains("GET api -> ERROR: got status 500, want one of [200]"));
    }

    #[tokio::test]
    async fn transport_failures_are_absorbed_into_the_report() {
        let url = "http://down.test/health";
        let client = Arc::new(MockHttpClient::new().with_error(url, "connection refused"));

        let monitor = HealthMonitor::new(client.clone());
        let report = monitor.check_all(&config(2, vec![service("down", url)])).await;

        assert_eq!(report.failed(), 1);
        // Transport failures retry like any other unhealthy outcome.
        assert_eq!(client.calls(url), 2);
        assert!(report
            .render()
            .contains("GET down -> ERROR: GET http://down.test/health failed: connection refused"));
    }

    #[tokio::test]
    async fn works_from_a_parsed_config() {
        let raw = r#"
email = "ops@example.com"
attempts = 1

[services.api]
endpoint = "http://api.test/health"
codes = [200]
timeout = "1s"
"#;
        let config = Config::parse(raw).unwrap();
        let client = MockHttpClient::new().with_status("http://api.test/health", 200);

        let monitor = HealthMonitor::new(Arc::new(client));
        let report = monitor.check_all(&config).await;

        assert_eq!(report.successful(), 1);
        assert_eq!(report.failed(), 0);
        assert!(!report.any_unhealthy());
    }

    #[tokio::test]
    async fn empty_service_set_yields_an_empty_report() {
        let monitor = HealthMonitor::new(Arc::new(MockHttpClient::new()));
        let report = monitor.check_all(&config(1, Vec::new())).await;

        assert_eq!(report.total(), 0);
        assert!(!report.any_unhealthy());
    }
}
