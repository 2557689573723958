use std::env;
use std::fs;
use std::sync::Arc;

use anyhow::Context;
use tracing::info;

use service_monitor::{Config, HealthMonitor, ReqwestHttpClient, SmtpMailer};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let path = env::args().nth(1).unwrap_or_else(|| "services.toml".to_string());
    let raw = fs::read_to_string(&path).with_context(|| format!("reading config file {path}"))?;
    let config = Config::parse(&raw).with_context(|| format!("parsing config file {path}"))?;

    info!(
        services = config.services.len(),
        attempts = config.attempts,
        "starting health checks"
    );

    let http_client = Arc::new(ReqwestHttpClient::new().context("building HTTP client")?);
    let monitor = HealthMonitor::new(http_client);
    let report = monitor.check_all(&config).await;

    print!("{}", report.render());

    if report.any_unhealthy() {
        // Mail settings are read only once a notification is actually due;
        // an all-healthy run never needs credentials.
        let mailer = SmtpMailer::from_env().context("configuring SMTP mailer")?;
        report
            .email_if_unhealthy(&mailer, &config.email)
            .await
            .context("emailing report")?;
        info!(to = %config.email, "report emailed");
    } else {
        info!("all services healthy, skipping email");
    }

    Ok(())
}
