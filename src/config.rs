use std::collections::HashMap;
use std::time::Duration;

use regex::Regex;
use reqwest::Url;
use serde::Deserialize;
use thiserror::Error;

/// HTML5 email address production.
const EMAIL_PATTERN: &str = r"^[a-zA-Z0-9.!#$%&'*+/=?^_`{|}~-]+@[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?(?:\.[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?)*$";

pub const MIN_ATTEMPTS: u32 = 1;
pub const MAX_ATTEMPTS: u32 = 10;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid email address: {0}")]
    InvalidEmail(String),
    #[error("invalid number of attempts (min 1, max 10): {0}")]
    InvalidAttempts(u32),
    #[error("service {service}: invalid endpoint {endpoint}: {reason}")]
    InvalidEndpoint {
        service: String,
        endpoint: String,
        reason: String,
    },
    #[error("service {service}: `codes` must list at least one status code")]
    NoCodes { service: String },
    #[error("service {service}: invalid status code {code} (must be within 100-599)")]
    InvalidStatusCode { service: String, code: u16 },
    #[error("service {service}: invalid timeout {timeout:?} (expected e.g. \"500ms\", \"2s\" or \"1m\")")]
    InvalidTimeout { service: String, timeout: String },
}

#[derive(Debug, Deserialize)]
struct RawConfig {
    email: String,
    attempts: u32,
    services: HashMap<String, RawService>,
}

#[derive(Debug, Deserialize)]
struct RawService {
    endpoint: String,
    codes: Vec<u16>,
    timeout: String,
}

/// One monitored endpoint. Immutable after config load.
#[derive(Debug, Clone)]
pub struct Service {
    pub name: String,
    pub endpoint: Url,
    pub codes: Vec<u16>,
    pub timeout: Duration,
}

impl Service {
    /// Whether the given response status counts as healthy.
    pub fn accepts(&self, status: u16) -> bool {
        self.codes.contains(&status)
    }
}

/// The validated service listing plus the common check settings.
#[derive(Debug, Clone)]
pub struct Config {
    pub email: String,
    pub attempts: u32,
    pub services: HashMap<String, Service>,
}

impl Config {
    /// Parses and validates the TOML service listing. Any validation failure
    /// is fatal; the checks never run against a partially valid config.
    pub fn parse(raw: &str) -> Result<Self, ConfigError> {
        let raw: RawConfig = toml::from_str(raw)?;

        let email_pattern = Regex::new(EMAIL_PATTERN).expect("email pattern is a valid regex");
        let email = validate_email(&email_pattern, raw.email)?;

        if !(MIN_ATTEMPTS..=MAX_ATTEMPTS).contains(&raw.attempts) {
            return Err(ConfigError::InvalidAttempts(raw.attempts));
        }

        let mut services = HashMap::with_capacity(raw.services.len());
        for (name, raw_service) in raw.services {
            let service = validate_service(&name, raw_service)?;
            services.insert(name, service);
        }

        Ok(Self {
            email,
            attempts: raw.attempts,
            services,
        })
    }
}

fn validate_email(pattern: &Regex, email: String) -> Result<String, ConfigError> {
    if pattern.is_match(&email) {
        Ok(email)
    } else {
        Err(ConfigError::InvalidEmail(email))
    }
}

fn validate_service(name: &str, raw: RawService) -> Result<Service, ConfigError> {
    let endpoint = Url::parse(&raw.endpoint).map_err(|err| ConfigError::InvalidEndpoint {
        service: name.to_string(),
        endpoint: raw.endpoint.clone(),
        reason: err.to_string(),
    })?;

    if raw.codes.is_empty() {
        return Err(ConfigError::NoCodes {
            service: name.to_string(),
        });
    }
    for &code in &raw.codes {
        if !(100..=599).contains(&code) {
            return Err(ConfigError::InvalidStatusCode {
                service: name.to_string(),
                code,
            });
        }
    }

    let timeout = parse_duration(&raw.timeout)
        .filter(|timeout| !timeout.is_zero())
        .ok_or_else(|| ConfigError::InvalidTimeout {
            service: name.to_string(),
            timeout: raw.timeout.clone(),
        })?;

    Ok(Service {
        name: name.to_string(),
        endpoint,
        codes: raw.codes,
        timeout,
    })
}

/// Parses a duration string like "500ms", "2s" or "1m".
fn parse_duration(s: &str) -> Option<Duration> {
    let s = s.trim();
    if let Some(secs) = s.strip_suffix('s') {
        if let Some(millis) = secs.strip_suffix('m') {
            millis.parse::<u64>().ok().map(Duration::from_millis)
        } else {
            secs.parse::<u64>().ok().map(Duration::from_secs)
        }
    } else if let Some(mins) = s.strip_suffix('m') {
        mins.parse::<u64>().ok().map(|mins| Duration::from_secs(mins * 60))
    } else {
        None
    }
}
