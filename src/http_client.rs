use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[async_trait]
pub trait HttpClient: Send + Sync {
    /// Performs a GET against `url` and returns the response status code.
    async fn get(&self, url: &str, timeout: Duration) -> Result<u16, BoxError>;
}

pub struct ReqwestHttpClient {
    client: reqwest::Client,
}

impl ReqwestHttpClient {
    /// The client is shared across all checks; the timeout is applied per
    /// request, since every service carries its own.
    pub fn new() -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl HttpClient for ReqwestHttpClient {
    async fn get(&self, url: &str, timeout: Duration) -> Result<u16, BoxError> {
        let response = self.client.get(url).timeout(timeout).send().await?;
        Ok(response.status().as_u16())
    }
}

enum MockReply {
    Status(u16),
    Error(String),
}

struct Script {
    replies: Vec<MockReply>,
    calls: usize,
}

/// Scripted HTTP client for tests and benches. Each configured URL replays
/// its replies in order, repeating the last one once exhausted; unknown URLs
/// answer 404.
#[derive(Default)]
pub struct MockHttpClient {
    scripts: Mutex<HashMap<String, Script>>,
}

impl MockHttpClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_status(self, url: &str, status: u16) -> Self {
        self.push(url, MockReply::Status(status));
        self
    }

    pub fn with_statuses(self, url: &str, statuses: &[u16]) -> Self {
        for &status in statuses {
            self.push(url, MockReply::Status(status));
        }
        self
    }

    pub fn with_error(self, url: &str, message: &str) -> Self {
        self.push(url, MockReply::Error(message.to_string()));
        self
    }

    fn push(&self, url: &str, reply: MockReply) {
        self.scripts
            .lock()
            .unwrap()
            .entry(url.to_string())
            .or_insert_with(|| Script {
                replies: Vec::new(),
                calls: 0,
            })
            .replies
            .push(reply);
    }

    /// How many times the given URL has been requested.
    pub fn calls(&self, url: &str) -> usize {
        self.scripts
            .lock()
            .unwrap()
            .get(url)
            .map_or(0, |script| script.calls)
    }
}

#[async_trait]
impl HttpClient for MockHttpClient {
    async fn get(&self, url: &str, _timeout: Duration) -> Result<u16, BoxError> {
        let mut scripts = self.scripts.lock().unwrap();
        let Some(script) = scripts.get_mut(url) else {
            return Ok(404);
        };
        let index = script.calls.min(script.replies.len() - 1);
        script.calls += 1;
        match &script.replies[index] {
            MockReply::Status(status) => Ok(*status),
            MockReply::Error(message) => Err(message.clone().into()),
        }
    }
}
