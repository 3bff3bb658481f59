use crate::config::ScraperConfig;
use crate::error::Result;
use std::time::Duration;
use tracing::debug;
use url::Url;

/// Shared HTTP session. `reqwest::Client` pools connections internally and is
/// cheap to clone, so one instance serves every concurrent fetch in a run.
#[derive(Clone)]
pub struct HttpClient {
    inner: reqwest::Client,
}

impl HttpClient {
    pub fn new(config: &ScraperConfig) -> Result<Self> {
        let inner = reqwest::Client::builder()
            .user_agent(&config.user_agent)
            .timeout(Duration::from_secs(config.timeout_secs))
            .gzip(true)
            // Accept cookies so session-based pages work
            .cookie_store(true)
            .build()?;

        Ok(Self { inner })
    }

    /// Fetch a URL as text. Non-2xx statuses are transport errors; there is
    /// no retry.
    pub async fn get_text(&self, url: &Url) -> Result<String> {
        debug!("GET {}", url);

        let text = self
            .inner
            .get(url.clone())
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;

        Ok(text)
    }
}
