//! Shared HTTP client for the collectors.

use std::time::Duration;

use reqwest::{Client, Response};
use serde::de::DeserializeOwned;

use crate::error::ScraperError;

const HTML_ACCEPT: &str = "text/html,application/xhtml+xml;q=0.9,*/*;q=0.8";

/// HTTP client with a fixed per-request timeout and a politeness delay.
///
/// Non-2xx responses are surfaced as typed errors and never retried; callers
/// decide whether a failure ends their page loop.
pub struct ScraperClient {
    client: Client,
    inter_request_delay: Duration,
}

impl ScraperClient {
    /// Creates a `ScraperClient` with the given timeout, `User-Agent` and
    /// delay between consecutive requests.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn new(
        timeout_secs: u64,
        user_agent: &str,
        inter_request_delay_ms: u64,
    ) -> Result<Self, ScraperError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(user_agent)
            .build()?;
        Ok(Self {
            client,
            inter_request_delay: Duration::from_millis(inter_request_delay_ms),
        })
    }

    /// Builds the client from the process configuration.
    ///
    /// # Errors
    ///
    /// See [`ScraperClient::new`].
    pub fn from_app_config(config: &cgintel_core::AppConfig) -> Result<Self, ScraperError> {
        Self::new(
            config.scraper_request_timeout_secs,
            &config.scraper_user_agent,
            config.scraper_inter_request_delay_ms,
        )
    }

    /// Sleeps for the configured politeness delay.
    pub async fn pause(&self) {
        if !self.inter_request_delay.is_zero() {
            tokio::time::sleep(self.inter_request_delay).await;
        }
    }

    /// Fetches `url` and decodes the body as JSON.
    ///
    /// # Errors
    ///
    /// - [`ScraperError::RateLimited`] on HTTP 429.
    /// - [`ScraperError::NotFound`] on HTTP 404.
    /// - [`ScraperError::UnexpectedStatus`] on any other non-2xx status.
    /// - [`ScraperError::Http`] on network or TLS failure.
    /// - [`ScraperError::Deserialize`] if the body is not the expected JSON.
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        context: &str,
    ) -> Result<T, ScraperError> {
        let response = self.send(url, "application/json").await?;
        let body = response.text().await?;
        serde_json::from_str::<T>(&body).map_err(|e| ScraperError::Deserialize {
            context: context.to_owned(),
            source: e,
        })
    }

    /// Fetches `url` and returns the body as text.
    ///
    /// # Errors
    ///
    /// Same status mapping as [`ScraperClient::get_json`].
    pub async fn get_html(&self, url: &str) -> Result<String, ScraperError> {
        let response = self.send(url, HTML_ACCEPT).await?;
        Ok(response.text().await?)
    }

    async fn send(&self, url: &str, accept: &str) -> Result<Response, ScraperError> {
        let response = self
            .client
            .get(url)
            .header(reqwest::header::ACCEPT, accept)
            .header(reqwest::header::ACCEPT_LANGUAGE, "de-DE,de;q=0.9,en;q=0.8")
            .send()
            .await?;
        let status = response.status();

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(ScraperError::RateLimited {
                url: url.to_owned(),
            });
        }

        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(ScraperError::NotFound {
                url: url.to_owned(),
            });
        }

        if !status.is_success() {
            return Err(ScraperError::UnexpectedStatus {
                status: status.as_u16(),
                url: url.to_owned(),
            });
        }

        Ok(response)
    }
}

/// Joins `base` and `path` and appends the query pairs, percent-encoding
/// values.
///
/// # Errors
///
/// Returns [`ScraperError::InvalidUrl`] if `base` is not an absolute URL.
pub fn build_url(base: &str, path: &str, query: &[(&str, &str)]) -> Result<String, ScraperError> {
    let joined = format!("{}{}", base.trim_end_matches('/'), path);
    let mut url = reqwest::Url::parse(&joined).map_err(|e| ScraperError::InvalidUrl {
        url: joined.clone(),
        reason: e.to_string(),
    })?;

    if !query.is_empty() {
        let mut pairs = url.query_pairs_mut();
        for (key, value) in query {
            pairs.append_pair(key, value);
        }
    }

    Ok(url.to_string())
}

#[cfg(test)]
#[path = "../client_test.rs"]
mod tests;
