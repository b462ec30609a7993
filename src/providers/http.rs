use anyhow::{Context, Result, anyhow};
use reqwest::Client;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, error};

/// Builds the client shared by all rate sources.
pub fn build_client(timeout: Duration) -> Result<Client> {
    Client::builder()
        .user_agent("ratewatch/0.1")
        .timeout(timeout)
        .build()
        .context("Failed to build HTTP client")
}

/// GETs `url` and decodes the JSON body into `T`.
///
/// Transport errors, non-2xx statuses, empty bodies and undecodable bodies are
/// all reported as errors.
pub async fn fetch_json<T: DeserializeOwned>(client: &Client, url: &str) -> Result<T> {
    debug!("Requesting rates from {}", url);

    let response = client
        .get(url)
        .send()
        .await
        .with_context(|| format!("Request failed for URL: {url}"))?
        .error_for_status()
        .with_context(|| format!("Unexpected response status for URL: {url}"))?;

    let response_text = response
        .text()
        .await
        .with_context(|| format!("Failed to get response text for URL: {url}"))?;

    if response_text.trim().is_empty() {
        return Err(anyhow!("Received empty response from {}", url));
    }

    match serde_json::from_str(&response_text) {
        Ok(data) => Ok(data),
        Err(e) => {
            error!(
                error = ?e,
                response = %response_text,
                "Failed to parse rates response"
            );
            Err(e).with_context(|| format!("Failed to parse response from {url}"))
        }
    }
}
