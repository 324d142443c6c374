//! Request plumbing shared by the HTTP backends.

use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use std::time::Duration;
use testbench_core::{Result, TestbenchError};
use tracing::debug;

/// Longest response body kept in an error message.
const MAX_ERROR_BODY: usize = 2_000;

pub fn build_client(timeout: Duration) -> Result<Client> {
    Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| TestbenchError::internal(format!("Failed to build HTTP client: {e}")))
}

/// Sends `request` and decodes a JSON body.
///
/// Non-2xx statuses become [`TestbenchError::Http`] carrying the body,
/// client timeouts become [`TestbenchError::Timeout`].
pub async fn send_json<T: DeserializeOwned>(request: RequestBuilder, backend: &str) -> Result<T> {
    let response = request
        .send()
        .await
        .map_err(|e| transport_error(e, backend))?;

    let status = response.status();
    debug!(backend, status = status.as_u16(), "Received response");

    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(TestbenchError::http(status.as_u16(), truncate(body)));
    }

    response.json::<T>().await.map_err(|e| {
        if e.is_timeout() {
            TestbenchError::timeout(format!("{backend} response body"))
        } else {
            TestbenchError::generator(format!("{backend} returned malformed JSON: {e}"))
        }
    })
}

fn transport_error(error: reqwest::Error, backend: &str) -> TestbenchError {
    if error.is_timeout() {
        TestbenchError::timeout(format!("{backend} request"))
    } else {
        TestbenchError::generator(format!("{backend} request failed: {error}"))
    }
}

fn truncate(mut body: String) -> String {
    if body.len() > MAX_ERROR_BODY {
        let mut end = MAX_ERROR_BODY;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        body.truncate(end);
        body.push_str("...[truncated]");
    }
    body
}

/// Rejects blank generated text.
pub fn non_empty(text: Option<String>) -> Result<String> {
    match text {
        Some(text) if !text.trim().is_empty() => Ok(text),
        _ => Err(TestbenchError::generator("empty response")),
    }
}

/// Joins a base URL and a path without doubling the slash.
pub fn endpoint(base_url: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base_url.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}
