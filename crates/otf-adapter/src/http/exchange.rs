/*
[INPUT]:  reqwest requests/responses, or their parts
[OUTPUT]: RequestSnapshot / ResponseSnapshot values
[POS]:    HTTP layer - exchange snapshots carried by RequestError
[UPDATE]: When more response metadata is needed for diagnosis
*/

use reqwest::header::HeaderMap;
use reqwest::{Method, StatusCode};
use url::Url;

/// Headers worth keeping when a response is captured for diagnosis.
const CAPTURED_HEADERS: &[&str] = &["content-type", "retry-after", "x-request-id"];

/// The request that was attempted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestSnapshot {
    pub method: Method,
    pub url: Url,
}

impl RequestSnapshot {
    pub fn new(method: Method, url: Url) -> Self {
        Self { method, url }
    }

    /// Snapshot a built (not yet sent) reqwest request.
    pub fn from_request(request: &reqwest::Request) -> Self {
        Self {
            method: request.method().clone(),
            url: request.url().clone(),
        }
    }
}

/// The response received, with the body already read into memory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseSnapshot {
    pub status: StatusCode,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl ResponseSnapshot {
    pub fn new(status: StatusCode, body: impl Into<String>) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: body.into(),
        }
    }

    /// Consume a response, keeping its status, a few headers and the body text.
    ///
    /// A body that cannot be read is recorded as empty; the status alone is
    /// still enough to classify the failure.
    pub async fn capture(response: reqwest::Response) -> Self {
        let status = response.status();
        let headers = captured_headers(response.headers());
        let body = match response.text().await {
            Ok(body) => body,
            Err(err) => {
                tracing::debug!(%status, error = %err, "failed to read response body");
                String::new()
            }
        };

        Self {
            status,
            headers,
            body,
        }
    }

    /// Look up a captured header by case-insensitive name.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// `Retry-After` in seconds, when the server sent the delta-seconds form.
    pub fn retry_after(&self) -> Option<u64> {
        self.header("retry-after")
            .and_then(|value| value.trim().parse().ok())
    }
}

fn captured_headers(headers: &HeaderMap) -> Vec<(String, String)> {
    CAPTURED_HEADERS
        .iter()
        .filter_map(|name| {
            let value = headers.get(*name)?.to_str().ok()?;
            Some((name.to_string(), value.to_string()))
        })
        .collect()
}
