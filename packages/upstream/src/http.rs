//! Shared request/response handling for the provider clients.
//!
//! Every client goes through [`send_json`] instead of calling
//! `reqwest::RequestBuilder::send()` directly, so status checks, body
//! decoding and error logging behave the same for all providers.

use std::time::Duration;

use serde::de::DeserializeOwned;

use crate::{ConfigError, USER_AGENT, UpstreamError};

/// Maximum length of the response body preview included in error logs.
const BODY_PREVIEW_LEN: usize = 500;

/// Builds a `reqwest` client with the crate's `User-Agent` and an
/// optional overall request timeout.
///
/// # Errors
///
/// Returns [`ConfigError::Client`] if the TLS backend cannot be
/// initialised.
pub fn build_client(timeout: Option<Duration>) -> Result<reqwest::Client, ConfigError> {
    let mut builder = reqwest::Client::builder().user_agent(USER_AGENT);
    if let Some(timeout) = timeout {
        builder = builder.timeout(timeout);
    }
    Ok(builder.build()?)
}

/// Sends a request and decodes the response body as JSON.
///
/// The body is read as text first so that decode failures can log what
/// was actually received (Overpass, for instance, answers overload errors
/// with an HTML page and a 200).
///
/// # Errors
///
/// * [`UpstreamError::Http`] on transport failure.
/// * [`UpstreamError::Status`] on any non-2xx status.
/// * [`UpstreamError::Parse`] if the body is not the expected JSON.
pub async fn send_json<T: DeserializeOwned>(
    service: &'static str,
    request: reqwest::RequestBuilder,
) -> Result<T, UpstreamError> {
    let response = request.send().await?;
    let status = response.status();
    let url = response.url().to_string();
    let text = response.text().await?;

    if !status.is_success() {
        let message = error_message(&text)
            .unwrap_or_else(|| format!("upstream returned status {}", status.as_u16()));
        log::warn!("{service} request failed: status={status} url={url} message={message}");
        return Err(UpstreamError::Status {
            service,
            status: status.as_u16(),
            message,
        });
    }

    decode(service, &text)
}

/// Decodes a successful response body, logging a preview on failure.
///
/// # Errors
///
/// Returns [`UpstreamError::Parse`] if `text` is not valid JSON for `T`.
pub fn decode<T: DeserializeOwned>(service: &'static str, text: &str) -> Result<T, UpstreamError> {
    serde_json::from_str(text).map_err(|e| {
        log::error!(
            "{service} JSON parse failed: {e}\n  \
             received: {} bytes\n  \
             body preview: {}",
            text.len(),
            preview(text),
        );
        UpstreamError::Parse {
            service,
            message: e.to_string(),
        }
    })
}

/// Pulls a human-readable message out of a provider error body.
///
/// Understands `{"error": {"message": "..."}}`, `{"error": "..."}` and
/// `{"message": "..."}`.
fn error_message(text: &str) -> Option<String> {
    let body: serde_json::Value = serde_json::from_str(text).ok()?;
    let candidate = match &body["error"] {
        serde_json::Value::String(s) => Some(s.as_str()),
        serde_json::Value::Object(obj) => obj.get("message").and_then(|m| m.as_str()),
        _ => body["message"].as_str(),
    };
    candidate.filter(|s| !s.is_empty()).map(String::from)
}

fn preview(text: &str) -> &str {
    if text.len() <= BODY_PREVIEW_LEN {
        return text;
    }
    let mut end = BODY_PREVIEW_LEN;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    &text[..end]
}
