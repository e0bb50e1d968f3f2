//! HTTP helpers for JSON APIs with consistent timeouts and error handling. The
//! auth service client builds on these to avoid duplicating request setup and
//! to surface server errors the same way everywhere. The helpers never store
//! tokens; callers attach them per request.

use crate::{errors::AppError, APP_USER_AGENT};
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;
use url::Url;

/// Maximum number of error body characters surfaced to the caller.
const MAX_ERROR_CHARS: usize = 200;
/// Message used when a failed response carries no body.
pub const GENERIC_HTTP_ERROR: &str = "Request failed.";

/// Builds a client with the crate user agent and a total request timeout.
///
/// # Errors
/// Returns `AppError::Config` if the TLS backend cannot be initialized.
pub fn build_client(timeout: Duration) -> Result<Client, AppError> {
    Client::builder()
        .user_agent(APP_USER_AGENT)
        .timeout(timeout)
        .build()
        .map_err(|err| AppError::Config(format!("Failed to initialize HTTP client: {err}")))
}

/// Joins a path onto the base URL, keeping any path prefix the base carries
/// (`https://host/api` + `/auth/me` = `https://host/api/auth/me`).
///
/// # Errors
/// Returns `AppError::Config` if the joined URL does not parse.
pub fn build_url(base: &Url, path: &str) -> Result<Url, AppError> {
    let base = base.as_str().trim().trim_end_matches('/');
    let path = path.trim().trim_start_matches('/');
    let joined = if path.is_empty() {
        base.to_string()
    } else {
        format!("{base}/{path}")
    };
    Url::parse(&joined).map_err(|err| AppError::Config(format!("Invalid request URL: {err}")))
}

/// Maps transport failures into `AppError` variants with timeout detection.
#[must_use]
pub fn map_request_error(err: &reqwest::Error) -> AppError {
    if err.is_timeout() {
        AppError::Timeout("Request timed out. Please try again.".to_string())
    } else if err.is_decode() {
        AppError::Parse(format!("Failed to decode response: {err}"))
    } else if err.is_builder() {
        AppError::Serialization(format!("Failed to build request: {err}"))
    } else {
        AppError::Network(format!("Unable to reach the server: {err}"))
    }
}

/// Parses a JSON body from a successful response, or turns the failure into
/// `AppError::Http` with the server's message.
///
/// # Errors
/// Returns `AppError::Http` for non-2xx statuses and `AppError::Parse` when the
/// body does not decode.
pub async fn handle_json_response<T: DeserializeOwned>(response: Response) -> Result<T, AppError> {
    if response.status().is_success() {
        let body = response
            .text()
            .await
            .map_err(|err| map_request_error(&err))?;
        serde_json::from_str(&body)
            .map_err(|err| AppError::Parse(format!("Failed to decode response: {err}")))
    } else {
        Err(http_error(response).await)
    }
}

/// Consumes a failed response into `AppError::Http`.
pub async fn http_error(response: Response) -> AppError {
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    AppError::Http {
        status,
        message: error_message(&body),
    }
}

/// Prefers the `message` (or `error`) field of a JSON error body, falling back
/// to the sanitized raw body.
#[must_use]
pub fn error_message(body: &str) -> String {
    extract_message(body).unwrap_or_else(|| sanitize_body(body))
}

fn extract_message(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    ["message", "error"]
        .iter()
        .filter_map(|key| value.get(key).and_then(Value::as_str))
        .map(str::trim)
        .find(|message| !message.is_empty())
        .map(|message| message.chars().take(MAX_ERROR_CHARS).collect())
}

/// Sanitizes error bodies for user-facing messages by trimming and truncating.
fn sanitize_body(body: &str) -> String {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        GENERIC_HTTP_ERROR.to_string()
    } else {
        trimmed.chars().take(MAX_ERROR_CHARS).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_url_keeps_base_path() {
        let base = Url::parse("https://api.aula.dev/api/").unwrap();
        let url = build_url(&base, "/auth/me").unwrap();
        assert_eq!(url.as_str(), "https://api.aula.dev/api/auth/me");
    }

    #[test]
    fn build_url_without_base_path() {
        let base = Url::parse("http://localhost:5000").unwrap();
        let url = build_url(&base, "auth/login").unwrap();
        assert_eq!(url.as_str(), "http://localhost:5000/auth/login");
    }

    #[test]
    fn error_message_prefers_json_message() {
        assert_eq!(
            error_message(r#"{"message":"Invalid credentials"}"#),
            "Invalid credentials"
        );
        assert_eq!(error_message(r#"{"error":"Forbidden"}"#), "Forbidden");
    }

    #[test]
    fn error_message_falls_back_to_body() {
        assert_eq!(error_message("  Bad Gateway \n"), "Bad Gateway");
        assert_eq!(error_message(""), "Request failed.");
        assert_eq!(error_message(r#"{"message":""}"#), r#"{"message":""}"#);
    }

    #[test]
    fn error_message_is_truncated() {
        let body = "x".repeat(500);
        assert_eq!(error_message(&body).len(), MAX_ERROR_CHARS);
    }
}
