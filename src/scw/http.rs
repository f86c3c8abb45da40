//! HTTP utilities for Scaleway REST API calls

use anyhow::{Context, Result};
use reqwest::{Client, Method, RequestBuilder, StatusCode};
use serde_json::Value;

/// Maximum length of response body to log (to avoid logging sensitive data)
const MAX_LOG_BODY_LENGTH: usize = 200;

/// Header carrying the secret key on every Scaleway request
const AUTH_HEADER: &str = "X-Auth-Token";

/// Sanitize response body for logging
/// Truncates long responses and strips control characters
fn sanitize_for_log(body: &str) -> String {
    let truncated = if body.len() > MAX_LOG_BODY_LENGTH {
        let cut = (0..=MAX_LOG_BODY_LENGTH)
            .rev()
            .find(|i| body.is_char_boundary(*i))
            .unwrap_or(0);
        format!("{}... [truncated, {} bytes total]", &body[..cut], body.len())
    } else {
        body.to_string()
    };

    truncated.replace(|c: char| !c.is_ascii_graphic() && c != ' ', "")
}

/// Non-2xx answer from the API
///
/// Kept as a concrete type inside the `anyhow` chain so callers can tell a
/// missing resource apart from any other failure.
#[derive(Debug, Clone, thiserror::Error)]
#[error("API request failed: {status}{}", detail(.message))]
pub struct ApiStatusError {
    pub status: StatusCode,
    pub message: Option<String>,
}

impl ApiStatusError {
    pub fn new(status: StatusCode, message: Option<String>) -> Self {
        Self { status, message }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, Some(message.into()))
    }
}

fn detail(message: &Option<String>) -> String {
    message
        .as_deref()
        .map(|m| format!(" ({})", m))
        .unwrap_or_default()
}

/// True when the error chain carries a 404 from the API
pub fn is_not_found(error: &anyhow::Error) -> bool {
    error
        .chain()
        .filter_map(|e| e.downcast_ref::<ApiStatusError>())
        .any(|e| e.status == StatusCode::NOT_FOUND)
}

/// Extract the `message` field Scaleway puts in error bodies
fn error_message(body: &str) -> Option<String> {
    serde_json::from_str::<Value>(body)
        .ok()?
        .get("message")
        .and_then(|v| v.as_str())
        .map(|s| s.chars().take(MAX_LOG_BODY_LENGTH).collect())
}

/// HTTP client wrapper for Scaleway API calls
#[derive(Clone)]
pub struct ScwHttpClient {
    client: Client,
}

impl ScwHttpClient {
    /// Create a new HTTP client
    pub fn new(user_agent: &str) -> Result<Self> {
        let client = Client::builder()
            .user_agent(user_agent)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self { client })
    }

    /// Make a GET request
    pub async fn get(&self, url: &str, token: &str) -> Result<Value> {
        self.send(Method::GET, url, token, None).await
    }

    /// Make a POST request
    pub async fn post(&self, url: &str, token: &str, body: Option<&Value>) -> Result<Value> {
        self.send(Method::POST, url, token, body).await
    }

    /// Make a PUT request
    pub async fn put(&self, url: &str, token: &str, body: Option<&Value>) -> Result<Value> {
        self.send(Method::PUT, url, token, body).await
    }

    /// Make a PATCH request
    pub async fn patch(&self, url: &str, token: &str, body: Option<&Value>) -> Result<Value> {
        self.send(Method::PATCH, url, token, body).await
    }

    /// Make a DELETE request
    pub async fn delete(&self, url: &str, token: &str) -> Result<Value> {
        self.send(Method::DELETE, url, token, None).await
    }

    async fn send(
        &self,
        method: Method,
        url: &str,
        token: &str,
        body: Option<&Value>,
    ) -> Result<Value> {
        tracing::debug!("{} {}", method, url);

        let mut request: RequestBuilder = self
            .client
            .request(method, url)
            .header(AUTH_HEADER, token);

        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await.context("Failed to send request")?;

        let status = response.status();
        let response_body = response
            .text()
            .await
            .context("Failed to read response body")?;

        if !status.is_success() {
            // Only the sanitized/truncated body is logged
            tracing::error!("API error: {} - {}", status, sanitize_for_log(&response_body));
            return Err(ApiStatusError::new(status, error_message(&response_body)).into());
        }

        // DELETE and some PUTs answer 204
        if response_body.is_empty() {
            return Ok(Value::Null);
        }

        serde_json::from_str(&response_body).context("Failed to parse response JSON")
    }
}

/// Format a Scaleway API error for display
pub fn format_scw_error(error: &anyhow::Error) -> String {
    if let Some(api) = error
        .chain()
        .find_map(|e| e.downcast_ref::<ApiStatusError>())
    {
        return match api.status.as_u16() {
            401 => "Authentication failed. Check SCW_SECRET_KEY.".to_string(),
            403 => "Permission denied. Check your IAM policies.".to_string(),
            404 => "Resource not found.".to_string(),
            409 => "Resource conflict. The resource may already exist or be in use.".to_string(),
            429 => "Rate limit exceeded. Please try again later.".to_string(),
            400 => match &api.message {
                Some(message) => format!("Invalid request: {}", message),
                None => "Invalid request. Check your parameters.".to_string(),
            },
            500..=599 => "Scaleway service temporarily unavailable. Please try again.".to_string(),
            _ => format!("Request failed with status {}.", api.status),
        };
    }

    let error_str = format!("{:#}", error);
    let sanitized = error_str
        .chars()
        .filter(|c| c.is_ascii_graphic() || *c == ' ')
        .take(80)
        .collect::<String>();

    if sanitized.len() < error_str.len() {
        format!("{}...", sanitized)
    } else {
        sanitized
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_truncates_long_bodies() {
        let body = "x".repeat(500);
        let sanitized = sanitize_for_log(&body);
        assert!(sanitized.starts_with(&"x".repeat(MAX_LOG_BODY_LENGTH)));
        assert!(sanitized.contains("500 bytes total"));
    }

    #[test]
    fn test_error_message_reads_scaleway_body() {
        let body = r#"{"message":"resource is not found","type":"not_found"}"#;
        assert_eq!(error_message(body).as_deref(), Some("resource is not found"));
        assert_eq!(error_message("not json"), None);
    }

    #[test]
    fn test_is_not_found_walks_context_chain() {
        let err = anyhow::Error::new(ApiStatusError::not_found("gone")).context("get instance");
        assert!(is_not_found(&err));

        let err = anyhow::Error::new(ApiStatusError::new(StatusCode::CONFLICT, None));
        assert!(!is_not_found(&err));
    }

    #[test]
    fn test_format_scw_error_maps_statuses() {
        let err = anyhow::Error::new(ApiStatusError::new(StatusCode::FORBIDDEN, None));
        assert_eq!(format_scw_error(&err), "Permission denied. Check your IAM policies.");

        let err = anyhow::anyhow!("connection reset");
        assert_eq!(format_scw_error(&err), "connection reset");
    }
}
