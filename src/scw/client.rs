//! Scaleway Client
//!
//! Main client for interacting with Scaleway APIs, combining the secret key
//! and HTTP functionality.

use super::http::ScwHttpClient;
use super::region::Region;
use anyhow::{Context, Result};
use serde_json::Value;
use url::Url;

/// Public API endpoint
pub const DEFAULT_API_URL: &str = "https://api.scaleway.com";

/// Main Scaleway client
#[derive(Clone)]
pub struct ScwClient {
    pub http: ScwHttpClient,
    secret_key: String,
    api_url: Url,
}

impl std::fmt::Debug for ScwClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Secret key stays out of logs
        f.debug_struct("ScwClient")
            .field("api_url", &self.api_url.as_str())
            .finish_non_exhaustive()
    }
}

impl ScwClient {
    /// Create a new Scaleway client
    pub fn new(secret_key: &str, api_url: &str, user_agent: &str) -> Result<Self> {
        let api_url = Url::parse(api_url)
            .with_context(|| format!("Invalid API URL: {}", api_url))?;
        if api_url.cannot_be_a_base() {
            return Err(anyhow::anyhow!("API URL cannot be a base: {}", api_url));
        }

        let http = ScwHttpClient::new(user_agent)?;

        Ok(Self {
            http,
            secret_key: secret_key.to_string(),
            api_url,
        })
    }

    /// Make a GET request to a Scaleway API
    pub async fn get(&self, url: &str) -> Result<Value> {
        self.http.get(url, &self.secret_key).await
    }

    /// Make a POST request to a Scaleway API
    pub async fn post(&self, url: &str, body: Option<&Value>) -> Result<Value> {
        self.http.post(url, &self.secret_key, body).await
    }

    /// Make a PUT request to a Scaleway API
    pub async fn put(&self, url: &str, body: Option<&Value>) -> Result<Value> {
        self.http.put(url, &self.secret_key, body).await
    }

    /// Make a PATCH request to a Scaleway API
    pub async fn patch(&self, url: &str, body: Option<&Value>) -> Result<Value> {
        self.http.patch(url, &self.secret_key, body).await
    }

    /// Make a DELETE request to a Scaleway API
    pub async fn delete(&self, url: &str) -> Result<Value> {
        self.http.delete(url, &self.secret_key).await
    }

    // =========================================================================
    // Managed Database (RDB) API helpers
    // =========================================================================

    /// Build a regional RDB API URL
    pub fn rdb_url(&self, region: &Region, path: &str) -> String {
        format!(
            "{}/rdb/v1/regions/{}/{}",
            self.api_url.as_str().trim_end_matches('/'),
            region,
            path
        )
    }

    /// Build the URL of one instance, or of a collection below it
    pub fn rdb_instance_url(&self, region: &Region, instance_id: &str, resource: &str) -> String {
        let base = format!("instances/{}", urlencoding::encode(instance_id));
        if resource.is_empty() {
            self.rdb_url(region, &base)
        } else {
            self.rdb_url(region, &format!("{}/{}", base, resource))
        }
    }
}

/// Append `key=value` pairs, skipping unset filters
pub fn with_query(url: String, params: &[(&str, Option<&str>)]) -> String {
    let parts: Vec<String> = params
        .iter()
        .filter_map(|(key, value)| value.map(|v| format!("{}={}", key, urlencoding::encode(v))))
        .collect();

    if parts.is_empty() {
        url
    } else if url.contains('?') {
        format!("{}&{}", url, parts.join("&"))
    } else {
        format!("{}?{}", url, parts.join("&"))
    }
}
