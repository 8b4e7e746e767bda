//! HTTP client for a hosted PostgREST-style table service.
//!
//! Tables live under `{base_url}/rest/v1/{table}`. Filters use the
//! `column=eq.value` dialect, ordering uses `order=column.desc`, and writes
//! ask for `Prefer: return=representation` so the stored row comes back.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use tracing::{debug, instrument};

use crate::{Key, Order, RemoteError, RemoteStore, Row};

/// Header asking the service to echo stored rows back.
const RETURN_REPRESENTATION: &str = "return=representation";

/// Header asking the service to answer writes with an empty body.
const RETURN_MINIMAL: &str = "return=minimal";

/// Longest response excerpt kept in error messages.
const MAX_ERROR_BODY: usize = 512;

/// Connection settings for [`RestClient`].
#[derive(Debug, Clone)]
pub struct RestConfig {
    /// Project URL, e.g. `https://xyz.example.co`.
    pub base_url: String,
    /// Anonymous or service API key, sent as `apikey` and bearer token.
    pub api_key: String,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
}

impl RestConfig {
    /// Creates a config with the default 30 second timeout.
    #[must_use]
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: api_key.into(),
            timeout_secs: 30,
        }
    }
}

/// [`RemoteStore`] backed by a PostgREST-compatible HTTP endpoint.
///
/// # Example
///
/// ```no_run
/// use edu_remote::{Order, RemoteStore, RestClient, RestConfig};
///
/// # async fn example() -> Result<(), edu_remote::RemoteError> {
/// let client = RestClient::new(RestConfig::new("https://db.example.co", "anon-key"))?;
/// let news = client.select("news", Some(&Order::desc("date"))).await?;
/// println!("{} news rows", news.len());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct RestClient {
    client: reqwest::Client,
    base_url: String,
}

impl RestClient {
    /// Builds a client with authentication headers preset.
    ///
    /// # Errors
    ///
    /// Returns [`RemoteError::InvalidConfig`] if the URL is empty or the key
    /// cannot be used as a header value, and [`RemoteError::Request`] if the
    /// HTTP client cannot be built.
    pub fn new(config: RestConfig) -> Result<Self, RemoteError> {
        let base_url = config.base_url.trim().trim_end_matches('/').to_string();
        if base_url.is_empty() {
            return Err(RemoteError::InvalidConfig(
                "remote URL must not be empty".to_string(),
            ));
        }

        let mut headers = HeaderMap::new();
        let key = HeaderValue::from_str(&config.api_key)
            .map_err(|e| RemoteError::InvalidConfig(format!("invalid API key: {e}")))?;
        let bearer = HeaderValue::from_str(&format!("Bearer {}", config.api_key))
            .map_err(|e| RemoteError::InvalidConfig(format!("invalid API key: {e}")))?;
        headers.insert("apikey", key);
        headers.insert(AUTHORIZATION, bearer);

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .default_headers(headers)
            .build()?;

        debug!(base_url = %base_url, "Remote table client ready");
        Ok(Self { client, base_url })
    }

    /// Returns the normalized base URL.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{table}", self.base_url)
    }
}

fn key_filter(key: &Key) -> [(String, String); 1] {
    [(key.column.clone(), format!("eq.{}", key.value))]
}

fn excerpt(body: &str) -> String {
    if body.len() <= MAX_ERROR_BODY {
        return body.to_string();
    }
    let mut end = MAX_ERROR_BODY;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &body[..end])
}

/// Checks the status and returns the raw body.
async fn read_body(table: &str, response: reqwest::Response) -> Result<String, RemoteError> {
    let status = response.status();
    let body = response.text().await?;
    if !status.is_success() {
        let message = if body.trim().is_empty() {
            status.canonical_reason().unwrap_or("request failed").to_string()
        } else {
            excerpt(&body)
        };
        return Err(RemoteError::Status {
            table: table.to_string(),
            status: status.as_u16(),
            message,
        });
    }
    Ok(body)
}

async fn read_rows(table: &str, response: reqwest::Response) -> Result<Vec<Row>, RemoteError> {
    let body = read_body(table, response).await?;
    serde_json::from_str(&body).map_err(|e| RemoteError::decode(table, e.to_string()))
}

#[async_trait]
impl RemoteStore for RestClient {
    #[instrument(skip(self, order), fields(order = ?order.map(Order::to_query_value)))]
    async fn select(&self, table: &str, order: Option<&Order>) -> Result<Vec<Row>, RemoteError> {
        let mut query = vec![("select".to_string(), "*".to_string())];
        if let Some(order) = order {
            query.push(("order".to_string(), order.to_query_value()));
        }

        let response = self
            .client
            .get(self.table_url(table))
            .query(&query)
            .send()
            .await?;
        let rows = read_rows(table, response).await?;
        debug!(rows = rows.len(), "Selected rows");
        Ok(rows)
    }

    #[instrument(skip(self, row))]
    async fn insert(&self, table: &str, row: Row) -> Result<Row, RemoteError> {
        let response = self
            .client
            .post(self.table_url(table))
            .header("Prefer", RETURN_REPRESENTATION)
            .json(&row)
            .send()
            .await?;
        read_rows(table, response)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| RemoteError::decode(table, "insert returned no row"))
    }

    #[instrument(skip(self, patch, key), fields(key = %key))]
    async fn update(&self, table: &str, patch: Row, key: &Key) -> Result<Row, RemoteError> {
        let response = self
            .client
            .patch(self.table_url(table))
            .query(&key_filter(key))
            .header("Prefer", RETURN_REPRESENTATION)
            .json(&patch)
            .send()
            .await?;
        read_rows(table, response)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| RemoteError::no_rows(table, key.clone()))
    }

    #[instrument(skip(self, key), fields(key = %key))]
    async fn delete(&self, table: &str, key: &Key) -> Result<(), RemoteError> {
        let response = self
            .client
            .delete(self.table_url(table))
            .query(&key_filter(key))
            .header("Prefer", RETURN_MINIMAL)
            .send()
            .await?;
        read_body(table, response).await?;
        Ok(())
    }
}
