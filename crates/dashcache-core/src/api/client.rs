//! API client for the dashboard REST backend.
//!
//! This module provides the `ApiClient` struct for making authenticated
//! requests to fetch orders, staff, products and summary statistics.

use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::{header, Client};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};
use url::Url;

use crate::models::{DashboardStats, Order, Product, StaffMember};

use super::ApiError;

// ============================================================================
// Constants
// ============================================================================

/// HTTP request timeout in seconds.
/// 30s allows for slow API responses while failing fast enough for good UX.
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Maximum number of retries for rate-limited (429) requests.
const MAX_RATE_LIMIT_RETRIES: u32 = 3;

/// Initial backoff delay in milliseconds for rate limiting.
const INITIAL_BACKOFF_MS: u64 = 1000;

/// API client for the dashboard backend.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    token: Option<String>,
}

impl ApiClient {
    /// Create a client for the API rooted at `base_url`.
    pub fn new(base_url: &str) -> Result<Self> {
        Url::parse(base_url).map_err(|e| ApiError::InvalidBaseUrl(format!("{}: {}", base_url, e)))?;

        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: None,
        })
    }

    /// Set the bearer token for authenticated requests
    pub fn set_token(&mut self, token: String) {
        self.token = Some(token);
    }

    /// Create a new ApiClient with the given token, sharing the connection pool.
    pub fn with_token(&self, token: String) -> Self {
        Self {
            client: self.client.clone(),
            base_url: self.base_url.clone(),
            token: Some(token),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn auth_headers(&self) -> Result<header::HeaderMap> {
        let mut headers = header::HeaderMap::new();
        headers.insert(header::ACCEPT, header::HeaderValue::from_static("application/json"));
        if let Some(ref token) = self.token {
            headers.insert(
                header::AUTHORIZATION,
                header::HeaderValue::from_str(&format!("Bearer {}", token))?,
            );
        }
        Ok(headers)
    }

    /// Check if response is successful, returning an error with body if not.
    /// Returns Ok(Some(response)) for success, Ok(None) for rate limit (should retry),
    /// or Err for other errors.
    async fn check_response_for_retry(response: reqwest::Response) -> Result<Option<reqwest::Response>> {
        if response.status().is_success() {
            Ok(Some(response))
        } else if response.status().as_u16() == 429 {
            Ok(None)
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(ApiError::from_status(status, &body).into())
        }
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = self.url(path);
        let mut retries = 0;
        let mut backoff_ms = INITIAL_BACKOFF_MS;

        loop {
            debug!(url = %url, "GET");
            let response = self
                .client
                .get(&url)
                .headers(self.auth_headers()?)
                .send()
                .await
                .with_context(|| format!("Failed to send GET request to {}", url))?;

            match Self::check_response_for_retry(response).await? {
                Some(response) => {
                    return response
                        .json()
                        .await
                        .with_context(|| format!("Failed to parse JSON response from {}", url));
                }
                None => {
                    retries += 1;
                    if retries > MAX_RATE_LIMIT_RETRIES {
                        return Err(ApiError::RateLimited.into());
                    }
                    warn!(url = %url, retry = retries, backoff_ms = backoff_ms, "Rate limited, backing off");
                    tokio::time::sleep(Duration::from_millis(backoff_ms)).await;
                    backoff_ms *= 2; // Exponential backoff
                }
            }
        }
    }

    // ===== Data Fetching Methods =====

    pub async fn fetch_orders(&self) -> Result<Vec<Order>> {
        self.get("orders").await.context("Failed to fetch orders")
    }

    pub async fn fetch_order(&self, order_id: i64) -> Result<Order> {
        self.get(&format!("orders/{}", order_id))
            .await
            .with_context(|| format!("Failed to fetch order {}", order_id))
    }

    pub async fn fetch_staff(&self) -> Result<Vec<StaffMember>> {
        self.get("staff").await.context("Failed to fetch staff")
    }

    pub async fn fetch_products(&self) -> Result<Vec<Product>> {
        self.get("products").await.context("Failed to fetch products")
    }

    pub async fn fetch_dashboard_stats(&self) -> Result<DashboardStats> {
        self.get("dashboard/stats")
            .await
            .context("Failed to fetch dashboard statistics")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_building() {
        let client = ApiClient::new("https://shop.example.com/api/").unwrap();
        assert_eq!(client.base_url(), "https://shop.example.com/api");
        assert_eq!(client.url("orders"), "https://shop.example.com/api/orders");
        assert_eq!(client.url("/orders/7"), "https://shop.example.com/api/orders/7");
    }

    #[test]
    fn test_rejects_invalid_base_url() {
        assert!(ApiClient::new("not a url").is_err());
    }

    #[test]
    fn test_auth_headers_include_token() {
        let client = ApiClient::new("https://shop.example.com").unwrap();
        assert!(client.auth_headers().unwrap().get(header::AUTHORIZATION).is_none());

        let client = client.with_token("abc".to_string());
        let headers = client.auth_headers().unwrap();
        assert_eq!(headers.get(header::AUTHORIZATION).unwrap(), "Bearer abc");
    }

    #[tokio::test]
    async fn test_unreachable_host_is_an_error() {
        // Port 9 (discard) on localhost is almost never listening
        let client = ApiClient::new("http://127.0.0.1:9").unwrap();
        assert!(client.fetch_orders().await.is_err());
    }
}
