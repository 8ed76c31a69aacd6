//! HTTP implementation of [`CacheApi`].

use crate::error::{ApiError, Result};
use crate::response::ApiResponse;
use crate::CacheApi;
use async_trait::async_trait;
use cache_browser_core::event::{names, AuthErrorDetail, NetworkErrorDetail};
use cache_browser_core::{BusEvent, ConsoleConfig, EventBus};
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::{Client, Method, StatusCode};
use serde_json::Value;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Source tag of the events this client emits.
const EVENT_SOURCE: &str = "cache-api";

/// Cache service client over HTTP.
///
/// A 401 or 403 emits `cache-api:auth-error` and a request that gets no
/// usable response emits `cache-api:network-error`; both also return the
/// error to the caller. Other error statuses are only returned.
pub struct CacheApiClient {
    http: Client,
    base_url: String,
    bus: Option<EventBus>,
    next_request_id: AtomicU64,
}

impl CacheApiClient {
    pub fn new(base_url: &str, bus: Option<EventBus>, timeout: Duration) -> Result<Self> {
        let base_url = base_url.trim_end_matches('/').to_string();
        if !base_url.is_empty() {
            reqwest::Url::parse(&base_url).map_err(|e| ApiError::InvalidUrl(format!("{base_url}: {e}")))?;
        }

        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ApiError::InvalidUrl(e.to_string()))?;

        tracing::debug!(base_url = %base_url, "Creating cache API client");
        Ok(Self {
            http,
            base_url,
            bus,
            next_request_id: AtomicU64::new(0),
        })
    }

    pub fn from_config(config: &ConsoleConfig, bus: Option<EventBus>) -> Result<Self> {
        Self::new(config.base_url(), bus, config.request_timeout())
    }

    /// Requests issued so far.
    pub fn request_count(&self) -> u64 {
        self.next_request_id.load(Ordering::Relaxed)
    }

    pub async fn post(&self, endpoint: &str, body: &Value) -> Result<ApiResponse> {
        self.request(Method::POST, endpoint, Some(body)).await
    }

    pub async fn delete(&self, endpoint: &str) -> Result<ApiResponse> {
        self.request(Method::DELETE, endpoint, None).await
    }

    async fn request(&self, method: Method, endpoint: &str, body: Option<&Value>) -> Result<ApiResponse> {
        let request_id = self.next_request_id.fetch_add(1, Ordering::Relaxed) + 1;
        let url = format!("{}{}", self.base_url, endpoint);
        tracing::debug!(request_id, "[{request_id}] {method} {url}");
        let started = Instant::now();

        let mut builder = self
            .http
            .request(method, &url)
            .header(ACCEPT, "application/json");
        if let Some(body) = body {
            builder = builder.json(body);
        }

        let response = match builder.send().await {
            Ok(response) => response,
            Err(e) => return Err(self.network_failure(request_id, endpoint, e.to_string())),
        };

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            tracing::warn!(request_id, endpoint, status = status.as_u16(), "Authentication required");
            self.emit(BusEvent::typed(
                names::AUTH_ERROR,
                &AuthErrorDetail {
                    status: status.as_u16(),
                    endpoint: endpoint.to_string(),
                    message: "Authentication required".to_string(),
                },
            ));
            return Err(ApiError::Auth {
                status: status.as_u16(),
                endpoint: endpoint.to_string(),
            });
        }

        if !status.is_success() {
            let body = response
                .text()
                .await
                .ok()
                .filter(|text| !text.is_empty())
                .unwrap_or_else(|| "Unknown error".to_string());
            tracing::error!(request_id, endpoint, status = status.as_u16(), "Request failed: {body}");
            return Err(ApiError::Http {
                status: status.as_u16(),
                status_text: status.canonical_reason().unwrap_or_default().to_string(),
                body,
            });
        }

        let is_json = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(|ct| ct.contains("application/json"))
            .unwrap_or(false);

        let decoded = if is_json {
            response.json::<Value>().await.map(ApiResponse::Json)
        } else {
            response.text().await.map(ApiResponse::Text)
        };

        match decoded {
            Ok(body) => {
                tracing::debug!(
                    request_id,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "[{request_id}] OK"
                );
                Ok(body)
            }
            Err(e) => {
                tracing::error!(request_id, endpoint, error = %e, "Could not read response body");
                self.emit(BusEvent::typed(
                    names::NETWORK_ERROR,
                    &NetworkErrorDetail {
                        endpoint: endpoint.to_string(),
                        error: e.to_string(),
                    },
                ));
                Err(ApiError::Decode {
                    endpoint: endpoint.to_string(),
                    message: e.to_string(),
                })
            }
        }
    }

    fn network_failure(&self, request_id: u64, endpoint: &str, message: String) -> ApiError {
        tracing::error!(request_id, endpoint, error = %message, "Network error");
        self.emit(BusEvent::typed(
            names::NETWORK_ERROR,
            &NetworkErrorDetail {
                endpoint: endpoint.to_string(),
                error: message.clone(),
            },
        ));
        ApiError::Network {
            endpoint: endpoint.to_string(),
            message,
        }
    }

    fn emit(&self, event: BusEvent) {
        if let Some(bus) = &self.bus {
            bus.emit_with_source(event, EVENT_SOURCE);
        }
    }
}

#[async_trait]
impl CacheApi for CacheApiClient {
    fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn fetch(&self, endpoint: &str) -> Result<ApiResponse> {
        self.request(Method::GET, endpoint, None).await
    }
}
