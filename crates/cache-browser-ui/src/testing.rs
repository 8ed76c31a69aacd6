//! In-memory cache service for component tests.

use async_trait::async_trait;
use cache_browser_api::{ApiError, ApiResponse, CacheApi, Result};
use cache_browser_core::event::{names, AuthErrorDetail};
use cache_browser_core::{BusEvent, EventBus};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

struct Route {
    result: Result<ApiResponse>,
    delay: Option<Duration>,
}

pub struct FakeApi {
    base_url: String,
    routes: Mutex<HashMap<String, Route>>,
    calls: Mutex<Vec<String>>,
    bus: Mutex<Option<EventBus>>,
}

impl FakeApi {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            base_url: "http://cache.test".to_string(),
            routes: Mutex::new(HashMap::new()),
            calls: Mutex::new(Vec::new()),
            bus: Mutex::new(None),
        })
    }

    /// Report authentication failures on `bus` the way the HTTP client does.
    pub fn report_to(&self, bus: &EventBus) -> &Self {
        *self.bus.lock() = Some(bus.clone());
        self
    }

    pub fn respond(&self, endpoint: &str, body: impl Into<ApiResponse>) -> &Self {
        self.routes.lock().insert(
            endpoint.to_string(),
            Route {
                result: Ok(body.into()),
                delay: None,
            },
        );
        self
    }

    pub fn fail(&self, endpoint: &str, error: ApiError) -> &Self {
        self.routes.lock().insert(
            endpoint.to_string(),
            Route {
                result: Err(error),
                delay: None,
            },
        );
        self
    }

    /// Answer `endpoint` only after `delay`.
    pub fn delay(&self, endpoint: &str, delay: Duration) -> &Self {
        if let Some(route) = self.routes.lock().get_mut(endpoint) {
            route.delay = Some(delay);
        }
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }

    pub fn call_count(&self, endpoint: &str) -> usize {
        self.calls.lock().iter().filter(|c| c.as_str() == endpoint).count()
    }
}

pub fn http_error(status: u16) -> ApiError {
    ApiError::Http {
        status,
        status_text: "Error".to_string(),
        body: "failed".to_string(),
    }
}

/// Rejected credentials on `endpoint`.
pub fn auth_error(status: u16, endpoint: &str) -> ApiError {
    ApiError::Auth {
        status,
        endpoint: endpoint.to_string(),
    }
}

#[async_trait]
impl CacheApi for FakeApi {
    fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn fetch(&self, endpoint: &str) -> Result<ApiResponse> {
        self.calls.lock().push(endpoint.to_string());
        let (result, delay) = match self.routes.lock().get(endpoint) {
            Some(route) => (route.result.clone(), route.delay),
            None => (Err(http_error(404)), None),
        };
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if let Err(ApiError::Auth { status, endpoint }) = &result {
            let bus = self.bus.lock().clone();
            if let Some(bus) = bus {
                let detail = AuthErrorDetail {
                    status: *status,
                    endpoint: endpoint.clone(),
                    message: "Authentication required".to_string(),
                };
                bus.emit_with_source(BusEvent::typed(names::AUTH_ERROR, &detail), "cache-api");
            }
        }
        result
    }
}
