//! Shared fixtures for the client integration tests: a scripted in-memory
//! transport and JSON builders for the server's payloads.

#![allow(dead_code)]

use async_trait::async_trait;
use client_lib::adapters::{MemoryStore, ToastHub};
use client_lib::config::ClientConfig;
use client_lib::state::AppState;
use marketplace_core::ports::{
    ApiRequest, ApiResponse, HttpTransport, Method, PortResult,
};
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};
use std::time::Duration;

type Handler = Box<dyn Fn(&ApiRequest) -> PortResult<ApiResponse> + Send + Sync>;
type DelayFn = Box<dyn Fn(&ApiRequest) -> Duration + Send + Sync>;

/// A fake server: every request is recorded, optionally delayed, then
/// answered by the handler.
pub struct FakeTransport {
    handler: Handler,
    delay: DelayFn,
    calls: Mutex<Vec<ApiRequest>>,
}

impl FakeTransport {
    pub fn new(
        handler: impl Fn(&ApiRequest) -> PortResult<ApiResponse> + Send + Sync + 'static,
    ) -> Self {
        Self {
            handler: Box::new(handler),
            delay: Box::new(|_| Duration::ZERO),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn with_delay(mut self, delay: impl Fn(&ApiRequest) -> Duration + Send + Sync + 'static) -> Self {
        self.delay = Box::new(delay);
        self
    }

    pub fn calls(&self) -> Vec<ApiRequest> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self, method: Method, path: &str) -> usize {
        self.calls()
            .iter()
            .filter(|c| c.method == method && c.path == path)
            .count()
    }

    pub fn total(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl HttpTransport for FakeTransport {
    async fn send(&self, request: ApiRequest) -> PortResult<ApiResponse> {
        self.calls.lock().unwrap().push(request.clone());
        let delay = (self.delay)(&request);
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        (self.handler)(&request)
    }
}

pub fn respond(status: u16, body: Value) -> PortResult<ApiResponse> {
    Ok(ApiResponse::new(status, body.to_string()))
}

pub fn query_value<'a>(request: &'a ApiRequest, key: &str) -> Option<&'a str> {
    request
        .query
        .iter()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.as_str())
}

pub fn json_body(request: &ApiRequest) -> Option<&Value> {
    match &request.body {
        Some(marketplace_core::ports::RequestBody::Json(value)) => Some(value),
        _ => None,
    }
}

pub fn user_json(id: &str, is_admin: bool) -> Value {
    json!({
        "id": id,
        "displayName": format!("User {}", id),
        "email": format!("{}@example.com", id),
        "avatar": null,
        "createdAt": "2026-03-01T10:00:00Z",
        "isAdmin": is_admin,
        "isSellingBanned": false
    })
}

pub fn car_json(id: &str, status: &str, seller: &str, tags: &[&str]) -> Value {
    json!({
        "id": id,
        "title": format!("Car {}", id),
        "brand": "Toyota",
        "price": 12000,
        "tags": tags,
        "status": status,
        "seller": { "id": seller, "displayName": format!("Seller {}", seller) },
        "createdAt": "2026-03-02T10:00:00Z"
    })
}

pub fn report_json(id: &str, car_id: &str, reporter: &str) -> Value {
    json!({
        "id": id,
        "carId": car_id,
        "reporter": { "id": reporter, "displayName": reporter },
        "reason": "scam",
        "status": "PENDING",
        "createdAt": "2026-03-03T10:00:00Z"
    })
}

pub fn test_config() -> ClientConfig {
    ClientConfig::from_lookup(|key| match key {
        "API_BASE_URL" => Some("http://marketplace.test/api".to_string()),
        "FEED_PAGE_SIZE" => Some("3".to_string()),
        _ => None,
    })
    .unwrap()
}

/// An app state wired to the fake transport and an in-memory store.
pub fn app(transport: Arc<FakeTransport>, storage: Arc<MemoryStore>) -> AppState {
    AppState::with_ports(
        Arc::new(test_config()),
        transport,
        storage,
        Arc::new(ToastHub::new()),
    )
}

/// Storage seeded with a token pair.
pub fn signed_in_storage(access: &str, refresh: &str) -> Arc<MemoryStore> {
    Arc::new(MemoryStore::with_entries([
        ("accessToken", access),
        ("refreshToken", refresh),
    ]))
}
