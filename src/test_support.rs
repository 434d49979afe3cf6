//! Shared test doubles for the transport and delay seams.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::HeaderMap;
use reqwest::{Method, StatusCode};

use crate::error::{AppError, Result};
use crate::retry::Delay;
use crate::transport::{ApiRequest, ApiResponse, Transport};

/// Delay stand-in that completes immediately.
pub struct NoDelay;

#[async_trait]
impl Delay for NoDelay {
    async fn sleep(&self, _duration: Duration) {}
}

pub fn response(status: u16, body: &str) -> ApiResponse {
    ApiResponse {
        status: StatusCode::from_u16(status).expect("valid status"),
        headers: HeaderMap::new(),
        body: body.to_string(),
    }
}

pub fn response_with_retry_after(status: u16, seconds: &str) -> ApiResponse {
    let mut headers = HeaderMap::new();
    headers.insert(
        reqwest::header::RETRY_AFTER,
        seconds.parse().expect("valid header value"),
    );
    ApiResponse {
        status: StatusCode::from_u16(status).expect("valid status"),
        headers,
        body: String::new(),
    }
}

pub fn transport_error() -> AppError {
    AppError::Io(std::io::Error::new(
        std::io::ErrorKind::ConnectionRefused,
        "connection refused",
    ))
}

struct Rule {
    method: Method,
    url_contains: String,
    responses: VecDeque<Result<ApiResponse>>,
}

/// Transport double that routes requests to scripted responses by method
/// and URL substring, records every request, and tracks how many calls
/// were in flight simultaneously.
pub struct MockTransport {
    rules: Mutex<Vec<Rule>>,
    requests: Mutex<Vec<ApiRequest>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    latency: Option<Duration>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self {
            rules: Mutex::new(Vec::new()),
            requests: Mutex::new(Vec::new()),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
            latency: None,
        }
    }

    /// Add artificial per-request latency so overlapping calls actually
    /// overlap when measuring concurrency.
    pub fn with_latency(latency: Duration) -> Self {
        Self {
            latency: Some(latency),
            ..Self::new()
        }
    }

    pub fn on(&self, method: Method, url_contains: &str, responses: Vec<Result<ApiResponse>>) {
        self.rules.lock().unwrap().push(Rule {
            method,
            url_contains: url_contains.to_string(),
            responses: responses.into(),
        });
    }

    pub fn requests(&self) -> Vec<ApiRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn request_count(&self, method: &Method, url_contains: &str) -> usize {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.method == *method && r.url.contains(url_contains))
            .count()
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    fn next_response(&self, request: &ApiRequest) -> Result<ApiResponse> {
        let mut rules = self.rules.lock().unwrap();
        let rule = rules
            .iter_mut()
            .find(|r| r.method == request.method && request.url.contains(&r.url_contains))
            .unwrap_or_else(|| {
                panic!("no rule for {} {}", request.method, request.url);
            });
        rule.responses.pop_front().unwrap_or_else(|| {
            panic!("script exhausted for {} {}", request.method, request.url);
        })
    }
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn send(&self, request: &ApiRequest) -> Result<ApiResponse> {
        self.requests.lock().unwrap().push(request.clone());

        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }

        let result = self.next_response(request);
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        result
    }
}
