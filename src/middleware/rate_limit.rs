use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use axum::body::Body;
use axum::extract::State;
use axum::http::{Request, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use serde_json::json;

const WINDOW: Duration = Duration::from_secs(1);

#[derive(Debug)]
struct WindowState {
    start: Instant,
    count: u32,
}

/// Fixed one-second window per client. Clients are told apart by the first
/// `x-forwarded-for` hop.
#[derive(Clone, Debug)]
pub struct RateLimiter {
    rps: u32,
    windows: Arc<Mutex<HashMap<String, WindowState>>>,
}

impl RateLimiter {
    fn new(rps: u32) -> Self {
        Self {
            rps: rps.max(1),
            windows: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    fn allow(&self, client: &str) -> bool {
        let mut guard = self.windows.lock().unwrap_or_else(|p| p.into_inner());
        let now = Instant::now();
        // Stale windows would otherwise pile up for one-off clients.
        if guard.len() > 10_000 {
            guard.retain(|_, w| now.duration_since(w.start) < WINDOW);
        }
        let window = guard.entry(client.to_string()).or_insert(WindowState {
            start: now,
            count: 0,
        });
        if now.duration_since(window.start) >= WINDOW {
            window.start = now;
            window.count = 0;
        }
        if window.count < self.rps {
            window.count += 1;
            true
        } else {
            false
        }
    }
}

fn client_key(req: &Request<Body>) -> String {
    req.headers()
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .unwrap_or("anonymous")
        .to_string()
}

pub async fn rps_middleware(
    State(state): State<RateLimiter>,
    req: Request<Body>,
    next: Next,
) -> Response {
    let client = client_key(&req);
    if !state.allow(&client) {
        tracing::debug!(client = %client, "rate limit exceeded");
        return (
            StatusCode::TOO_MANY_REQUESTS,
            axum::Json(json!({ "error": "rate_limit_exceeded" })),
        )
            .into_response();
    }
    next.run(req).await
}

pub fn new_rps_state(rps: u32) -> RateLimiter {
    RateLimiter::new(rps)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn limits_each_client_separately() {
        let limiter = new_rps_state(2);
        assert!(limiter.allow("10.0.0.1"));
        assert!(limiter.allow("10.0.0.1"));
        assert!(!limiter.allow("10.0.0.1"));
        assert!(limiter.allow("10.0.0.2"));
    }

    #[test]
    fn zero_rps_still_allows_one_request() {
        let limiter = new_rps_state(0);
        assert!(limiter.allow("a"));
        assert!(!limiter.allow("a"));
    }
}
