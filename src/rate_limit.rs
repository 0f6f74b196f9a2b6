use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    extract::{ConnectInfo, Request, State},
    http::StatusCode,
    middleware::Next,
    response::Response,
};
use tokio::sync::Mutex;

use crate::{error::AppError, state::AppState};

#[derive(Debug)]
struct ClientWindow {
    started_at: Instant,
    requests: u32,
}

#[derive(Debug)]
struct LimiterState {
    windows: HashMap<String, ClientWindow>,
    swept_at: Instant,
}

// Fixed-window counter per client key. The window resets on the first
// request after it elapses, so a client gets at most max_requests per
// window span.
#[derive(Clone)]
pub struct RateLimiter {
    max_requests: u32,
    window: Duration,
    state: Arc<Mutex<LimiterState>>,
}

impl RateLimiter {
    pub fn new(max_requests: u32, window: Duration) -> Self {
        Self {
            max_requests,
            window,
            state: Arc::new(Mutex::new(LimiterState {
                windows: HashMap::new(),
                swept_at: Instant::now(),
            })),
        }
    }

    pub async fn allow(&self, key: &str) -> bool {
        self.allow_at(key, Instant::now()).await
    }

    async fn allow_at(&self, key: &str, now: Instant) -> bool {
        let mut state = self.state.lock().await;

        // Keys that never come back are dropped here; the sweep runs at
        // most once per window span.
        if now.duration_since(state.swept_at) >= self.window {
            let window = self.window;
            state
                .windows
                .retain(|_, w| now.duration_since(w.started_at) < window);
            state.swept_at = now;
        }

        let entry = state.windows.entry(key.to_string()).or_insert(ClientWindow {
            started_at: now,
            requests: 0,
        });

        if now.duration_since(entry.started_at) >= self.window {
            entry.started_at = now;
            entry.requests = 0;
        }

        if entry.requests >= self.max_requests {
            return false;
        }

        entry.requests += 1;
        true
    }
}

pub async fn enforce(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let key = client_key(&request);

    if !state.rate_limiter.allow(&key).await {
        return Err(AppError::new(
            StatusCode::TOO_MANY_REQUESTS,
            "too many requests, please try again later",
        ));
    }

    Ok(next.run(request).await)
}

// First hop of X-Forwarded-For when present, otherwise the socket address.
fn client_key(request: &Request) -> String {
    let forwarded = request
        .headers()
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .map(str::trim)
        .filter(|value| !value.is_empty());

    if let Some(forwarded) = forwarded {
        return forwarded.to_string();
    }

    request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}
