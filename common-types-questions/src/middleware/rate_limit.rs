use ::std::collections::HashMap;
use ::std::net::Ipv6Addr;
use ::std::time::{Duration, Instant};
use axum::{
    middleware::Next,
    extract::State,
    http::{Request, StatusCode, header::HeaderValue},
    response::Response,
    body::Body,
};
use parking_lot::Mutex;

use crate::{
    Response::{ServerResponse, status_response},
    State::AppState,
    Constants,
};
use common_types::Ip::try_fetch_ipv6;

// Expired windows are swept once the table grows past this, at most once
// per window
const SWEEP_THRESHOLD: usize = 10_000;

struct Window {
    started: Instant,
    count: u32,
}

struct Clients {
    windows: HashMap<Ipv6Addr, Window>,
    last_sweep: Instant,
}

/// Fixed window request counter per client address.
pub struct RateLimiter {
    max_requests: u32,
    window: Duration,
    clients: Mutex<Clients>,
}

impl RateLimiter {
    pub fn new(max_requests: u32, window: Duration) -> Self {
        Self {
            max_requests,
            window,
            clients: Mutex::new(Clients {
                windows: HashMap::new(),
                last_sweep: Instant::now(),
            }),
        }
    }

    /// Counts one request from `client`. Returns the requests left in the
    /// current window, or `None` once the limit is exceeded.
    pub fn acquire(&self, client: Ipv6Addr) -> Option<u32> {
        self.acquire_at(client, Instant::now())
    }

    fn acquire_at(&self, client: Ipv6Addr, now: Instant) -> Option<u32> {
        let mut clients = self.clients.lock();
        let window = self.window;
        if clients.windows.len() >= SWEEP_THRESHOLD && now.saturating_duration_since(clients.last_sweep) >= window {
            clients.windows.retain(|_, entry| now.saturating_duration_since(entry.started) < window);
            clients.last_sweep = now;
        }
        let entry = clients.windows.entry(client).or_insert(Window { started: now, count: 0 });
        if now.saturating_duration_since(entry.started) >= window {
            *entry = Window { started: now, count: 0 };
        }
        if entry.count >= self.max_requests {
            return None
        }
        entry.count += 1;
        Some(self.max_requests - entry.count)
    }
}

#[tracing::instrument(skip(appstate, req, next))]
pub async fn middleware(State(appstate): State<AppState>, req: Request<Body>, next: Next<Body>) -> Result<Response, ServerResponse> {
    // Clients hidden behind unknown proxies share one bucket
    let client = try_fetch_ipv6(req.headers(), *Constants::DEVELOPMENT_MODE).unwrap_or(Ipv6Addr::UNSPECIFIED);
    let Some(remaining) = appstate.rate_limiter.acquire(client) else {
        tracing::warn!("Rate limit exceeded for {client}");
        return Err(status_response(StatusCode::TOO_MANY_REQUESTS, "Too many requests, please try again later."));
    };
    let mut response = next.run(req).await;
    response.headers_mut().insert("ratelimit-limit", HeaderValue::from(appstate.rate_limiter.max_requests));
    response.headers_mut().insert("ratelimit-remaining", HeaderValue::from(remaining));
    Ok(response)
}
