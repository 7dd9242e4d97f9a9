use std::sync::Arc;
use std::time::{Duration, Instant};

use actix_web::HttpRequest;
use dashmap::DashMap;

const UNKNOWN_CLIENT: &str = "unknown";

/// Sliding-window request counter keyed by client IP.
///
/// Each key keeps the instants of its accepted requests that are still inside
/// the window. The filter-count-append sequence runs while holding the map
/// entry, so concurrent requests from one client cannot both slip under the
/// quota.
pub struct RateLimiter {
    requests: DashMap<String, Vec<Instant>>,
    window: Duration,
    max_requests: usize,
}

impl RateLimiter {
    pub fn new(window: Duration, max_requests: usize) -> Self {
        Self {
            requests: DashMap::new(),
            window,
            max_requests,
        }
    }

    /// Returns `true` and records the request if `client_ip` is under quota.
    pub fn check(&self, client_ip: &str) -> bool {
        self.check_at(client_ip, Instant::now())
    }

    pub fn check_at(&self, client_ip: &str, now: Instant) -> bool {
        let mut timestamps = self.requests.entry(client_ip.to_owned()).or_default();
        timestamps.retain(|t| now.saturating_duration_since(*t) < self.window);
        if timestamps.len() >= self.max_requests {
            return false;
        }
        timestamps.push(now);
        true
    }

    /// Drops expired timestamps and evicts clients left with none.
    /// Returns how many clients were evicted.
    pub fn prune(&self) -> usize {
        self.prune_at(Instant::now())
    }

    pub fn prune_at(&self, now: Instant) -> usize {
        let before = self.requests.len();
        self.requests.retain(|_, timestamps| {
            timestamps.retain(|t| now.saturating_duration_since(*t) < self.window);
            !timestamps.is_empty()
        });
        before.saturating_sub(self.requests.len())
    }

    pub fn tracked_clients(&self) -> usize {
        self.requests.len()
    }
}

/// Periodically evicts idle clients so the map does not grow without bound.
pub async fn prune_rate_limits(rate_limiter: Arc<RateLimiter>, every: Duration) {
    let mut interval = tokio::time::interval(every);
    loop {
        interval.tick().await;
        let evicted = rate_limiter.prune();
        if evicted > 0 {
            tracing::debug!(
                evicted,
                remaining = rate_limiter.tracked_clients(),
                "Evicted idle rate-limit entries"
            );
        }
    }
}

/// First `X-Forwarded-For` hop, then the peer address, then a shared
/// `"unknown"` bucket.
pub fn client_ip(request: &HttpRequest) -> String {
    let forwarded = request
        .headers()
        .get("X-Forwarded-For")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .map(str::trim)
        .filter(|value| !value.is_empty());

    if let Some(ip) = forwarded {
        return ip.to_owned();
    }

    request
        .peer_addr()
        .map(|addr| addr.ip().to_string())
        .unwrap_or_else(|| UNKNOWN_CLIENT.to_owned())
}
