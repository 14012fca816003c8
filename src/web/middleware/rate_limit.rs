//! Per-IP rate limiting middleware.

use axum::{
    body::Body,
    extract::ConnectInfo,
    http::Request,
    middleware::Next,
    response::{IntoResponse, Response},
};
use governor::{
    clock::DefaultClock,
    state::{InMemoryState, NotKeyed},
    Quota, RateLimiter,
};
use std::{
    collections::HashMap,
    net::SocketAddr,
    num::NonZeroU32,
    sync::{Arc, PoisonError, RwLock},
    time::Duration,
};

use crate::web::error::ApiError;

/// Per-IP rate limiter using Governor.
pub type IpRateLimiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

type LimiterMap = RwLock<HashMap<String, Arc<IpRateLimiter>>>;

/// State for rate limiting.
pub struct RateLimitState {
    /// Per-IP limiters for login and registration.
    login_limiters: LimiterMap,
    /// Per-IP limiters for every other API route.
    api_limiters: LimiterMap,
    /// Requests per minute.
    login_rate_limit: u32,
    /// Requests per minute.
    api_rate_limit: u32,
    /// Key clients by forwarded headers instead of the peer address.
    trust_proxy_headers: bool,
}

impl RateLimitState {
    pub fn new(login_rate_limit: u32, api_rate_limit: u32) -> Self {
        Self {
            login_limiters: RwLock::new(HashMap::new()),
            api_limiters: RwLock::new(HashMap::new()),
            login_rate_limit,
            api_rate_limit,
            trust_proxy_headers: false,
        }
    }

    /// Trust `X-Forwarded-For` and `X-Real-IP` for the client address.
    pub fn with_proxy_headers(mut self, trust: bool) -> Self {
        self.trust_proxy_headers = trust;
        self
    }

    /// Get or create a rate limiter for the given IP.
    fn get_or_create_limiter(
        limiters: &LimiterMap,
        ip: &str,
        requests_per_minute: u32,
    ) -> Arc<IpRateLimiter> {
        {
            let read_guard = limiters.read().unwrap_or_else(PoisonError::into_inner);
            if let Some(limiter) = read_guard.get(ip) {
                return limiter.clone();
            }
        }

        let mut write_guard = limiters.write().unwrap_or_else(PoisonError::into_inner);

        // Double-check after acquiring write lock
        if let Some(limiter) = write_guard.get(ip) {
            return limiter.clone();
        }

        let quota =
            Quota::per_minute(NonZeroU32::new(requests_per_minute).unwrap_or(NonZeroU32::MIN));
        let limiter = Arc::new(RateLimiter::direct(quota));
        write_guard.insert(ip.to_string(), limiter.clone());
        limiter
    }

    pub fn check_login(&self, ip: &str) -> bool {
        Self::get_or_create_limiter(&self.login_limiters, ip, self.login_rate_limit)
            .check()
            .is_ok()
    }

    pub fn check_api(&self, ip: &str) -> bool {
        Self::get_or_create_limiter(&self.api_limiters, ip, self.api_rate_limit)
            .check()
            .is_ok()
    }

    /// Drop limiters that are not in use by a request.
    pub fn cleanup(&self) {
        for limiters in [&self.login_limiters, &self.api_limiters] {
            limiters
                .write()
                .unwrap_or_else(PoisonError::into_inner)
                .retain(|_, v| Arc::strong_count(v) > 1);
        }
    }

    /// Number of tracked client addresses (login and API).
    pub fn tracked_clients(&self) -> usize {
        [&self.login_limiters, &self.api_limiters]
            .iter()
            .map(|l| l.read().unwrap_or_else(PoisonError::into_inner).len())
            .sum()
    }

    /// Start a background task to periodically clean up old entries.
    pub fn start_cleanup_task(self: Arc<Self>) {
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_secs(300));
            interval.tick().await;
            loop {
                interval.tick().await;
                self.cleanup();
            }
        });
    }
}

/// Extract client IP from request.
///
/// Proxy headers are read only when `trust_proxy_headers` is set; otherwise
/// the peer address is used.
fn get_client_ip(req: &Request<Body>, trust_proxy_headers: bool) -> String {
    if trust_proxy_headers {
        if let Some(ip) = req
            .headers()
            .get("X-Forwarded-For")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(',').next())
            .map(str::trim)
            .filter(|ip| !ip.is_empty())
        {
            return ip.to_string();
        }

        if let Some(real_ip) = req
            .headers()
            .get("X-Real-IP")
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|ip| !ip.is_empty())
        {
            return real_ip.to_string();
        }
    }

    if let Some(ConnectInfo(addr)) = req.extensions().get::<ConnectInfo<SocketAddr>>() {
        return addr.ip().to_string();
    }

    "unknown".to_string()
}

/// Rate limiting middleware for login and registration.
pub async fn login_rate_limit(
    state: Arc<RateLimitState>,
    req: Request<Body>,
    next: Next,
) -> Response {
    let ip = get_client_ip(&req, state.trust_proxy_headers);

    if !state.check_login(&ip) {
        tracing::warn!(ip = %ip, "Login rate limit exceeded");
        return ApiError::too_many_requests("Too many login attempts. Please try again later.")
            .into_response();
    }

    next.run(req).await
}

/// Rate limiting middleware for the API.
pub async fn api_rate_limit(
    state: Arc<RateLimitState>,
    req: Request<Body>,
    next: Next,
) -> Response {
    let ip = get_client_ip(&req, state.trust_proxy_headers);

    if !state.check_api(&ip) {
        tracing::warn!(ip = %ip, "API rate limit exceeded");
        return ApiError::too_many_requests("Too many requests. Please try again later.")
            .into_response();
    }

    next.run(req).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{http::StatusCode, middleware, routing::get, Router};
    use tower::util::ServiceExt;

    #[test]
    fn test_login_rate_limit() {
        let state = RateLimitState::new(3, 100);

        assert!(state.check_login("127.0.0.1"));
        assert!(state.check_login("127.0.0.1"));
        assert!(state.check_login("127.0.0.1"));
        assert!(!state.check_login("127.0.0.1"));

        // Different IP has its own budget
        assert!(state.check_login("192.168.1.1"));
    }

    #[test]
    fn test_api_and_login_budgets_are_separate() {
        let state = RateLimitState::new(1, 2);
        assert!(state.check_login("10.0.0.1"));
        assert!(!state.check_login("10.0.0.1"));

        assert!(state.check_api("10.0.0.1"));
        assert!(state.check_api("10.0.0.1"));
        assert!(!state.check_api("10.0.0.1"));
    }

    #[test]
    fn test_zero_limit_allows_one() {
        let state = RateLimitState::new(0, 0);
        assert!(state.check_api("10.0.0.2"));
        assert!(!state.check_api("10.0.0.2"));
    }

    #[test]
    fn test_cleanup_drops_idle_limiters() {
        let state = RateLimitState::new(5, 5);
        state.check_login("a");
        state.check_api("b");
        assert_eq!(state.tracked_clients(), 2);
        state.cleanup();
        assert_eq!(state.tracked_clients(), 0);
    }

    fn forwarded(ip: &str) -> Request<Body> {
        Request::builder()
            .uri("/")
            .header("X-Forwarded-For", format!("{ip}, 10.0.0.1"))
            .body(Body::empty())
            .unwrap()
    }

    #[test]
    fn test_client_ip_ignores_proxy_headers_by_default() {
        let mut req = forwarded("203.0.113.9");
        req.extensions_mut()
            .insert(ConnectInfo(SocketAddr::from(([192, 0, 2, 1], 4000))));

        assert_eq!(get_client_ip(&req, false), "192.0.2.1");
        assert_eq!(get_client_ip(&req, true), "203.0.113.9");

        let real_ip = Request::builder()
            .header("X-Real-IP", "198.51.100.7")
            .body(Body::empty())
            .unwrap();
        assert_eq!(get_client_ip(&real_ip, true), "198.51.100.7");
        assert_eq!(get_client_ip(&real_ip, false), "unknown");
    }

    #[tokio::test]
    async fn test_spoofed_forwarded_for_shares_bucket() {
        let state = Arc::new(RateLimitState::new(5, 1));
        let app = Router::new()
            .route("/", get(|| async { "OK" }))
            .layer(middleware::from_fn(move |req, next| {
                api_rate_limit(state.clone(), req, next)
            }));

        let first = app.clone().oneshot(forwarded("203.0.113.1")).await.unwrap();
        assert_eq!(first.status(), StatusCode::OK);

        let second = app.oneshot(forwarded("203.0.113.2")).await.unwrap();
        assert_eq!(second.status(), StatusCode::TOO_MANY_REQUESTS);
    }

    #[tokio::test]
    async fn test_middleware_returns_429() {
        let state = Arc::new(RateLimitState::new(5, 1).with_proxy_headers(true));
        let app = Router::new()
            .route("/", get(|| async { "OK" }))
            .layer(middleware::from_fn(move |req, next| {
                api_rate_limit(state.clone(), req, next)
            }));

        let first = app.clone().oneshot(forwarded("203.0.113.9")).await.unwrap();
        assert_eq!(first.status(), StatusCode::OK);

        let other = app.clone().oneshot(forwarded("203.0.113.10")).await.unwrap();
        assert_eq!(other.status(), StatusCode::OK);

        let second = app.oneshot(forwarded("203.0.113.9")).await.unwrap();
        assert_eq!(second.status(), StatusCode::TOO_MANY_REQUESTS);
    }
}
