//! Login rate limiting.

use axum::{
    body::Body,
    extract::ConnectInfo,
    http::Request,
    middleware::Next,
    response::{IntoResponse, Response},
};
use governor::{DefaultKeyedRateLimiter, Quota, RateLimiter};
use std::{net::SocketAddr, num::NonZeroU32, sync::Arc, time::Duration};

use crate::web::error::ApiError;

/// Per-client login attempt limiter.
///
/// Clients are keyed by socket address. `X-Forwarded-For` and `X-Real-IP`
/// are only consulted when proxy headers are trusted.
pub struct LoginRateLimiter {
    limiter: DefaultKeyedRateLimiter<String>,
    trust_proxy_headers: bool,
}

impl LoginRateLimiter {
    /// Allow `per_minute` attempts per client; zero is treated as one.
    pub fn new(per_minute: u32) -> Self {
        let quota = Quota::per_minute(NonZeroU32::new(per_minute).unwrap_or(NonZeroU32::MIN));
        Self {
            limiter: RateLimiter::keyed(quota),
            trust_proxy_headers: false,
        }
    }

    /// Key clients by forwarded headers when present. Only enable this
    /// behind a reverse proxy that overwrites them.
    pub fn trust_proxy_headers(mut self, trust: bool) -> Self {
        self.trust_proxy_headers = trust;
        self
    }

    /// Record an attempt from `client`, returning whether it is allowed.
    pub fn check(&self, client: &str) -> bool {
        self.limiter.check_key(&client.to_string()).is_ok()
    }

    /// Drop state for clients whose quota has fully replenished.
    pub fn cleanup(&self) {
        self.limiter.retain_recent();
        self.limiter.shrink_to_fit();
    }

    /// Periodically clean up idle clients.
    pub fn start_cleanup_task(self: Arc<Self>) {
        tokio::spawn(async move {
            loop {
                tokio::time::sleep(Duration::from_secs(300)).await;
                self.cleanup();
            }
        });
    }
}

/// Extract client IP from request.
fn get_client_ip(req: &Request<Body>, trust_proxy_headers: bool) -> String {
    if trust_proxy_headers {
        // First hop of a reverse proxy chain
        if let Some(forwarded) = req
            .headers()
            .get("X-Forwarded-For")
            .and_then(|v| v.to_str().ok())
        {
            if let Some(ip) = forwarded.split(',').next() {
                return ip.trim().to_string();
            }
        }

        if let Some(real_ip) = req
            .headers()
            .get("X-Real-IP")
            .and_then(|v| v.to_str().ok())
        {
            return real_ip.to_string();
        }
    }

    if let Some(ConnectInfo(addr)) = req.extensions().get::<ConnectInfo<SocketAddr>>() {
        return addr.ip().to_string();
    }

    "unknown".to_string()
}

/// Rate limiting middleware for the login endpoint.
pub async fn login_rate_limit(
    limiter: Arc<LoginRateLimiter>,
    req: Request<Body>,
    next: Next,
) -> Response {
    let ip = get_client_ip(&req, limiter.trust_proxy_headers);

    if !limiter.check(&ip) {
        tracing::warn!(ip = %ip, "Login rate limit exceeded");
        return ApiError::too_many_requests("Too many login attempts. Please try again later.")
            .into_response();
    }

    next.run(req).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_login_rate_limit() {
        let limiter = LoginRateLimiter::new(3);

        assert!(limiter.check("127.0.0.1"));
        assert!(limiter.check("127.0.0.1"));
        assert!(limiter.check("127.0.0.1"));
        assert!(!limiter.check("127.0.0.1"));

        // Separate budget per client
        assert!(limiter.check("192.168.1.1"));
    }

    #[test]
    fn test_zero_limit_allows_one() {
        let limiter = LoginRateLimiter::new(0);
        assert!(limiter.check("10.0.0.1"));
        assert!(!limiter.check("10.0.0.1"));
    }

    fn forwarded_request(peer: &str) -> Request<Body> {
        let mut req = Request::builder()
            .header("X-Forwarded-For", "203.0.113.7, 10.0.0.1")
            .header("X-Real-IP", "198.51.100.2")
            .body(Body::empty())
            .unwrap();
        let addr: SocketAddr = peer.parse().unwrap();
        req.extensions_mut().insert(ConnectInfo(addr));
        req
    }

    #[test]
    fn test_client_ip_ignores_headers_by_default() {
        let req = forwarded_request("192.0.2.10:50000");
        assert_eq!(get_client_ip(&req, false), "192.0.2.10");

        let req = Request::builder()
            .header("X-Forwarded-For", "203.0.113.7")
            .body(Body::empty())
            .unwrap();
        assert_eq!(get_client_ip(&req, false), "unknown");
    }

    #[test]
    fn test_client_ip_from_trusted_headers() {
        let req = forwarded_request("192.0.2.10:50000");
        assert_eq!(get_client_ip(&req, true), "203.0.113.7");

        let mut req = Request::builder()
            .header("X-Real-IP", "198.51.100.2")
            .body(Body::empty())
            .unwrap();
        req.extensions_mut()
            .insert(ConnectInfo("192.0.2.10:50000".parse::<SocketAddr>().unwrap()));
        assert_eq!(get_client_ip(&req, true), "198.51.100.2");

        let req = Request::builder().body(Body::empty()).unwrap();
        assert_eq!(get_client_ip(&req, true), "unknown");
    }
}
