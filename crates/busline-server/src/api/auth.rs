//! Driver session extraction and login throttling.

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use axum::{
    async_trait,
    extract::{ConnectInfo, FromRequestParts, Request, State},
    http::{request::Parts, HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use busline_core::Session;
use chrono::Utc;
use dashmap::DashMap;
use tracing::warn;

use crate::api::error::ApiError;
use crate::state::AppState;

/// Name of the cookie carrying the session token.
pub const SESSION_COOKIE: &str = "busline_session";

/// A live driver session, pulled from the session cookie.
///
/// Rejects with `401 {"error": "Not authenticated"}` when the cookie is
/// missing, unknown, or expired.
#[derive(Debug, Clone)]
pub struct DriverSession(pub Session);

#[async_trait]
impl FromRequestParts<Arc<AppState>> for DriverSession {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let jar = CookieJar::from_headers(&parts.headers);
        let token = jar.get(SESSION_COOKIE).map(|cookie| cookie.value());
        let session = state.authenticate(token, Utc::now())?;
        Ok(Self(session))
    }
}

/// Session cookie issued on login. No max-age: it lives for the browser
/// session, and the server-side TTL bounds it regardless.
pub fn session_cookie(token: String, secure: bool) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, token))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(secure)
        .build()
}

/// Removal cookie matching `session_cookie`'s path.
pub fn expired_session_cookie() -> Cookie<'static> {
    Cookie::build(SESSION_COOKIE).path("/").build()
}

/// Per-IP sliding-window limiter for login attempts.
#[derive(Clone)]
pub struct RateLimiter {
    hits: Arc<DashMap<String, Vec<Instant>>>,
    last_sweep: Arc<Mutex<Instant>>,
    sweep_every: Duration,
    window: Duration,
    max_per_window: u32,
    enabled: bool,
    trust_proxy: bool,
}

impl RateLimiter {
    pub fn new(max_rps: u32, enabled: bool, trust_proxy: bool) -> Self {
        Self {
            hits: Arc::new(DashMap::new()),
            last_sweep: Arc::new(Mutex::new(Instant::now())),
            sweep_every: Duration::from_secs(60),
            window: Duration::from_secs(1),
            max_per_window: max_rps,
            enabled,
            trust_proxy,
        }
    }

    /// Record an attempt from `client`; false when it is over the limit.
    pub fn check(&self, client: &str) -> bool {
        if !self.enabled {
            return true;
        }

        let now = Instant::now();
        if self.sweep_due(now) {
            let window = self.window;
            self.hits
                .retain(|_, stamps| stamps.iter().any(|t| now.duration_since(*t) < window));
        }

        let mut entry = self.hits.entry(client.to_string()).or_default();
        let stamps = entry.value_mut();
        stamps.retain(|t| now.duration_since(*t) < self.window);

        if stamps.len() < self.max_per_window as usize {
            stamps.push(now);
            true
        } else {
            false
        }
    }

    fn sweep_due(&self, now: Instant) -> bool {
        let Ok(mut last) = self.last_sweep.lock() else {
            return false;
        };
        if now.duration_since(*last) >= self.sweep_every {
            *last = now;
            true
        } else {
            false
        }
    }

    /// Client address: first `X-Forwarded-For` hop when proxies are
    /// trusted, otherwise the socket peer.
    fn client_of(&self, headers: &HeaderMap, peer: Option<SocketAddr>) -> String {
        let forwarded = self
            .trust_proxy
            .then(|| headers.get("X-Forwarded-For"))
            .flatten()
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(',').next())
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty());

        forwarded
            .or_else(|| peer.map(|addr| addr.ip().to_string()))
            .unwrap_or_else(|| "unknown".to_string())
    }
}

/// Middleware rejecting clients that exceed the login rate.
pub async fn rate_limit(
    State(limiter): State<RateLimiter>,
    request: Request,
    next: Next,
) -> Response {
    let peer = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|info| info.0);
    let client = limiter.client_of(request.headers(), peer);

    if limiter.check(&client) {
        return next.run(request).await;
    }

    warn!("Login rate limit exceeded for {}", client);
    (
        StatusCode::TOO_MANY_REQUESTS,
        Json(serde_json::json!({
            "error": "Rate limit exceeded",
            "retry_after": "1 second"
        })),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn limiter_caps_attempts_per_client() {
        let limiter = RateLimiter::new(2, true, false);

        assert!(limiter.check("10.0.0.1"));
        assert!(limiter.check("10.0.0.1"));
        assert!(!limiter.check("10.0.0.1"));
        assert!(limiter.check("10.0.0.2"));
    }

    #[test]
    fn disabled_limiter_allows_everything() {
        let limiter = RateLimiter::new(0, false, false);
        for _ in 0..10 {
            assert!(limiter.check("10.0.0.1"));
        }
    }

    #[test]
    fn forwarded_header_only_counts_when_trusted() {
        let mut headers = HeaderMap::new();
        headers.insert("X-Forwarded-For", "203.0.113.9, 10.0.0.1".parse().unwrap());
        let peer: SocketAddr = "192.0.2.1:5555".parse().unwrap();

        let trusting = RateLimiter::new(1, true, true);
        assert_eq!(trusting.client_of(&headers, Some(peer)), "203.0.113.9");

        let strict = RateLimiter::new(1, true, false);
        assert_eq!(strict.client_of(&headers, Some(peer)), "192.0.2.1");
        assert_eq!(strict.client_of(&headers, None), "unknown");
    }

    #[test]
    fn session_cookie_is_http_only_and_site_wide() {
        let cookie = session_cookie("abc".to_string(), true);
        assert_eq!(cookie.name(), SESSION_COOKIE);
        assert_eq!(cookie.value(), "abc");
        assert_eq!(cookie.path(), Some("/"));
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.secure(), Some(true));
        assert_eq!(cookie.same_site(), Some(SameSite::Lax));
    }
}
