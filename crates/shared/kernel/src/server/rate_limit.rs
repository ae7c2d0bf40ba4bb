use super::{ApiError, RequesterContext};
use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::Response;
use dfort_domain::config::RateLimitConfig;
use moka::sync::Cache;
use std::borrow::Cow;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

const GENERAL_MESSAGE: &str = "Too many requests. Please try again later.";
const AUTH_MESSAGE: &str = "Too many authentication attempts. Please try again in 15 minutes.";

/// Key for callers whose address the transport did not expose.
const UNKNOWN_CLIENT: &str = "unknown";

#[derive(Debug)]
struct RateLimiterInner {
    windows: Cache<String, Arc<AtomicU32>>,
    max_requests: u32,
    message: Cow<'static, str>,
}

/// Fixed-window request counter keyed by client address.
///
/// A window opens on a client's first request and lasts `window` regardless of traffic: the
/// counter lives in a cache entry whose time-to-live is the window length, and increments never
/// re-insert the entry.
#[derive(Debug, Clone)]
pub struct RateLimiter {
    inner: Arc<RateLimiterInner>,
}

impl RateLimiter {
    #[must_use]
    pub fn new(max_requests: u32, window: Duration, message: impl Into<Cow<'static, str>>) -> Self {
        let windows = Cache::builder().time_to_live(window).max_capacity(100_000).build();
        Self {
            inner: Arc::new(RateLimiterInner { windows, max_requests, message: message.into() }),
        }
    }

    /// Budget for every `/api` route.
    #[must_use]
    pub fn general(config: &RateLimitConfig) -> Self {
        Self::new(config.max_requests, Duration::from_secs(config.window_seconds), GENERAL_MESSAGE)
    }

    /// Tighter budget for the routes that accept passwords and tokens.
    #[must_use]
    pub fn auth(config: &RateLimitConfig) -> Self {
        let window = Duration::from_secs(config.window_seconds);
        Self::new(config.auth_max_requests, window, AUTH_MESSAGE)
    }

    /// Counts one request for `client`.
    ///
    /// # Errors
    /// [`ApiError::RateLimited`] once the client exceeded its budget for the current window.
    pub fn check(&self, client: &str) -> Result<(), ApiError> {
        let counter = self.inner.windows.get_with_by_ref(client, || Arc::new(AtomicU32::new(0)));
        let seen = counter.fetch_add(1, Ordering::Relaxed).saturating_add(1);

        if seen > self.inner.max_requests {
            return Err(ApiError::RateLimited {
                message: self.inner.message.clone(),
                context: Some(format!("client {client}").into()),
            });
        }
        Ok(())
    }
}

/// Middleware for `axum::middleware::from_fn_with_state`.
///
/// # Errors
/// [`ApiError::RateLimited`] when the caller is over budget; the request never reaches the router.
pub async fn enforce_rate_limit(
    State(limiter): State<RateLimiter>,
    req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let requester = RequesterContext::from_extensions_and_headers(req.extensions(), req.headers());
    limiter.check(requester.ip_address.as_deref().unwrap_or(UNKNOWN_CLIENT))?;
    Ok(next.run(req).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn budget_is_per_client() {
        let limiter = RateLimiter::new(2, Duration::from_secs(60), "slow down");

        assert!(limiter.check("10.0.0.1").is_ok());
        assert!(limiter.check("10.0.0.1").is_ok());
        let err = limiter.check("10.0.0.1").unwrap_err();
        assert_eq!(err.message(), "slow down");

        assert!(limiter.check("10.0.0.2").is_ok());
    }

    #[test]
    fn window_expiry_resets_the_counter() {
        let limiter = RateLimiter::new(1, Duration::from_millis(50), "slow down");

        assert!(limiter.check("client").is_ok());
        assert!(limiter.check("client").is_err());

        std::thread::sleep(Duration::from_millis(120));
        assert!(limiter.check("client").is_ok());
    }
}
