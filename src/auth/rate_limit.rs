//! Fixed-window request limiter.
//!
//! One counter per caller, keyed by API key once it matches the configured key
//! and by peer address otherwise. Windows live in a moka cache whose time-to-live equals
//! the window length, so an expired window simply disappears and the next
//! request opens a fresh one.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use actix_web::body::{BoxBody, MessageBody};
use actix_web::dev::{ServiceRequest, ServiceResponse};
use actix_web::http::header::{HeaderName, HeaderValue};
use actix_web::middleware::Next;
use actix_web::{web, Error, ResponseError};
use moka::future::Cache;

use super::middleware::{authorize, extract_api_key};
use crate::error::AppError;
use crate::AppState;

const MAX_TRACKED_CALLERS: u64 = 100_000;

struct Window {
    started: Instant,
    count: AtomicU32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateDecision {
    Allowed { limit: u32, remaining: u32 },
    Limited { retry_after: Duration },
}

#[derive(Clone)]
pub struct RateLimiter {
    windows: Cache<String, Arc<Window>>,
    window: Duration,
    max_requests: u32,
}

impl RateLimiter {
    pub fn new(window: Duration, max_requests: u32) -> Self {
        let windows = Cache::builder()
            .time_to_live(window)
            .max_capacity(MAX_TRACKED_CALLERS)
            .build();
        Self {
            windows,
            window,
            max_requests,
        }
    }

    /// Count one request for `caller`.
    pub async fn check(&self, caller: &str) -> RateDecision {
        let window = self
            .windows
            .get_with(caller.to_string(), async {
                Arc::new(Window {
                    started: Instant::now(),
                    count: AtomicU32::new(0),
                })
            })
            .await;

        let count = window.count.fetch_add(1, Ordering::SeqCst).saturating_add(1);
        if count > self.max_requests {
            RateDecision::Limited {
                retry_after: self.window.saturating_sub(window.started.elapsed()),
            }
        } else {
            RateDecision::Allowed {
                limit: self.max_requests,
                remaining: self.max_requests - count,
            }
        }
    }
}

/// Unverified keys fall back to the peer address so made-up keys share one window.
fn caller_key(req: &ServiceRequest, expected: Option<&str>) -> String {
    match extract_api_key(req.request()) {
        Some(key) if authorize(Some(&key), expected).is_ok() => format!("key:{}", key),
        _ => format!(
            "ip:{}",
            req.peer_addr()
                .map(|addr| addr.ip().to_string())
                .unwrap_or_else(|| "unknown".to_string())
        ),
    }
}

pub async fn enforce_rate_limit(
    req: ServiceRequest,
    next: Next<impl MessageBody + 'static>,
) -> Result<ServiceResponse<BoxBody>, Error> {
    let Some(state) = req.app_data::<web::Data<AppState>>().cloned() else {
        return next.call(req).await.map(ServiceResponse::map_into_boxed_body);
    };

    let caller = caller_key(&req, state.config.api_key.as_deref());
    match state.rate_limiter.check(&caller).await {
        RateDecision::Limited { retry_after } => {
            log::warn!("Rate limit exceeded for {}", req.path());
            let error = AppError::RateLimited {
                retry_after_secs: retry_after.as_secs().max(1),
            };
            Ok(req.into_response(error.error_response()))
        }
        RateDecision::Allowed { limit, remaining } => {
            let mut res = next.call(req).await?.map_into_boxed_body();
            let headers = res.headers_mut();
            headers.insert(
                HeaderName::from_static("ratelimit-limit"),
                HeaderValue::from(limit),
            );
            headers.insert(
                HeaderName::from_static("ratelimit-remaining"),
                HeaderValue::from(remaining),
            );
            Ok(res)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::test::TestRequest;

    fn request_from(peer: &str, key: Option<&str>) -> ServiceRequest {
        let mut req = TestRequest::get()
            .uri("/api/templates")
            .peer_addr(peer.parse().unwrap());
        if let Some(key) = key {
            req = req.insert_header(("x-api-key", key));
        }
        req.to_srv_request()
    }

    #[test]
    fn test_only_accepted_keys_get_their_own_window() {
        let expected = Some("html2pdf_secret");
        assert_eq!(
            caller_key(&request_from("10.0.0.9:4000", Some("html2pdf_secret")), expected),
            "key:html2pdf_secret"
        );
        assert_eq!(
            caller_key(&request_from("10.0.0.9:4000", Some("made-up")), expected),
            "ip:10.0.0.9"
        );
        assert_eq!(caller_key(&request_from("10.0.0.9:4001", None), expected), "ip:10.0.0.9");
        assert_eq!(
            caller_key(&request_from("10.0.0.9:4000", Some("html2pdf_secret")), None),
            "ip:10.0.0.9"
        );
    }

    #[tokio::test]
    async fn test_requests_beyond_max_are_limited() {
        let limiter = RateLimiter::new(Duration::from_secs(60), 2);
        assert_eq!(
            limiter.check("a").await,
            RateDecision::Allowed { limit: 2, remaining: 1 }
        );
        assert_eq!(
            limiter.check("a").await,
            RateDecision::Allowed { limit: 2, remaining: 0 }
        );
        match limiter.check("a").await {
            RateDecision::Limited { retry_after } => assert!(retry_after <= Duration::from_secs(60)),
            other => panic!("expected limit, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_callers_are_counted_separately() {
        let limiter = RateLimiter::new(Duration::from_secs(60), 1);
        assert!(matches!(limiter.check("a").await, RateDecision::Allowed { .. }));
        assert!(matches!(limiter.check("b").await, RateDecision::Allowed { .. }));
        assert!(matches!(limiter.check("a").await, RateDecision::Limited { .. }));
    }

    #[tokio::test]
    async fn test_window_expiry_resets_the_count() {
        let limiter = RateLimiter::new(Duration::from_millis(50), 1);
        assert!(matches!(limiter.check("a").await, RateDecision::Allowed { .. }));
        assert!(matches!(limiter.check("a").await, RateDecision::Limited { .. }));
        tokio::time::sleep(Duration::from_millis(120)).await;
        assert!(matches!(limiter.check("a").await, RateDecision::Allowed { .. }));
    }

    #[tokio::test]
    async fn test_concurrent_increments_are_not_lost() {
        let limiter = RateLimiter::new(Duration::from_secs(60), 1_000);
        let tasks: Vec<_> = (0..50)
            .map(|_| {
                let limiter = limiter.clone();
                tokio::spawn(async move { limiter.check("shared").await })
            })
            .collect();
        for task in tasks {
            task.await.unwrap();
        }
        assert_eq!(
            limiter.check("shared").await,
            RateDecision::Allowed { limit: 1_000, remaining: 1_000 - 51 }
        );
    }
}
