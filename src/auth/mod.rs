//! API-key authentication and request rate limiting for the `/api` scope.

pub mod api_key;
pub mod middleware;
pub mod rate_limit;

pub use middleware::{authorize, extract_api_key, require_api_key, AuthError};
pub use rate_limit::{enforce_rate_limit, RateDecision, RateLimiter};

#[cfg(test)]
mod tests;
