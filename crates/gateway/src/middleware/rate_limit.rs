//! Rate limiting middleware using token bucket algorithm

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use governor::{
    clock::QuantaClock,
    state::{InMemoryState, NotKeyed},
    Quota, RateLimiter,
};
use pdfintellect_common::errors::AppError;
use std::num::NonZeroU32;
use std::sync::Arc;

/// Rate limiter using governor crate
pub type GlobalRateLimiter = RateLimiter<NotKeyed, InMemoryState, QuantaClock>;

/// Service-wide limiter and the quota it enforces
pub struct RateLimit {
    limiter: GlobalRateLimiter,
    requests_per_minute: u32,
}

impl RateLimit {
    pub fn check(&self) -> Result<(), AppError> {
        self.limiter.check().map_err(|_| AppError::RateLimited {
            limit: self.requests_per_minute,
        })
    }
}

/// Create a new rate limiter; a zero quota means no limit
pub fn create_rate_limiter(requests_per_minute: u32, burst: u32) -> Option<Arc<RateLimit>> {
    let per_minute = NonZeroU32::new(requests_per_minute)?;
    let burst = NonZeroU32::new(burst).unwrap_or(per_minute);
    let quota = Quota::per_minute(per_minute).allow_burst(burst);

    Some(Arc::new(RateLimit {
        limiter: RateLimiter::direct(quota),
        requests_per_minute,
    }))
}

/// Rate limiting middleware
pub async fn rate_limit_middleware(
    State(limit): State<Arc<RateLimit>>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    if let Err(e) = limit.check() {
        tracing::warn!(path = %request.uri().path(), "Rate limit exceeded");
        return Err(e);
    }
    Ok(next.run(request).await)
}
