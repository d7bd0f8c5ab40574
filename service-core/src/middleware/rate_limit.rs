use crate::error::AppError;
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use governor::{
    clock::{Clock, DefaultClock},
    state::{InMemoryState, NotKeyed},
    Quota, RateLimiter,
};
use std::{num::NonZeroU32, sync::Arc, time::Duration};

/// Process-wide rate limiter applied to the whole API surface.
pub type ApiRateLimiter = Arc<RateLimiter<NotKeyed, InMemoryState, DefaultClock>>;

/// Create an unkeyed rate limiter enforcing a per-minute ceiling.
pub fn per_minute_rate_limiter(ceiling: u32) -> ApiRateLimiter {
    let ceiling = ceiling.max(1);
    let period = Duration::from_millis(60_000 / ceiling as u64);
    let quota = Quota::with_period(period)
        .expect("Failed to create quota with valid period")
        .allow_burst(NonZeroU32::new(ceiling).expect("ceiling is guaranteed to be non-zero"));

    Arc::new(RateLimiter::direct(quota))
}

/// Middleware enforcing the configured request ceiling.
pub async fn rate_limit_middleware(
    State(limiter): State<ApiRateLimiter>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    match limiter.check() {
        Ok(_) => Ok(next.run(request).await),
        Err(negative) => {
            let wait_time = negative.wait_time_from(DefaultClock::default().now());
            Err(AppError::TooManyRequests(
                "Too many requests. Please try again later.".to_string(),
                Some(wait_time.as_secs()),
            ))
        }
    }
}
