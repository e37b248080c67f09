//! Per-client request rate limiting.

use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::num::NonZeroU32;
use std::sync::Arc;

use axum::extract::{ConnectInfo, Request, State};
use axum::middleware::Next;
use axum::response::Response;
use governor::{DefaultKeyedRateLimiter, Quota, RateLimiter};
use tracing::warn;

use crate::ApiError;

/// Token bucket per client IP address.
///
/// Clones share the same buckets.
#[derive(Clone)]
pub struct Throttle {
    limiter: Arc<DefaultKeyedRateLimiter<IpAddr>>,
    burst: NonZeroU32,
    rate: NonZeroU32,
}

impl Throttle {
    /// Allow `burst` requests at once, refilled at `rate` requests per
    /// second.
    #[must_use]
    pub fn new(burst: NonZeroU32, rate: NonZeroU32) -> Self {
        let quota = Quota::per_second(rate).allow_burst(burst);
        Self {
            limiter: Arc::new(RateLimiter::keyed(quota)),
            burst,
            rate,
        }
    }

    /// Sustained requests per second.
    #[must_use]
    pub const fn rate(&self) -> NonZeroU32 {
        self.rate
    }

    /// Take one request from the bucket of `ip`.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Throttled`] if the bucket is empty.
    pub fn check(&self, ip: IpAddr) -> Result<(), ApiError> {
        self.limiter.check_key(&ip).map_err(|_| ApiError::Throttled {
            rate: self.rate.get(),
        })
    }
}

impl fmt::Debug for Throttle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Throttle")
            .field("burst", &self.burst)
            .field("rate", &self.rate)
            .finish_non_exhaustive()
    }
}

/// Refuse requests from clients that are over their rate.
///
/// Requests without a known peer address are not limited.
///
/// # Errors
///
/// Fails with [`ApiError::Throttled`] (429) once the client's bucket is empty.
pub async fn limit_requests(
    State(throttle): State<Throttle>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let peer = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip());

    if let Some(ip) = peer {
        throttle.check(ip).inspect_err(|_| {
            warn!(%ip, uri = %request.uri(), "limit_requests: throttled");
        })?;
    }

    Ok(next.run(request).await)
}
