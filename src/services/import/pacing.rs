use std::time::Duration;

use crate::config::{DeliveryConfig, ResolverConfig};
use governor::{
    Quota, RateLimiter, clock::DefaultClock, state::InMemoryState, state::direct::NotKeyed,
};

type DirectRateLimiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

/// Spaces out remote calls so a run stays under the service's informal rate limit.
///
/// Each endpoint gets its own single-cell bucket: two consecutive calls to the same
/// endpoint are at least `period` apart. A zero period disables pacing for that endpoint.
pub struct Pacer {
    search: Option<DirectRateLimiter>,
    delivery: Option<DirectRateLimiter>,
}

fn limiter(period: Duration) -> Option<DirectRateLimiter> {
    Quota::with_period(period).map(RateLimiter::direct)
}

impl Pacer {
    pub fn new(search_period: Duration, delivery_period: Duration) -> Self {
        Self {
            search: limiter(search_period),
            delivery: limiter(delivery_period),
        }
    }

    pub fn from_config(resolver: &ResolverConfig, delivery: &DeliveryConfig) -> Self {
        Self::new(
            Duration::from_millis(resolver.search_delay_ms),
            Duration::from_millis(delivery.batch_delay_ms),
        )
    }

    #[cfg(test)]
    pub fn unpaced() -> Self {
        Self::new(Duration::ZERO, Duration::ZERO)
    }

    /// Wait until the next search call is allowed.
    pub async fn before_search(&self) {
        if let Some(limiter) = &self.search {
            log::trace!("Waiting for search rate limiter");
            limiter.until_ready().await;
        }
    }

    /// Wait until the next batch delivery call is allowed.
    pub async fn before_delivery(&self) {
        if let Some(limiter) = &self.delivery {
            log::trace!("Waiting for delivery rate limiter");
            limiter.until_ready().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    #[tokio::test]
    async fn test_consecutive_calls_are_spaced() {
        let pacer = Pacer::new(Duration::from_millis(30), Duration::ZERO);

        let start = Instant::now();
        for _ in 0..3 {
            pacer.before_search().await;
        }

        // First call passes immediately, the next two wait one period each
        assert!(start.elapsed() >= Duration::from_millis(55));
    }

    #[tokio::test]
    async fn test_endpoints_are_paced_independently() {
        let pacer = Pacer::new(Duration::from_secs(60), Duration::ZERO);

        pacer.before_search().await;
        let start = Instant::now();
        for _ in 0..5 {
            pacer.before_delivery().await;
        }
        assert!(start.elapsed() < Duration::from_secs(1));
    }

    #[tokio::test]
    async fn test_unpaced_does_not_wait() {
        let pacer = Pacer::unpaced();

        let start = Instant::now();
        for _ in 0..10 {
            pacer.before_search().await;
            pacer.before_delivery().await;
        }
        assert!(start.elapsed() < Duration::from_millis(50));
    }
}
