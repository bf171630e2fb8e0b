use std::time::Duration;

use governor::clock::DefaultClock;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter};

type Limiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

/// Spaces sequential store requests at least `period` apart.
/// A zero period disables pacing.
pub struct RequestPacer {
    limiter: Option<Limiter>,
}

impl RequestPacer {
    pub fn new(period: Duration) -> Self {
        Self {
            limiter: Quota::with_period(period).map(RateLimiter::direct),
        }
    }

    pub fn unpaced() -> Self {
        Self { limiter: None }
    }

    pub async fn ready(&self) {
        if let Some(ref limiter) = self.limiter {
            limiter.until_ready().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    #[test]
    fn test_zero_period_does_not_wait() {
        let pacer = RequestPacer::new(Duration::ZERO);
        let start = Instant::now();
        tokio_test::block_on(async {
            for _ in 0..5 {
                pacer.ready().await;
            }
        });
        assert!(start.elapsed() < Duration::from_millis(50));
    }

    #[test]
    fn test_unpaced_is_immediately_ready() {
        let pacer = RequestPacer::unpaced();
        tokio_test::assert_ready!(tokio_test::task::spawn(pacer.ready()).poll());
    }

    #[tokio::test]
    async fn test_period_spaces_requests() {
        let pacer = RequestPacer::new(Duration::from_millis(40));
        let start = Instant::now();
        for _ in 0..3 {
            pacer.ready().await;
        }
        // First request is immediate, the next two wait one period each.
        assert!(start.elapsed() >= Duration::from_millis(70));
    }
}
