use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

use governor::clock::DefaultClock;
use governor::state::direct::NotKeyed;
use governor::state::InMemoryState;
use governor::{Quota, RateLimiter};

use crate::policy::{JitterPolicy, QuotaPolicy};

/// Per-task politeness gate: a random jitter pause followed by an optional
/// shared request quota.
#[derive(Clone)]
pub struct RequestThrottle {
    jitter: JitterPolicy,
    limiter: Option<Arc<DirectRateLimiter>>,
}

type DirectRateLimiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

impl RequestThrottle {
    pub fn new(jitter: JitterPolicy, quota: Option<QuotaPolicy>) -> Self {
        Self {
            jitter,
            limiter: quota.map(|quota| Arc::new(RateLimiter::direct(quota_from_policy(quota)))),
        }
    }

    pub fn unthrottled() -> Self {
        Self::new(JitterPolicy::none(), None)
    }

    /// Suspends the calling task until it may issue its request.
    /// Returns the jitter that was applied.
    pub async fn wait(&self) -> Duration {
        let delay = self.jitter.sample();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        if let Some(limiter) = &self.limiter {
            limiter.until_ready().await;
        }
        delay
    }

    pub fn has_quota(&self) -> bool {
        self.limiter.is_some()
    }
}

fn quota_from_policy(policy: QuotaPolicy) -> Quota {
    let safe_limit = policy.limit.max(1);
    let burst = NonZeroU32::new(safe_limit).unwrap_or(NonZeroU32::MIN);

    let seconds_per_cell = (policy.window.as_secs_f64() / f64::from(safe_limit)).max(0.001);
    let period = Duration::from_secs_f64(seconds_per_cell);

    Quota::with_period(period)
        .map(|quota| quota.allow_burst(burst))
        .unwrap_or_else(|| Quota::per_minute(burst))
}
