//! Tunable politeness and normalization policy.
//!
//! The defaults describe a polite daily harvest: seven in-flight
//! requests, a uniform 2–3 s pause before each call, a 10 s request timeout,
//! and the national passenger carrier as the only allowed carrier.

use std::time::Duration;

use crate::ValidationError;

/// Label the provider data uses for "train does not run".
pub const NO_SERVICE_LABEL: &str = "Поезд не курсирует";

/// Carrier name of the national long-distance passenger operator.
pub const NATIONAL_CARRIER: &str = "ФПК";

#[derive(Debug, Clone, PartialEq)]
pub struct HarvestPolicy {
    pub max_concurrency: usize,
    pub jitter: JitterPolicy,
    pub quota: Option<QuotaPolicy>,
    pub request_timeout: Duration,
}

/// Uniform delay distribution applied before every upstream call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JitterPolicy {
    pub min_delay: Duration,
    pub max_delay: Duration,
}

/// Request budget of `limit` calls per `window`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuotaPolicy {
    pub window: Duration,
    pub limit: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlattenPolicy {
    /// A car group is kept iff its first carrier is in this list.
    pub carrier_allow_list: Vec<String>,
    pub no_service_label: String,
    pub no_service_price: i64,
    pub no_service_cost: i64,
}

impl Default for HarvestPolicy {
    fn default() -> Self {
        Self {
            max_concurrency: 7,
            jitter: JitterPolicy::default(),
            quota: None,
            request_timeout: Duration::from_secs(10),
        }
    }
}

impl HarvestPolicy {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.max_concurrency == 0 {
            return Err(ValidationError::ZeroConcurrency);
        }
        self.jitter.validate()?;
        if let Some(quota) = &self.quota {
            quota.validate()?;
        }
        Ok(())
    }

    pub fn request_timeout_ms(&self) -> u64 {
        duration_ms(self.request_timeout)
    }
}

impl Default for JitterPolicy {
    fn default() -> Self {
        Self {
            min_delay: Duration::from_secs(2),
            max_delay: Duration::from_secs(3),
        }
    }
}

impl JitterPolicy {
    pub const fn none() -> Self {
        Self {
            min_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
        }
    }

    pub fn from_millis(min_ms: u64, max_ms: u64) -> Result<Self, ValidationError> {
        let policy = Self {
            min_delay: Duration::from_millis(min_ms),
            max_delay: Duration::from_millis(max_ms),
        };
        policy.validate()?;
        Ok(policy)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.min_delay > self.max_delay {
            return Err(ValidationError::InvertedJitter {
                min_ms: duration_ms(self.min_delay),
                max_ms: duration_ms(self.max_delay),
            });
        }
        Ok(())
    }

    /// Draws a delay uniformly from `[min_delay, max_delay]` at millisecond resolution.
    pub fn sample(&self) -> Duration {
        let min_ms = duration_ms(self.min_delay);
        let max_ms = duration_ms(self.max_delay).max(min_ms);
        if min_ms == max_ms {
            return self.min_delay;
        }
        Duration::from_millis(fastrand::u64(min_ms..=max_ms))
    }
}

impl QuotaPolicy {
    pub fn per_minute(limit: u32) -> Self {
        Self {
            window: Duration::from_secs(60),
            limit,
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.limit == 0 {
            return Err(ValidationError::ZeroQuota);
        }
        Ok(())
    }
}

impl Default for FlattenPolicy {
    fn default() -> Self {
        Self {
            carrier_allow_list: vec![
                String::from(NATIONAL_CARRIER),
                String::from(NO_SERVICE_LABEL),
            ],
            no_service_label: String::from(NO_SERVICE_LABEL),
            no_service_price: 3_000_000,
            no_service_cost: 0,
        }
    }
}

impl FlattenPolicy {
    /// Replaces the allow-list; the no-service label stays allowed.
    pub fn with_carriers<I, S>(mut self, carriers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.carrier_allow_list = carriers.into_iter().map(Into::into).collect();
        self.allow_no_service_label();
        self
    }

    pub fn with_no_service(mut self, label: impl Into<String>, price: i64) -> Self {
        let label = label.into();
        self.carrier_allow_list
            .retain(|carrier| *carrier != self.no_service_label);
        self.no_service_label = label;
        self.no_service_price = price;
        self.allow_no_service_label();
        self
    }

    fn allow_no_service_label(&mut self) {
        if !self.allows_carrier(Some(&self.no_service_label)) {
            self.carrier_allow_list.push(self.no_service_label.clone());
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.carrier_allow_list.is_empty() {
            return Err(ValidationError::EmptyCarrierAllowList);
        }
        Ok(())
    }

    pub fn allows_carrier(&self, carrier: Option<&str>) -> bool {
        carrier.is_some_and(|carrier| {
            self.carrier_allow_list
                .iter()
                .any(|allowed| allowed == carrier)
        })
    }
}

fn duration_ms(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}
