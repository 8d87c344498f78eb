//! Leaky-bucket rate prediction.
//!
//! A [`Limiter`] answers "would this call be throttled right now?" before any
//! request goes out. It does no I/O and holds no locks; the request pipeline
//! owns every limiter behind its exclusion gate.

use crate::error::{Error, Result};
use std::time::Duration;
use tokio::time::Instant;

/// Leaky-bucket predictor for one rate-limited endpoint.
///
/// The bucket holds up to `rate` tokens. One token leaks back every
/// `per / rate`, and a full window without activity refills it completely.
///
/// ```
/// use battlemetrics::limiter::Limiter;
/// use std::time::Duration;
/// use tokio::time::Instant;
///
/// let mut bucket = Limiter::new(1, Duration::from_secs(1)).unwrap();
/// let now = Instant::now();
/// assert_eq!(bucket.update_rate_limit(now), Duration::ZERO);
/// assert!(bucket.get_retry_after(now) > Duration::ZERO);
/// ```
#[derive(Debug, Clone)]
pub struct Limiter {
    rate: u32,
    per: Duration,
    leak_rate: Duration,
    last_update: Option<Instant>,
    tokens: u32,
}

impl Limiter {
    pub fn new(rate: u32, per: Duration) -> Result<Self> {
        if rate == 0 {
            return Err(Error::validation("limiter rate must be at least 1"));
        }
        if per.is_zero() {
            return Err(Error::validation("limiter window must be non-zero"));
        }
        Ok(Self {
            rate,
            per,
            leak_rate: per / rate,
            last_update: None,
            tokens: rate,
        })
    }

    pub fn rate(&self) -> u32 {
        self.rate
    }

    pub fn per(&self) -> Duration {
        self.per
    }

    /// Time for a single token to leak back.
    pub fn leak_rate(&self) -> Duration {
        self.leak_rate
    }

    /// Tokens available at `now`.
    pub fn get_tokens(&self, now: Instant) -> u32 {
        let last = self.last_update.unwrap_or(now);
        if now > last + self.per {
            // Whole window passed without activity.
            return self.rate;
        }
        let elapsed = now.saturating_duration_since(last);
        let leaked = elapsed.as_nanos() / self.leak_rate.as_nanos();
        let leaked = u32::try_from(leaked).unwrap_or(u32::MAX);
        self.tokens.saturating_add(leaked).min(self.rate)
    }

    /// How long to wait before a call at `now` would not be throttled.
    pub fn get_retry_after(&self, now: Instant) -> Duration {
        self.retry_after_with(now, self.get_tokens(now))
    }

    fn retry_after_with(&self, now: Instant, tokens: u32) -> Duration {
        if tokens > 0 {
            return Duration::ZERO;
        }
        let last = self.last_update.unwrap_or(now);
        self.leak_rate
            .saturating_sub(now.saturating_duration_since(last))
    }

    /// Record a call made at `now`.
    ///
    /// Consumes a token when one is available and returns zero; otherwise
    /// returns the predicted delay without consuming anything. The baseline
    /// timestamp moves once at least a full leak interval has passed, so
    /// frequent checks cannot stall the leak and a leaked token is only
    /// counted once.
    pub fn update_rate_limit(&mut self, now: Instant) -> Duration {
        let last = *self.last_update.get_or_insert(now);
        let tokens = self.get_tokens(now);

        let retry_after = if tokens > 0 {
            self.tokens = tokens - 1;
            Duration::ZERO
        } else {
            self.retry_after_with(now, tokens)
        };

        if now.saturating_duration_since(last) >= self.leak_rate {
            self.last_update = Some(now);
        }
        retry_after
    }

    /// Refill the bucket and forget the timestamp baseline.
    pub fn reset(&mut self) {
        self.tokens = self.rate;
        self.last_update = None;
    }
}

/// A named limiter declaration for one endpoint.
///
/// The request pipeline creates the [`Limiter`] the first time a bucket with
/// this name is used and keeps it for the life of the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bucket {
    pub name: &'static str,
    pub rate: u32,
    pub per: Duration,
}

impl Bucket {
    pub const fn new(name: &'static str, rate: u32, per: Duration) -> Self {
        Self { name, rate, per }
    }

    pub fn limiter(&self) -> Result<Limiter> {
        Limiter::new(self.rate, self.per)
    }
}
