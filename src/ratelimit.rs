use std::fmt::{self, Debug};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Instant;

use crate::error::{Error, validate_non_negative};

/// A source of monotonic time, abstracted so tests can drive it.
pub trait Clock {
    /// Returns the current instant.
    fn now(&self) -> Instant;
}

/// The production clock, backed by `Instant::now()`. Unaffected by
/// wall-clock adjustments.
#[derive(Debug, Clone, Copy, Default)]
pub struct MonoClock;

impl Clock for MonoClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// CreditLimiter answers whether `cost` credits can be spent right now.
/// This is the seam used to substitute the limiter behind a sampler.
pub trait CreditLimiter: Send + Sync + Debug {
    /// Spends `cost` credits and returns true when enough are available,
    /// otherwise leaves the balance untouched and returns false.
    fn check_credit(&self, cost: f64) -> bool;
}

/// The mutable pair updated on every check.
#[derive(Debug)]
struct Bucket {
    balance: f64,
    last_tick: Instant,
}

/// RateLimiter is a credit bucket that refills continuously at
/// `credits_per_second` and holds at most `max_balance` credits. It starts
/// full, so a burst of up to `max_balance` is admitted immediately.
///
/// All callers of one limiter share a single bucket; every check is a
/// single critical section, so concurrent callers can never spend the same
/// credits twice.
pub struct RateLimiter<C: Clock = MonoClock> {
    credits_per_second: f64,
    max_balance: f64,
    bucket: Mutex<Bucket>,
    clock: C,
}

impl RateLimiter<MonoClock> {
    /// Create a new RateLimiter using the monotonic system clock.
    ///
    /// # Arguments
    ///
    /// * `credits_per_second` - Refill rate. Zero means the balance never refills.
    /// * `max_balance` - Burst capacity and initial balance.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidConfiguration` if either value is negative, NaN,
    /// or infinite.
    pub fn new(credits_per_second: f64, max_balance: f64) -> Result<Self, Error> {
        Self::with_clock(credits_per_second, max_balance, MonoClock)
    }
}

impl<C: Clock> RateLimiter<C> {
    /// Create a new RateLimiter reading time from `clock`.
    pub fn with_clock(credits_per_second: f64, max_balance: f64, clock: C) -> Result<Self, Error> {
        let credits_per_second = validate_non_negative("credits_per_second", credits_per_second)?;
        let max_balance = validate_non_negative("max_balance", max_balance)?;

        tracing::debug!(credits_per_second, max_balance, "created rate limiter");

        let last_tick = clock.now();
        Ok(RateLimiter {
            credits_per_second,
            max_balance,
            bucket: Mutex::new(Bucket {
                balance: max_balance,
                last_tick,
            }),
            clock,
        })
    }

    pub fn credits_per_second(&self) -> f64 {
        self.credits_per_second
    }

    pub fn max_balance(&self) -> f64 {
        self.max_balance
    }

    /// Returns the balance as of the most recent check, without refilling.
    pub fn balance(&self) -> f64 {
        self.lock().balance
    }

    /// Spends `cost` credits if the refilled balance covers it.
    pub fn check_credit(&self, cost: f64) -> bool {
        let mut bucket = self.lock();

        // Read the clock while holding the lock so last_tick never moves
        // backwards under contention.
        let now = self.clock.now();
        let elapsed = now.saturating_duration_since(bucket.last_tick);
        bucket.last_tick = now;

        let replenished = bucket.balance + elapsed.as_secs_f64() * self.credits_per_second;
        let balance = replenished.min(self.max_balance);

        if balance >= cost {
            bucket.balance = balance - cost;
            true
        } else {
            bucket.balance = balance;
            tracing::trace!(balance, cost, "insufficient credit");
            false
        }
    }

    // The bucket holds plain floats that are always written together, so a
    // panic elsewhere cannot leave it half-updated.
    fn lock(&self) -> MutexGuard<'_, Bucket> {
        self.bucket.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<C> CreditLimiter for RateLimiter<C>
where
    C: Clock + Send + Sync,
{
    fn check_credit(&self, cost: f64) -> bool {
        RateLimiter::check_credit(self, cost)
    }
}

impl<C: Clock> Debug for RateLimiter<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RateLimiter")
            .field("credits_per_second", &self.credits_per_second)
            .field("max_balance", &self.max_balance)
            .field("balance", &self.balance())
            .finish()
    }
}
