// Copyright 2025 Google LLC
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     https://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use crate::{Error, Result};
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// A token bucket limiting the rate of some operation.
///
/// The bucket tracks how many permits were consumed recently. The consumed
/// count drains at `rate` permits per second, and each acquisition adds to
/// it. Once the count exceeds `rate` the acquisition waits until enough
/// permits drained. The bucket never holds a negative count, so an idle
/// limiter grants at most one second worth of permits without waiting.
///
/// Acquisitions on the same limiter are serialized: the bucket is locked for
/// the full acquisition, including any wait.
#[derive(Debug)]
pub struct RateLimiter {
    key: String,
    rate: f64,
    bucket: Mutex<Bucket>,
}

#[derive(Debug)]
struct Bucket {
    consumed: f64,
    last: Instant,
}

impl Bucket {
    fn decay(&mut self, rate: f64) {
        let now = Instant::now();
        let elapsed = now.saturating_duration_since(self.last).as_secs_f64();
        self.last = now;
        self.consumed = (self.consumed - rate * elapsed).max(0.0);
    }

    fn debit(&mut self, rate: f64, permits: f64) -> Option<Duration> {
        self.consumed += permits;
        if self.consumed <= rate {
            return None;
        }
        let wait = (self.consumed - rate) / rate;
        Some(Duration::try_from_secs_f64(wait).unwrap_or(Duration::MAX))
    }

    fn refund(&mut self, permits: f64) {
        self.consumed = (self.consumed - permits).max(0.0);
    }
}

fn is_valid_count(permits: f64) -> bool {
    permits.is_finite() && permits >= 0.0
}

impl RateLimiter {
    /// Creates a limiter granting `rate` permits per second.
    ///
    /// # Example
    /// ```
    /// # use stratus_ratelimit::RateLimiter;
    /// let limiter = RateLimiter::new("uploads", 10.0)?;
    /// assert_eq!(limiter.rate(), 10.0);
    /// # Ok::<(), stratus_ratelimit::Error>(())
    /// ```
    pub fn new<K: Into<String>>(key: K, rate: f64) -> Result<Self> {
        if !rate.is_finite() || rate <= 0.0 {
            return Err(Error::InvalidRate(rate));
        }
        Ok(Self {
            key: key.into(),
            rate,
            bucket: Mutex::new(Bucket {
                consumed: 0.0,
                last: Instant::now(),
            }),
        })
    }

    /// The name of this limiter.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// The rate, in permits per second.
    pub fn rate(&self) -> f64 {
        self.rate
    }

    /// Acquires `permits`, waiting as long as needed.
    ///
    /// Dropping the returned future before it completes abandons the wait,
    /// but the permits remain debited. A negative or non-finite `permits` is
    /// granted as zero permits.
    pub async fn acquire(&self, permits: f64) {
        let permits = if is_valid_count(permits) { permits } else { 0.0 };
        let mut bucket = self.bucket.lock().await;
        bucket.decay(self.rate);
        if let Some(delay) = bucket.debit(self.rate, permits) {
            tracing::debug!(key = %self.key, ?delay, permits, "rate limited, waiting");
            tokio::time::sleep(delay).await;
        }
    }

    /// Acquires `permits` only if that is possible without waiting.
    ///
    /// Returns `false`, and leaves the bucket untouched, if the permits would
    /// overrun the rate or are negative or non-finite. Note that this still
    /// waits for other acquisitions in progress on the same limiter.
    pub async fn try_acquire(&self, permits: f64) -> bool {
        if !is_valid_count(permits) {
            return false;
        }
        let mut bucket = self.bucket.lock().await;
        bucket.decay(self.rate);
        if bucket.consumed + permits > self.rate {
            return false;
        }
        bucket.consumed += permits;
        true
    }

    /// Acquires `permits` unless `cancel` fires first.
    ///
    /// Cancellation interrupts both the wait for other acquisitions and the
    /// rate limiting delay. A cancelled acquisition returns its permits to
    /// the bucket.
    pub async fn acquire_until_cancelled(
        &self,
        permits: f64,
        cancel: &CancellationToken,
    ) -> Result<()> {
        if !is_valid_count(permits) {
            return Err(Error::InvalidPermits(permits));
        }
        let mut bucket = tokio::select! {
            _ = cancel.cancelled() => return Err(Error::Cancelled),
            b = self.bucket.lock() => b,
        };
        bucket.decay(self.rate);
        let Some(delay) = bucket.debit(self.rate, permits) else {
            return Ok(());
        };
        tracing::debug!(key = %self.key, ?delay, permits, "rate limited, waiting");
        tokio::select! {
            _ = cancel.cancelled() => {
                bucket.refund(permits);
                Err(Error::Cancelled)
            }
            _ = tokio::time::sleep(delay) => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use test_case::test_case;

    #[test_case(0.0)]
    #[test_case(-1.0)]
    #[test_case(f64::NAN)]
    #[test_case(f64::INFINITY)]
    fn invalid_rate(rate: f64) {
        let got = RateLimiter::new("k", rate);
        assert!(matches!(got, Err(Error::InvalidRate(_))), "{got:?}");
    }

    #[tokio::test(start_paused = true)]
    async fn burst_is_free() -> anyhow::Result<()> {
        let limiter = RateLimiter::new("k", 100.0)?;
        let start = Instant::now();
        for _ in 0..10 {
            limiter.acquire(10.0).await;
        }
        assert_eq!(start.elapsed(), Duration::ZERO);
        Ok(())
    }

    #[test_case(10)]
    #[test_case(50)]
    #[test_case(100)]
    #[tokio::test(start_paused = true)]
    async fn throughput(n: u32) -> anyhow::Result<()> {
        let limiter = RateLimiter::new("k", 100.0)?;
        let start = Instant::now();
        for _ in 0..n {
            limiter.acquire(10.0).await;
        }
        let want = Duration::from_secs_f64((n as f64 / 10.0 - 1.0).max(0.0));
        let got = start.elapsed();
        assert!(got >= want, "elapsed={got:?}, want at least {want:?}");
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn full_rate_acquisitions() -> anyhow::Result<()> {
        let limiter = RateLimiter::new("k", 100.0)?;
        let start = Instant::now();
        for _ in 0..10 {
            limiter.acquire(100.0).await;
        }
        let got = start.elapsed();
        assert!(got >= Duration::from_secs(9), "{got:?}");
        assert!(got < Duration::from_secs(10), "{got:?}");
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn try_acquire_refuses_without_debit() -> anyhow::Result<()> {
        let limiter = RateLimiter::new("k", 100.0)?;
        assert!(limiter.try_acquire(60.0).await);
        assert!(!limiter.try_acquire(60.0).await);
        // The refusal did not consume anything, 40 permits are still free.
        assert!(limiter.try_acquire(40.0).await);
        assert!(!limiter.try_acquire(1.0).await);

        tokio::time::advance(Duration::from_millis(500)).await;
        assert!(limiter.try_acquire(50.0).await);
        assert!(!limiter.try_acquire(1.0).await);
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn decay_is_clamped() -> anyhow::Result<()> {
        let limiter = RateLimiter::new("k", 10.0)?;
        limiter.acquire(5.0).await;
        tokio::time::advance(Duration::from_secs(3600)).await;
        // A long idle period does not accumulate more than one second of
        // credit.
        assert!(limiter.try_acquire(10.0).await);
        assert!(!limiter.try_acquire(0.5).await);
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn waits_for_overrun() -> anyhow::Result<()> {
        let limiter = RateLimiter::new("k", 10.0)?;
        let start = Instant::now();
        limiter.acquire(10.0).await;
        limiter.acquire(5.0).await;
        let got = start.elapsed();
        assert!(got >= Duration::from_millis(500), "{got:?}");
        assert!(got < Duration::from_millis(600), "{got:?}");
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn acquisitions_are_serialized() -> anyhow::Result<()> {
        let limiter = Arc::new(RateLimiter::new("k", 10.0)?);
        limiter.acquire(10.0).await;
        let start = Instant::now();
        let tasks = (0..3)
            .map(|_| {
                let limiter = limiter.clone();
                tokio::spawn(async move { limiter.acquire(10.0).await })
            })
            .collect::<Vec<_>>();
        for t in tasks {
            t.await?;
        }
        let got = start.elapsed();
        assert!(got >= Duration::from_secs(3), "{got:?}");
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn cancelled_while_waiting() -> anyhow::Result<()> {
        let limiter = RateLimiter::new("k", 10.0)?;
        limiter.acquire(10.0).await;
        let cancel = CancellationToken::new();
        let child = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(100)).await;
            child.cancel();
        });
        let start = Instant::now();
        let got = limiter.acquire_until_cancelled(20.0, &cancel).await;
        assert_eq!(got, Err(Error::Cancelled));
        let elapsed = start.elapsed();
        assert!(elapsed < Duration::from_secs(1), "{elapsed:?}");

        // The cancelled permits were returned, only the first 10 permits
        // (minus what drained in 100ms) remain.
        let bucket = limiter.bucket.lock().await;
        assert!(bucket.consumed <= 10.0, "{bucket:?}");
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn not_cancelled() -> anyhow::Result<()> {
        let limiter = RateLimiter::new("k", 10.0)?;
        let cancel = CancellationToken::new();
        let start = Instant::now();
        limiter.acquire_until_cancelled(10.0, &cancel).await?;
        limiter.acquire_until_cancelled(10.0, &cancel).await?;
        let got = start.elapsed();
        assert!(got >= Duration::from_secs(1), "{got:?}");
        Ok(())
    }

    #[test_case(-50.0)]
    #[test_case(f64::NAN)]
    #[test_case(f64::INFINITY)]
    #[test_case(f64::NEG_INFINITY)]
    #[tokio::test(start_paused = true)]
    async fn acquire_invalid_count_grants_nothing(permits: f64) -> anyhow::Result<()> {
        let limiter = RateLimiter::new("k", 10.0)?;
        let start = Instant::now();
        limiter.acquire(permits).await;
        assert_eq!(start.elapsed(), Duration::ZERO);
        {
            let bucket = limiter.bucket.lock().await;
            assert_eq!(bucket.consumed, 0.0, "{bucket:?}");
        }
        // No extra credit was granted beyond the rate.
        assert!(!limiter.try_acquire(60.0).await);
        assert!(limiter.try_acquire(10.0).await);
        Ok(())
    }

    #[test_case(-1.0)]
    #[test_case(f64::NAN)]
    #[test_case(f64::INFINITY)]
    #[tokio::test]
    async fn try_acquire_invalid_count(permits: f64) -> anyhow::Result<()> {
        let limiter = RateLimiter::new("k", 10.0)?;
        assert!(!limiter.try_acquire(permits).await);
        let bucket = limiter.bucket.lock().await;
        assert_eq!(bucket.consumed, 0.0, "{bucket:?}");
        Ok(())
    }

    #[tokio::test]
    async fn acquire_until_cancelled_invalid_count() -> anyhow::Result<()> {
        let limiter = RateLimiter::new("k", 10.0)?;
        let cancel = CancellationToken::new();
        let got = limiter.acquire_until_cancelled(-5.0, &cancel).await;
        assert_eq!(got, Err(Error::InvalidPermits(-5.0)));
        let got = limiter.acquire_until_cancelled(f64::NAN, &cancel).await;
        assert!(matches!(got, Err(Error::InvalidPermits(p)) if p.is_nan()), "{got:?}");
        Ok(())
    }

    #[test]
    fn overrun_delay_saturates() {
        let mut bucket = Bucket {
            consumed: 0.0,
            last: Instant::now(),
        };
        let got = bucket.debit(1e-9, 1e12);
        assert_eq!(got, Some(Duration::MAX));
    }

    #[tokio::test(start_paused = true)]
    async fn huge_overrun_is_cancellable() -> anyhow::Result<()> {
        let limiter = RateLimiter::new("k", 1e-9)?;
        let cancel = CancellationToken::new();
        let child = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(1)).await;
            child.cancel();
        });
        let got = limiter.acquire_until_cancelled(1e12, &cancel).await;
        assert_eq!(got, Err(Error::Cancelled));
        Ok(())
    }

    #[tokio::test]
    async fn cancelled_before_lock() -> anyhow::Result<()> {
        let limiter = RateLimiter::new("k", 10.0)?;
        let _guard = limiter.bucket.lock().await;
        let cancel = CancellationToken::new();
        cancel.cancel();
        let got = limiter.acquire_until_cancelled(1.0, &cancel).await;
        assert_eq!(got, Err(Error::Cancelled));
        Ok(())
    }
}
