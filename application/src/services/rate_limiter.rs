//! Per-provider fixed-window rate limiter.
//!
//! Each provider gets its own window behind its own lock, held in a
//! concurrent map. Admission is a single check-and-increment under that lock,
//! so calls to unrelated providers never contend.

use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Instant;
use switchboard_domain::{Admission, DomainError, RateLimit, RateWindow};
use tracing::debug;

/// Counters describing limiter activity since construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RateLimiterStats {
    pub admitted: u64,
    pub rejected: u64,
    /// Providers that have been seen at least once
    pub providers: usize,
}

#[derive(Debug, Default)]
pub struct RateLimiter {
    windows: DashMap<String, Arc<Mutex<RateWindow>>>,
    admitted: AtomicU64,
    rejected: AtomicU64,
}

impl RateLimiter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Admit one call to `provider_id` at `now`.
    ///
    /// Returns the number of calls still available in the current window, or
    /// `RateLimited` with the time until the window ends.
    pub fn try_admit(
        &self,
        provider_id: &str,
        limit: &RateLimit,
        now: Instant,
    ) -> Result<u32, DomainError> {
        let window = self.window(provider_id);
        let admission = {
            let mut window = window.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
            window.try_admit(limit, now)
        };

        match admission {
            Admission::Admitted { remaining } => {
                self.admitted.fetch_add(1, Ordering::Relaxed);
                Ok(remaining)
            }
            Admission::WindowFull { retry_after } => {
                self.rejected.fetch_add(1, Ordering::Relaxed);
                debug!(
                    provider = provider_id,
                    retry_after_ms = retry_after.as_millis() as u64,
                    "Rate window full"
                );
                Err(DomainError::RateLimited {
                    provider: provider_id.to_string(),
                    retry_after,
                })
            }
        }
    }

    /// [`try_admit`](Self::try_admit) at the current instant.
    pub fn admit(&self, provider_id: &str, limit: &RateLimit) -> Result<u32, DomainError> {
        self.try_admit(provider_id, limit, Instant::now())
    }

    pub fn stats(&self) -> RateLimiterStats {
        RateLimiterStats {
            admitted: self.admitted.load(Ordering::Relaxed),
            rejected: self.rejected.load(Ordering::Relaxed),
            providers: self.windows.len(),
        }
    }

    // The map shard lock is released before the per-provider lock is taken.
    fn window(&self, provider_id: &str) -> Arc<Mutex<RateWindow>> {
        if let Some(existing) = self.windows.get(provider_id) {
            return Arc::clone(existing.value());
        }
        Arc::clone(
            self.windows
                .entry(provider_id.to_string())
                .or_default()
                .value(),
        )
    }
}
