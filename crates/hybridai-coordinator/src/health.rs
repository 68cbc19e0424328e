//! Remote backend health tracking.
//!
//! After `threshold` consecutive remote failures the backend is bypassed for
//! a cooldown. Once it elapses the next request probes the remote backend
//! again; one success clears the failure streak. Lock-free.

use std::fmt;
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::time::Duration;
use tokio::time::Instant;

const NOT_DEGRADED: u64 = 0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HealthStatus {
    Healthy,
    /// Remote backend bypassed until the cooldown elapses
    Degraded,
}

impl HealthStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Healthy => "healthy",
            Self::Degraded => "degraded",
        }
    }
}

impl fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug)]
pub struct RemoteHealth {
    threshold: u32,
    cooldown: Duration,
    consecutive_failures: AtomicU32,
    /// Millis since `start` when the bypass ends, offset by one; 0 when healthy
    degraded_until_ms: AtomicU64,
    start: Instant,
}

impl RemoteHealth {
    pub fn new(threshold: u32, cooldown: Duration) -> Self {
        Self {
            threshold: threshold.max(1),
            cooldown,
            consecutive_failures: AtomicU32::new(0),
            degraded_until_ms: AtomicU64::new(NOT_DEGRADED),
            start: Instant::now(),
        }
    }

    pub fn record_success(&self) {
        self.consecutive_failures.store(0, Ordering::Release);
        if self.degraded_until_ms.swap(NOT_DEGRADED, Ordering::AcqRel) != NOT_DEGRADED {
            tracing::info!("remote backend recovered");
        }
    }

    /// Returns true when this failure tripped degraded mode
    pub fn record_failure(&self) -> bool {
        let failures = self.consecutive_failures.fetch_add(1, Ordering::AcqRel) + 1;
        if failures < self.threshold {
            return false;
        }

        let now = self.elapsed_ms();
        let until = now + self.cooldown.as_millis() as u64 + 1;
        let previous = self.degraded_until_ms.swap(until, Ordering::AcqRel);
        if previous == NOT_DEGRADED || previous <= now + 1 {
            tracing::warn!(
                failures,
                cooldown_ms = self.cooldown.as_millis() as u64,
                "remote backend degraded, routing locally"
            );
            return true;
        }
        false
    }

    /// True while the cooldown is running
    pub fn is_degraded(&self) -> bool {
        match self.degraded_until_ms.load(Ordering::Acquire) {
            NOT_DEGRADED => false,
            until => self.elapsed_ms() + 1 < until,
        }
    }

    pub fn status(&self) -> HealthStatus {
        if self.is_degraded() {
            HealthStatus::Degraded
        } else {
            HealthStatus::Healthy
        }
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures.load(Ordering::Acquire)
    }

    fn elapsed_ms(&self) -> u64 {
        self.start.elapsed().as_millis() as u64
    }
}
