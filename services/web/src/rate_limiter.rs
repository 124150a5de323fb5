//! Login throttling to slow down password guessing

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::warn;

/// Rate limiter configuration
#[derive(Debug, Clone)]
pub struct RateLimiterConfig {
    /// Failed attempts tolerated inside one window
    pub max_failures: u32,
    /// Window over which failures are counted
    pub window: Duration,
    /// How long a key stays locked once the limit is hit
    pub lockout: Duration,
}

impl Default for RateLimiterConfig {
    fn default() -> Self {
        Self {
            max_failures: 5,
            window: Duration::from_secs(300),
            lockout: Duration::from_secs(900),
        }
    }
}

#[derive(Debug)]
struct FailureRecord {
    failures: u32,
    window_start: Instant,
    locked_until: Option<Instant>,
}

impl FailureRecord {
    /// Still counting failures or still locked
    fn is_live(&self, now: Instant, window: Duration) -> bool {
        match self.locked_until {
            Some(until) => now < until,
            None => now.duration_since(self.window_start) < window,
        }
    }
}

/// Failure-counting limiter keyed by an arbitrary string (the login name)
#[derive(Debug, Clone)]
pub struct RateLimiter {
    config: RateLimiterConfig,
    entries: Arc<Mutex<HashMap<String, FailureRecord>>>,
}

impl RateLimiter {
    /// Create a new rate limiter
    pub fn new(config: RateLimiterConfig) -> Self {
        Self {
            config,
            entries: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Whether `key` may attempt a login now
    pub async fn is_allowed(&self, key: &str) -> bool {
        let mut entries = self.entries.lock().await;
        let now = Instant::now();

        let Some(locked_until) = entries.get(key).map(|entry| entry.locked_until) else {
            return true;
        };

        match locked_until {
            Some(until) if now < until => false,
            Some(_) => {
                entries.remove(key);
                true
            }
            None => true,
        }
    }

    /// Count a failed attempt, locking the key once the limit is reached
    pub async fn record_failure(&self, key: &str) {
        let mut entries = self.entries.lock().await;
        let now = Instant::now();

        // Sweep on write so one-off usernames do not accumulate.
        entries.retain(|_, record| record.is_live(now, self.config.window));

        let entry = entries.entry(key.to_string()).or_insert(FailureRecord {
            failures: 0,
            window_start: now,
            locked_until: None,
        });

        if now.duration_since(entry.window_start) >= self.config.window {
            entry.failures = 0;
            entry.window_start = now;
        }

        entry.failures += 1;
        if entry.failures >= self.config.max_failures && entry.locked_until.is_none() {
            entry.locked_until = Some(now + self.config.lockout);
            warn!(
                "Locked out {} for {} seconds after {} failed logins",
                key,
                self.config.lockout.as_secs(),
                entry.failures
            );
        }
    }

    /// Forget all failures for `key`
    pub async fn reset(&self, key: &str) {
        self.entries.lock().await.remove(key);
    }

    #[cfg(test)]
    async fn tracked_keys(&self) -> usize {
        self.entries.lock().await.len()
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(RateLimiterConfig::default())
    }
}
