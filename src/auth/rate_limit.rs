//! Login throttling: a fixed attempt budget per fixed time window, keyed by
//! client address, to slow brute-force attempts against the login endpoint.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::debug;

#[derive(Clone, Debug)]
pub struct LoginRateLimitConfig {
    pub max_attempts: u32,
    pub window: Duration,
}

impl Default for LoginRateLimitConfig {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            window: Duration::from_secs(15 * 60),
        }
    }
}

#[derive(Debug, Clone)]
struct AttemptEntry {
    attempts: u32,
    first_attempt: Instant,
}

impl AttemptEntry {
    fn new() -> Self {
        Self {
            attempts: 1,
            first_attempt: Instant::now(),
        }
    }

    fn window_elapsed(&self, window: Duration) -> bool {
        Instant::now().duration_since(self.first_attempt) > window
    }
}

/// In-memory throttle for login attempts. Entries reset when their window
/// elapses; a successful login clears its key immediately.
#[derive(Clone)]
pub struct LoginRateLimiter {
    config: LoginRateLimitConfig,
    attempts: Arc<Mutex<HashMap<String, AttemptEntry>>>,
}

impl LoginRateLimiter {
    pub fn new(config: LoginRateLimitConfig) -> Self {
        Self {
            config,
            attempts: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Whether `key` still has budget for another attempt.
    pub async fn check(&self, key: &str) -> bool {
        let mut map = self.attempts.lock().await;
        match map.get(key) {
            Some(entry) if entry.window_elapsed(self.config.window) => {
                map.remove(key);
                true
            }
            Some(entry) => entry.attempts < self.config.max_attempts,
            None => true,
        }
    }

    /// Records a failed attempt for `key`.
    pub async fn record_failure(&self, key: &str) {
        let mut map = self.attempts.lock().await;
        match map.get_mut(key) {
            Some(entry) if !entry.window_elapsed(self.config.window) => {
                entry.attempts += 1;
                debug!(key, attempts = entry.attempts, "login attempt recorded");
            }
            _ => {
                map.insert(key.to_string(), AttemptEntry::new());
            }
        }
    }

    /// Clears the budget for `key` after a successful login.
    pub async fn clear(&self, key: &str) {
        self.attempts.lock().await.remove(key);
    }
}
