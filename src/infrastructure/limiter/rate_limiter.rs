use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use parking_lot::Mutex;

use crate::constants::UNKNOWN_CLIENT;

/// One client's submission budget for the current window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitEntry {
    pub count: u32,
    pub window_reset_at: DateTime<Utc>,
}

/// Counter storage behind the limiter. The in-memory map is the default;
/// a shared external store can be swapped in without touching the window
/// arithmetic.
pub trait RateLimitStore: Send + Sync {
    fn get(&self, key: &str) -> Option<RateLimitEntry>;
    fn set(&self, key: &str, entry: RateLimitEntry);

    /// Drops entries whose window has closed, returning how many were
    /// removed. Entries still mid-window must survive.
    fn sweep_expired(&self, now: DateTime<Utc>) -> usize;
}

#[derive(Clone, Default)]
pub struct InMemoryRateLimitStore {
    entries: Arc<DashMap<String, RateLimitEntry>>,
}

impl InMemoryRateLimitStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl RateLimitStore for InMemoryRateLimitStore {
    fn get(&self, key: &str) -> Option<RateLimitEntry> {
        self.entries.get(key).map(|entry| *entry.value())
    }

    fn set(&self, key: &str, entry: RateLimitEntry) {
        self.entries.insert(key.to_string(), entry);
    }

    fn sweep_expired(&self, now: DateTime<Utc>) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, entry| entry.window_reset_at > now);
        before.saturating_sub(self.entries.len())
    }
}

#[derive(Debug, Clone, Copy)]
pub struct LimiterConfig {
    pub max_requests: u32,
    pub window: Duration,
}

impl Default for LimiterConfig {
    fn default() -> Self {
        LimiterConfig {
            max_requests: 3,
            window: Duration::minutes(15),
        }
    }
}

/// Fixed-window admission control for the contact endpoint. Quotas reset
/// fully at each window boundary; the boundary instant itself opens a fresh
/// window. Process-local by default, so in a multi-instance deployment the
/// quota is per instance.
pub struct FixedWindowLimiter<S: RateLimitStore> {
    store: S,
    config: LimiterConfig,
    // Serializes the read-decide-write cycle; without it a burst could push
    // the stored count past the budget.
    gate: Mutex<()>,
}

impl<S: RateLimitStore> FixedWindowLimiter<S> {
    pub fn new(store: S, config: LimiterConfig) -> Self {
        FixedWindowLimiter {
            store,
            config,
            gate: Mutex::new(()),
        }
    }

    pub fn check_and_consume(&self, key: &str) -> bool {
        self.check_and_consume_at(key, Utc::now())
    }

    /// Counts one request against `key` and reports whether it fit the
    /// budget. Rejected requests leave the entry untouched. An empty key
    /// falls back to the shared "unknown" bucket.
    pub fn check_and_consume_at(&self, key: &str, now: DateTime<Utc>) -> bool {
        let key = if key.trim().is_empty() { UNKNOWN_CLIENT } else { key };
        let _gate = self.gate.lock();

        match self.store.get(key) {
            Some(entry) if now < entry.window_reset_at => {
                if entry.count < self.config.max_requests {
                    self.store.set(
                        key,
                        RateLimitEntry {
                            count: entry.count + 1,
                            window_reset_at: entry.window_reset_at,
                        },
                    );
                    true
                } else {
                    false
                }
            }
            // First sighting of the key, or its window has closed.
            _ => {
                self.store.set(
                    key,
                    RateLimitEntry {
                        count: 1,
                        window_reset_at: now + self.config.window,
                    },
                );
                true
            }
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }
}
