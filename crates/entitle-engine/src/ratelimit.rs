//! Best-effort in-process rate limiting.
//!
//! A sliding window over a mutex-protected timestamp map, keyed by
//! client address + actor. No cross-process coordination: good enough
//! for abuse mitigation on authentication-adjacent endpoints, never
//! for billing-grade accounting (seat counters live in the atomic
//! datastore layer for exactly that reason).

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};

use entitle_core::counter::HitCounter;

/// In-process sliding-window hit counter.
pub struct SlidingWindow {
    window: Duration,
    hits: Mutex<HashMap<String, Vec<Instant>>>,
}

impl SlidingWindow {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            hits: Mutex::new(HashMap::new()),
        }
    }
}

impl HitCounter for SlidingWindow {
    fn hit(&self, key: &str) -> u32 {
        let mut map = self.hits.lock().unwrap_or_else(PoisonError::into_inner);
        let now = Instant::now();
        let hits = map.entry(key.to_string()).or_default();
        hits.retain(|t| now.duration_since(*t) < self.window);
        hits.push(now);
        hits.len() as u32
    }

    fn count(&self, key: &str) -> u32 {
        let mut map = self.hits.lock().unwrap_or_else(PoisonError::into_inner);
        let now = Instant::now();
        match map.get_mut(key) {
            Some(hits) => {
                hits.retain(|t| now.duration_since(*t) < self.window);
                hits.len() as u32
            }
            None => 0,
        }
    }
}

/// Gate keyed by client address + actor over an injected counter.
pub struct RateLimiter<C: HitCounter> {
    counter: C,
    max_hits: u32,
}

impl<C: HitCounter> RateLimiter<C> {
    pub fn new(counter: C, max_hits: u32) -> Self {
        Self { counter, max_hits }
    }

    /// Record the attempt and report whether it is within the limit.
    pub fn allow(&self, addr: &str, actor: &str) -> bool {
        self.counter.hit(&format!("{addr}:{actor}")) <= self.max_hits
    }
}
