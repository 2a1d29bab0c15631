//! Keep-alive tracker for UDP subscribers.
//!
//! Records the last time each subscriber (keyed by its datagram source
//! address) was heard from. `check_timeouts` evicts and returns every
//! subscriber that has been silent for longer than the timeout, so each
//! timeout is reported once.
//!
//! Time is measured with `std::time::Instant`, which is monotonic. The monitor
//! is not synchronized; share it behind a `Mutex`.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::time::{Duration, Instant};

/// Tracks subscriber keep-alives and reports the ones that went silent.
pub struct PingMonitor {
    last_seen: HashMap<SocketAddr, Instant>,
    timeout: Duration,
}

impl PingMonitor {
    /// Monitor dropping subscribers after `timeout` of silence.
    pub fn new(timeout: Duration) -> Self {
        Self {
            last_seen: HashMap::new(),
            timeout,
        }
    }

    /// Record a fresh ping (or subscription) from `addr`.
    pub fn update_ping(&mut self, addr: SocketAddr) {
        self.last_seen.insert(addr, Instant::now());
    }

    /// Forget `addr`, e.g. after it unsubscribed.
    pub fn remove(&mut self, addr: &SocketAddr) -> bool {
        self.last_seen.remove(addr).is_some()
    }

    /// Evict and return subscribers silent for longer than the timeout.
    pub fn check_timeouts(&mut self) -> Vec<SocketAddr> {
        let now = Instant::now();
        let timeout = self.timeout;
        let mut timed_out = Vec::new();

        self.last_seen.retain(|addr, last_ping| {
            if now.duration_since(*last_ping) > timeout {
                timed_out.push(*addr);
                false
            } else {
                true
            }
        });
        timed_out
    }

    /// Whether `addr` is currently tracked.
    pub fn is_client_active(&self, addr: &SocketAddr) -> bool {
        self.last_seen.contains_key(addr)
    }
}
