//! Shared networking constants and helpers used by the feed and the graph.

/// UDP port the feed listens on for subscriptions and pings, and streams from.
pub const DATA_PORT: u16 = 8081;

/// Interval between keep-alive pings sent by a subscriber.
pub const PING_INTERVAL_MS: u64 = 2000;

/// Largest datagram either side expects to read.
pub const MAX_DATAGRAM: usize = 2048;

/// Helper to format an address with a port like "ip:port".
pub fn addr(ip: &str, port: u16) -> String {
    format!("{}:{}", ip, port)
}
