//! Command-line arguments for the ratio feed.
use clap::Parser;
use ratio_common::net::DATA_PORT;

/// Parsed command-line arguments.
#[derive(Debug, Parser)]
#[command(version, about, long_about = None)]
pub struct Args {
    /// Address to bind the UDP data socket on.
    #[clap(long, default_value = "0.0.0.0")]
    pub bind_ip: String,

    /// UDP port for subscriptions, pings and outgoing batches.
    #[clap(long, default_value_t = DATA_PORT)]
    pub port: u16,

    /// Milliseconds between two quote batches.
    #[clap(long, default_value_t = 500)]
    pub interval_ms: u64,

    /// Seconds without a ping after which a subscriber is dropped.
    #[clap(long, default_value_t = 5)]
    pub ping_timeout_secs: u64,
}
