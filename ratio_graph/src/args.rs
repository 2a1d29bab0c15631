//! Command-line arguments for the ratio graph.
//!
//! This module defines the CLI interface using `clap`. See `main` for end-to-end usage.
use clap::Parser;
use ratio_common::net::DATA_PORT;

/// Parsed command-line arguments.
#[derive(Debug, Parser)]
#[command(version, about, long_about = None)]
pub struct Args {
    /// Feed IP address (IPv4 or IPv6).
    #[clap(long)]
    pub server_ip: String,

    /// Feed UDP port.
    #[clap(long, default_value_t = DATA_PORT)]
    pub server_port: u16,

    /// Local UDP port to receive batches on; 0 picks a free port.
    #[clap(long, default_value_t = 0)]
    pub listen_port: u16,

    /// Delay before the chart table is mounted. Batches arriving earlier are dropped.
    #[clap(long, default_value_t = 0)]
    pub mount_delay_ms: u64,
}
