//! Sending commands to the ratio feed over UDP.
//!
//! Commands go out from the same socket batches are received on, so the feed
//! streams back to the right address and matches pings to the subscription.
use log::{debug, error, info};
use ratio_common::net::PING_INTERVAL_MS;
use ratio_common::{Command, RatioError};
use std::io::ErrorKind;
use std::net::{SocketAddr, UdpSocket};
use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};
use std::thread;
use std::time::Duration;

/// Helper type for sending commands to the feed.
pub struct CommandSender;

impl CommandSender {
    /// Sends a single `command` datagram to `target`.
    pub fn send_command(socket: &UdpSocket, target: SocketAddr, command: &Command) -> Result<(), RatioError> {
        let bytes = command.to_json_bytes()?;
        info!("Sending {} to {}", command.header, target);
        socket.send_to(&bytes, target)?;
        Ok(())
    }

    /// Spawns a thread that pings `target` every `PING_INTERVAL_MS` until `shutdown` is set.
    pub fn start_ping_thread(socket: Arc<UdpSocket>, target: SocketAddr, shutdown: Arc<AtomicBool>) {
        info!("Ping thread started. Target: {}", target);
        thread::spawn(move || {
            let interval = Duration::from_millis(PING_INTERVAL_MS);
            let ping = match Command::ping().to_json_bytes() {
                Ok(bytes) => bytes,
                Err(e) => {
                    error!("Failed to encode PING: {}", e);
                    return;
                }
            };

            while !shutdown.load(Ordering::Relaxed) {
                thread::sleep(interval);
                if shutdown.load(Ordering::Relaxed) {
                    break;
                }

                match socket.send_to(&ping, target) {
                    Ok(_) => debug!("PING sent to {}", target),
                    Err(ref e) if e.kind() == ErrorKind::ConnectionReset => continue,
                    Err(e) => error!("Failed to send PING: {}", e),
                }
            }
            info!("Ping thread stopping...");
        });
    }
}
