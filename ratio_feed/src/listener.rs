//! Command listener for the feed's data socket.
//!
//! Reads `SUBSCRIBE` / `PING` / `UNSUBSCRIBE` datagrams, refreshes the sender's
//! keep-alive in the `PingMonitor` and hands subscription changes to the main
//! loop as `Control` messages. Undecodable datagrams are logged and dropped.

use crate::model::ping_monitor::PingMonitor;
use crossbeam_channel::Sender;
use log::{debug, error, info, warn};
use ratio_common::command::{Command, Header};
use ratio_common::net::MAX_DATAGRAM;
use ratio_common::RatioError;
use std::net::{SocketAddr, UdpSocket};
use std::sync::{Arc, Mutex};

/// Subscription change requested by a remote subscriber.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum Control {
    /// Start streaming batches to the address.
    Subscribe(SocketAddr),
    /// Stop streaming batches to the address.
    Unsubscribe(SocketAddr),
}

/// UDP listener for subscriber commands.
///
/// Decodes each datagram as a `Command`. Pings only refresh the `PingMonitor`;
/// subscribe/unsubscribe also forward a `Control` to the main loop. A datagram
/// that fails to decode is logged and skipped without affecting other
/// subscribers.
pub struct CommandListener {
    socket: Arc<UdpSocket>,
    ping_monitor: Arc<Mutex<PingMonitor>>,
}

impl CommandListener {
    /// Listener reading from `socket` and tracking keep-alives in `ping_monitor`.
    pub fn new(socket: Arc<UdpSocket>, ping_monitor: Arc<Mutex<PingMonitor>>) -> Self {
        Self {
            socket,
            ping_monitor,
        }
    }

    /// Blocking loop that reads commands and forwards subscription changes to `tx`.
    pub fn receive_loop(self, tx: Sender<Control>) -> Result<(), RatioError> {
        info!("Command listener started on {}", self.socket.local_addr()?);
        let mut buf = [0u8; MAX_DATAGRAM];

        loop {
            let (size, addr) = match self.socket.recv_from(&mut buf) {
                Ok(received) => received,
                Err(e) => {
                    error!("UDP receive error: {}", e);
                    continue;
                }
            };

            let command = match Command::from_json_slice(&buf[..size]) {
                Ok(command) => command,
                Err(e) => {
                    warn!("Ignoring malformed command from {}: {}", addr, e);
                    continue;
                }
            };
            debug!("Received {} from {}", command.header, addr);

            if let Some(control) = self.apply(&command, addr)? {
                tx.send(control)
                    .map_err(|e| RatioError::ChannelSend(e.to_string()))?;
            }
        }
    }

    /// Updates keep-alive state for `command` and returns the control to forward, if any.
    fn apply(&self, command: &Command, addr: SocketAddr) -> Result<Option<Control>, RatioError> {
        let mut monitor = self.ping_monitor.lock()?;
        let control = match command.header {
            Header::Ping => {
                if !monitor.is_client_active(&addr) {
                    debug!("Ping from {} without an active subscription", addr);
                }
                monitor.update_ping(addr);
                None
            }
            Header::Subscribe => {
                monitor.update_ping(addr);
                Some(Control::Subscribe(addr))
            }
            Header::Unsubscribe => {
                monitor.remove(&addr);
                Some(Control::Unsubscribe(addr))
            }
        };
        Ok(control)
    }
}
