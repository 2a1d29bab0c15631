//! Ratio feed: a UDP quote source for the ABC/DEF pair.
//!
//! The binary streams quote batches (JSON arrays of two quotes, ABC first) to
//! every subscriber. Internally it wires together:
//!
//! - `QuoteGenerator`: produces one `QuoteBatch` per interval and broadcasts
//!   it to all stream tasks via `crossbeam_channel` senders.
//! - `CommandListener`: reads `SUBSCRIBE` / `PING` / `UNSUBSCRIBE` commands
//!   from the data socket and keeps the `PingMonitor` current.
//! - Per-subscriber stream task: a thread that forwards each batch to the
//!   subscriber's address until it unsubscribes or its keep-alive times out.
//!
//! A stream that fails to send exits on its own without affecting the others;
//! its subscriber is forgotten so a later `SUBSCRIBE` starts a fresh stream.
#![warn(missing_docs)]
use crate::args::Args;
use crate::listener::{CommandListener, Control};
use crate::model::ping_monitor::PingMonitor;
use crate::model::quote_generator::QuoteGenerator;
use clap::Parser;
use crossbeam_channel::{Receiver, Sender, select, unbounded};
use log::{debug, error, info};
use ratio_common::net::addr;
use ratio_common::{QuoteBatch, RatioError, Result};
use std::collections::HashMap;
use std::net::{SocketAddr, UdpSocket};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

mod args;
mod listener;
pub mod model;

/// Stream task for a single subscriber.
///
/// Forwards every batch from `data_rx` to `target_addr` over `socket` until a
/// signal arrives on `stop_rx`, the generator goes away, or a send fails.
pub fn handle_client_stream(
    socket: Arc<UdpSocket>,
    target_addr: SocketAddr,
    data_rx: Receiver<QuoteBatch>,
    stop_rx: Receiver<()>,
) -> Result<(), RatioError> {
    loop {
        select! {
            recv(stop_rx) -> _ => break,
            recv(data_rx) -> msg => {
                let batch = msg.map_err(|e| RatioError::ChannelRecv(e.to_string()))?;
                let data = batch.to_json_bytes()?;
                socket.send_to(&data, target_addr)?;
            }
        }
    }
    debug!("Stream for {} finished", target_addr);
    Ok(())
}

fn main() -> Result<(), RatioError> {
    init_logger();
    let args = Args::parse();

    let udp_socket = Arc::new(UdpSocket::bind(addr(&args.bind_ip, args.port))?);
    info!("UDP socket created on: {}", udp_socket.local_addr()?);

    let ping_monitor = Arc::new(Mutex::new(PingMonitor::new(Duration::from_secs(
        args.ping_timeout_secs,
    ))));

    let (timeout_tx, timeout_rx) = unbounded::<SocketAddr>();
    let monitor_for_checker = Arc::clone(&ping_monitor);
    thread::spawn(move || start_ping_monitor(monitor_for_checker, timeout_tx));

    let (control_tx, control_rx) = unbounded::<Control>();
    let listener = CommandListener::new(Arc::clone(&udp_socket), Arc::clone(&ping_monitor));
    thread::spawn(move || {
        if let Err(e) = listener.receive_loop(control_tx) {
            error!("Command listener failed: {}", e);
        }
    });

    let subscription_tx = QuoteGenerator::start(Duration::from_millis(args.interval_ms));
    let (exit_tx, exit_rx) = unbounded::<StreamExit>();
    let mut streams = StreamRegistry::new(Arc::clone(&udp_socket), subscription_tx, exit_tx);

    loop {
        select! {
            recv(control_rx) -> msg => match msg {
                Ok(Control::Subscribe(target)) => {
                    if let Err(e) = streams.open_stream(target) {
                        error!("Failed to subscribe client {}: {}", target, e);
                    }
                }
                Ok(Control::Unsubscribe(target)) => {
                    streams.close_stream(target, "unsubscribed");
                }
                Err(e) => return Err(RatioError::ChannelRecv(e.to_string())),
            },

            recv(timeout_rx) -> msg => match msg {
                Ok(target) => {
                    streams.close_stream(target, "ping timeout");
                }
                Err(e) => return Err(RatioError::ChannelRecv(e.to_string())),
            },

            recv(exit_rx) -> msg => match msg {
                Ok((target, id)) => {
                    streams.release_stream(target, id);
                }
                Err(e) => return Err(RatioError::ChannelRecv(e.to_string())),
            }
        }
    }
}

/// Exit notice of a stream task: subscriber address and stream id.
type StreamExit = (SocketAddr, u64);

/// Stream tasks currently serving subscribers, keyed by subscriber address.
struct StreamRegistry {
    socket: Arc<UdpSocket>,
    subscription_tx: Sender<Sender<QuoteBatch>>,
    exit_tx: Sender<StreamExit>,
    streams: HashMap<SocketAddr, (u64, Sender<()>)>,
    next_id: u64,
}

impl StreamRegistry {
    fn new(
        socket: Arc<UdpSocket>,
        subscription_tx: Sender<Sender<QuoteBatch>>,
        exit_tx: Sender<StreamExit>,
    ) -> Self {
        Self {
            socket,
            subscription_tx,
            exit_tx,
            streams: HashMap::new(),
            next_id: 0,
        }
    }

    /// Starts a stream task for `target`, stopping the one it already had.
    ///
    /// The task posts a `StreamExit` when it returns, whatever the reason.
    fn open_stream(&mut self, target: SocketAddr) -> Result<u64> {
        if let Some((_, shutdown_tx)) = self.streams.remove(&target) {
            let _ = shutdown_tx.send(());
            debug!("Replacing stream for {}", target);
        }

        let (shutdown_tx, shutdown_rx) = unbounded::<()>();
        let (client_data_tx, client_data_rx) = unbounded::<QuoteBatch>();
        self.subscription_tx
            .send(client_data_tx)
            .map_err(|e| RatioError::ChannelSend(e.to_string()))?;

        let id = self.next_id;
        self.next_id += 1;
        self.streams.insert(target, (id, shutdown_tx));

        let socket = Arc::clone(&self.socket);
        let exit_tx = self.exit_tx.clone();
        thread::spawn(move || {
            if let Err(e) = handle_client_stream(socket, target, client_data_rx, shutdown_rx) {
                error!("Client stream {} error: {}", target, e);
            }
            let _ = exit_tx.send((target, id));
        });
        info!("Stream created for subscriber {}", target);
        Ok(id)
    }

    /// Signals the stream for `target` to stop and forgets it.
    fn close_stream(&mut self, target: SocketAddr, reason: &str) -> bool {
        match self.streams.remove(&target) {
            Some((_, shutdown_tx)) => {
                let _ = shutdown_tx.send(());
                info!("Stream for {} closed: {}", target, reason);
                true
            }
            None => {
                debug!("No active stream for {} ({})", target, reason);
                false
            }
        }
    }

    /// Forgets stream `id` of `target` once its task has exited.
    ///
    /// Notices from streams that were already closed or replaced are ignored.
    fn release_stream(&mut self, target: SocketAddr, id: u64) -> bool {
        match self.streams.get(&target) {
            Some((current, _)) if *current == id => {
                self.streams.remove(&target);
                info!("Stream for {} ended; it may subscribe again", target);
                true
            }
            _ => false,
        }
    }

    #[cfg(test)]
    fn contains(&self, target: SocketAddr) -> bool {
        self.streams.contains_key(&target)
    }
}

fn start_ping_monitor(ping_monitor: Arc<Mutex<PingMonitor>>, timeout_tx: Sender<SocketAddr>) {
    let check_interval = Duration::from_secs(1);

    loop {
        thread::sleep(check_interval);
        let timed_out_clients = match ping_monitor.lock() {
            Ok(mut monitor) => monitor.check_timeouts(),
            Err(e) => {
                error!("Ping monitor lock poisoned: {}", e);
                return;
            }
        };
        for client_addr in timed_out_clients {
            if let Err(e) = timeout_tx.send(client_addr) {
                error!("Error sending timeout notification: {}", e);
                return;
            }
        }
    }
}

fn init_logger() {
    env_logger::Builder::new()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();
}
