//! Ratio Graph: subscribes to the ratio feed and charts the ABC/DEF price
//! ratio against its alert bounds. Every received quote batch is turned into
//! one analytics record by the refresh driver and appended to an in-memory
//! pivot table, which logs the point just updated (at `warn` when it alerts).
//!
//! Usage example (CLI):
//! ```bash
//! ratio_graph --server-ip 127.0.0.1 --listen-port 55555
//! ```
#![warn(missing_docs)]
mod args;
mod model;
mod sender;

use crate::args::Args;
use crate::model::pivot::PivotEngine;
use crate::sender::CommandSender;
use clap::Parser;
use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, unbounded};
use log::{debug, error, info, warn};
use ratio_common::net::MAX_DATAGRAM;
use ratio_common::{Command, QuoteBatch, RatioError, RefreshDriver, Result, TableEngine};
use std::io::ErrorKind;
use std::net::{IpAddr, SocketAddr, UdpSocket};
use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};
use std::thread;
use std::time::{Duration, Instant};

/// How long the refresh loop waits for a batch before rechecking shutdown and mount.
const POLL_INTERVAL: Duration = Duration::from_millis(200);

/// Receives quote batches from `socket` and forwards them to `tx` in arrival order.
///
/// Datagrams that are not a valid batch (bad JSON, fewer than two quotes) are
/// logged and skipped.
fn start_receiver_loop(
    socket: Arc<UdpSocket>,
    tx: Sender<QuoteBatch>,
    shutdown: Arc<AtomicBool>,
) -> Result<(), RatioError> {
    info!("Batch receiver running on: {}", socket.local_addr()?);
    let mut buf = [0u8; MAX_DATAGRAM];

    while !shutdown.load(Ordering::Relaxed) {
        match socket.recv(&mut buf) {
            Ok(size) => match QuoteBatch::from_json_slice(&buf[..size]) {
                Ok(batch) => {
                    if tx.send(batch).is_err() {
                        debug!("Batch consumer gone; receiver stopping");
                        break;
                    }
                }
                Err(e) => warn!("Skipping datagram: {}", e),
            },
            Err(e) => match e.kind() {
                ErrorKind::WouldBlock | ErrorKind::TimedOut | ErrorKind::ConnectionReset => continue,
                _ => {
                    error!("Receive data error: {}", e);
                    return Err(RatioError::Io(e));
                }
            },
        }
    }
    info!("Receiver loop stopping...");
    Ok(())
}

/// Feeds batches from `batch_rx` into `driver` until shutdown or until the channel closes.
///
/// The driver is mounted once `mount_at` has passed; batches arriving earlier
/// are handed to the unmounted driver, which drops them. Returns the number of
/// such early batches.
fn run_refresh_loop<E: TableEngine>(
    driver: &mut RefreshDriver<E>,
    batch_rx: &Receiver<QuoteBatch>,
    mount_at: Instant,
    shutdown: &AtomicBool,
) -> Result<usize> {
    let mut early = 0;

    while !shutdown.load(Ordering::Relaxed) {
        if !driver.is_mounted() && Instant::now() >= mount_at {
            driver.on_mount()?;
            info!("Chart mounted");
        }

        match batch_rx.recv_timeout(POLL_INTERVAL) {
            Ok(batch) => {
                if !driver.is_mounted() {
                    early += 1;
                }
                driver.on_batch(&batch)?;
            }
            Err(RecvTimeoutError::Timeout) => continue,
            Err(RecvTimeoutError::Disconnected) => break,
        }
    }
    Ok(early)
}

fn main() -> Result<(), RatioError> {
    init_logger();
    let args = Args::parse();
    let shutdown = Arc::new(AtomicBool::new(false));
    {
        let shutdown = shutdown.clone();
        ctrlc::set_handler(move || {
            info!("Ctrl+C received. Shutting down graph...");
            shutdown.store(true, Ordering::SeqCst);
        })
        .map_err(|e| RatioError::Format(format!("Failed to set Ctrl+C handler: {}", e)))?;
    }

    let server_ip: IpAddr = args
        .server_ip
        .trim()
        .trim_matches('"')
        .parse()
        .map_err(|e| RatioError::Format(format!("Invalid --server-ip: {}", e)))?;
    let feed_addr = SocketAddr::new(server_ip, args.server_port);

    let socket = Arc::new(UdpSocket::bind(("0.0.0.0", args.listen_port))?);
    socket.set_read_timeout(Some(Duration::from_millis(500)))?;
    info!("UDP graph listening on: {}", socket.local_addr()?);

    CommandSender::send_command(&socket, feed_addr, &Command::subscribe())?;
    CommandSender::start_ping_thread(Arc::clone(&socket), feed_addr, Arc::clone(&shutdown));

    let (batch_tx, batch_rx) = unbounded::<QuoteBatch>();
    let receiver = {
        let socket = Arc::clone(&socket);
        let shutdown = Arc::clone(&shutdown);
        thread::spawn(move || start_receiver_loop(socket, batch_tx, shutdown))
    };

    let mut driver = RefreshDriver::new(PivotEngine);
    let mount_at = Instant::now() + Duration::from_millis(args.mount_delay_ms);
    info!("Graph is running. Press Ctrl+C to exit.");
    let outcome = run_refresh_loop(&mut driver, &batch_rx, mount_at, &shutdown);
    shutdown.store(true, Ordering::SeqCst);

    if let Err(e) = CommandSender::send_command(&socket, feed_addr, &Command::unsubscribe()) {
        warn!("Failed to unsubscribe: {}", e);
    }
    let early = outcome?;
    if let Some(table) = driver.table() {
        if table.is_empty() {
            warn!("No batches were charted");
        }
        let alerts = table.rows().iter().filter(|row| row.is_alert()).count();
        info!(
            "Session summary: {} rows over {} timestamps, {} alerting, {} batches before mount",
            table.len(),
            table.group_count(),
            alerts,
            early
        );
    }

    match receiver.join() {
        Ok(result) => result,
        Err(_) => Err(RatioError::Format(String::from("receiver thread panicked"))),
    }
}

fn init_logger() {
    env_logger::Builder::new()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();
}
