//! Quote batch generator and subscriber broadcast.
//!
//! `QuoteGenerator` runs a background thread that advances a `MarketWalk` once
//! per interval and broadcasts the resulting `QuoteBatch` to every registered
//! subscriber channel. New stream tasks register by sending their
//! `Sender<QuoteBatch>` on the channel returned by `QuoteGenerator::start`.
//!
//! Broadcast is best-effort: a subscriber whose channel is closed is dropped.

use crate::model::market::MarketWalk;
use chrono::Utc;
use crossbeam_channel::Sender;
use log::{debug, info};
use ratio_common::QuoteBatch;
use std::thread;
use std::time::Duration;

/// Background market data generator that broadcasts to subscribers.
pub struct QuoteGenerator;

impl QuoteGenerator {
    /// Start the generator thread and return a channel for registering subscribers.
    pub fn start(interval: Duration) -> Sender<Sender<QuoteBatch>> {
        let (subscribe_tx, subscribe_rx) = crossbeam_channel::unbounded::<Sender<QuoteBatch>>();

        thread::spawn(move || {
            let mut clients: Vec<Sender<QuoteBatch>> = Vec::new();
            let mut walk = MarketWalk::default();
            let mut rng = rand::rng();

            info!(
                "Market generator started (thread {:?}, interval {:?})",
                thread::current().id(),
                interval
            );

            loop {
                while let Ok(new_client_tx) = subscribe_rx.try_recv() {
                    clients.push(new_client_tx);
                    info!("Generator: new subscriber added. Total: {}", clients.len());
                }

                let batch = walk.next_batch(&mut rng, Utc::now());
                let [abc_mid, def_mid] = walk.mids();
                debug!("Generated batch ABC mid={:.4} DEF mid={:.4}", abc_mid, def_mid);
                clients.retain(|client_tx| client_tx.send(batch.clone()).is_ok());

                thread::sleep(interval);
            }
        });
        subscribe_tx
    }
}
