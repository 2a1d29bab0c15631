//! Error types shared between the feed, the graph shell, and the core.
//!
//! `RatioError` unifies I/O, serialization, channel and sink failures so every
//! crate can propagate a single error type. Numeric degeneracy (a zero
//! secondary mid-price) is deliberately absent: it flows through as a
//! non-finite ratio.
use std::io;
use std::sync::PoisonError;

use thiserror::Error;

/// Unified error type shared by all workspace crates.
#[derive(Error, Debug)]
pub enum RatioError {
    /// I/O error originating from the standard library or sockets.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Generic formatting/validation error with a human-readable message.
    #[error("Format error: {0}")]
    Format(String),

    /// Failure while encoding/decoding JSON via serde_json.
    #[error("JSON serialization/deserialization error: {0}")]
    SerdeJson(#[from] serde_json::Error),

    /// A quote batch carried fewer than the two positional entries.
    #[error("Incomplete quote batch: expected 2 quotes, got {0}")]
    IncompleteBatch(usize),

    /// The hosting environment could not provide a table for the schema.
    #[error("Table unavailable: {0}")]
    TableUnavailable(String),

    /// Channel send failed (e.g., receiver dropped); contains a short context string.
    #[error("Channel send failed: {0}")]
    ChannelSend(String),

    /// Channel receive failed (e.g., sender closed); contains a short context string.
    #[error("Channel receive failed: {0}")]
    ChannelRecv(String),

    /// A poisoned mutex/lock was encountered.
    #[error("Mutex Lock Poisoned: {0}")]
    MutexLock(String),
}

impl<T> From<PoisonError<T>> for RatioError {
    fn from(err: PoisonError<T>) -> Self {
        RatioError::MutexLock(err.to_string())
    }
}
