//!
//! Core of the ratio monitor shared by the feed and the graph shell.
//!
//! This crate aggregates:
//! - `error`: unified error type `RatioError` used across the workspace.
//! - `result`: handy `Result<T, RatioError>` alias.
//! - `stocks`: the two instruments tracked by the monitor.
//! - `quote`: top-of-book quotes and the positional `QuoteBatch`.
//! - `record`: the Row Generator producing one `AnalyticsRecord` per batch.
//! - `schema`: sink column schema and view configuration.
//! - `driver`: the Refresh Driver and the sink traits it pushes into.
//! - `command`: UDP command payloads exchanged between graph and feed.
//! - `net`: networking constants and small helpers.
#![warn(missing_docs)]
pub mod command;
pub mod driver;
pub mod error;
pub mod net;
pub mod quote;
pub mod record;
pub mod result;
pub mod schema;
pub mod stocks;

pub use command::Command;
pub use driver::{RefreshDriver, Table, TableEngine};
pub use error::RatioError;
pub use quote::{Quote, QuoteBatch};
pub use record::AnalyticsRecord;
pub use result::Result;
