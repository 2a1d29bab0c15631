//! Domain models and utilities for the ratio feed.
//!
//! - `market`: random-walk order book tops for the ABC/DEF pair.
//! - `ping_monitor`: in-memory keep-alive tracker for subscriber timeouts.
//! - `quote_generator`: background batch generator and subscriber broadcast.

pub mod market;
pub mod ping_monitor;
pub mod quote_generator;
