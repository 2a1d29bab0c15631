//! Rendering side of the graph.
//!
//! - `pivot`: in-memory pivot table sink honouring the chart's view config.
pub mod pivot;
