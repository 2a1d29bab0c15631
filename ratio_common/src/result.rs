//! Result type alias shared across the workspace.
//!
//! Defaults the error type to the common `RatioError`, so functions can simply
//! return `Result<T>`.
use crate::error::RatioError;

/// Workspace-wide `Result` alias with `RatioError` as the default error.
pub type Result<T, E = RatioError> = std::result::Result<T, E>;
