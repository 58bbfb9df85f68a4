//! slate-core: task model, GitHub client, and the reconciliation engine.
//!
//! # Conventions
//!
//! - **Errors**: typed `thiserror` enums at the GitHub boundary,
//!   `anyhow::Result` in orchestration glue.
//! - **Logging**: `tracing` macros (`info!`, `warn!`, `debug!`).

pub mod config;
pub mod github;
pub mod model;
pub mod sync;
