//! I/O helpers for the pipeline: configuration, processes, files.

pub mod config;
pub mod executor;
pub mod process;
pub mod record_store;
pub mod stage_log;
pub mod workspace;
