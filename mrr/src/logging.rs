//! Development-time tracing.
//!
//! # Separation of Concerns
//!
//! - **Tracing (this module)**: Dev diagnostics via `RUST_LOG`, output to stderr.
//!   Not persisted.
//!
//! - **Stage logs (`io/stage_log`)**: Captured program output and metadata in
//!   `<work_dir>/logs/`. Always written, unaffected by `RUST_LOG`.
//!
//! - **Console progress**: Stage banners and results on stdout, printed by the
//!   pipeline itself.

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize the tracing subscriber.
///
/// Reads `RUST_LOG`. Defaults to `warn`, or `mrr=debug` when `verbose` is set.
/// Output: stderr, compact format.
///
/// # Example
/// ```bash
/// RUST_LOG=mrr=trace mrr --dfile d.pddl --ifile p.pddl --pfile p.pddl.m --encoder MRR
/// ```
pub fn init(verbose: bool) {
    let default = if verbose { "warn,mrr=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).compact())
        .init();
}
