//! Plan-repair pipeline orchestrator.
//!
//! Drives an external toolchain through five sequential stages: encode a
//! planning problem into weighted CNF, preprocess it, solve it with a MaxSAT
//! solver, undo the preprocessing, and decode the model back into a plan. All
//! stages share one wall-clock budget and report into a single CSV result
//! record that the external planning engine also rewrites.
//!
//! - **[`core`]**: Pure logic (budget arithmetic, the result record, solver
//!   output parsing, fault classification). No I/O.
//! - **[`io`]**: Side effects (configuration, process execution, the record
//!   file, the work directory, stage logs).
//!
//! [`pipeline`] coordinates the two; [`stages`] builds each stage's command line.

pub mod core;
pub mod exit_codes;
pub mod io;
pub mod logging;
pub mod pipeline;
pub mod stages;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
