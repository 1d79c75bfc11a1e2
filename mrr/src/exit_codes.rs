//! Stable exit codes for the `mrr` CLI.

/// Every stage ran and the model was decoded.
pub const OK: i32 = 0;
/// A stage fault aborted the run; the fault is in the result record.
pub const ABORTED: i32 = 1;
/// Missing inputs, bad configuration, or an I/O failure outside the stages.
pub const INVALID: i32 = 1;
