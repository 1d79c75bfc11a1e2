//! Deterministic, pure logic shared by the pipeline controller.
//!
//! Core modules must be free of I/O side effects (the budget only reads its
//! injected clock). They operate on in-memory values and return deterministic
//! outputs suitable for tests.

pub mod budget;
pub mod record;
pub mod solver_output;
pub mod types;
