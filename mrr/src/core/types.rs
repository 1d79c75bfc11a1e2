//! Shared deterministic types for the pipeline controller.

use std::fmt;
use std::path::PathBuf;

use clap::ValueEnum;
use serde::Serialize;

use crate::core::solver_output::SolverStatus;

/// Encoding algorithm accepted by the planning engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Algorithm {
    #[value(name = "MD")]
    Md,
    #[value(name = "MR")]
    Mr,
    #[value(name = "MR_OPSB")]
    MrOpsb,
    #[value(name = "MRD")]
    Mrd,
    #[value(name = "MRR")]
    Mrr,
    #[value(name = "MRR_OPSB")]
    MrrOpsb,
    #[value(name = "MRR_CSSB")]
    MrrCssb,
}

impl Algorithm {
    /// Identifier passed to the engine's `--alg` flag.
    pub fn as_str(self) -> &'static str {
        match self {
            Algorithm::Md => "MD",
            Algorithm::Mr => "MR",
            Algorithm::MrOpsb => "MR_OPSB",
            Algorithm::Mrd => "MRD",
            Algorithm::Mrr => "MRR",
            Algorithm::MrrOpsb => "MRR_OPSB",
            Algorithm::MrrCssb => "MRR_CSSB",
        }
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One external-program step of the pipeline, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Encode,
    Preprocess,
    Solve,
    Reconstruct,
    Decode,
}

impl Stage {
    pub const ALL: [Stage; 5] = [
        Stage::Encode,
        Stage::Preprocess,
        Stage::Solve,
        Stage::Reconstruct,
        Stage::Decode,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Stage::Encode => "encode",
            Stage::Preprocess => "preprocess",
            Stage::Solve => "solve",
            Stage::Reconstruct => "reconstruct",
            Stage::Decode => "decode",
        }
    }

    /// 1-based position, used to order stage logs.
    pub fn ordinal(self) -> usize {
        self as usize + 1
    }

    /// Console banner printed when the stage starts.
    pub fn banner(self) -> &'static str {
        match self {
            Stage::Encode => "Encoding WCNF",
            Stage::Preprocess => "Preprocessing WCNF",
            Stage::Solve => "Solving MaxSAT",
            Stage::Reconstruct => "Undoing preprocessing",
            Stage::Decode => "Decoding MaxSAT model",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Terminal classification of an aborted run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fault {
    EncoderTimeout,
    EncoderError,
    PreproError,
    PreproTimeout,
    /// Solver finished with a status that does not allow reconstruction.
    Solver(SolverStatus),
    /// Solver reported SAT/OPTIMAL but printed no assignment line.
    NoAssignment(SolverStatus),
    PreproReconstructError,
    /// Engine could not decode the model. Not a record value: `maxsat_result` keeps the
    /// solver's verdict.
    DecodeFailed,
}

impl Fault {
    /// Stage the fault is attributed to.
    pub fn stage(&self) -> Stage {
        match self {
            Fault::EncoderTimeout | Fault::EncoderError => Stage::Encode,
            Fault::PreproError | Fault::PreproTimeout => Stage::Preprocess,
            Fault::Solver(_) | Fault::NoAssignment(_) => Stage::Solve,
            Fault::PreproReconstructError => Stage::Reconstruct,
            Fault::DecodeFailed => Stage::Decode,
        }
    }

    /// Value written to `maxsat_result` when the run aborts; `None` leaves the record as is.
    pub fn record_value(&self) -> Option<&'static str> {
        let value = match self {
            Fault::EncoderTimeout => "ENCODER_TIMEOUT",
            Fault::EncoderError => "ENCODER_ERROR",
            Fault::PreproError => "PREPRO_ERROR",
            Fault::PreproTimeout => "PREPRO_TIMEOUT",
            Fault::Solver(status) | Fault::NoAssignment(status) => status.record_value(),
            Fault::PreproReconstructError => "PREPRO_RECONSTRUCT_ERROR",
            Fault::DecodeFailed => return None,
        };
        Some(value)
    }

    /// One-line console diagnostic.
    pub fn describe(&self) -> String {
        match self {
            Fault::EncoderTimeout | Fault::PreproTimeout => "Time elapsed".to_string(),
            Fault::EncoderError => "Encoding failed".to_string(),
            Fault::PreproError => "Preprocessing failed".to_string(),
            Fault::Solver(status) => format!("MaxSAT failed ({status})"),
            Fault::NoAssignment(status) => format!("MaxSAT failed ({status}, no model)"),
            Fault::PreproReconstructError => "Failed to undo preprocessing".to_string(),
            Fault::DecodeFailed => "Decoding failed".to_string(),
        }
    }
}

impl fmt::Display for Fault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.describe())
    }
}

/// Final state of one pipeline run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineOutcome {
    Done { record_path: PathBuf },
    Aborted { fault: Fault },
}

impl PipelineOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, PipelineOutcome::Done { .. })
    }
}
