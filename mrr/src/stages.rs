//! Command lines for each pipeline stage.
//!
//! Everything here is pure: given the configuration, the run inputs and the
//! budget-derived limits, build the [`StageRequest`] the executor will run.

use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::core::types::{Algorithm, Stage};
use crate::io::config::{PipelineConfig, ProgramConfig};
use crate::io::executor::StageRequest;
use crate::io::workspace::WorkPaths;

/// User-supplied inputs for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunInputs {
    pub domain: PathBuf,
    pub problem: PathBuf,
    pub plan: PathBuf,
    pub algorithm: Algorithm,
    /// Forward `--verbose` to the planning engine.
    pub verbose: bool,
}

/// Builds stage requests against one work directory and record file.
#[derive(Debug, Clone)]
pub struct StagePlanner<'a> {
    pub config: &'a PipelineConfig,
    pub paths: &'a WorkPaths,
    pub record_path: &'a Path,
    pub inputs: &'a RunInputs,
}

impl StagePlanner<'_> {
    /// Engine in encode mode, writing the WCNF and its statistics.
    pub fn encode(&self, remaining_minutes: f64) -> StageRequest {
        let mut args = vec![
            "--time".to_string(),
            format!("{remaining_minutes:.3}"),
        ];
        args.extend(self.pddl_args());
        args.extend([
            "--encode".to_string(),
            "--out-file".to_string(),
            display(self.record_path),
            "--wcnf-file".to_string(),
            display(&self.paths.encoded),
            "--alg".to_string(),
            self.inputs.algorithm.to_string(),
        ]);
        if self.inputs.verbose {
            args.push("--verbose".to_string());
        }
        request(Stage::Encode, &self.config.encoder, args, None, None)
    }

    /// Preprocessor simplifying the encoded instance; stdout becomes the preprocessed file.
    pub fn preprocess(&self, time_limit_secs: u64) -> StageRequest {
        let args = vec![
            display(&self.paths.encoded),
            "preprocess".to_string(),
            format!("-mapfile={}", self.paths.map.display()),
            format!("-timelimit={time_limit_secs}"),
        ];
        request(
            Stage::Preprocess,
            &self.config.preprocessor,
            args,
            None,
            Some(self.paths.preprocessed.clone()),
        )
    }

    /// Solver on the preprocessed instance, hard-limited to `time_limit_secs`.
    ///
    /// A limit of 0 kills the solver as soon as it starts; the budget has less than a second
    /// left at that point.
    pub fn solve(&self, time_limit_secs: u64) -> StageRequest {
        request(
            Stage::Solve,
            &self.config.solver,
            vec![display(&self.paths.preprocessed)],
            Some(Duration::from_secs(time_limit_secs)),
            Some(self.paths.solver_out.clone()),
        )
    }

    /// Preprocessor mapping the solver's assignment back to the encoded instance.
    pub fn reconstruct(&self) -> StageRequest {
        let args = vec![
            display(&self.paths.pp_model),
            "reconstruct".to_string(),
            format!("-mapfile={}", self.paths.map.display()),
        ];
        request(
            Stage::Reconstruct,
            &self.config.preprocessor,
            args,
            None,
            Some(self.paths.reconstruct_out.clone()),
        )
    }

    /// Engine in decode mode, appending solution metrics to the record.
    pub fn decode(&self) -> StageRequest {
        let mut args = self.pddl_args();
        args.extend([
            "--decode".to_string(),
            "--model-file".to_string(),
            display(&self.paths.model),
            "--out-file".to_string(),
            display(self.record_path),
            "--wcnf-file".to_string(),
            display(&self.paths.encoded),
        ]);
        if self.inputs.verbose {
            args.push("--verbose".to_string());
        }
        request(Stage::Decode, &self.config.encoder, args, None, None)
    }

    fn pddl_args(&self) -> Vec<String> {
        vec![
            "--domain".to_string(),
            display(&self.inputs.domain),
            "--problem".to_string(),
            display(&self.inputs.problem),
            "--plan".to_string(),
            display(&self.inputs.plan),
        ]
    }
}

fn request(
    stage: Stage,
    program: &ProgramConfig,
    stage_args: Vec<String>,
    timeout: Option<Duration>,
    stdout_path: Option<PathBuf>,
) -> StageRequest {
    let mut args = program.leading_args().to_vec();
    args.extend(stage_args);
    StageRequest {
        stage,
        program: program.program().to_string(),
        args,
        timeout,
        stdout_path,
    }
}

fn display(path: &Path) -> String {
    path.display().to_string()
}
