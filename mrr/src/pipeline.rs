//! The pipeline controller.
//!
//! Runs encode, preprocess, solve, reconstruct and decode strictly in order
//! against one shared time budget. After every stage the outcome is written to
//! the result record; the first fault aborts the run. Faults before decoding
//! are written to `maxsat_result`; a decode failure leaves the solver's verdict.
//!
//! Solver and reconstruction output is parsed from the tee files in the work
//! directory, never from the size-limited in-memory capture.

use std::fs;
use std::ops::ControlFlow;
use std::path::Path;
use std::time::Instant;

use anyhow::{Context, Result};
use tracing::{debug, info, instrument, warn};

use crate::core::budget::Budget;
use crate::core::record::{Field, RecordSeed, ResultRecord};
use crate::core::solver_output::{
    SolverStatus, last_assignment, parse_solver_output, solution_file_contents,
};
use crate::core::types::{Fault, PipelineOutcome, Stage};
use crate::io::config::PipelineConfig;
use crate::io::executor::{StageExecutor, StageOutput, StageRequest};
use crate::io::record_store::RecordStore;
use crate::io::workspace::{WorkPaths, is_non_empty_file};
use crate::stages::{RunInputs, StagePlanner};

pub const SEP: &str = "************************************************";

type Flow = ControlFlow<Fault>;

/// Print a stage banner between separator lines.
pub fn print_header(header: &str) {
    println!("\n{SEP}\n** {header}\n{SEP}");
}

pub struct Pipeline<'a, E: StageExecutor> {
    config: &'a PipelineConfig,
    paths: WorkPaths,
    store: RecordStore,
    record: ResultRecord,
    budget: Budget,
    executor: &'a E,
    inputs: RunInputs,
}

impl<'a, E: StageExecutor> Pipeline<'a, E> {
    /// Set up a run and write the initial result record.
    ///
    /// `paths` must point at a freshly prepared work directory.
    pub fn new(
        config: &'a PipelineConfig,
        paths: WorkPaths,
        inputs: RunInputs,
        budget: Budget,
        executor: &'a E,
    ) -> Result<Self> {
        let store = RecordStore::new(&config.results_file);
        let domain = inputs.domain.display().to_string();
        let problem = inputs.problem.display().to_string();
        let plan = inputs.plan.display().to_string();
        let record = ResultRecord::new(&RecordSeed {
            domain: &domain,
            problem: &problem,
            plan: &plan,
            algorithm: inputs.algorithm.as_str(),
            time_limit_ms: budget.total_ms(),
        });

        println!("Initialising results file");
        store.initialize(&record)?;

        Ok(Self {
            config,
            paths,
            store,
            record,
            budget,
            executor,
            inputs,
        })
    }

    pub fn record(&self) -> &ResultRecord {
        &self.record
    }

    /// Drive the run to `Done` or the first fault.
    ///
    /// Faults are returned as [`PipelineOutcome::Aborted`]; `Err` is reserved for
    /// infrastructure failures such as an unwritable record.
    #[instrument(skip_all, fields(alg = %self.inputs.algorithm, budget_ms = self.budget.total_ms()))]
    pub fn run(&mut self) -> Result<PipelineOutcome> {
        for stage in Stage::ALL {
            print_header(stage.banner());
            debug!(stage = %stage, remaining_ms = self.budget.remaining_ms(), "stage starting");
            let flow = match stage {
                Stage::Encode => self.encode()?,
                Stage::Preprocess => self.preprocess()?,
                Stage::Solve => self.solve()?,
                Stage::Reconstruct => self.reconstruct()?,
                Stage::Decode => self.decode()?,
            };
            if let ControlFlow::Break(fault) = flow {
                return self.abort(fault);
            }
        }

        println!("Results written to {}", self.store.path().display());
        info!(
            elapsed_ms = u64::try_from(self.budget.elapsed().as_millis()).unwrap_or(u64::MAX),
            result = self.record.get(Field::MaxsatResult),
            "pipeline finished"
        );
        Ok(PipelineOutcome::Done {
            record_path: self.store.path().to_path_buf(),
        })
    }

    fn encode(&mut self) -> Result<Flow> {
        let request = self.planner().encode(self.budget.remaining_minutes());
        let (output, elapsed_ms) = self.execute(&request);

        // The engine writes its instance counters straight into the record file.
        self.reload_record();
        self.record.set(Field::EncTime, elapsed_ms);
        self.store.save(&self.record)?;

        if output.is_none() || !self.paths.encoded.is_file() {
            return Ok(ControlFlow::Break(Fault::EncoderError));
        }
        if self.budget.is_exhausted() {
            return Ok(ControlFlow::Break(Fault::EncoderTimeout));
        }
        Ok(ControlFlow::Continue(()))
    }

    fn preprocess(&mut self) -> Result<Flow> {
        let request = self
            .planner()
            .preprocess(self.budget.remaining_whole_secs());
        let (output, elapsed_ms) = self.execute(&request);
        self.record.set(Field::PreproTime, elapsed_ms);
        self.store.save(&self.record)?;

        if output.is_none() || !is_non_empty_file(&self.paths.preprocessed) {
            return Ok(ControlFlow::Break(Fault::PreproError));
        }
        if self.budget.is_exhausted() {
            return Ok(ControlFlow::Break(Fault::PreproTimeout));
        }
        Ok(ControlFlow::Continue(()))
    }

    fn solve(&mut self) -> Result<Flow> {
        let request = self.planner().solve(self.budget.remaining_whole_secs());
        let (output, elapsed_ms) = self.execute(&request);
        self.record.set(Field::MaxsatTime, elapsed_ms);

        let Some(output) = output else {
            self.store.save(&self.record)?;
            return Ok(ControlFlow::Break(Fault::Solver(SolverStatus::SolverError)));
        };
        self.echo(&output);

        let report = parse_solver_output(&full_stdout(&request, &output)?);
        let status = report.status.unwrap_or(if output.timed_out {
            SolverStatus::Timeout
        } else {
            SolverStatus::SolverError
        });
        if let Some(assignment) = &report.assignment {
            write_text(&self.paths.pp_model, &solution_file_contents(assignment))?;
            println!("Model written to {}", self.paths.pp_model.display());
        }
        println!("{status}");

        self.record.set(Field::MaxsatResult, status.record_value());
        self.store.save(&self.record)?;
        debug!(status = %status, has_assignment = report.assignment.is_some(), "solver finished");

        Ok(match (status.is_continuable(), report.assignment.is_some()) {
            (true, true) => ControlFlow::Continue(()),
            (true, false) => ControlFlow::Break(Fault::NoAssignment(status)),
            (false, _) => ControlFlow::Break(Fault::Solver(status)),
        })
    }

    fn reconstruct(&mut self) -> Result<Flow> {
        let request = self.planner().reconstruct();
        let (output, _) = self.execute(&request);
        let Some(output) = output else {
            return Ok(ControlFlow::Break(Fault::PreproReconstructError));
        };
        self.echo(&output);

        let Some(assignment) = last_assignment(&full_stdout(&request, &output)?) else {
            return Ok(ControlFlow::Break(Fault::PreproReconstructError));
        };
        write_text(&self.paths.model, &format!("{assignment}\n"))?;
        println!("Model written to {}", self.paths.model.display());
        Ok(ControlFlow::Continue(()))
    }

    fn decode(&mut self) -> Result<Flow> {
        let request = self.planner().decode();
        let (output, _) = self.execute(&request);

        // The engine appends the solution metrics to the record file.
        self.reload_record();

        match output {
            Some(output) if output.succeeded() => Ok(ControlFlow::Continue(())),
            _ => Ok(ControlFlow::Break(Fault::DecodeFailed)),
        }
    }

    fn abort(&mut self, fault: Fault) -> Result<PipelineOutcome> {
        if let Some(value) = fault.record_value() {
            self.record.set(Field::MaxsatResult, value);
        }
        self.store.save(&self.record)?;
        println!("{fault}");
        warn!(
            stage = %fault.stage(),
            result = self.record.get(Field::MaxsatResult),
            remaining_ms = self.budget.remaining_ms(),
            "pipeline aborted"
        );
        Ok(PipelineOutcome::Aborted { fault })
    }

    fn planner(&self) -> StagePlanner<'_> {
        StagePlanner {
            config: self.config,
            paths: &self.paths,
            record_path: self.store.path(),
            inputs: &self.inputs,
        }
    }

    /// Run one program, timing it on the budget's clock. `None` if it could not be run.
    fn execute(&self, request: &StageRequest) -> (Option<StageOutput>, i64) {
        let started = self.budget.now();
        let output = match self.executor.run(request) {
            Ok(output) => Some(output),
            Err(err) => {
                warn!(stage = %request.stage, err = format!("{err:#}"), "stage program could not be run");
                None
            }
        };
        (output, self.elapsed_ms_since(started))
    }

    fn elapsed_ms_since(&self, started: Instant) -> i64 {
        let elapsed = self.budget.now().saturating_duration_since(started);
        i64::try_from(elapsed.as_millis()).unwrap_or(i64::MAX)
    }

    fn reload_record(&mut self) {
        match self.store.load() {
            Ok(record) => self.record = record,
            Err(err) => warn!(err = format!("{err:#}"), "keeping in-memory result record"),
        }
    }

    fn echo(&self, output: &StageOutput) {
        if self.inputs.verbose {
            println!("{}", output.stdout_text());
        }
    }
}

/// Complete stdout of a stage whose output is parsed.
///
/// The in-memory capture stops at the output limit; the tee file does not.
fn full_stdout(request: &StageRequest, output: &StageOutput) -> Result<String> {
    let Some(path) = &request.stdout_path else {
        return Ok(output.stdout_text().to_string());
    };
    if output.stdout_truncated {
        debug!(stage = %request.stage, path = %path.display(), "capture limit hit, parsing tee file");
    }
    let bytes = fs::read(path)
        .with_context(|| format!("read {} output {}", request.stage, path.display()))?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

fn write_text(path: &Path, contents: &str) -> Result<()> {
    fs::write(path, contents).with_context(|| format!("write {}", path.display()))
}
