//! Stage executor abstraction.
//!
//! The [`StageExecutor`] trait decouples the pipeline controller from actually
//! spawning external programs. Tests use scripted executors that return
//! predetermined outputs (and simulate the programs' file side effects)
//! without spawning processes.

use std::path::PathBuf;
use std::process::Command;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::Utc;
use tracing::{debug, info, instrument, warn};

use crate::core::types::Stage;
use crate::io::process::run_command;
use crate::io::stage_log::{StageMeta, write_stage_log};

/// Parameters for one external program invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageRequest {
    pub stage: Stage,
    pub program: String,
    pub args: Vec<String>,
    /// Hard OS-level limit; `None` lets the program run to completion.
    pub timeout: Option<Duration>,
    /// Write standard output verbatim to this file as it is produced.
    pub stdout_path: Option<PathBuf>,
}

impl StageRequest {
    /// Shell-like rendering for diagnostics.
    pub fn command_line(&self) -> String {
        let mut parts = Vec::with_capacity(self.args.len() + 1);
        parts.push(self.program.as_str());
        parts.extend(self.args.iter().map(String::as_str));
        parts.join(" ")
    }
}

/// Raw result of one invocation. No interpretation of the output happens here.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StageOutput {
    pub elapsed: Duration,
    /// `None` when the process was terminated by a signal.
    pub exit_code: Option<i32>,
    pub timed_out: bool,
    /// Captured standard output; `None` if the program printed nothing.
    pub stdout: Option<String>,
    /// `stdout` holds only a prefix; the tee file (if any) has everything.
    pub stdout_truncated: bool,
}

impl StageOutput {
    pub fn succeeded(&self) -> bool {
        !self.timed_out && self.exit_code == Some(0)
    }

    pub fn stdout_text(&self) -> &str {
        self.stdout.as_deref().unwrap_or_default()
    }
}

/// Abstraction over how stages are executed.
pub trait StageExecutor {
    /// Run the stage's program. Errors mean the program could not be run at all.
    fn run(&self, request: &StageRequest) -> Result<StageOutput>;
}

/// Executor that spawns the configured programs.
#[derive(Debug, Clone)]
pub struct ProcessExecutor {
    /// Bytes of each stream kept in memory (and in stage logs).
    pub output_limit_bytes: usize,
    /// Where stage logs are written; `None` disables them.
    pub logs_dir: Option<PathBuf>,
}

impl StageExecutor for ProcessExecutor {
    #[instrument(skip_all, fields(stage = %request.stage, program = %request.program))]
    fn run(&self, request: &StageRequest) -> Result<StageOutput> {
        info!(command = %request.command_line(), timeout_secs = ?request.timeout.map(|t| t.as_secs()), "starting stage program");

        let mut cmd = Command::new(&request.program);
        cmd.args(&request.args);

        let started_at = Utc::now();
        let output = run_command(
            cmd,
            request.timeout,
            self.output_limit_bytes,
            request.stdout_path.as_deref(),
        )
        .with_context(|| format!("run {} ({})", request.stage, request.program))?;

        if let Some(logs_dir) = &self.logs_dir {
            let meta = StageMeta {
                stage: request.stage,
                program: request.program.clone(),
                args: request.args.clone(),
                started_at: started_at.to_rfc3339(),
                elapsed_ms: output.elapsed.as_millis() as u64,
                exit_code: output.status.code(),
                timed_out: output.timed_out,
                timeout_secs: request.timeout.map(|t| t.as_secs()),
                stdout_bytes: output.stdout_bytes,
                stderr_bytes: output.stderr.len() + output.stderr_truncated,
            };
            if let Err(err) = write_stage_log(logs_dir, &meta, &output) {
                warn!(err = %err, "failed to write stage log");
            }
        }

        if output.timed_out {
            warn!(timeout_secs = ?request.timeout.map(|t| t.as_secs()), "stage program timed out");
        } else if !output.status.success() {
            warn!(exit_code = ?output.status.code(), "stage program exited with failure");
        }

        let stdout = if output.stdout.is_empty() {
            None
        } else {
            Some(String::from_utf8_lossy(&output.stdout).into_owned())
        };

        debug!(elapsed_ms = output.elapsed.as_millis() as u64, "stage program finished");
        Ok(StageOutput {
            elapsed: output.elapsed,
            exit_code: output.status.code(),
            timed_out: output.timed_out,
            stdout,
            stdout_truncated: output.stdout_truncated > 0,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_line_joins_program_and_args() {
        let request = StageRequest {
            stage: Stage::Preprocess,
            program: "maxpre".to_string(),
            args: vec![
                "temp/encoded.wcnf".to_string(),
                "preprocess".to_string(),
                "-timelimit=12".to_string(),
            ],
            timeout: None,
            stdout_path: None,
        };
        assert_eq!(
            request.command_line(),
            "maxpre temp/encoded.wcnf preprocess -timelimit=12"
        );
    }

    #[test]
    fn output_success_requires_clean_exit() {
        let ok = StageOutput {
            exit_code: Some(0),
            ..StageOutput::default()
        };
        assert!(ok.succeeded());

        let killed = StageOutput {
            exit_code: None,
            timed_out: true,
            ..StageOutput::default()
        };
        assert!(!killed.succeeded());
        assert_eq!(killed.stdout_text(), "");
    }

    #[cfg(unix)]
    #[test]
    fn process_executor_runs_program_and_writes_logs() {
        let temp = tempfile::tempdir().expect("tempdir");
        let logs_dir = temp.path().join("logs");
        let executor = ProcessExecutor {
            output_limit_bytes: 1_000,
            logs_dir: Some(logs_dir.clone()),
        };
        let request = StageRequest {
            stage: Stage::Reconstruct,
            program: "sh".to_string(),
            args: vec!["-c".to_string(), "echo 'v 1 -2 3'".to_string()],
            timeout: Some(Duration::from_secs(10)),
            stdout_path: None,
        };

        let output = executor.run(&request).expect("run");
        assert!(output.succeeded());
        assert_eq!(output.stdout_text(), "v 1 -2 3\n");
        assert!(logs_dir.join("4-reconstruct.json").is_file());
        assert!(logs_dir.join("4-reconstruct.log").is_file());
    }

    #[cfg(unix)]
    #[test]
    fn process_executor_reports_missing_program() {
        let executor = ProcessExecutor {
            output_limit_bytes: 1_000,
            logs_dir: None,
        };
        let request = StageRequest {
            stage: Stage::Solve,
            program: "/nonexistent/loandra".to_string(),
            args: Vec::new(),
            timeout: None,
            stdout_path: None,
        };
        let err = executor.run(&request).unwrap_err();
        assert!(format!("{err:#}").contains("run solve"));
    }
}
