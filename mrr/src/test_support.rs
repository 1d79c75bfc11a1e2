//! Test-only doubles for driving the pipeline without real programs or time.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use anyhow::{Context, Result, anyhow, bail};

use crate::core::budget::Clock;
use crate::core::types::Stage;
use crate::io::executor::{StageExecutor, StageOutput, StageRequest};
use crate::io::record_store::RecordStore;

/// Manually advanced clock. Clones share the same time.
#[derive(Debug, Clone)]
pub struct FakeClock {
    base: Instant,
    offset_ms: Arc<AtomicU64>,
}

impl FakeClock {
    pub fn new() -> Self {
        Self {
            base: Instant::now(),
            offset_ms: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn advance(&self, by: Duration) {
        let ms = u64::try_from(by.as_millis()).unwrap_or(u64::MAX);
        self.offset_ms.fetch_add(ms, Ordering::SeqCst);
    }
}

impl Default for FakeClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for FakeClock {
    fn now(&self) -> Instant {
        self.base + Duration::from_millis(self.offset_ms.load(Ordering::SeqCst))
    }
}

/// What one simulated program invocation does.
#[derive(Debug, Clone, Default)]
pub struct ScriptedStage {
    pub output: StageOutput,
    /// Files the program leaves behind.
    pub writes: Vec<(PathBuf, String)>,
    /// Record fields the program rewrites in place: (record path, field, value).
    pub record_updates: Vec<(PathBuf, String, String)>,
    /// Fail as if the program could not be spawned.
    pub spawn_error: bool,
    /// Complete stdout when `output.stdout` holds only a capped prefix.
    pub full_stdout: Option<String>,
}

impl ScriptedStage {
    /// Clean exit printing `stdout`.
    pub fn ok(stdout: &str) -> Self {
        Self {
            output: StageOutput {
                exit_code: Some(0),
                stdout: (!stdout.is_empty()).then(|| stdout.to_string()),
                ..StageOutput::default()
            },
            ..Self::default()
        }
    }

    pub fn exit_code(mut self, code: i32) -> Self {
        self.output.exit_code = Some(code);
        self
    }

    /// Killed by the hard timeout.
    pub fn timed_out(mut self) -> Self {
        self.output.exit_code = None;
        self.output.timed_out = true;
        self
    }

    /// Takes `elapsed` of wall-clock time (advances the executor's clock).
    pub fn taking(mut self, elapsed: Duration) -> Self {
        self.output.elapsed = elapsed;
        self
    }

    /// Keep only the first `limit` bytes of stdout in memory, like the process executor's
    /// capture limit. The tee file still receives everything.
    pub fn capped_at(mut self, limit: usize) -> Self {
        if let Some(stdout) = self.output.stdout.take() {
            let cut = (0..=limit.min(stdout.len()))
                .rev()
                .find(|&i| stdout.is_char_boundary(i))
                .unwrap_or(0);
            self.output.stdout_truncated = cut < stdout.len();
            self.output.stdout = Some(stdout[..cut].to_string());
            self.full_stdout = Some(stdout);
        }
        self
    }

    pub fn writing(mut self, path: impl Into<PathBuf>, contents: impl Into<String>) -> Self {
        self.writes.push((path.into(), contents.into()));
        self
    }

    pub fn updating_record(
        mut self,
        record_path: impl Into<PathBuf>,
        field: &str,
        value: impl Into<String>,
    ) -> Self {
        self.record_updates
            .push((record_path.into(), field.to_string(), value.into()));
        self
    }

    pub fn spawn_failure() -> Self {
        Self {
            spawn_error: true,
            ..Self::default()
        }
    }
}

/// Executor replaying queued [`ScriptedStage`]s in order and recording every request.
#[derive(Debug, Default)]
pub struct ScriptedExecutor {
    script: RefCell<VecDeque<ScriptedStage>>,
    requests: RefCell<Vec<StageRequest>>,
    clock: Option<FakeClock>,
}

impl ScriptedExecutor {
    pub fn new(script: impl IntoIterator<Item = ScriptedStage>) -> Self {
        Self {
            script: RefCell::new(script.into_iter().collect()),
            requests: RefCell::new(Vec::new()),
            clock: None,
        }
    }

    /// Advance `clock` by each stage's elapsed time.
    pub fn with_clock(mut self, clock: FakeClock) -> Self {
        self.clock = Some(clock);
        self
    }

    pub fn requests(&self) -> Vec<StageRequest> {
        self.requests.borrow().clone()
    }

    pub fn stages(&self) -> Vec<Stage> {
        self.requests.borrow().iter().map(|r| r.stage).collect()
    }

    pub fn remaining(&self) -> usize {
        self.script.borrow().len()
    }
}

impl StageExecutor for ScriptedExecutor {
    fn run(&self, request: &StageRequest) -> Result<StageOutput> {
        self.requests.borrow_mut().push(request.clone());
        let step = self
            .script
            .borrow_mut()
            .pop_front()
            .ok_or_else(|| anyhow!("no scripted output for stage {}", request.stage))?;

        if let Some(clock) = &self.clock {
            clock.advance(step.output.elapsed);
        }
        if step.spawn_error {
            bail!("run {} ({}): program not found", request.stage, request.program);
        }

        for (path, contents) in &step.writes {
            write_file(path, contents)?;
        }
        for (record_path, field, value) in &step.record_updates {
            RecordStore::new(record_path).update_field(field, value)?;
        }
        if let Some(path) = &request.stdout_path {
            let teed = step
                .full_stdout
                .as_deref()
                .unwrap_or(step.output.stdout_text());
            write_file(path, teed)?;
        }
        Ok(step.output)
    }
}

fn write_file(path: &Path, contents: &str) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent).with_context(|| format!("create {}", parent.display()))?;
    }
    fs::write(path, contents).with_context(|| format!("write {}", path.display()))
}
