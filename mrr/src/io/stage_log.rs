//! Per-stage logs under `<work_dir>/logs/`.
//!
//! Each external invocation leaves `<n>-<stage>.json` (metadata) and
//! `<n>-<stage>.log` (captured stdout/stderr) behind, so a failed run can be
//! inspected after the fact.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Serialize;

use crate::core::types::Stage;
use crate::io::process::CommandOutput;

#[derive(Debug, Clone, Serialize)]
pub struct StageMeta {
    pub stage: Stage,
    pub program: String,
    pub args: Vec<String>,
    pub started_at: String,
    pub elapsed_ms: u64,
    pub exit_code: Option<i32>,
    pub timed_out: bool,
    pub timeout_secs: Option<u64>,
    pub stdout_bytes: usize,
    pub stderr_bytes: usize,
}

#[derive(Debug, Clone)]
pub struct StageLogPaths {
    pub meta_path: PathBuf,
    pub log_path: PathBuf,
}

impl StageLogPaths {
    pub fn new(logs_dir: &Path, stage: Stage) -> Self {
        let stem = format!("{}-{}", stage.ordinal(), stage.as_str());
        Self {
            meta_path: logs_dir.join(format!("{stem}.json")),
            log_path: logs_dir.join(format!("{stem}.log")),
        }
    }
}

pub fn write_stage_log(
    logs_dir: &Path,
    meta: &StageMeta,
    output: &CommandOutput,
) -> Result<StageLogPaths> {
    let paths = StageLogPaths::new(logs_dir, meta.stage);
    fs::create_dir_all(logs_dir)
        .with_context(|| format!("create stage log dir {}", logs_dir.display()))?;

    let mut buf = serde_json::to_string_pretty(meta).context("serialize stage meta")?;
    buf.push('\n');
    write_text(&paths.meta_path, &buf)?;

    let label = meta.stage.as_str();
    let mut log = String::new();
    log.push_str("=== stdout ===\n");
    log.push_str(&String::from_utf8_lossy(&output.stdout));
    log.push_str(&output.stdout_truncated_notice(label));
    log.push_str("\n=== stderr ===\n");
    log.push_str(&String::from_utf8_lossy(&output.stderr));
    log.push_str(&output.stderr_truncated_notice(label));
    if output.timed_out {
        log.push_str(&format!("\n[{label} timed out]\n"));
    }
    write_text(&paths.log_path, &log)?;

    Ok(paths)
}

fn write_text(path: &Path, contents: &str) -> Result<()> {
    fs::write(path, contents).with_context(|| format!("write {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stage_log_paths_are_ordered_by_stage() {
        let paths = StageLogPaths::new(Path::new("temp/logs"), Stage::Solve);
        assert_eq!(paths.meta_path, PathBuf::from("temp/logs/3-solve.json"));
        assert_eq!(paths.log_path, PathBuf::from("temp/logs/3-solve.log"));
    }

    #[cfg(unix)]
    #[test]
    fn writes_meta_and_output() {
        use std::process::Command;

        let temp = tempfile::tempdir().expect("tempdir");
        let mut cmd = Command::new("sh");
        cmd.arg("-c").arg("echo 's OPTIMUM'; echo warn 1>&2");
        let output = crate::io::process::run_command(cmd, None, 1_000, None).expect("run");

        let meta = StageMeta {
            stage: Stage::Solve,
            program: "sh".to_string(),
            args: vec!["-c".to_string()],
            started_at: "2026-01-01T00:00:00+00:00".to_string(),
            elapsed_ms: 3,
            exit_code: output.status.code(),
            timed_out: false,
            timeout_secs: Some(60),
            stdout_bytes: output.stdout_bytes,
            stderr_bytes: output.stderr.len(),
        };
        let paths = write_stage_log(&temp.path().join("logs"), &meta, &output).expect("write");

        let json: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&paths.meta_path).expect("read meta"))
                .expect("parse meta");
        assert_eq!(json["stage"], "solve");
        assert_eq!(json["timeout_secs"], 60);

        let log = fs::read_to_string(&paths.log_path).expect("read log");
        assert!(log.contains("s OPTIMUM"));
        assert!(log.contains("=== stderr ===\nwarn"));
    }
}
