//! Pipeline configuration stored in `mrr.toml`.
//!
//! Every external program is configured as a command line prefix, so a stage's
//! program can be swapped without touching the controller.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};

pub const DEFAULT_CONFIG_FILE: &str = "mrr.toml";

const ENGINE_CLASSPATH: &str =
    "./lib/pplib-0.1.2.jar:./lib/args4j-2.33.jar:./lib/libtw.jar:./lib/pddl4j-3.5.0.jar";
const ENGINE_MAIN: &str = "au.rmit.agtgrp.pplib.pp.mrr.MrrMain";

/// Pipeline configuration (TOML).
///
/// Missing fields default to the stock toolchain (`java` engine, `maxpre`, `loandra`).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct PipelineConfig {
    /// Scratch directory, recreated at the start of every run.
    pub work_dir: PathBuf,

    /// Result record written (and rewritten) throughout the run.
    pub results_file: PathBuf,

    /// Keep at most this many bytes of each captured stream in memory and in stage logs.
    pub output_limit_bytes: usize,

    pub encoder: ProgramConfig,
    pub preprocessor: ProgramConfig,
    pub solver: ProgramConfig,
}

/// Program plus fixed leading arguments; stage arguments are appended after these.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProgramConfig {
    pub command: Vec<String>,
}

impl ProgramConfig {
    pub fn new<I, S>(command: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            command: command.into_iter().map(Into::into).collect(),
        }
    }

    pub fn program(&self) -> &str {
        self.command.first().map(String::as_str).unwrap_or_default()
    }

    pub fn leading_args(&self) -> &[String] {
        self.command.get(1..).unwrap_or_default()
    }

    fn validate(&self, label: &str) -> Result<()> {
        if self.program().trim().is_empty() {
            return Err(anyhow!("{label}.command must be a non-empty array"));
        }
        Ok(())
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            work_dir: PathBuf::from("./temp"),
            results_file: PathBuf::from("mrr-results.csv"),
            output_limit_bytes: 10_000_000,
            encoder: ProgramConfig::new(["java", "-Xmx8G", "-cp", ENGINE_CLASSPATH, ENGINE_MAIN]),
            preprocessor: ProgramConfig::new(["maxpre"]),
            solver: ProgramConfig::new(["loandra", "-print-model"]),
        }
    }
}

impl PipelineConfig {
    pub fn validate(&self) -> Result<()> {
        if self.output_limit_bytes == 0 {
            return Err(anyhow!("output_limit_bytes must be > 0"));
        }
        if self.work_dir.as_os_str().is_empty() {
            return Err(anyhow!("work_dir must not be empty"));
        }
        if self.results_file.as_os_str().is_empty() {
            return Err(anyhow!("results_file must not be empty"));
        }
        self.encoder.validate("encoder")?;
        self.preprocessor.validate("preprocessor")?;
        self.solver.validate("solver")?;
        Ok(())
    }
}

/// Load config from a TOML file.
///
/// If the file is missing, returns `PipelineConfig::default()`.
pub fn load_config(path: &Path) -> Result<PipelineConfig> {
    if !path.exists() {
        let cfg = PipelineConfig::default();
        cfg.validate()?;
        return Ok(cfg);
    }
    let contents = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let cfg: PipelineConfig =
        toml::from_str(&contents).with_context(|| format!("parse {}", path.display()))?;
    cfg.validate()?;
    Ok(cfg)
}

/// Atomically write config to disk (temp file + rename).
pub fn write_config(path: &Path, cfg: &PipelineConfig) -> Result<()> {
    cfg.validate()?;
    let mut buf = toml::to_string_pretty(cfg).context("serialize config toml")?;
    buf.push('\n');
    write_atomic(path, &buf)
}

fn write_atomic(path: &Path, contents: &str) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)
            .with_context(|| format!("create directory {}", parent.display()))?;
    }
    let tmp_path = path.with_extension("toml.tmp");
    fs::write(&tmp_path, contents)
        .with_context(|| format!("write temp config {}", tmp_path.display()))?;
    fs::rename(&tmp_path, path).with_context(|| format!("replace config {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_missing_returns_default() {
        let temp = tempfile::tempdir().expect("tempdir");
        let cfg = load_config(&temp.path().join("missing.toml")).expect("load");
        assert_eq!(cfg, PipelineConfig::default());
    }

    #[test]
    fn write_then_load_round_trips() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("mrr.toml");
        let mut cfg = PipelineConfig::default();
        cfg.solver = ProgramConfig::new(["open-wbo", "-print-model"]);
        write_config(&path, &cfg).expect("write");
        let loaded = load_config(&path).expect("load");
        assert_eq!(loaded, cfg);
    }

    #[test]
    fn partial_file_keeps_defaults() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("mrr.toml");
        fs::write(&path, "work_dir = \"scratch\"\n\n[solver]\ncommand = [\"rc2\"]\n")
            .expect("write");
        let cfg = load_config(&path).expect("load");
        assert_eq!(cfg.work_dir, PathBuf::from("scratch"));
        assert_eq!(cfg.solver.program(), "rc2");
        assert!(cfg.solver.leading_args().is_empty());
        assert_eq!(cfg.preprocessor, PipelineConfig::default().preprocessor);
    }

    #[test]
    fn rejects_empty_command() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("mrr.toml");
        fs::write(&path, "[preprocessor]\ncommand = []\n").expect("write");
        let err = load_config(&path).unwrap_err();
        assert!(format!("{err:#}").contains("preprocessor.command"));
    }

    #[test]
    fn default_engine_command_splits_program_and_args() {
        let cfg = PipelineConfig::default();
        assert_eq!(cfg.encoder.program(), "java");
        assert_eq!(cfg.encoder.leading_args().len(), 4);
        assert_eq!(cfg.encoder.leading_args()[3], ENGINE_MAIN);
    }
}
