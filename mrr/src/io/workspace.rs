//! Scratch directory layout and input file checks.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use tracing::{debug, warn};

/// All artifact paths inside the work directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkPaths {
    pub dir: PathBuf,
    /// Encoded WCNF written by the planning engine.
    pub encoded: PathBuf,
    /// Preprocessor output (simplified WCNF).
    pub preprocessed: PathBuf,
    /// Map linking the preprocessed instance back to the encoded one.
    pub map: PathBuf,
    /// Solver assignment for the preprocessed instance.
    pub pp_model: PathBuf,
    /// Reconstructed assignment for the encoded instance.
    pub model: PathBuf,
    /// Complete solver stdout, parsed for status and assignment.
    pub solver_out: PathBuf,
    /// Complete reconstruction stdout, parsed for the assignment.
    pub reconstruct_out: PathBuf,
    pub logs_dir: PathBuf,
}

impl WorkPaths {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        let dir = dir.into();
        let preprocessed = dir.join("preprocessed.wcnf");
        Self {
            encoded: dir.join("encoded.wcnf"),
            map: dir.join("preprocessed.wcnf.map"),
            preprocessed,
            pp_model: dir.join("pp-model.dimacs"),
            model: dir.join("model.dimacs"),
            solver_out: dir.join("solver.out"),
            reconstruct_out: dir.join("reconstruct.out"),
            logs_dir: dir.join("logs"),
            dir,
        }
    }
}

/// Recreate `dir` from scratch, destroying previous contents.
///
/// Refuses to touch an existing regular file at that path.
pub fn prepare_work_dir(dir: &Path) -> Result<WorkPaths> {
    if dir.is_file() {
        bail!("{} is a file", dir.display());
    }
    if dir.is_dir() {
        debug!(dir = %dir.display(), "removing previous work dir");
        fs::remove_dir_all(dir).with_context(|| format!("remove {}", dir.display()))?;
    }
    println!("Making directory: {}", dir.display());
    fs::create_dir_all(dir).with_context(|| format!("create {}", dir.display()))?;
    Ok(WorkPaths::new(dir))
}

/// Error unless `path` is an existing regular file.
pub fn require_file(path: &Path) -> Result<()> {
    if !path.is_file() {
        bail!("File does not exist: {}", path.display());
    }
    Ok(())
}

/// Resolve the plan file, falling back to its lower-cased path.
pub fn resolve_plan_file(path: &Path) -> Result<PathBuf> {
    if path.is_file() {
        return Ok(path.to_path_buf());
    }
    let lowered = PathBuf::from(path.to_string_lossy().to_lowercase());
    warn!(
        plan = %path.display(),
        fallback = %lowered.display(),
        "plan file missing, trying lower-case path"
    );
    require_file(&lowered)?;
    Ok(lowered)
}

/// True if `path` is a file with at least one byte.
pub fn is_non_empty_file(path: &Path) -> bool {
    fs::metadata(path)
        .map(|meta| meta.is_file() && meta.len() > 0)
        .unwrap_or(false)
}
