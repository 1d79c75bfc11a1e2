//! CLI tests for the `mrr` binary.
//!
//! Spawns the binary and checks exit codes, console output, and the result
//! record it leaves behind.

use std::fs;
use std::process::Command;

use mrr::exit_codes;

#[test]
fn missing_domain_file_exits_invalid() {
    let temp = tempfile::tempdir().expect("tempdir");

    let output = Command::new(env!("CARGO_BIN_EXE_mrr"))
        .current_dir(temp.path())
        .args([
            "--dfile",
            "missing-domain.pddl",
            "--ifile",
            "p01.pddl",
            "--pfile",
            "p01.pddl.m",
            "--encoder",
            "MRR",
        ])
        .output()
        .expect("run mrr");

    assert_eq!(output.status.code(), Some(exit_codes::INVALID));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("File does not exist: missing-domain.pddl"),
        "{stderr}"
    );
    // Inputs are checked before the work dir or record are touched.
    assert!(!temp.path().join("temp").exists());
    assert!(!temp.path().join("mrr-results.csv").exists());
}

#[test]
fn invalid_config_exits_invalid() {
    let temp = tempfile::tempdir().expect("tempdir");
    for name in ["domain.pddl", "p01.pddl", "p01.pddl.m"] {
        fs::write(temp.path().join(name), "()\n").expect("write input");
    }
    fs::write(temp.path().join("mrr.toml"), "output_limit_bytes = 0\n").expect("write config");

    let output = Command::new(env!("CARGO_BIN_EXE_mrr"))
        .current_dir(temp.path())
        .args([
            "--dfile",
            "domain.pddl",
            "--ifile",
            "p01.pddl",
            "--pfile",
            "p01.pddl.m",
            "--encoder",
            "MD",
        ])
        .output()
        .expect("run mrr");

    assert_eq!(output.status.code(), Some(exit_codes::INVALID));
    assert!(String::from_utf8_lossy(&output.stderr).contains("output_limit_bytes must be > 0"));
}

#[cfg(unix)]
#[test]
fn encoder_that_writes_nothing_aborts_with_encoder_error() {
    use mrr::core::record::Field;
    use mrr::io::config::{PipelineConfig, ProgramConfig, write_config};
    use mrr::io::record_store::RecordStore;

    let temp = tempfile::tempdir().expect("tempdir");
    for name in ["domain.pddl", "p01.pddl", "p01.pddl.m"] {
        fs::write(temp.path().join(name), "()\n").expect("write input");
    }
    let config = PipelineConfig {
        work_dir: temp.path().join("temp"),
        results_file: temp.path().join("out/mrr-results.csv"),
        encoder: ProgramConfig::new(["sh", "-c", "exit 0", "engine"]),
        ..PipelineConfig::default()
    };
    let config_path = temp.path().join("pipeline.toml");
    write_config(&config_path, &config).expect("write config");

    let output = Command::new(env!("CARGO_BIN_EXE_mrr"))
        .current_dir(temp.path())
        .args(["--dfile", "domain.pddl", "--ifile", "p01.pddl", "--pfile", "p01.pddl.m"])
        .args(["--encoder", "MR", "--time", "1"])
        .arg("--config")
        .arg(&config_path)
        .output()
        .expect("run mrr");

    assert_eq!(output.status.code(), Some(exit_codes::ABORTED));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("** Encoding WCNF"), "{stdout}");
    assert!(stdout.contains("Encoding failed"), "{stdout}");
    assert!(!stdout.contains("Preprocessing WCNF"), "{stdout}");

    let record = RecordStore::new(&config.results_file)
        .load()
        .expect("load record");
    assert_eq!(record.get(Field::MaxsatResult), "ENCODER_ERROR");
    assert_eq!(record.get(Field::Alg), "MR");
    assert_eq!(record.get(Field::TimeLimit), "60000");
}
