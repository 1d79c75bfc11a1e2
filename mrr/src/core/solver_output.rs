//! Parsing of MaxSAT solver and preprocessor standard output.
//!
//! Both programs speak the same line protocol: `s <TOKEN>` reports a solve
//! status and `v <literals...>` carries a variable assignment. Other lines
//! (comments, `o` cost lines) are ignored.

use std::fmt;

use tracing::warn;

pub const STATUS_MARKER: &str = "s";
pub const ASSIGNMENT_MARKER: &str = "v";

/// Solver status decoded from an `s` line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SolverStatus {
    Optimal,
    Sat,
    Unsat,
    Timeout,
    SolverError,
    /// Token outside the documented table (or a bare `s` line).
    Unrecognized(String),
}

impl SolverStatus {
    /// Map a status token via the fixed table.
    pub fn from_token(token: &str) -> Self {
        match token {
            "OPTIMUM" | "OPTIMAL" => SolverStatus::Optimal,
            "SATISFIABLE" => SolverStatus::Sat,
            "UNSATISFIABLE" => SolverStatus::Unsat,
            "TIMEOUT" | "UNKNOWN" => SolverStatus::Timeout,
            "ERROR" => SolverStatus::SolverError,
            other => SolverStatus::Unrecognized(other.to_string()),
        }
    }

    /// Value written to the record's `maxsat_result` column.
    pub fn record_value(&self) -> &'static str {
        match self {
            SolverStatus::Optimal => "OPTIMAL",
            SolverStatus::Sat => "SAT",
            SolverStatus::Unsat => "UNSAT",
            SolverStatus::Timeout => "TIMEOUT",
            SolverStatus::SolverError => "SOLVER_ERROR",
            SolverStatus::Unrecognized(_) => "",
        }
    }

    /// Only SAT and OPTIMAL let the pipeline continue.
    pub fn is_continuable(&self) -> bool {
        matches!(self, SolverStatus::Optimal | SolverStatus::Sat)
    }
}

impl fmt::Display for SolverStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SolverStatus::Unrecognized(token) => write!(f, "unrecognized status '{token}'"),
            other => f.write_str(other.record_value()),
        }
    }
}

/// Everything the controller needs from one block of solver output.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SolverReport {
    /// Last status line seen, if any.
    pub status: Option<SolverStatus>,
    /// Last assignment line seen, verbatim (marker included).
    pub assignment: Option<String>,
}

/// Scan output line by line; the last status and the last assignment win.
pub fn parse_solver_output(stdout: &str) -> SolverReport {
    let mut report = SolverReport::default();
    for line in stdout.lines() {
        let line = line.trim_end();
        let mut tokens = line.split_whitespace();
        match tokens.next() {
            Some(ASSIGNMENT_MARKER) => report.assignment = Some(line.to_string()),
            Some(STATUS_MARKER) => {
                let status = SolverStatus::from_token(tokens.next().unwrap_or_default());
                if let SolverStatus::Unrecognized(token) = &status {
                    warn!(token = %token, "cannot decode MaxSAT result");
                }
                report.status = Some(status);
            }
            _ => {}
        }
    }
    report
}

/// Last assignment line in `stdout`, if any.
pub fn last_assignment(stdout: &str) -> Option<String> {
    parse_solver_output(stdout).assignment
}

/// Contents of the preprocessed-solution file handed to reconstruction.
pub fn solution_file_contents(assignment: &str) -> String {
    format!("{STATUS_MARKER} OPTIMUM\n{assignment}\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_every_documented_token() {
        let cases = [
            ("OPTIMUM", SolverStatus::Optimal),
            ("OPTIMAL", SolverStatus::Optimal),
            ("SATISFIABLE", SolverStatus::Sat),
            ("UNSATISFIABLE", SolverStatus::Unsat),
            ("TIMEOUT", SolverStatus::Timeout),
            ("UNKNOWN", SolverStatus::Timeout),
            ("ERROR", SolverStatus::SolverError),
        ];
        for (token, expected) in cases {
            assert_eq!(SolverStatus::from_token(token), expected, "{token}");
            assert_eq!(SolverStatus::from_token(token), SolverStatus::from_token(token));
        }
    }

    #[test]
    fn unknown_tokens_are_unrecognized() {
        let status = SolverStatus::from_token("optimum");
        assert_eq!(status, SolverStatus::Unrecognized("optimum".to_string()));
        assert_eq!(status.record_value(), "");
        assert!(!status.is_continuable());
    }

    #[test]
    fn record_values_match_taxonomy() {
        assert_eq!(SolverStatus::Optimal.record_value(), "OPTIMAL");
        assert_eq!(SolverStatus::Sat.record_value(), "SAT");
        assert_eq!(SolverStatus::Unsat.record_value(), "UNSAT");
        assert_eq!(SolverStatus::Timeout.record_value(), "TIMEOUT");
        assert_eq!(SolverStatus::SolverError.record_value(), "SOLVER_ERROR");
    }

    #[test]
    fn only_sat_and_optimal_continue() {
        assert!(SolverStatus::Optimal.is_continuable());
        assert!(SolverStatus::Sat.is_continuable());
        assert!(!SolverStatus::Unsat.is_continuable());
        assert!(!SolverStatus::Timeout.is_continuable());
        assert!(!SolverStatus::SolverError.is_continuable());
    }

    #[test]
    fn parses_status_and_assignment() {
        let out = "c Loandra\no 12\ns OPTIMUM FOUND\nv 1 -2 3\n";
        let report = parse_solver_output(out);
        assert_eq!(report.status, Some(SolverStatus::Optimal));
        assert_eq!(report.assignment.as_deref(), Some("v 1 -2 3"));
    }

    #[test]
    fn last_assignment_and_status_win() {
        let out = "s SATISFIABLE\nv 1 2\ns OPTIMUM\nv -1 2\n";
        let report = parse_solver_output(out);
        assert_eq!(report.status, Some(SolverStatus::Optimal));
        assert_eq!(report.assignment.as_deref(), Some("v -1 2"));
    }

    #[test]
    fn ignores_lines_that_only_share_a_prefix() {
        let out = "verbose: on\nsolver started\nc v 1 2\n";
        assert_eq!(parse_solver_output(out), SolverReport::default());
    }

    #[test]
    fn bare_status_marker_is_unrecognized() {
        let report = parse_solver_output("s\n");
        assert_eq!(
            report.status,
            Some(SolverStatus::Unrecognized(String::new()))
        );
    }

    #[test]
    fn unsat_output_has_no_assignment() {
        let report = parse_solver_output("s UNSATISFIABLE\n");
        assert_eq!(report.status, Some(SolverStatus::Unsat));
        assert_eq!(report.assignment, None);
    }

    #[test]
    fn solution_file_has_synthesized_status_header() {
        assert_eq!(solution_file_contents("v 1 -2 3"), "s OPTIMUM\nv 1 -2 3\n");
        assert_eq!(last_assignment("c done\nv 4 5\n").as_deref(), Some("v 4 5"));
    }
}
