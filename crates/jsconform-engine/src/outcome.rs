//! Execution outcome classification.
//!
//! Engines report failures as free-form text on stderr. Whatever shape a
//! fixture threw (an Error subclass, a string, an object), it is normalized
//! here into a closed tagged variant so downstream reconciliation never
//! branches on unconstrained shapes.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::process::ExitStatus;
use std::time::Duration;

/// Closed classification of an uncaught error's category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorKind {
    Syntax,
    Type,
    Range,
    Reference,
    Generic,
}

impl ErrorKind {
    /// Map an engine-reported error head ("TypeError", "SyntaxError", ...) to a kind.
    pub fn from_head(head: &str) -> Self {
        match head {
            "SyntaxError" => ErrorKind::Syntax,
            "TypeError" => ErrorKind::Type,
            "RangeError" => ErrorKind::Range,
            "ReferenceError" => ErrorKind::Reference,
            _ => ErrorKind::Generic,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Syntax => "syntax",
            ErrorKind::Type => "type",
            ErrorKind::Range => "range",
            ErrorKind::Reference => "reference",
            ErrorKind::Generic => "generic",
        }
    }
}

/// Observable result of running one compiled fixture.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum Outcome {
    /// The engine process ran to quiescence and exited.
    Completed {
        stdout: String,
        stderr: String,
        exit_code: i32,
    },
    /// The engine exited abnormally with a recognizable error diagnostic
    /// (uncaught throw or uncaught promise rejection).
    ThrownUncaught {
        #[serde(rename = "errorKind")]
        kind: ErrorKind,
        message: String,
    },
    /// The wall-clock budget expired and the process was killed.
    TimedOut,
    /// The fixture never reached the engine (transform failure or unreadable source).
    CompileFailed { message: String },
}

impl Outcome {
    /// Stable variant name used in baselines and reports.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Outcome::Completed { .. } => "completed",
            Outcome::ThrownUncaught { .. } => "thrown-uncaught",
            Outcome::TimedOut => "timed-out",
            Outcome::CompileFailed { .. } => "compile-failed",
        }
    }

    /// Captured stdout, where the variant has any.
    pub fn stdout(&self) -> &str {
        match self {
            Outcome::Completed { stdout, .. } => stdout,
            _ => "",
        }
    }

    /// Short per-variant detail for baselines and diffs.
    pub fn detail(&self) -> String {
        match self {
            Outcome::Completed { exit_code, .. } => {
                if *exit_code == 0 {
                    String::new()
                } else {
                    format!("exit {}", exit_code)
                }
            }
            Outcome::ThrownUncaught { kind, message } => {
                format!("{}: {}", kind.as_str(), message)
            }
            Outcome::TimedOut => String::new(),
            Outcome::CompileFailed { message } => message.clone(),
        }
    }
}

/// One execution observation: an outcome plus how long the sandbox ran.
///
/// `duration` is recorded on every path, including timeout and kill paths.
#[derive(Debug, Clone, PartialEq)]
pub struct Execution {
    pub outcome: Outcome,
    pub duration: Duration,
}

/// First `XxxError: message` line in engine stderr.
static ERROR_HEAD: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)^\s*(?:Uncaught\s+)?([A-Za-z]+Error)\s*:\s*(.*)$").unwrap()
});

/// Classify a finished engine process into an outcome.
///
/// Nonzero exits are treated as uncaught errors only when stderr carries a
/// recognizable diagnostic; otherwise the exit code is an observable part of
/// a completed run (fixtures may call `process.exit(3)` on purpose).
pub fn classify(status: ExitStatus, stdout: String, stderr: String) -> Outcome {
    if status.success() {
        return Outcome::Completed {
            stdout,
            stderr,
            exit_code: 0,
        };
    }

    if let Some(caps) = ERROR_HEAD.captures(&stderr) {
        let kind = ErrorKind::from_head(&caps[1]);
        let message = caps[2].trim_end().to_string();
        return Outcome::ThrownUncaught { kind, message };
    }

    // Killed by signal or exited nonzero without a diagnostic
    match status.code() {
        Some(code) => Outcome::Completed {
            stdout,
            stderr,
            exit_code: code,
        },
        None => Outcome::ThrownUncaught {
            kind: ErrorKind::Generic,
            message: "process terminated by signal".to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::process::Command;

    fn run_sh(script: &str) -> (ExitStatus, String, String) {
        let out = Command::new("sh")
            .arg("-c")
            .arg(script)
            .output()
            .expect("sh should run");
        (
            out.status,
            String::from_utf8_lossy(&out.stdout).to_string(),
            String::from_utf8_lossy(&out.stderr).to_string(),
        )
    }

    #[test]
    fn test_classify_success() {
        let (status, stdout, stderr) = run_sh("echo hi");
        let outcome = classify(status, stdout, stderr);
        assert_eq!(outcome.kind_name(), "completed");
        assert_eq!(outcome.stdout(), "hi\n");
    }

    #[test]
    fn test_classify_type_error() {
        let (status, stdout, stderr) =
            run_sh("echo 'TypeError: x is not a function' >&2; exit 1");
        let outcome = classify(status, stdout, stderr);
        match outcome {
            Outcome::ThrownUncaught { kind, message } => {
                assert_eq!(kind, ErrorKind::Type);
                assert_eq!(message, "x is not a function");
            }
            other => panic!("Expected ThrownUncaught, got {:?}", other),
        }
    }

    #[test]
    fn test_classify_uncaught_prefix() {
        let (status, stdout, stderr) =
            run_sh("echo 'Uncaught ReferenceError: foo is not defined' >&2; exit 1");
        let outcome = classify(status, stdout, stderr);
        match outcome {
            Outcome::ThrownUncaught { kind, .. } => assert_eq!(kind, ErrorKind::Reference),
            other => panic!("Expected ThrownUncaught, got {:?}", other),
        }
    }

    #[test]
    fn test_classify_unknown_error_head_is_generic() {
        let (status, stdout, stderr) = run_sh("echo 'WeirdCustomError: boom' >&2; exit 1");
        let outcome = classify(status, stdout, stderr);
        match outcome {
            Outcome::ThrownUncaught { kind, message } => {
                assert_eq!(kind, ErrorKind::Generic);
                assert_eq!(message, "boom");
            }
            other => panic!("Expected ThrownUncaught, got {:?}", other),
        }
    }

    #[test]
    fn test_classify_plain_nonzero_exit_is_completed() {
        let (status, stdout, stderr) = run_sh("echo partial; exit 3");
        let outcome = classify(status, stdout, stderr);
        match outcome {
            Outcome::Completed {
                stdout, exit_code, ..
            } => {
                assert_eq!(stdout, "partial\n");
                assert_eq!(exit_code, 3);
            }
            other => panic!("Expected Completed, got {:?}", other),
        }
    }

    #[test]
    fn test_detail_for_variants() {
        let ok = Outcome::Completed {
            stdout: String::new(),
            stderr: String::new(),
            exit_code: 0,
        };
        assert_eq!(ok.detail(), "");

        let thrown = Outcome::ThrownUncaught {
            kind: ErrorKind::Syntax,
            message: "unexpected token".to_string(),
        };
        assert_eq!(thrown.detail(), "syntax: unexpected token");
    }
}
