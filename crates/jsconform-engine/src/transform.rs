//! Transform adapter — TypeScript fixtures through the external TS→JS tool.
//!
//! Pure from the pipeline's point of view: source text in, compiled text or
//! a compile-error observation out. Transform failure is an ordinary,
//! expected result (a fixture may intentionally probe a syntax boundary),
//! so it never raises.

use serde::{Deserialize, Serialize};
use std::io::Write;
use std::process::{Command, Stdio};

use crate::engine::FILE_PLACEHOLDER;

/// How a fixture's source is interpreted, selected by file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    TypeScript,
    JavaScript,
}

/// Configured invocation for the external TS→JS tool.
///
/// Without a `{file}` placeholder in `args`, source is piped on stdin and
/// compiled JS read from stdout. With one, the source is materialized in a
/// scratch dir first.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TransformSpec {
    pub program: String,
    #[serde(default)]
    pub args: Vec<String>,
}

/// Result of compiling one fixture: exactly one of source or failure.
#[derive(Debug, Clone, PartialEq)]
pub enum CompileOutput {
    /// Plain JS ready for the sandbox.
    Source(String),
    /// The transform rejected the fixture.
    Failed(String),
}

/// The TS→JS transform adapter. `.js` fixtures pass through unchanged.
#[derive(Debug, Clone)]
pub struct Transformer {
    spec: Option<TransformSpec>,
}

impl Transformer {
    /// Build an adapter; `spec` is None when no transform tool is configured.
    pub fn new(spec: Option<TransformSpec>) -> Self {
        Self { spec }
    }

    /// Compile one fixture source.
    pub fn compile(&self, source: &str, kind: SourceKind) -> CompileOutput {
        match kind {
            SourceKind::JavaScript => CompileOutput::Source(source.to_string()),
            SourceKind::TypeScript => match &self.spec {
                Some(spec) => run_tool(spec, source),
                None => CompileOutput::Failed(
                    "no TS transform tool configured ([transform] in jsconform.toml)".to_string(),
                ),
            },
        }
    }
}

fn run_tool(spec: &TransformSpec, source: &str) -> CompileOutput {
    let uses_file = spec.args.iter().any(|a| a.contains(FILE_PLACEHOLDER));

    // Scratch file kept alive for the duration of the tool run
    let scratch;
    let mut cmd = Command::new(&spec.program);
    if uses_file {
        scratch = match materialize(source) {
            Ok(s) => s,
            Err(e) => return CompileOutput::Failed(format!("transform scratch dir: {}", e)),
        };
        let path = scratch.1.to_string_lossy().into_owned();
        for arg in &spec.args {
            cmd.arg(arg.replace(FILE_PLACEHOLDER, &path));
        }
        cmd.stdin(Stdio::null());
    } else {
        for arg in &spec.args {
            cmd.arg(arg);
        }
        cmd.stdin(Stdio::piped());
    }
    cmd.stdout(Stdio::piped()).stderr(Stdio::piped());

    let mut child = match cmd.spawn() {
        Ok(c) => c,
        Err(e) => {
            return CompileOutput::Failed(format!(
                "failed to spawn transform tool '{}': {}",
                spec.program, e
            ))
        }
    };

    if !uses_file {
        if let Some(mut stdin) = child.stdin.take() {
            // A tool that exits before reading all input produces a broken
            // pipe here; the exit status below is the signal that matters.
            let _ = stdin.write_all(source.as_bytes());
        }
    }

    let output = match child.wait_with_output() {
        Ok(o) => o,
        Err(e) => return CompileOutput::Failed(format!("transform tool I/O error: {}", e)),
    };

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        let message = stderr
            .lines()
            .find(|l| !l.trim().is_empty())
            .unwrap_or("transform tool exited nonzero")
            .trim()
            .to_string();
        return CompileOutput::Failed(message);
    }

    match String::from_utf8(output.stdout) {
        Ok(compiled) => CompileOutput::Source(compiled),
        Err(_) => CompileOutput::Failed("transform tool produced non-UTF-8 output".to_string()),
    }
}

/// Write source to a scratch file; returns the dir (for lifetime) and path.
fn materialize(source: &str) -> std::io::Result<(tempfile::TempDir, std::path::PathBuf)> {
    let dir = tempfile::Builder::new().prefix("jsconform-ts-").tempdir()?;
    let path = dir.path().join("fixture.ts");
    std::fs::write(&path, source)?;
    Ok((dir, path))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_js_passes_through() {
        let t = Transformer::new(None);
        let out = t.compile("console.log(1);\n", SourceKind::JavaScript);
        assert_eq!(out, CompileOutput::Source("console.log(1);\n".to_string()));
    }

    #[test]
    fn test_ts_without_tool_fails() {
        let t = Transformer::new(None);
        match t.compile("let x: number = 1;\n", SourceKind::TypeScript) {
            CompileOutput::Failed(msg) => assert!(msg.contains("no TS transform tool")),
            other => panic!("Expected Failed, got {:?}", other),
        }
    }

    #[test]
    fn test_stdin_tool_transforms() {
        // sed as a stand-in transform: strips a type annotation
        let t = Transformer::new(Some(TransformSpec {
            program: "sed".to_string(),
            args: vec!["s/: number//".to_string()],
        }));
        match t.compile("let x: number = 1;\n", SourceKind::TypeScript) {
            CompileOutput::Source(js) => assert_eq!(js, "let x = 1;\n"),
            other => panic!("Expected Source, got {:?}", other),
        }
    }

    #[test]
    fn test_file_placeholder_tool() {
        let t = Transformer::new(Some(TransformSpec {
            program: "cat".to_string(),
            args: vec![FILE_PLACEHOLDER.to_string()],
        }));
        match t.compile("let y = 2;\n", SourceKind::TypeScript) {
            CompileOutput::Source(js) => assert_eq!(js, "let y = 2;\n"),
            other => panic!("Expected Source, got {:?}", other),
        }
    }

    #[test]
    fn test_tool_failure_is_compile_failed() {
        let t = Transformer::new(Some(TransformSpec {
            program: "sh".to_string(),
            args: vec![
                "-c".to_string(),
                "echo 'TS1005: unexpected token' >&2; exit 2".to_string(),
            ],
        }));
        match t.compile("let ??? = 1;\n", SourceKind::TypeScript) {
            CompileOutput::Failed(msg) => assert!(msg.contains("TS1005")),
            other => panic!("Expected Failed, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_tool_is_compile_failed_not_panic() {
        let t = Transformer::new(Some(TransformSpec {
            program: "definitely-not-a-transform-tool".to_string(),
            args: vec![],
        }));
        match t.compile("let x = 1;\n", SourceKind::TypeScript) {
            CompileOutput::Failed(msg) => assert!(msg.contains("failed to spawn")),
            other => panic!("Expected Failed, got {:?}", other),
        }
    }
}
