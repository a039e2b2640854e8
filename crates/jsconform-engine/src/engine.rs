//! Engine handle resolution and command construction.
//!
//! An engine under test is an external executable described by configuration
//! (`[engines.<id>]` in jsconform.toml). The handle verifies the program can
//! be found once, up front, so a misconfigured engine aborts the run instead
//! of failing fixture by fixture.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::process::Command;

use crate::error::EngineError;

/// Placeholder in engine argv that is replaced with the script path.
pub const FILE_PLACEHOLDER: &str = "{file}";

/// Configured invocation for one engine.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EngineSpec {
    /// Program name or path (e.g. "node", "/usr/local/bin/d8")
    pub program: String,

    /// Arguments. `{file}` is replaced with the script path; when absent,
    /// the script path is appended as the final argument.
    #[serde(default)]
    pub args: Vec<String>,
}

/// A resolved, verified engine ready to execute fixtures.
#[derive(Debug, Clone)]
pub struct EngineHandle {
    id: String,
    spec: EngineSpec,
}

impl EngineHandle {
    /// Resolve an engine spec, verifying the program exists.
    pub fn new(id: &str, spec: EngineSpec) -> Result<Self, EngineError> {
        if resolve_program(&spec.program).is_none() {
            return Err(EngineError::ProgramNotFound(spec.program));
        }
        Ok(Self {
            id: id.to_string(),
            spec,
        })
    }

    /// The configured engine id (e.g. "node").
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Build the command line for executing one script file.
    pub fn command_for(&self, script: &Path) -> Command {
        let mut cmd = Command::new(&self.spec.program);
        let script_str = script.to_string_lossy();
        let mut placed = false;
        for arg in &self.spec.args {
            if arg.contains(FILE_PLACEHOLDER) {
                cmd.arg(arg.replace(FILE_PLACEHOLDER, &script_str));
                placed = true;
            } else {
                cmd.arg(arg);
            }
        }
        if !placed {
            cmd.arg(script.as_os_str());
        }
        cmd
    }
}

/// Locate a program: direct path if it contains a separator, PATH search otherwise.
fn resolve_program(program: &str) -> Option<PathBuf> {
    let candidate = Path::new(program);
    if candidate.components().count() > 1 {
        return candidate.exists().then(|| candidate.to_path_buf());
    }
    let path_var = std::env::var_os("PATH")?;
    for dir in std::env::split_paths(&path_var) {
        let full = dir.join(program);
        if full.is_file() {
            return Some(full);
        }
    }
    None
}
