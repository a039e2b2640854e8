//! Harness configuration (jsconform.toml).
//!
//! Engine selection and the TS→JS transform tool are configuration, never
//! hardcoded. The file is found by walking up from the working directory,
//! the same way a project manifest is.

use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use jsconform_engine::{EngineSpec, TransformSpec};

use crate::error::HarnessFault;

/// Config file name searched for in the CWD and its ancestors.
pub const CONFIG_FILE: &str = "jsconform.toml";

/// Parsed jsconform.toml.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct HarnessConfig {
    /// Engines under test, keyed by the id passed to `--engine`.
    #[serde(default)]
    pub engines: HashMap<String, EngineSpec>,

    /// External TS→JS transform tool; optional (a pure-JS corpus needs none).
    #[serde(default)]
    pub transform: Option<TransformSpec>,

    #[serde(default)]
    pub defaults: Defaults,
}

/// `[defaults]` section.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct Defaults {
    /// Sandbox wall-clock budget in milliseconds.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Worker pool bound; 0 means one worker per CPU.
    #[serde(default)]
    pub jobs: usize,

    /// Baseline store path, relative to the config file's directory.
    #[serde(default = "default_baseline")]
    pub baseline: PathBuf,
}

fn default_timeout_ms() -> u64 {
    5000
}

fn default_baseline() -> PathBuf {
    PathBuf::from("baseline.jsonl")
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            timeout_ms: default_timeout_ms(),
            jobs: 0,
            baseline: default_baseline(),
        }
    }
}

impl HarnessConfig {
    /// Parse a config file.
    pub fn load(path: &Path) -> Result<Self, HarnessFault> {
        let text = std::fs::read_to_string(path).map_err(|e| HarnessFault::Config {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        toml::from_str(&text).map_err(|e| HarnessFault::Config {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Walk up from `start` looking for jsconform.toml.
    pub fn find(start: &Path) -> Option<PathBuf> {
        let mut dir = start.to_path_buf();
        loop {
            let candidate = dir.join(CONFIG_FILE);
            if candidate.exists() {
                return Some(candidate);
            }
            if !dir.pop() {
                return None;
            }
        }
    }

    /// Look up an engine spec by id.
    pub fn engine(&self, id: &str, config_path: &Path) -> Result<EngineSpec, HarnessFault> {
        self.engines
            .get(id)
            .cloned()
            .ok_or_else(|| HarnessFault::UnknownEngine {
                id: id.to_string(),
                config: config_path.to_path_buf(),
            })
    }
}
