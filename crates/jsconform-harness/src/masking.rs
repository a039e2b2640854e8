//! Output normalization and nondeterminism masking.
//!
//! Raw byte-equality makes the regression oracle useless against fixtures
//! that legitimately print timestamps or identity hashes. The mask rule set
//! is explicit and inspectable: built-in defaults live in one table here,
//! and a TOML rule file can extend or replace them. Nothing is hardcoded
//! per-fixture.

use regex::Regex;
use serde::Deserialize;
use std::path::Path;

use crate::error::HarnessFault;

/// Built-in masking defaults: (name, pattern, replacement).
const BUILTIN_RULES: &[(&str, &str, &str)] = &[
    (
        "iso-timestamp",
        r"\d{4}-\d{2}-\d{2}T\d{2}:\d{2}:\d{2}(?:\.\d+)?(?:Z|[+-]\d{2}:\d{2})?",
        "<timestamp>",
    ),
    ("hex-identity", r"0x[0-9a-fA-F]{6,}", "<addr>"),
    // Date.now()-scale millisecond epochs (2017..2033)
    ("epoch-millis", r"\b1[5-9]\d{11}\b", "<epoch-ms>"),
];

/// One masking rule: every pattern match is replaced by the placeholder.
#[derive(Debug, Clone)]
pub struct MaskRule {
    pub name: String,
    pub pattern: Regex,
    pub replace: String,
}

/// Rule file shape: `[[rule]]` tables, optionally replacing the builtins.
#[derive(Debug, Deserialize)]
struct RuleFile {
    /// Keep the built-in rules ahead of the file's own (default true).
    #[serde(default = "default_true", rename = "extend-builtin")]
    extend_builtin: bool,
    #[serde(default, rename = "rule")]
    rules: Vec<RuleEntry>,
}

#[derive(Debug, Deserialize)]
struct RuleEntry {
    name: String,
    pattern: String,
    replace: String,
}

fn default_true() -> bool {
    true
}

/// An ordered set of masking rules plus line normalization.
#[derive(Debug, Clone)]
pub struct MaskSet {
    rules: Vec<MaskRule>,
}

impl MaskSet {
    /// The built-in default rules.
    pub fn builtin() -> Self {
        let rules = BUILTIN_RULES
            .iter()
            .map(|(name, pattern, replace)| MaskRule {
                name: (*name).to_string(),
                pattern: Regex::new(pattern).expect("builtin mask pattern is valid"),
                replace: (*replace).to_string(),
            })
            .collect();
        Self { rules }
    }

    /// An empty set (normalization only).
    pub fn none() -> Self {
        Self { rules: Vec::new() }
    }

    /// Load a TOML rule file, extending or replacing the builtins.
    pub fn from_file(path: &Path) -> Result<Self, HarnessFault> {
        let text = std::fs::read_to_string(path).map_err(|e| HarnessFault::MaskRules {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        let parsed: RuleFile = toml::from_str(&text).map_err(|e| HarnessFault::MaskRules {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

        let mut rules = if parsed.extend_builtin {
            Self::builtin().rules
        } else {
            Vec::new()
        };
        for entry in parsed.rules {
            let pattern = Regex::new(&entry.pattern).map_err(|e| HarnessFault::MaskRules {
                path: path.to_path_buf(),
                message: format!("rule '{}': {}", entry.name, e),
            })?;
            rules.push(MaskRule {
                name: entry.name,
                pattern,
                replace: entry.replace,
            });
        }
        Ok(Self { rules })
    }

    /// Rule names and patterns, for `--verbose` inspection.
    pub fn describe(&self) -> Vec<(String, String)> {
        self.rules
            .iter()
            .map(|r| (r.name.clone(), r.pattern.as_str().to_string()))
            .collect()
    }

    /// Normalize then mask captured output.
    pub fn apply(&self, text: &str) -> String {
        let mut out = normalize_text(text);
        for rule in &self.rules {
            out = rule.pattern.replace_all(&out, rule.replace.as_str()).into_owned();
        }
        out
    }

    /// Normalized, masked output split into lines.
    pub fn apply_lines(&self, text: &str) -> Vec<String> {
        let applied = self.apply(text);
        if applied.is_empty() {
            Vec::new()
        } else {
            applied.lines().map(str::to_string).collect()
        }
    }
}

/// Line-level normalization: CRLF → LF, strip trailing whitespace per line,
/// drop trailing blank lines.
pub fn normalize_text(text: &str) -> String {
    let unified = text.replace("\r\n", "\n");
    let mut lines: Vec<&str> = unified.lines().map(str::trim_end).collect();
    while matches!(lines.last(), Some(l) if l.is_empty()) {
        lines.pop();
    }
    lines.join("\n")
}
