//! Fixture model and inline-expectation parsing.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use jsconform_engine::SourceKind;

/// Stable fixture identifier: the `/`-joined path relative to its discovery
/// root, extension included (a `.ts` and `.js` sibling must not collide).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FixtureId(String);

impl FixtureId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for FixtureId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// One parsed expectation comment: the 1-based source line it sits on and
/// the `;`-separated expected output fragments.
#[derive(Debug, Clone, PartialEq)]
pub struct InlineExpectation {
    pub line: usize,
    pub fragments: Vec<String>,
}

/// One example script under test. Read-only after discovery.
#[derive(Debug, Clone)]
pub struct Fixture {
    pub id: FixtureId,
    /// Grouping path segments, e.g. ["es2020", "generators"].
    pub category: Vec<String>,
    pub source_text: String,
    pub source_kind: SourceKind,
    pub inline_expectations: Vec<InlineExpectation>,
    /// Set when the file could not be read or decoded; such a fixture
    /// short-circuits to a compile-failed outcome downstream instead of
    /// aborting discovery.
    pub read_error: Option<String>,
}

impl Fixture {
    /// Build a fixture from readable source, parsing inline expectations.
    pub fn from_source(
        id: FixtureId,
        category: Vec<String>,
        source_text: String,
        source_kind: SourceKind,
    ) -> Self {
        let inline_expectations = parse_inline_expectations(&source_text);
        Self {
            id,
            category,
            source_text,
            source_kind,
            inline_expectations,
            read_error: None,
        }
    }

    /// Build the placeholder entry for a file that could not be read.
    pub fn unreadable(id: FixtureId, category: Vec<String>, message: String) -> Self {
        Self {
            id,
            category,
            source_text: String::new(),
            source_kind: SourceKind::JavaScript,
            inline_expectations: Vec::new(),
            read_error: Some(message),
        }
    }

    /// Expected output fragments flattened in source order.
    pub fn expected_fragments(&self) -> Vec<&str> {
        self.inline_expectations
            .iter()
            .flat_map(|e| e.fragments.iter().map(String::as_str))
            .collect()
    }
}

/// A call conventionally understood to print output.
static PRINT_CALL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?:console\.(?:log|error|info)|\bprint)\s*\(").unwrap());

/// Comment openers that mark prose or tool directives, never expectations.
const COMMENT_BLOCKLIST: &[&str] = &["TODO", "NOTE", "FIXME", "eslint", "@ts-"];

/// Characters a statement can end with ahead of a trailing comment. A `//`
/// preceded by anything else (e.g. the middle of a URL literal) is not a
/// comment marker.
const STATEMENT_TAILS: &[char] = &[';', ')', '}', '\'', '"'];

/// Best-effort scan for expectation comments.
///
/// A trailing `// a; b; c` comment counts only when it sits on a line with a
/// recognized print call, follows the end of the statement, and splits into
/// all-non-empty fragments. Anything ambiguous is left unparsed so
/// reconciliation falls back to the baseline.
pub fn parse_inline_expectations(source: &str) -> Vec<InlineExpectation> {
    let mut out = Vec::new();
    for (idx, line) in source.lines().enumerate() {
        let Some(print) = PRINT_CALL.find(line) else {
            continue;
        };
        let Some(comment_at) = line.rfind("//") else {
            continue;
        };
        if comment_at < print.end() {
            continue;
        }
        let code = line[..comment_at].trim_end();
        if !code.ends_with(STATEMENT_TAILS) {
            continue;
        }
        let comment = line[comment_at + 2..].trim();
        if comment.is_empty() {
            continue;
        }
        if COMMENT_BLOCKLIST
            .iter()
            .any(|b| comment.to_ascii_lowercase().starts_with(&b.to_ascii_lowercase()))
        {
            continue;
        }
        let fragments: Vec<String> = comment.split(';').map(|f| f.trim().to_string()).collect();
        if fragments.iter().any(String::is_empty) {
            continue;
        }
        out.push(InlineExpectation {
            line: idx + 1,
            fragments,
        });
    }
    out
}
