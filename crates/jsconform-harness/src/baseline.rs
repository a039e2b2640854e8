//! Persisted baseline store.
//!
//! One JSON object per line, sorted by fixture id, so baseline changes are
//! line-diffable and reviewable. The store is updated only by the explicit
//! accept operations; a run never writes it implicitly.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};

use jsconform_engine::Outcome;

use crate::error::HarnessFault;
use crate::fixture::FixtureId;
use crate::masking::MaskSet;

/// Whether the recorded result was accepted as good or merely tracked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BaselineStatus {
    Good,
    Failing,
}

/// Last-recorded execution summary for one fixture.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BaselineEntry {
    pub fixture_id: FixtureId,
    /// Outcome variant name ("completed", "thrown-uncaught", ...).
    pub outcome: String,
    /// Hex SHA-256 of normalized stdout (empty for non-completed outcomes).
    pub stdout_sha256: String,
    /// Per-variant detail (error kind + message, nonzero exit, ...).
    pub message: String,
    pub status: BaselineStatus,
}

impl BaselineEntry {
    /// Summarize a fresh outcome for comparison or acceptance.
    pub fn summarize(
        fixture_id: &FixtureId,
        outcome: &Outcome,
        masks: &MaskSet,
        status: BaselineStatus,
    ) -> Self {
        let stdout_sha256 = match outcome {
            Outcome::Completed { stdout, .. } => digest_hex(&masks.apply(stdout)),
            _ => String::new(),
        };
        Self {
            fixture_id: fixture_id.clone(),
            outcome: outcome.kind_name().to_string(),
            stdout_sha256,
            message: masks.apply(&outcome.detail()),
            status,
        }
    }

    /// True when a fresh summary observes the same behavior.
    pub fn matches(&self, fresh: &BaselineEntry) -> bool {
        self.outcome == fresh.outcome
            && self.stdout_sha256 == fresh.stdout_sha256
            && self.message == fresh.message
    }

    /// Short human description, used in regression diffs.
    pub fn describe(&self) -> String {
        let mut out = self.outcome.clone();
        if !self.message.is_empty() {
            out.push_str(&format!(" ({})", self.message));
        }
        if !self.stdout_sha256.is_empty() {
            out.push_str(&format!(" stdout#{}", &self.stdout_sha256[..8]));
        }
        out
    }
}

fn digest_hex(text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// The on-disk baseline: fixture id → last recorded summary.
#[derive(Debug)]
pub struct BaselineStore {
    path: PathBuf,
    entries: BTreeMap<FixtureId, BaselineEntry>,
}

impl BaselineStore {
    /// Load a store; a missing file is an empty store, a corrupt line is fatal.
    pub fn load(path: &Path) -> Result<Self, HarnessFault> {
        let mut entries = BTreeMap::new();
        if path.exists() {
            let text = std::fs::read_to_string(path).map_err(|e| HarnessFault::BaselineCorrupt {
                path: path.to_path_buf(),
                line: 0,
                message: e.to_string(),
            })?;
            for (idx, line) in text.lines().enumerate() {
                if line.trim().is_empty() {
                    continue;
                }
                let entry: BaselineEntry =
                    serde_json::from_str(line).map_err(|e| HarnessFault::BaselineCorrupt {
                        path: path.to_path_buf(),
                        line: idx + 1,
                        message: e.to_string(),
                    })?;
                entries.insert(entry.fixture_id.clone(), entry);
            }
        }
        Ok(Self {
            path: path.to_path_buf(),
            entries,
        })
    }

    pub fn get(&self, id: &FixtureId) -> Option<&BaselineEntry> {
        self.entries.get(id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Record an entry (idempotent upsert). Takes effect on `save`.
    pub fn accept(&mut self, entry: BaselineEntry) {
        self.entries.insert(entry.fixture_id.clone(), entry);
    }

    /// Write all entries sorted by fixture id, one JSON object per line.
    pub fn save(&self) -> Result<(), HarnessFault> {
        let write = || -> std::io::Result<()> {
            if let Some(parent) = self.path.parent() {
                if !parent.as_os_str().is_empty() {
                    std::fs::create_dir_all(parent)?;
                }
            }
            let mut file = std::fs::File::create(&self.path)?;
            for entry in self.entries.values() {
                let line = serde_json::to_string(entry)
                    .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
                writeln!(file, "{}", line)?;
            }
            Ok(())
        };
        write().map_err(|source| HarnessFault::BaselineWrite {
            path: self.path.clone(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn completed(stdout: &str) -> Outcome {
        Outcome::Completed {
            stdout: stdout.to_string(),
            stderr: String::new(),
            exit_code: 0,
        }
    }

    #[test]
    fn test_missing_file_is_empty_store() {
        let dir = tempfile::tempdir().unwrap();
        let store = BaselineStore::load(&dir.path().join("baseline.jsonl")).unwrap();
        assert!(store.is_empty());
    }

    #[test]
    fn test_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("baseline.jsonl");
        let masks = MaskSet::none();

        let mut store = BaselineStore::load(&path).unwrap();
        let id = FixtureId::new("basic/sum.js");
        store.accept(BaselineEntry::summarize(
            &id,
            &completed("12\n"),
            &masks,
            BaselineStatus::Good,
        ));
        store.save().unwrap();

        let reloaded = BaselineStore::load(&path).unwrap();
        assert_eq!(reloaded.len(), 1);
        let entry = reloaded.get(&id).unwrap();
        assert_eq!(entry.outcome, "completed");
        assert_eq!(entry.status, BaselineStatus::Good);
    }

    #[test]
    fn test_saved_lines_sorted_by_fixture_id() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("baseline.jsonl");
        let masks = MaskSet::none();

        let mut store = BaselineStore::load(&path).unwrap();
        for id in ["z.js", "a.js", "m/x.js"] {
            store.accept(BaselineEntry::summarize(
                &FixtureId::new(id),
                &completed("1\n"),
                &masks,
                BaselineStatus::Good,
            ));
        }
        store.save().unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let ids: Vec<String> = text
            .lines()
            .map(|l| serde_json::from_str::<BaselineEntry>(l).unwrap().fixture_id.to_string())
            .collect();
        assert_eq!(ids, vec!["a.js", "m/x.js", "z.js"]);
    }

    #[test]
    fn test_accept_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("baseline.jsonl");
        let masks = MaskSet::none();
        let id = FixtureId::new("basic/sum.js");
        let entry = BaselineEntry::summarize(&id, &completed("12\n"), &masks, BaselineStatus::Good);

        let mut store = BaselineStore::load(&path).unwrap();
        store.accept(entry.clone());
        store.accept(entry.clone());
        assert_eq!(store.len(), 1);
        assert_eq!(store.get(&id).unwrap(), &entry);
    }

    #[test]
    fn test_corrupt_line_is_fault() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("baseline.jsonl");
        std::fs::write(&path, "{not json}\n").unwrap();
        let err = BaselineStore::load(&path).unwrap_err();
        match err {
            HarnessFault::BaselineCorrupt { line, .. } => assert_eq!(line, 1),
            other => panic!("Expected BaselineCorrupt, got {:?}", other),
        }
    }

    #[test]
    fn test_summary_masks_stdout_before_hashing() {
        let masks = MaskSet::builtin();
        let id = FixtureId::new("time.js");
        let a = BaselineEntry::summarize(
            &id,
            &completed("t=2024-01-01T00:00:00Z\n"),
            &masks,
            BaselineStatus::Good,
        );
        let b = BaselineEntry::summarize(
            &id,
            &completed("t=2025-06-15T09:30:00Z\n"),
            &masks,
            BaselineStatus::Good,
        );
        assert!(a.matches(&b), "masked timestamps must compare equal");
    }

    #[test]
    fn test_differing_stdout_does_not_match() {
        let masks = MaskSet::none();
        let id = FixtureId::new("sum.js");
        let a = BaselineEntry::summarize(&id, &completed("12\n"), &masks, BaselineStatus::Good);
        let b = BaselineEntry::summarize(&id, &completed("13\n"), &masks, BaselineStatus::Good);
        assert!(!a.matches(&b));
    }
}
