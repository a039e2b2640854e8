//! Result reconciliation — fresh observations against expectations.
//!
//! Priority order: inline expectations when the fixture carries them,
//! otherwise the persisted baseline. A fixture with neither is `NewFixture`,
//! never a silent pass.

use serde::Serialize;

use jsconform_engine::Outcome;

use crate::baseline::{BaselineEntry, BaselineStatus};
use crate::fixture::{Fixture, FixtureId};
use crate::masking::MaskSet;
use crate::runner::ExecutionResult;

/// Classified outcome of one fixture's run(s).
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "verdict", rename_all = "kebab-case")]
pub enum Verdict {
    Pass,
    Fail { diff: String },
    NewFixture,
    Regression { from: String, to: String },
    Flaky { observed: Vec<String> },
}

impl Verdict {
    /// Stable name for reports.
    pub fn name(&self) -> &'static str {
        match self {
            Verdict::Pass => "pass",
            Verdict::Fail { .. } => "fail",
            Verdict::NewFixture => "new",
            Verdict::Regression { .. } => "regression",
            Verdict::Flaky { .. } => "flaky",
        }
    }
}

/// One fixture's verdict plus what the reporter needs to group and time it.
#[derive(Debug, Clone, Serialize)]
pub struct ReconciledVerdict {
    pub fixture_id: FixtureId,
    pub category: Vec<String>,
    #[serde(flatten)]
    pub verdict: Verdict,
    pub duration_ms: f64,
}

/// Reconcile one fixture's executions.
///
/// `runs` holds one execution normally, several under `--repeat`; repeats
/// that disagree after normalization are `Flaky` and are never collapsed
/// into `Pass`.
pub fn reconcile(
    fixture: &Fixture,
    runs: &[ExecutionResult],
    baseline: Option<&BaselineEntry>,
    masks: &MaskSet,
) -> ReconciledVerdict {
    let duration_ms = runs
        .first()
        .map(|r| r.duration.as_secs_f64() * 1000.0)
        .unwrap_or(0.0);

    let verdict = reconcile_verdict(fixture, runs, baseline, masks);

    ReconciledVerdict {
        fixture_id: fixture.id.clone(),
        category: fixture.category.clone(),
        verdict,
        duration_ms,
    }
}

fn reconcile_verdict(
    fixture: &Fixture,
    runs: &[ExecutionResult],
    baseline: Option<&BaselineEntry>,
    masks: &MaskSet,
) -> Verdict {
    let Some(first) = runs.first() else {
        // The runner always produces at least one execution; an empty slice
        // means the fixture never ran, which must still yield a verdict line.
        return Verdict::Fail {
            diff: "fixture produced no execution result".to_string(),
        };
    };

    // Repeat disagreement dominates every other classification.
    if runs.len() > 1 {
        let summaries: Vec<BaselineEntry> = runs
            .iter()
            .map(|r| {
                BaselineEntry::summarize(&fixture.id, &r.outcome, masks, BaselineStatus::Good)
            })
            .collect();
        if summaries.iter().any(|s| !s.matches(&summaries[0])) {
            let mut observed: Vec<String> = summaries.iter().map(|s| s.describe()).collect();
            observed.sort();
            observed.dedup();
            return Verdict::Flaky { observed };
        }
    }

    if !fixture.inline_expectations.is_empty() {
        return check_inline(fixture, &first.outcome, masks);
    }

    let fresh = BaselineEntry::summarize(&fixture.id, &first.outcome, masks, BaselineStatus::Good);
    match baseline {
        None => Verdict::NewFixture,
        Some(entry) if entry.matches(&fresh) => Verdict::Pass,
        Some(entry) => {
            let from = entry.describe();
            let to = fresh.describe();
            match entry.status {
                BaselineStatus::Good => Verdict::Regression { from, to },
                BaselineStatus::Failing => Verdict::Fail {
                    diff: format!("expected {}, got {}", from, to),
                },
            }
        }
    }
}

/// Ordered fragment match: expectation k against normalized stdout line k.
fn check_inline(fixture: &Fixture, outcome: &Outcome, masks: &MaskSet) -> Verdict {
    let Outcome::Completed { stdout, .. } = outcome else {
        return Verdict::Fail {
            diff: format!(
                "expected console output but run was {}{}",
                outcome.kind_name(),
                match outcome.detail() {
                    d if d.is_empty() => String::new(),
                    d => format!(": {}", d),
                }
            ),
        };
    };

    let lines = masks.apply_lines(stdout);
    let expected = fixture.expected_fragments();

    for (idx, fragment) in expected.iter().enumerate() {
        match lines.get(idx) {
            Some(line) if line.contains(fragment) => {}
            Some(line) => {
                return Verdict::Fail {
                    diff: format!("line {}: expected '{}', got '{}'", idx + 1, fragment, line),
                }
            }
            None => {
                return Verdict::Fail {
                    diff: format!(
                        "line {}: expected '{}', got end of output",
                        idx + 1,
                        fragment
                    ),
                }
            }
        }
    }

    Verdict::Pass
}
