//! Verdict aggregation and report rendering data.
//!
//! Groups verdicts by category path with hierarchical rollup: a category's
//! counts include every descendant. The machine-readable records and the
//! human summary are both derived from the same verdict sequence.

use serde::Serialize;
use std::collections::BTreeMap;

use crate::reconcile::{ReconciledVerdict, Verdict};

/// Pass/fail tallies for one category subtree.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CategoryStats {
    pub pass: usize,
    pub fail: usize,
    pub regression: usize,
    pub new: usize,
    pub flaky: usize,
}

impl CategoryStats {
    pub fn total(&self) -> usize {
        self.pass + self.fail + self.regression + self.new + self.flaky
    }

    fn count(&mut self, verdict: &Verdict) {
        match verdict {
            Verdict::Pass => self.pass += 1,
            Verdict::Fail { .. } => self.fail += 1,
            Verdict::Regression { .. } => self.regression += 1,
            Verdict::NewFixture => self.new += 1,
            Verdict::Flaky { .. } => self.flaky += 1,
        }
    }
}

/// Aggregated run report.
#[derive(Debug, Serialize)]
pub struct Report {
    /// Every verdict, in discovery order. One line per fixture, always.
    pub verdicts: Vec<ReconciledVerdict>,
    /// Rolled-up stats per category path ("es2020", "es2020/generators", ...).
    pub categories: BTreeMap<String, CategoryStats>,
    pub totals: CategoryStats,
}

impl Report {
    /// True when any verdict forces a failing exit.
    pub fn has_failures(&self, strict: bool) -> bool {
        self.totals.fail > 0
            || self.totals.regression > 0
            || (strict && self.totals.flaky > 0)
    }

    /// Process exit code under the harness policy: `NewFixture` never fails
    /// a run; `Flaky` only under strict mode.
    pub fn exit_code(&self, strict: bool) -> i32 {
        if self.has_failures(strict) {
            1
        } else {
            0
        }
    }

    /// One machine-readable JSON line per fixture (serde-rendered).
    pub fn machine_records(&self) -> Vec<serde_json::Value> {
        self.verdicts
            .iter()
            .map(|v| serde_json::to_value(v).expect("verdict serializes"))
            .collect()
    }
}

/// Aggregate a verdict sequence into a report.
pub fn aggregate(verdicts: Vec<ReconciledVerdict>) -> Report {
    let mut categories: BTreeMap<String, CategoryStats> = BTreeMap::new();
    let mut totals = CategoryStats::default();

    for v in &verdicts {
        totals.count(&v.verdict);
        // Rollup: count the verdict into every ancestor category
        let mut path = String::new();
        for segment in &v.category {
            if !path.is_empty() {
                path.push('/');
            }
            path.push_str(segment);
            categories.entry(path.clone()).or_default().count(&v.verdict);
        }
    }

    Report {
        verdicts,
        categories,
        totals,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::FixtureId;

    fn verdict(id: &str, category: &[&str], verdict: Verdict) -> ReconciledVerdict {
        ReconciledVerdict {
            fixture_id: FixtureId::new(id),
            category: category.iter().map(|s| s.to_string()).collect(),
            verdict,
            duration_ms: 1.0,
        }
    }

    #[test]
    fn test_rollup_includes_descendants() {
        let report = aggregate(vec![
            verdict("es2020/bigint.js", &["es2020"], Verdict::Pass),
            verdict(
                "es2020/generators/a.js",
                &["es2020", "generators"],
                Verdict::Pass,
            ),
            verdict(
                "es2020/generators/b.js",
                &["es2020", "generators"],
                Verdict::Fail {
                    diff: "x".to_string(),
                },
            ),
        ]);

        let es2020 = &report.categories["es2020"];
        assert_eq!(es2020.pass, 2, "parent includes descendant passes");
        assert_eq!(es2020.fail, 1, "parent includes descendant failures");
        let generators = &report.categories["es2020/generators"];
        assert_eq!(generators.total(), 2);
    }

    #[test]
    fn test_totals_cover_uncategorized_fixtures() {
        let report = aggregate(vec![verdict("solo.js", &[], Verdict::Pass)]);
        assert_eq!(report.totals.pass, 1);
        assert!(report.categories.is_empty());
    }

    #[test]
    fn test_fail_forces_exit_one() {
        let report = aggregate(vec![verdict(
            "a.js",
            &["basic"],
            Verdict::Fail {
                diff: "x".to_string(),
            },
        )]);
        assert_eq!(report.exit_code(false), 1);
    }

    #[test]
    fn test_regression_forces_exit_one() {
        let report = aggregate(vec![verdict(
            "a.js",
            &["basic"],
            Verdict::Regression {
                from: "completed stdout#aaaa".to_string(),
                to: "completed stdout#bbbb".to_string(),
            },
        )]);
        assert_eq!(report.exit_code(false), 1);
    }

    #[test]
    fn test_new_fixture_never_affects_exit() {
        let report = aggregate(vec![verdict("a.js", &["basic"], Verdict::NewFixture)]);
        assert_eq!(report.exit_code(false), 0);
        assert_eq!(report.exit_code(true), 0);
    }

    #[test]
    fn test_flaky_fails_only_in_strict_mode() {
        let report = aggregate(vec![verdict(
            "a.js",
            &["basic"],
            Verdict::Flaky {
                observed: vec!["completed stdout#aaaa".to_string()],
            },
        )]);
        assert_eq!(report.exit_code(false), 0);
        assert_eq!(report.exit_code(true), 1);
    }

    #[test]
    fn test_machine_records_one_per_fixture() {
        let report = aggregate(vec![
            verdict("a.js", &["basic"], Verdict::Pass),
            verdict("b.js", &["basic"], Verdict::NewFixture),
        ]);
        let records = report.machine_records();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0]["fixture_id"], "a.js");
        assert_eq!(records[0]["verdict"], "pass");
        assert_eq!(records[1]["verdict"], "new-fixture");
    }
}
