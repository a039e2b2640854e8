//! jsconform harness
//!
//! The fixture pipeline: discovery and inline-expectation parsing, the
//! bounded-parallel runner, output normalization and masking, the persisted
//! baseline store, result reconciliation, and categorized reporting.
//!
//! Data flows one way: Fixture Store → Transform Adapter → Execution
//! Sandbox → Result Reconciler → Aggregator/Reporter. Fixtures are mutually
//! independent; the only shared state is the read-only baseline.

pub mod baseline;
pub mod config;
pub mod discover;
pub mod error;
pub mod fixture;
pub mod masking;
pub mod reconcile;
pub mod report;
pub mod runner;

pub use baseline::{BaselineEntry, BaselineStatus, BaselineStore};
pub use config::HarnessConfig;
pub use discover::discover;
pub use error::HarnessFault;
pub use fixture::{Fixture, FixtureId, InlineExpectation};
pub use masking::MaskSet;
pub use reconcile::{reconcile, ReconciledVerdict, Verdict};
pub use report::{aggregate, CategoryStats, Report};
pub use runner::{run_all, CompiledUnit, ExecutionResult, FixtureRun, RunOptions};
