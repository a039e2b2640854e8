//! `jsconform accept` — record one fixture's fresh result as the baseline.
//!
//! Acceptance is the only way results enter the baseline store. It is
//! explicit and idempotent: accepting an unchanged fixture twice leaves the
//! store byte-identical.

use anyhow::{anyhow, bail};
use std::path::PathBuf;
use std::time::Duration;

use jsconform_engine::{EngineHandle, SandboxLimits, SourceKind, Transformer};
use jsconform_harness::{
    BaselineEntry, BaselineStatus, BaselineStore, Fixture, FixtureId, MaskSet, RunOptions,
};

use crate::commands::{load_config, resolve_baseline_path};
use crate::output::{self, StyledOutput};

pub struct AcceptArgs {
    pub fixture_id: String,
    pub engine: String,
    pub root: Option<PathBuf>,
    pub timeout: Option<u64>,
    pub mask: Option<PathBuf>,
    pub baseline: Option<PathBuf>,
    pub color: String,
    pub config: Option<PathBuf>,
}

pub fn execute(args: AcceptArgs) -> anyhow::Result<i32> {
    let color_choice = output::resolve_color_choice(Some(&args.color));
    let mut out = StyledOutput::new(color_choice);

    let (config_path, config) = load_config(args.config.as_deref())?;

    let spec = config.engine(&args.engine, &config_path)?;
    let engine = EngineHandle::new(&args.engine, spec)?;
    let transformer = Transformer::new(config.transform.clone());

    let masks = match &args.mask {
        Some(path) => MaskSet::from_file(path)?,
        None => MaskSet::builtin(),
    };

    let fixture = load_fixture(&args)?;

    let options = RunOptions {
        limits: SandboxLimits {
            timeout: Duration::from_millis(args.timeout.unwrap_or(config.defaults.timeout_ms)),
        },
        ..Default::default()
    };
    let mut runs = jsconform_harness::run_all(vec![fixture], &engine, &transformer, &options)?;
    let run = runs.pop().expect("one fixture yields one run");
    let result = run
        .runs
        .first()
        .ok_or_else(|| anyhow!("fixture produced no execution result"))?;

    let entry = BaselineEntry::summarize(
        &run.fixture.id,
        &result.outcome,
        &masks,
        BaselineStatus::Good,
    );
    let summary = entry.describe();

    let baseline_path = resolve_baseline_path(args.baseline.as_deref(), &config, &config_path);
    let mut baseline = BaselineStore::load(&baseline_path)?;
    baseline.accept(entry);
    baseline.save()?;

    out.success("Accepted ");
    out.bold(&run.fixture.id.to_string());
    out.newline();
    out.dim(&format!("  {} → {}", summary, baseline_path.display()));
    out.newline();

    Ok(0)
}

/// Resolve a fixture id against the corpus root, keeping the id intact.
fn load_fixture(args: &AcceptArgs) -> anyhow::Result<Fixture> {
    let root = args.root.clone().unwrap_or_else(|| PathBuf::from("."));
    let path = root.join(&args.fixture_id);
    if !path.is_file() {
        bail!(
            "Fixture '{}' not found under {}",
            args.fixture_id,
            root.display()
        );
    }

    let kind = match path.extension().and_then(|e| e.to_str()) {
        Some("js") => SourceKind::JavaScript,
        Some("ts") => SourceKind::TypeScript,
        _ => bail!("Not a fixture file (expected .js or .ts): {}", args.fixture_id),
    };

    let source = std::fs::read_to_string(&path)
        .map_err(|e| anyhow!("Failed to read '{}': {}", args.fixture_id, e))?;

    let segments: Vec<&str> = args.fixture_id.split('/').collect();
    let category: Vec<String> = segments[..segments.len().saturating_sub(1)]
        .iter()
        .map(|s| s.to_string())
        .collect();

    Ok(Fixture::from_source(
        FixtureId::new(args.fixture_id.clone()),
        category,
        source,
        kind,
    ))
}
