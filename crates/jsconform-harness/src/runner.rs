//! Pipeline runner — fixtures through transform and sandbox, in parallel.
//!
//! Fixtures are embarrassingly parallel: each one gets its own compiled
//! unit and its own freshly created sandbox, so the worker pool bound only
//! caps engine-process overhead, never correctness. Results are re-sorted
//! into discovery order before reconciliation so reports are deterministic
//! regardless of completion order.

use std::time::{Duration, Instant};

use jsconform_engine::{
    CompileOutput, EngineHandle, Outcome, Sandbox, SandboxLimits, Transformer,
};

use crate::error::HarnessFault;
use crate::fixture::{Fixture, FixtureId};

/// Knobs for one `run_all` invocation.
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub limits: SandboxLimits,
    /// Executions per fixture; > 1 enables flakiness detection.
    pub repeat: usize,
    /// Worker pool bound; 0 means one worker per CPU.
    pub jobs: usize,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            limits: SandboxLimits::default(),
            repeat: 1,
            jobs: 0,
        }
    }
}

/// Output of the Transform Adapter for one fixture.
#[derive(Debug, Clone)]
pub struct CompiledUnit {
    pub fixture_id: FixtureId,
    pub output: CompileOutput,
}

/// One sandboxed run of one fixture.
#[derive(Debug, Clone)]
pub struct ExecutionResult {
    pub fixture_id: FixtureId,
    pub outcome: Outcome,
    /// Wall-clock time, recorded on every path including failures.
    pub duration: Duration,
}

/// A fixture together with all of its executions this invocation.
#[derive(Debug, Clone)]
pub struct FixtureRun {
    pub fixture: Fixture,
    pub runs: Vec<ExecutionResult>,
}

/// Run every fixture through transform and sandbox across a bounded pool.
///
/// Only engine-level faults (spawn failure, scratch-dir failure) abort the
/// batch; per-fixture compile errors, throws, and timeouts are ordinary
/// outcomes inside the returned runs.
pub fn run_all(
    fixtures: Vec<Fixture>,
    engine: &EngineHandle,
    transformer: &Transformer,
    options: &RunOptions,
) -> Result<Vec<FixtureRun>, HarnessFault> {
    let jobs = if options.jobs == 0 {
        num_cpus::get()
    } else {
        options.jobs
    };

    let (task_tx, task_rx) = crossbeam::channel::unbounded::<(usize, Fixture)>();
    let (result_tx, result_rx) =
        crossbeam::channel::unbounded::<Result<(usize, FixtureRun), HarnessFault>>();

    for task in fixtures.into_iter().enumerate() {
        let _ = task_tx.send(task);
    }
    drop(task_tx);

    std::thread::scope(|scope| {
        for _ in 0..jobs {
            let task_rx = task_rx.clone();
            let result_tx = result_tx.clone();
            scope.spawn(move || {
                while let Ok((idx, fixture)) = task_rx.recv() {
                    let outcome = run_fixture(fixture, engine, transformer, options);
                    if result_tx.send(outcome.map(|r| (idx, r))).is_err() {
                        break;
                    }
                }
            });
        }
    });
    drop(result_tx);

    let mut collected: Vec<(usize, FixtureRun)> = Vec::new();
    for msg in result_rx {
        collected.push(msg?);
    }
    collected.sort_by_key(|(idx, _)| *idx);
    Ok(collected.into_iter().map(|(_, run)| run).collect())
}

/// Run one fixture: transform once, execute `repeat` times, each in a
/// fully fresh sandbox.
fn run_fixture(
    fixture: Fixture,
    engine: &EngineHandle,
    transformer: &Transformer,
    options: &RunOptions,
) -> Result<FixtureRun, HarnessFault> {
    if let Some(message) = fixture.read_error.clone() {
        let runs = vec![ExecutionResult {
            fixture_id: fixture.id.clone(),
            outcome: Outcome::CompileFailed { message },
            duration: Duration::ZERO,
        }];
        return Ok(FixtureRun { fixture, runs });
    }

    let started = Instant::now();
    let compiled = CompiledUnit {
        fixture_id: fixture.id.clone(),
        output: transformer.compile(&fixture.source_text, fixture.source_kind),
    };

    let runs = match compiled.output {
        CompileOutput::Failed(message) => vec![ExecutionResult {
            fixture_id: fixture.id.clone(),
            outcome: Outcome::CompileFailed { message },
            duration: started.elapsed(),
        }],
        CompileOutput::Source(js) => {
            let repeat = options.repeat.max(1);
            let mut runs = Vec::with_capacity(repeat);
            for _ in 0..repeat {
                let exec = Sandbox::execute(&js, engine, &options.limits)?;
                runs.push(ExecutionResult {
                    fixture_id: fixture.id.clone(),
                    outcome: exec.outcome,
                    duration: exec.duration,
                });
            }
            runs
        }
    };

    Ok(FixtureRun { fixture, runs })
}
