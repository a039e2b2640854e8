//! Process-isolated execution sandbox.
//!
//! Every fixture runs in a freshly spawned engine process with its own
//! scratch directory, so no `globalThis` or prototype mutation can leak
//! between fixtures and a hung loop can always be reclaimed by killing the
//! child. Process exit is the engine's own quiescence signal: a JS engine
//! exits only once its microtask/macrotask queues have drained, so captured
//! output is finalized exactly at quiescence or at the timeout kill.

use parking_lot::Mutex;
use std::io::Read;
use std::process::{Child, Stdio};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crate::engine::EngineHandle;
use crate::error::EngineError;
use crate::outcome::{self, Execution, Outcome};

/// Poll interval while waiting on a child with a deadline.
const WAIT_POLL: Duration = Duration::from_millis(5);

/// Resource limits applied to one sandboxed run.
#[derive(Debug, Clone)]
pub struct SandboxLimits {
    /// Wall-clock budget. The child is killed when it expires.
    pub timeout: Duration,
}

impl Default for SandboxLimits {
    fn default() -> Self {
        Self {
            timeout: Duration::from_millis(5000),
        }
    }
}

/// Disposable execution context for compiled fixture sources.
pub struct Sandbox;

impl Sandbox {
    /// Execute compiled source in a fresh engine process.
    ///
    /// The source is materialized in a private scratch dir which is also the
    /// child's working directory; the dir is removed on drop, on every exit
    /// path. Stdout and stderr are drained by dedicated reader threads into
    /// memory in write order, never to the harness's own streams.
    pub fn execute(
        source: &str,
        engine: &EngineHandle,
        limits: &SandboxLimits,
    ) -> Result<Execution, EngineError> {
        let scratch = tempfile::Builder::new()
            .prefix("jsconform-")
            .tempdir()
            .map_err(EngineError::Scratch)?;
        let script = scratch.path().join("fixture.js");
        std::fs::write(&script, source).map_err(EngineError::Scratch)?;

        let mut cmd = engine.command_for(&script);
        scrub_env(&mut cmd);
        cmd.current_dir(scratch.path())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        let start = Instant::now();
        let deadline = start + limits.timeout;
        let mut child = cmd.spawn().map_err(|source| EngineError::Spawn {
            program: engine.id().to_string(),
            source,
        })?;

        let stdout_capture = drain(child.stdout.take());
        let stderr_capture = drain(child.stderr.take());

        let status = match wait_with_deadline(&mut child, deadline) {
            Some(status) => status,
            None => {
                // Budget expired: forcefully reclaim the child. Orphaned
                // grandchildren may keep the pipes open, so capture threads
                // are abandoned at the deadline rather than joined.
                let _ = child.kill();
                let _ = child.wait();
                finalize(stdout_capture, deadline);
                finalize(stderr_capture, deadline);
                return Ok(Execution {
                    outcome: Outcome::TimedOut,
                    duration: start.elapsed(),
                });
            }
        };

        let stdout = finalize(stdout_capture, deadline);
        let stderr = finalize(stderr_capture, deadline);
        let duration = start.elapsed();

        Ok(Execution {
            outcome: outcome::classify(status, stdout, stderr),
            duration,
        })
    }
}

/// Reduce the child environment to a deterministic baseline.
///
/// Wall-clock timezone and locale leak into engine output (Date rendering,
/// number formatting); pin both and keep only what process spawning needs.
fn scrub_env(cmd: &mut std::process::Command) {
    let keep: Vec<(String, String)> = ["PATH", "HOME"]
        .iter()
        .filter_map(|k| std::env::var(k).ok().map(|v| (k.to_string(), v)))
        .collect();
    cmd.env_clear();
    for (k, v) in keep {
        cmd.env(k, v);
    }
    cmd.env("TZ", "UTC");
    cmd.env("LC_ALL", "C");
}

/// A pipe being drained into a shared buffer by a dedicated thread.
struct Capture {
    buf: Arc<Mutex<Vec<u8>>>,
    handle: JoinHandle<()>,
}

/// Spawn a reader thread that appends pipe chunks to a shared buffer in
/// write order.
fn drain<R: Read + Send + 'static>(pipe: Option<R>) -> Option<Capture> {
    pipe.map(|mut r| {
        let buf = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&buf);
        let handle = thread::spawn(move || {
            let mut chunk = [0u8; 8192];
            loop {
                match r.read(&mut chunk) {
                    Ok(0) | Err(_) => break,
                    Ok(n) => sink.lock().extend_from_slice(&chunk[..n]),
                }
            }
        });
        Capture { buf, handle }
    })
}

/// Collect a capture's contents, waiting for the reader until the deadline.
///
/// When the engine exited cleanly its pipes are closed and the reader is
/// already done; the deadline only guards against orphaned grandchildren
/// holding a pipe open, in which case the thread is abandoned and whatever
/// arrived so far is returned.
fn finalize(capture: Option<Capture>, deadline: Instant) -> String {
    let Some(capture) = capture else {
        return String::new();
    };
    while !capture.handle.is_finished() && Instant::now() < deadline {
        thread::sleep(WAIT_POLL);
    }
    if capture.handle.is_finished() {
        let _ = capture.handle.join();
    }
    let bytes = capture.buf.lock().clone();
    String::from_utf8_lossy(&bytes).into_owned()
}

/// Poll the child until it exits or the deadline passes.
///
/// Returns None on deadline expiry with the child still running.
fn wait_with_deadline(child: &mut Child, deadline: Instant) -> Option<std::process::ExitStatus> {
    loop {
        match child.try_wait() {
            Ok(Some(status)) => return Some(status),
            Ok(None) => {}
            Err(_) => return None,
        }
        if Instant::now() >= deadline {
            return None;
        }
        thread::sleep(WAIT_POLL);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::EngineSpec;

    /// `sh` as a stand-in engine: scripts fake whatever an engine would print.
    fn sh_engine() -> EngineHandle {
        EngineHandle::new(
            "sh",
            EngineSpec {
                program: "sh".to_string(),
                args: vec![],
            },
        )
        .expect("sh should resolve")
    }

    #[test]
    fn test_captures_stdout_and_stderr() {
        let exec = Sandbox::execute(
            "echo one\necho two >&2\necho three\n",
            &sh_engine(),
            &SandboxLimits::default(),
        )
        .expect("execute should succeed");

        match exec.outcome {
            Outcome::Completed { stdout, stderr, exit_code } => {
                assert_eq!(stdout, "one\nthree\n");
                assert_eq!(stderr, "two\n");
                assert_eq!(exit_code, 0);
            }
            other => panic!("Expected Completed, got {:?}", other),
        }
    }

    #[test]
    fn test_duration_recorded_on_success() {
        let exec = Sandbox::execute("true", &sh_engine(), &SandboxLimits::default())
            .expect("execute should succeed");
        assert!(exec.duration > Duration::ZERO);
    }

    #[test]
    fn test_infinite_loop_times_out() {
        let limits = SandboxLimits {
            timeout: Duration::from_millis(200),
        };
        let start = Instant::now();
        let exec = Sandbox::execute("while :; do :; done", &sh_engine(), &limits)
            .expect("execute should succeed");
        assert_eq!(exec.outcome, Outcome::TimedOut);
        assert!(exec.duration >= limits.timeout);
        // Bounded overhead: the harness must not hang anywhere near forever
        assert!(start.elapsed() < Duration::from_secs(5));
    }

    #[test]
    fn test_timeout_reclaims_pending_async_work() {
        // A sleeping child stands in for an unresolved timer chain.
        let limits = SandboxLimits {
            timeout: Duration::from_millis(200),
        };
        let exec = Sandbox::execute("echo early\nsleep 60\n", &sh_engine(), &limits)
            .expect("execute should succeed");
        assert_eq!(exec.outcome, Outcome::TimedOut);
    }

    #[test]
    fn test_fresh_scratch_per_execution() {
        // A fixture that mutates its environment must not be observable by
        // the next one: each run gets a brand-new working directory.
        let limits = SandboxLimits::default();
        let first = Sandbox::execute("touch leaked-state", &sh_engine(), &limits)
            .expect("execute should succeed");
        assert_eq!(first.outcome.kind_name(), "completed");

        let second = Sandbox::execute(
            "test -f leaked-state && echo leaked || echo clean",
            &sh_engine(),
            &limits,
        )
        .expect("execute should succeed");
        assert_eq!(second.outcome.stdout(), "clean\n");
    }

    #[test]
    fn test_env_is_pinned() {
        let exec = Sandbox::execute("echo \"$TZ/$LC_ALL\"", &sh_engine(), &SandboxLimits::default())
            .expect("execute should succeed");
        assert_eq!(exec.outcome.stdout(), "UTC/C\n");
    }

    #[test]
    fn test_uncaught_error_classified() {
        let exec = Sandbox::execute(
            "echo 'SyntaxError: unexpected token' >&2\nexit 1\n",
            &sh_engine(),
            &SandboxLimits::default(),
        )
        .expect("execute should succeed");
        match exec.outcome {
            Outcome::ThrownUncaught { kind, .. } => {
                assert_eq!(kind, crate::outcome::ErrorKind::Syntax)
            }
            other => panic!("Expected ThrownUncaught, got {:?}", other),
        }
    }
}
