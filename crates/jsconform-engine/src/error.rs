//! Engine-layer error types.

/// Errors raised while resolving an engine or spawning its process.
///
/// These are harness-level faults. A fixture that fails to compile or run is
/// an ordinary observation and is classified in [`crate::outcome::Outcome`],
/// never surfaced here.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Engine program missing from disk and PATH
    #[error("Engine program not found: {0}")]
    ProgramNotFound(String),

    /// Engine process could not be spawned
    #[error("Failed to spawn engine '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// Sandbox scratch directory could not be created or written
    #[error("Failed to set up sandbox scratch dir: {0}")]
    Scratch(#[from] std::io::Error),
}
