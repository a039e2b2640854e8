//! Harness fault taxonomy.
//!
//! Per-fixture failures (compile errors, uncaught throws, timeouts,
//! unreadable files) are classified outcomes and never appear here. A
//! `HarnessFault` aborts the whole run with exit code 2.

use std::path::PathBuf;

use jsconform_engine::EngineError;

/// Fatal, run-aborting harness errors.
#[derive(Debug, thiserror::Error)]
pub enum HarnessFault {
    /// A discovery root does not exist
    #[error("Discovery root not found: {0}")]
    MissingRoot(PathBuf),

    /// Two discovery roots produced the same fixture id
    #[error("Duplicate fixture id '{0}' across discovery roots")]
    DuplicateFixture(String),

    /// Configuration file unreadable or invalid
    #[error("Failed to load config {path}: {message}")]
    Config { path: PathBuf, message: String },

    /// Requested engine id has no configuration
    #[error("Unknown engine '{id}'. Add an [engines.{id}] section to {config}.")]
    UnknownEngine { id: String, config: PathBuf },

    /// Baseline store has an unparsable line
    #[error("Baseline store corrupt at {path}:{line}: {message}")]
    BaselineCorrupt {
        path: PathBuf,
        line: usize,
        message: String,
    },

    /// Baseline store could not be written
    #[error("Failed to write baseline {path}: {source}")]
    BaselineWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Mask rule file unreadable or invalid
    #[error("Invalid mask rule file {path}: {message}")]
    MaskRules { path: PathBuf, message: String },

    /// Engine handle or sandbox setup failure
    #[error(transparent)]
    Engine(#[from] EngineError),
}
