//! jsconform engine layer
//!
//! Resolves configured JavaScript engines into runnable commands, adapts
//! TypeScript fixtures through an external transform tool, and executes
//! compiled sources in process-isolated sandboxes with captured output.

pub mod engine;
pub mod error;
pub mod outcome;
pub mod sandbox;
pub mod transform;

pub use engine::{EngineHandle, EngineSpec};
pub use error::EngineError;
pub use outcome::{ErrorKind, Execution, Outcome};
pub use sandbox::{Sandbox, SandboxLimits};
pub use transform::{CompileOutput, SourceKind, TransformSpec, Transformer};
