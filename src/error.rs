//! Error types for the dependency analyzer and scheduler.

use crate::types::{ModuleName, SourceId};
use std::path::PathBuf;

/// Convenience alias used throughout the crate.
pub type Result<T, E = FcompileError> = std::result::Result<T, E>;

/// Everything that can go wrong building the task tree or driving the build.
#[derive(Debug, thiserror::Error)]
pub enum FcompileError {
    /// A module was `module`-defined in more than one source file.
    #[error("module `{module}` is defined in both `{first}` and `{second}`")]
    ModuleMultipleDefined { module: ModuleName, first: SourceId, second: SourceId },

    /// A `use`d module has no defining source and is not satisfied by an include directory.
    #[error("module `{0}` is used but never defined")]
    ModuleNotDefined(ModuleName),

    /// A compiler subprocess exited with a nonzero status.
    #[error("compilation of `{unit}` failed with exit code {retcode}")]
    CompilationError { unit: SourceId, retcode: i32 },

    /// A `module`/`use` line could not be parsed.
    #[error("{file}:{line}: malformed `{keyword}` declaration")]
    MalformedDeclaration { file: PathBuf, line: usize, keyword: &'static str },

    /// A worker's compiler subprocess could not even be spawned.
    #[error("failed to spawn compiler for `{unit}`")]
    Spawn { unit: SourceId, #[source] source_err: std::io::Error },

    /// The requested worker count makes no sense.
    #[error("--jobs must be at least 1, got {0}")]
    InvalidJobs(i64),

    /// The user interrupted the build (e.g. Ctrl-C).
    #[error("build interrupted")]
    Interrupted,

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}
