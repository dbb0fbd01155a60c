//! Core domain types shared by the parser, graph builder and scheduler.

use serde::{Deserialize, Serialize};
use std::{fmt, path::PathBuf, sync::Arc};

/// An opaque, lowercase module identifier.
///
/// Two modules are identical iff their lowercased spellings are; construction
/// always folds case so callers never have to remember to do it themselves.
#[derive(Clone, Debug, Eq, PartialEq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ModuleName(String);

impl ModuleName {
    pub fn new(raw: impl AsRef<str>) -> Self {
        Self(raw.as_ref().to_lowercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The filename of the interface artifact this module would produce, e.g. `foo.mod`.
    pub fn artifact_filename(&self) -> String {
        format!("{}.mod", self.0)
    }
}

impl fmt::Display for ModuleName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ModuleName {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// The stable identity of a compilation unit across runs, as supplied by the task manifest.
///
/// Cheaply cloneable (`Arc<str>`-backed) since it is threaded through queues, `ancestors`
/// sets and result tuples.
#[derive(Clone, Debug, Eq, PartialEq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SourceId(Arc<str>);

impl SourceId {
    pub fn new(raw: impl AsRef<str>) -> Self {
        Self(Arc::from(raw.as_ref()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SourceId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for SourceId {
    fn from(s: String) -> Self {
        Self(Arc::from(s.as_str()))
    }
}

/// A single compilation task as resolved by the external build driver.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Task {
    /// Path to the source file.
    pub source: PathBuf,
    /// Command-line tokens the compiler will be invoked with; the source path is appended.
    #[serde(default)]
    pub args: Vec<String>,
    /// Directories searched for pre-built `.mod` files.
    #[serde(default)]
    pub includes: Vec<PathBuf>,
}

impl Task {
    /// The full argument vector a worker should spawn: `args` followed by the source path.
    pub fn full_args(&self) -> Vec<String> {
        let mut args = self.args.clone();
        args.push(self.source.display().to_string());
        args
    }
}
