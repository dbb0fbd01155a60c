//! Command-line surface: two flags, both optional.

use crate::error::{FcompileError, Result};
use clap::Parser;

fn default_jobs() -> usize {
    (num_cpus::get() / 2).max(1)
}

/// Dependency-aware incremental build driver.
///
/// Reads a task manifest from stdin and compiles whatever is dirty, in an
/// order that respects module dependencies, using the smallest rebuild set
/// that the prior run's `.mod` interface hashes allow.
#[derive(Parser, Debug)]
#[command(name = "fcompile", about, version)]
pub struct Cli {
    /// Number of parallel workers.
    #[arg(short = 'j', long = "jobs")]
    jobs: Option<i64>,

    /// Scan files and report counts only; do not compile or touch the cache.
    #[arg(long)]
    pub dry: bool,
}

impl Cli {
    /// Resolves the effective worker count, rejecting a non-positive worker
    /// count rather than coercing it to 1.
    pub fn jobs(&self) -> Result<usize> {
        match self.jobs {
            None => Ok(default_jobs()),
            Some(n) if n >= 1 => Ok(n as usize),
            Some(n) => Err(FcompileError::InvalidJobs(n)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_zero_jobs() {
        let cli = Cli { jobs: Some(0), dry: false };
        assert!(matches!(cli.jobs(), Err(FcompileError::InvalidJobs(0))));
    }

    #[test]
    fn default_jobs_is_at_least_one() {
        let cli = Cli { jobs: None, dry: false };
        assert!(cli.jobs().unwrap() >= 1);
    }
}
