#![doc = include_str!("../README.md")]
#![warn(rustdoc::all)]
#![cfg_attr(not(test), warn(unused_crate_dependencies))]
#![deny(unused_must_use, rust_2018_idioms)]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]

#[macro_use]
extern crate tracing;

pub mod cache;
pub mod cli;
pub mod error;
pub mod graph;
pub mod hash;
pub mod manifest;
pub mod parser;
pub mod queue;
pub mod report;
pub mod scheduler;
pub mod types;
pub mod worker;

pub use error::{FcompileError, Result};

use cache::{HashCache, CACHE_FILENAME};
use graph::TaskTree;
use report::Timing;
use std::{collections::HashMap, path::Path, sync::Arc};
use types::{SourceId, Task};

/// Summary of one `build()` invocation, useful to a caller that wants to
/// report or test against counts without parsing the progress text.
#[derive(Debug, Clone, Default)]
pub struct BuildStats {
    pub total: usize,
    pub changed: usize,
    pub compiled: usize,
}

/// Scans `tasks`, builds the dependency graph, and (unless `dry` or nothing
/// is dirty) drives the scheduler to compile everything that needs it.
///
/// The cache at `cache_path` is loaded before scheduling and is only
/// rewritten if scheduling was actually attempted: a dry run or a run where
/// nothing was dirty leaves it untouched. Once
/// scheduling *is* attempted, the cache is written on every exit path,
/// including a compilation failure, so already-completed work is not redone.
#[instrument(skip(tasks, cache_path), fields(tasks = tasks.len()))]
pub async fn build(
    tasks: HashMap<SourceId, Task>,
    jobs: usize,
    dry: bool,
    cache_path: impl AsRef<Path>,
) -> Result<BuildStats> {
    info!("scanning files");
    let tree = Arc::new(TaskTree::build(&tasks)?);

    let cache = HashCache::load(cache_path.as_ref());
    let changed_files: Vec<SourceId> = tasks
        .keys()
        .filter(|src| tree.hashes.get(src.as_str()) != cache.hashes.get(src.as_str()))
        .cloned()
        .collect();

    println!("Changed files: {}/{}.", changed_files.len(), tasks.len());
    let stats = BuildStats { total: tasks.len(), changed: changed_files.len(), compiled: 0 };

    if changed_files.is_empty() || dry {
        return Ok(stats);
    }

    let tasks = Arc::new(tasks);
    let (hashes, outcome) =
        scheduler::run(tree, tasks, cache.hashes.clone(), changed_files, jobs).await;

    let mut cache = cache;
    cache.hashes = hashes;
    cache.save()?;

    let timings = outcome?;
    print_debug_table_if_requested(timings.clone());

    Ok(BuildStats { compiled: timings.len(), ..stats })
}

/// The default cache path: `_fcompile_cache.json` in the current directory.
pub fn default_cache_path() -> std::path::PathBuf {
    std::path::PathBuf::from(CACHE_FILENAME)
}

fn print_debug_table_if_requested(timings: Vec<Timing>) {
    let debug_requested =
        std::env::var_os("DEBUG").map(|v| !v.is_empty()).unwrap_or(false);
    if debug_requested {
        report::print_slowest(timings);
    }
}
