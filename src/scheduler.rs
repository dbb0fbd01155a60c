//! Drives incremental compilation: determines the initial dirty set, gates
//! readiness on ancestor completion, emits prioritized dispatches, consumes
//! results, and dynamically extends the work set as `.mod` interface hashes
//! change.
//!
//! Single-threaded cooperative concurrency: the loop below is the only task
//! that ever touches `hashes`, `waiting` or `scheduled`, so those invariants
//! never observe a partial update. Parallelism comes entirely from the worker
//! pool's subprocesses.

use crate::{
    error::{FcompileError, Result},
    graph::TaskTree,
    hash::{hash_file, Hash},
    queue::PriorityQueue,
    report::{self, Progress, Timing},
    types::{SourceId, Task},
    worker::{worker_loop, DispatchedTask, TaskOutcome, TaskResult},
};
use std::{
    collections::{HashMap, HashSet},
    path::Path,
    sync::{
        atomic::{AtomicUsize, Ordering::Relaxed},
        Arc,
    },
    time::Instant,
};
use tokio::sync::mpsc;

/// Runs the scheduler to completion against `jobs` workers.
///
/// Always returns the hash map as it stood at the moment the run ended, even
/// on error, so the caller can persist the cache and retain partial progress.
pub async fn run(
    tree: Arc<TaskTree>,
    tasks: Arc<HashMap<SourceId, Task>>,
    mut hashes: HashMap<String, Hash>,
    changed_files: Vec<SourceId>,
    jobs: usize,
) -> (HashMap<String, Hash>, Result<Vec<Timing>>) {
    if changed_files.is_empty() {
        return (hashes, Ok(Vec::new()));
    }

    let jobs = jobs.max(1);
    let task_queue: Arc<PriorityQueue<DispatchedTask>> = Arc::new(PriorityQueue::new());
    let (result_tx, mut result_rx) = mpsc::unbounded_channel::<TaskResult>();
    let running = Arc::new(AtomicUsize::new(0));

    let handles: Vec<_> = (0..jobs)
        .map(|_| {
            tokio::spawn(worker_loop(task_queue.clone(), result_tx.clone(), running.clone()))
        })
        .collect();
    drop(result_tx);

    let outcome = schedule_loop(
        &tree,
        &tasks,
        &mut hashes,
        changed_files,
        &task_queue,
        &mut result_rx,
        &running,
    )
    .await;

    task_queue.close();
    for handle in handles {
        handle.abort();
        let _ = handle.await;
    }

    (hashes, outcome)
}

#[allow(clippy::too_many_arguments)]
async fn schedule_loop(
    tree: &TaskTree,
    tasks: &HashMap<SourceId, Task>,
    hashes: &mut HashMap<String, Hash>,
    changed_files: Vec<SourceId>,
    task_queue: &PriorityQueue<DispatchedTask>,
    result_rx: &mut mpsc::UnboundedReceiver<TaskResult>,
    running: &Arc<AtomicUsize>,
) -> Result<Vec<Timing>> {
    let start = Instant::now();
    let mut n_all_lines: u64 =
        changed_files.iter().map(|s| *tree.line_nums.get(s).unwrap_or(&0) as u64).sum();
    let mut n_lines: u64 = 0;
    let mut waiting: HashSet<SourceId> = changed_files.into_iter().collect();
    let mut scheduled: HashSet<SourceId> = HashSet::new();
    let mut timings = Vec::new();
    let stdout = std::io::stdout();

    loop {
        let blocking: HashSet<SourceId> = waiting.union(&scheduled).cloned().collect();
        let ready: Vec<SourceId> = waiting
            .iter()
            .filter(|s| tree.ancestors.get(*s).map_or(true, |anc| anc.is_disjoint(&blocking)))
            .cloned()
            .collect();
        for src in ready {
            hashes.remove(src.as_str());
            let task = tasks.get(&src).expect("dirty source must be a known task");
            task_queue.push(DispatchedTask {
                priority: *tree.priority.get(&src).unwrap_or(&1),
                source: src.clone(),
                args: task.full_args(),
            });
            waiting.remove(&src);
            scheduled.insert(src);
        }

        let progress = Progress {
            waiting: waiting.len(),
            scheduled: scheduled.len(),
            running: running.load(Relaxed),
            lines_done: n_lines,
            lines_total: n_all_lines,
            elapsed_secs: start.elapsed().as_secs_f64(),
        };
        progress.write_line(stdout.lock());
        debug!(
            waiting = progress.waiting,
            scheduled = progress.scheduled,
            running = progress.running,
            n_lines,
            n_all_lines,
            "scheduler progress"
        );

        if waiting.is_empty() && scheduled.is_empty() {
            println!();
            break;
        }

        let next = tokio::select! {
            biased;
            _ = tokio::signal::ctrl_c() => None,
            result = result_rx.recv() => Some(result),
        };
        let Some(next) = next else {
            return Err(FcompileError::Interrupted);
        };
        let Some(TaskResult { source, outcome, wall_secs }) = next else {
            // All workers exited without a result pending; nothing more can complete.
            break;
        };
        let retcode = match outcome {
            TaskOutcome::SpawnFailed(source_err) => {
                return Err(FcompileError::Spawn { unit: source, source_err });
            }
            TaskOutcome::Exited(retcode) => retcode,
        };
        if retcode != 0 {
            return Err(FcompileError::CompilationError { unit: source, retcode });
        }

        let line_count = *tree.line_nums.get(&source).unwrap_or(&0);
        timings.push(Timing { source: source.as_str().to_owned(), wall_secs, line_count });
        hashes.insert(source.as_str().to_owned(), tree.hashes[source.as_str()].clone());
        n_lines += line_count as u64;
        scheduled.remove(&source);
        report::announce(&mut std::io::stdout(), format_args!("Compiled {source}."));

        if let Some(modules) = tree.src_mods.get(&source) {
            for module in modules {
                let modfile = module.artifact_filename();
                let new_hash = hash_file(Path::new(&modfile), None)?;
                if hashes.get(&modfile) == Some(&new_hash) {
                    // Interface unchanged: the whole point of the incrementality
                    // layer is that nothing downstream gets enqueued here.
                    continue;
                }
                hashes.insert(modfile, new_hash);
                let Some(users) = tree.mod_uses.get(module) else { continue };
                for dependent in users {
                    debug_assert!(
                        !scheduled.contains(dependent),
                        "ancestor ordering should forbid a scheduled consumer of a just-changed interface"
                    );
                    hashes.remove(dependent.as_str());
                    if waiting.insert(dependent.clone()) {
                        n_all_lines += *tree.line_nums.get(dependent).unwrap_or(&0) as u64;
                    }
                }
            }
        }
    }

    Ok(timings)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn no_changed_files_runs_nothing() {
        let tasks = Arc::new(HashMap::new());
        let tree = Arc::new(TaskTree::build(&tasks).unwrap());
        let (hashes, result) = run(tree, tasks, HashMap::new(), Vec::new(), 2).await;
        assert!(hashes.is_empty());
        assert_eq!(result.unwrap().len(), 0);
    }
}
