//! The worker pool: a fixed number of cooperative tasks that each pop one
//! dispatched compilation at a time, spawn the compiler subprocess, and post
//! the result back to the scheduler.
//!
//! Workers never interpret the return code: the scheduler alone decides
//! whether a nonzero exit is fatal.

use crate::{queue::PriorityQueue, types::SourceId};
use std::{
    cmp::Ordering,
    sync::{atomic::AtomicUsize, Arc},
    time::Instant,
};
use tokio::{process::Command, sync::mpsc};

/// One dispatched compilation, ordered by descending priority.
pub struct DispatchedTask {
    pub priority: u64,
    pub source: SourceId,
    pub args: Vec<String>,
}

impl PartialEq for DispatchedTask {
    fn eq(&self, other: &Self) -> bool {
        self.priority == other.priority
    }
}
impl Eq for DispatchedTask {}
impl PartialOrd for DispatchedTask {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
impl Ord for DispatchedTask {
    fn cmp(&self, other: &Self) -> Ordering {
        self.priority.cmp(&other.priority)
    }
}

/// How a dispatched compilation ended: either the subprocess ran to
/// completion with some exit code, or it could not be spawned at all.
pub enum TaskOutcome {
    Exited(i32),
    SpawnFailed(std::io::Error),
}

/// Outcome of one completed compilation, posted to the scheduler's result channel.
pub struct TaskResult {
    pub source: SourceId,
    pub outcome: TaskOutcome,
    pub wall_secs: f64,
}

/// Runs until `queue` is closed and drained, compiling whatever it pops.
///
/// `running` is incremented for the duration of each subprocess wait only, for
/// display purposes -- it carries no synchronization weight.
pub async fn worker_loop(
    queue: Arc<PriorityQueue<DispatchedTask>>,
    results: mpsc::UnboundedSender<TaskResult>,
    running: Arc<AtomicUsize>,
) {
    while let Some(task) = queue.pop().await {
        let DispatchedTask { source, args, .. } = task;
        let Some((program, rest)) = args.split_first() else {
            // An empty argument list can't be spawned; report it as a hard
            // failure through the same path a real spawn failure takes.
            let err = std::io::Error::new(
                std::io::ErrorKind::Other,
                "task has an empty argument list",
            );
            let _ = results.send(TaskResult {
                source,
                outcome: TaskOutcome::SpawnFailed(err),
                wall_secs: 0.0,
            });
            continue;
        };

        debug!(%source, "dispatching compiler subprocess");
        running.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        let start = Instant::now();
        let status = Command::new(program).args(rest).status().await;
        running.fetch_sub(1, std::sync::atomic::Ordering::SeqCst);
        let wall_secs = start.elapsed().as_secs_f64();

        let outcome = match status {
            Ok(status) => TaskOutcome::Exited(status.code().unwrap_or(-1)),
            Err(err) => TaskOutcome::SpawnFailed(err),
        };
        if results.send(TaskResult { source, outcome, wall_secs }).is_err() {
            // Scheduler has gone away (fatal error elsewhere); nothing left to do.
            break;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dispatched_tasks_order_by_priority() {
        let low = DispatchedTask { priority: 1, source: SourceId::new("a"), args: vec![] };
        let high = DispatchedTask { priority: 9, source: SourceId::new("b"), args: vec![] };
        assert!(high > low);
    }

    #[tokio::test]
    async fn worker_exits_when_queue_closes() {
        let queue = Arc::new(PriorityQueue::new());
        queue.close();
        let (tx, _rx) = mpsc::unbounded_channel();
        let running = Arc::new(AtomicUsize::new(0));
        worker_loop(queue, tx, running).await;
    }

    #[tokio::test]
    async fn empty_args_report_a_spawn_failure() {
        let queue: Arc<PriorityQueue<DispatchedTask>> = Arc::new(PriorityQueue::new());
        queue.push(DispatchedTask { priority: 1, source: SourceId::new("a"), args: vec![] });
        queue.close();
        let (tx, mut rx) = mpsc::unbounded_channel();
        let running = Arc::new(AtomicUsize::new(0));
        worker_loop(queue, tx, running).await;

        let result = rx.recv().await.unwrap();
        assert_eq!(result.source, SourceId::new("a"));
        assert!(matches!(result.outcome, TaskOutcome::SpawnFailed(_)));
    }
}
