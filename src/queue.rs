//! A minimal async priority queue, the one synchronization surface (together with
//! the plain FIFO result channel) between the scheduler and the worker pool.

use std::{
    collections::BinaryHeap,
    sync::{
        atomic::{AtomicBool, Ordering},
        Mutex,
    },
};
use tokio::sync::Notify;

/// Many-producer/many-consumer priority queue. `T`'s `Ord` impl determines pop order:
/// the greatest element pops first, matching "higher priority first" directly without
/// the negate-for-a-min-heap trick a `BinaryHeap`-free implementation would need.
pub struct PriorityQueue<T: Ord + Send> {
    heap: Mutex<BinaryHeap<T>>,
    notify: Notify,
    closed: AtomicBool,
}

impl<T: Ord + Send> PriorityQueue<T> {
    pub fn new() -> Self {
        Self { heap: Mutex::new(BinaryHeap::new()), notify: Notify::new(), closed: AtomicBool::new(false) }
    }

    /// Enqueues an item and wakes one waiting consumer, if any.
    pub fn push(&self, item: T) {
        self.heap.lock().unwrap().push(item);
        self.notify.notify_one();
    }

    /// Pops the greatest item, waiting for one to arrive. Returns `None` once the
    /// queue has been closed and drained.
    pub async fn pop(&self) -> Option<T> {
        loop {
            {
                let mut heap = self.heap.lock().unwrap();
                if let Some(item) = heap.pop() {
                    return Some(item);
                }
                if self.closed.load(Ordering::Acquire) {
                    return None;
                }
            }
            self.notify.notified().await;
        }
    }

    /// Signals that no more items will be pushed; wakes every waiting consumer.
    pub fn close(&self) {
        self.closed.store(true, Ordering::Release);
        self.notify.notify_waiters();
    }
}

impl<T: Ord + Send> Default for PriorityQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn pops_highest_priority_first() {
        let q: PriorityQueue<i32> = PriorityQueue::new();
        q.push(1);
        q.push(5);
        q.push(3);
        assert_eq!(q.pop().await, Some(5));
        assert_eq!(q.pop().await, Some(3));
        assert_eq!(q.pop().await, Some(1));
    }

    #[tokio::test]
    async fn pop_returns_none_after_close_when_empty() {
        let q: PriorityQueue<i32> = PriorityQueue::new();
        q.close();
        assert_eq!(q.pop().await, None);
    }
}
