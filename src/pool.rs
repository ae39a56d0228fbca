/*
 * rank-trainer, a stochastic weight search engine for ranking problems
 * Copyright (C) 2026 rank-trainer contributors
 *
 * rank-trainer is free software: you can redistribute it and/or modify it
 * under the terms of the GNU General Public License as published by the Free
 * Software Foundation, either version 3 of the License, or (at your option)
 * any later version.
 *
 * rank-trainer is distributed in the hope that it will be useful, but
 * WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the GNU General
 * Public License for more details.
 *
 * You should have received a copy of the GNU General Public License along
 * with rank-trainer. If not, see <https://www.gnu.org/licenses/>.
 */

//! A fixed-size, persistent worker pool for the per-cycle evaluation
//! fan-out.
//!
//! The training loop submits one batch of tasks (one per event) every
//! cycle, thousands of times a second. Spawning fresh threads every cycle
//! would be wasteful at that rate, so this pool keeps a fixed set of worker
//! threads parked on a condition variable between batches and only pays
//! thread-spawn cost once, at startup.

use std::{
    collections::VecDeque,
    num::NonZero,
    sync::{Arc, Condvar, Mutex},
    thread::{self, available_parallelism, JoinHandle},
};

/// A unit of work submitted to the pool: a boxed closure run on some worker
/// thread, with no return value. Callers communicate results back through
/// their own shared state (see [`crate::trainer::Trainer`]'s use of
/// `Arc<Mutex<Event>>`).
type Task = Box<dyn FnOnce() + Send + 'static>;

/// Shared state between the pool's handle and its worker threads.
struct Shared {
    /// Pending tasks, submitted by [`WorkerPool::submit_batch`] and drained
    /// by workers.
    queue: Mutex<QueueState>,
    /// Signalled when a task is pushed, or when the pool is shutting down.
    work_available: Condvar,
    /// Signalled whenever `in_flight` reaches zero.
    batch_done: Condvar,
}

/// The queue plus the bookkeeping needed to know when a submitted batch has
/// fully drained, guarded by a single mutex.
struct QueueState {
    /// Tasks waiting to be picked up.
    tasks: VecDeque<Task>,
    /// How many tasks from the current batch are queued or running.
    in_flight: usize,
    /// Set once, telling workers to exit instead of waiting for more work.
    must_die: bool,
}

/// A fixed-size pool of persistent worker threads.
pub struct WorkerPool {
    /// State shared with every worker thread.
    shared: Arc<Shared>,
    /// Join handles for every worker, taken by [`WorkerPool::shutdown`].
    workers: Vec<JoinHandle<()>>,
}

impl WorkerPool {
    /// Creates a pool with `thread_count` workers.
    ///
    /// `thread_count` is used as-is only when it falls in `[1, 1024]`.
    /// Outside that range (including `0`, the command line's "auto" token,
    /// and anything absurdly large) a thread count is instead derived from
    /// [`available_parallelism`], halved and clamped to be at least `1`.
    pub fn new(thread_count: usize) -> Self {
        let thread_count = if (1..=1024).contains(&thread_count) {
            thread_count
        } else {
            available_parallelism()
                .map(NonZero::get)
                .map_or(1, |n| (n / 2).max(1))
        };

        let shared = Arc::new(Shared {
            queue: Mutex::new(QueueState {
                tasks: VecDeque::new(),
                in_flight: 0,
                must_die: false,
            }),
            work_available: Condvar::new(),
            batch_done: Condvar::new(),
        });

        let workers = (0..thread_count)
            .map(|_| {
                let shared = Arc::clone(&shared);
                thread::spawn(move || Self::worker_loop(&shared))
            })
            .collect();

        Self { shared, workers }
    }

    /// The body run by every worker thread until `must_die` is set.
    fn worker_loop(shared: &Shared) {
        loop {
            let mut state = shared.queue.lock().expect("worker pool mutex was poisoned");
            loop {
                if state.must_die {
                    return;
                }
                if let Some(task) = state.tasks.pop_front() {
                    drop(state);
                    task();
                    let mut state = shared.queue.lock().expect("worker pool mutex was poisoned");
                    state.in_flight -= 1;
                    if state.in_flight == 0 {
                        shared.batch_done.notify_all();
                    }
                    break;
                }
                state = shared
                    .work_available
                    .wait(state)
                    .expect("worker pool mutex was poisoned");
            }
        }
    }

    /// Submits a batch of tasks and blocks until every one of them has run.
    ///
    /// Tasks within a batch may run in any order and on any worker; the
    /// caller is responsible for making sure they don't race each other
    /// (each task in the training loop only ever touches its own event, via
    /// its own `Arc<Mutex<Event>>`).
    pub fn submit_batch(&self, tasks: Vec<Task>) {
        if tasks.is_empty() {
            return;
        }

        {
            let mut state = self.shared.queue.lock().expect("worker pool mutex was poisoned");
            state.in_flight += tasks.len();
            state.tasks.extend(tasks);
        }
        self.shared.work_available.notify_all();

        let state = self.shared.queue.lock().expect("worker pool mutex was poisoned");
        let _state = self
            .shared
            .batch_done
            .wait_while(state, |state| state.in_flight > 0)
            .expect("worker pool mutex was poisoned");
    }

    /// How many worker threads this pool runs.
    pub fn thread_count(&self) -> usize {
        self.workers.len()
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        {
            let mut state = self.shared.queue.lock().expect("worker pool mutex was poisoned");
            state.must_die = true;
        }
        self.shared.work_available.notify_all();
        for worker in self.workers.drain(..) {
            let _ = worker.join();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn runs_every_task_in_a_batch() {
        let pool = WorkerPool::new(4);
        let counter = Arc::new(AtomicUsize::new(0));

        let tasks: Vec<Task> = (0..50)
            .map(|_| {
                let counter = Arc::clone(&counter);
                Box::new(move || {
                    counter.fetch_add(1, Ordering::SeqCst);
                }) as Task
            })
            .collect();

        pool.submit_batch(tasks);
        assert_eq!(counter.load(Ordering::SeqCst), 50);
    }

    #[test]
    fn runs_several_batches_sequentially() {
        let pool = WorkerPool::new(2);
        let counter = Arc::new(AtomicUsize::new(0));

        for _ in 0..10 {
            let counter = Arc::clone(&counter);
            pool.submit_batch(vec![Box::new(move || {
                counter.fetch_add(1, Ordering::SeqCst);
            })]);
        }
        assert_eq!(counter.load(Ordering::SeqCst), 10);
    }

    #[test]
    fn zero_thread_count_falls_back_to_available_parallelism() {
        let pool = WorkerPool::new(0);
        assert!(pool.thread_count() >= 1);
    }

    #[test]
    fn out_of_range_thread_count_falls_back_to_available_parallelism() {
        let pool = WorkerPool::new(5000);
        assert!(pool.thread_count() >= 1);
        assert!(pool.thread_count() <= 1024);
    }

    #[test]
    fn in_range_thread_count_is_used_verbatim() {
        let pool = WorkerPool::new(3);
        assert_eq!(pool.thread_count(), 3);
    }

    #[test]
    fn empty_batch_returns_immediately() {
        let pool = WorkerPool::new(2);
        pool.submit_batch(Vec::new());
    }
}
