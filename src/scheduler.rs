//! Fixed-size worker pool with a shared task queue.
//!
//! The pool lives for exactly one sort call. Worker threads are scoped to
//! [`JobScheduler::run`], so tasks may borrow the input and the sort context.
//! Tasks receive the scheduler itself and may enqueue further tasks, which is
//! how radix steps recurse.
//!
//! Termination is tracked with a `pending` counter: it is incremented before a
//! task is pushed and decremented after the task returned, so it reaches zero
//! only once the queue is empty and no worker is executing anything.

use crate::error::Result;
use crossbeam_deque::{Injector, Steal};
use log::debug;
use parking_lot::{Condvar, Mutex};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering, fence};
use std::thread;
use std::time::Duration;

/// Upper bound on how long an idle worker sleeps before re-checking the queue.
const PARK_TIMEOUT: Duration = Duration::from_millis(1);

/// A deferred unit of work.
pub type Task<'a> = Box<dyn FnOnce(&JobScheduler<'a>) + Send + 'a>;

/// Worker pool executing [`Task`]s until the queue runs dry.
pub struct JobScheduler<'a> {
    queue: Injector<Task<'a>>,
    num_threads: usize,
    /// Tasks enqueued and not yet finished.
    pending: AtomicUsize,
    /// Workers currently parked waiting for work.
    idle: AtomicUsize,
    shutdown: AtomicBool,
    poisoned: AtomicBool,
    lock: Mutex<()>,
    work_available: Condvar,
    drained: Condvar,
}

impl<'a> JobScheduler<'a> {
    /// Creates a scheduler for `num_threads` workers. No thread is started
    /// until [`run`](Self::run) is called.
    pub fn new(num_threads: usize) -> Self {
        assert!(num_threads > 0, "scheduler needs at least one worker");
        Self {
            queue: Injector::new(),
            num_threads,
            pending: AtomicUsize::new(0),
            idle: AtomicUsize::new(0),
            shutdown: AtomicBool::new(false),
            poisoned: AtomicBool::new(false),
            lock: Mutex::new(()),
            work_available: Condvar::new(),
            drained: Condvar::new(),
        }
    }

    /// Number of worker threads.
    pub fn num_threads(&self) -> usize {
        self.num_threads
    }

    /// Adds a task to the queue. Safe to call from any thread, including from
    /// within a running task.
    pub fn enqueue<F>(&self, task: F)
    where
        F: FnOnce(&JobScheduler<'a>) + Send + 'a,
    {
        self.pending.fetch_add(1, Ordering::AcqRel);
        self.queue.push(Box::new(task));
        fence(Ordering::SeqCst);
        if self.idle.load(Ordering::SeqCst) > 0 {
            let _guard = self.lock.lock();
            self.work_available.notify_one();
        }
    }

    /// Best-effort hint that at least one worker is waiting for work.
    ///
    /// The answer may be stale by the time the caller acts on it.
    #[inline]
    pub fn has_idle_worker(&self) -> bool {
        self.idle.load(Ordering::Relaxed) > 0
    }

    /// Number of tasks enqueued and not yet finished.
    pub fn pending(&self) -> usize {
        self.pending.load(Ordering::Acquire)
    }

    /// Blocks until the queue is empty and every worker is idle.
    ///
    /// Returns early if a task panicked; the panic itself is re-raised when
    /// [`run`](Self::run) joins the workers.
    pub fn run_until_empty(&self) {
        let mut guard = self.lock.lock();
        while self.pending.load(Ordering::Acquire) > 0 && !self.poisoned.load(Ordering::Acquire) {
            self.drained.wait(&mut guard);
        }
    }

    /// Starts the workers, runs `f` on the calling thread and shuts the pool
    /// down once `f` returns. Workers are joined before this returns.
    ///
    /// `f` is expected to enqueue the initial work and call
    /// [`run_until_empty`](Self::run_until_empty).
    pub fn run<R>(&self, f: impl FnOnce(&Self) -> R) -> Result<R> {
        thread::scope(|scope| {
            let mut handles = Vec::with_capacity(self.num_threads);
            let mut spawn_error = None;
            for id in 0..self.num_threads {
                let builder = thread::Builder::new().name(format!("prsort-worker-{id}"));
                match builder.spawn_scoped(scope, move || self.worker_loop()) {
                    Ok(handle) => handles.push(handle),
                    Err(e) => {
                        spawn_error = Some(e);
                        break;
                    }
                }
            }
            debug!("Started {} of {} workers", handles.len(), self.num_threads);

            let result = match spawn_error {
                None => Ok(f(self)),
                Some(e) => Err(e.into()),
            };
            self.stop();
            for handle in handles {
                if let Err(payload) = handle.join() {
                    std::panic::resume_unwind(payload);
                }
            }
            result
        })
    }

    fn stop(&self) {
        let _guard = self.lock.lock();
        self.shutdown.store(true, Ordering::Release);
        self.work_available.notify_all();
    }

    fn pop(&self) -> Option<Task<'a>> {
        loop {
            match self.queue.steal() {
                Steal::Success(task) => return Some(task),
                Steal::Empty => return None,
                Steal::Retry => continue,
            }
        }
    }

    fn worker_loop(&self) {
        loop {
            if self.shutdown.load(Ordering::Acquire) {
                return;
            }
            if let Some(task) = self.pop() {
                let _done = TaskCompletion(self);
                task(self);
                continue;
            }

            let mut guard = self.lock.lock();
            self.idle.fetch_add(1, Ordering::SeqCst);
            fence(Ordering::SeqCst);
            while self.queue.is_empty() && !self.shutdown.load(Ordering::Acquire) {
                self.work_available.wait_for(&mut guard, PARK_TIMEOUT);
            }
            self.idle.fetch_sub(1, Ordering::AcqRel);
        }
    }

    fn task_finished(&self) {
        let panicking = thread::panicking();
        if panicking {
            self.poisoned.store(true, Ordering::Release);
        }
        if self.pending.fetch_sub(1, Ordering::AcqRel) == 1 || panicking {
            let _guard = self.lock.lock();
            self.drained.notify_all();
        }
    }
}

/// Marks a task as finished when dropped, also while unwinding.
struct TaskCompletion<'s, 'a>(&'s JobScheduler<'a>);

impl Drop for TaskCompletion<'_, '_> {
    fn drop(&mut self) {
        self.0.task_finished();
    }
}
