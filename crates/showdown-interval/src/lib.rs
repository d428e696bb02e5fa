//! Periodic task scheduler for the showdown client.
//!
//! A connection is a fixed set of named tasks that all start together
//! and live and die together: the receive loop, the output drain loop,
//! and whatever interval jobs the embedder registers.
//!
//! # Periodic tasks
//!
//! Each task wraps a unit of [`Work`]. [`run_periodic`] loops: note the
//! start time, run the work once, then sleep for whatever is left of the
//! interval. Intervals are measured from the *start* of the previous run,
//! so slow work eats into the sleep rather than pushing the schedule
//! back. Work that overruns its interval is re-run immediately and a
//! warning is logged. A zero interval means "run again as soon as the
//! previous run finished" (after yielding once, so siblings get polled).
//!
//! # Task groups
//!
//! [`TaskGroup::run`] races every registered task. The first one to
//! finish, whether it stopped on its own or returned an error, wins;
//! every other task is dropped (cancelled) before `run` returns. There is
//! no restart or supervision.
//!
//! All tasks in a group are polled from the task that awaits
//! [`TaskGroup::run`]; they interleave only at `.await` points and never
//! run in parallel.
//!
//! ```ignore
//! let mut group = TaskGroup::new();
//! group
//!     .register("receiver", Duration::ZERO, receiver)
//!     .register("sender", Duration::ZERO, drain)
//!     .register("ladder", Duration::from_secs(3), from_fn(|| poll_ladder(&client)));
//! let exit = group.run().await;
//! ```

#![allow(async_fn_in_trait)]

use std::future::Future;
use std::ops::ControlFlow;
use std::time::Duration;

use futures_util::future::{select_all, LocalBoxFuture};
use futures_util::FutureExt;
use tokio::time::Instant;
use tracing::{debug, trace, warn};

// ---------------------------------------------------------------------------
// Work
// ---------------------------------------------------------------------------

/// One repeatable unit of work.
///
/// Returning `Ok(ControlFlow::Break(()))` ends the task normally;
/// returning `Err` ends it abnormally. Either way the group it belongs to
/// is torn down.
pub trait Work {
    /// The error a run can fail with.
    type Error;

    /// Runs the work once.
    async fn run_once(&mut self) -> Result<ControlFlow<()>, Self::Error>;
}

/// [`Work`] backed by a closure that returns a future.
pub struct FnWork<F>(F);

/// Wraps a closure as [`Work`].
///
/// The future the closure returns must not borrow from the closure
/// itself; capture clones of what it needs instead.
pub fn from_fn<F, Fut, E>(f: F) -> FnWork<F>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<ControlFlow<()>, E>>,
{
    FnWork(f)
}

impl<F, Fut, E> Work for FnWork<F>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<ControlFlow<()>, E>>,
{
    type Error = E;

    async fn run_once(&mut self) -> Result<ControlFlow<()>, E> {
        (self.0)().await
    }
}

// ---------------------------------------------------------------------------
// Periodic loop
// ---------------------------------------------------------------------------

/// Runs `work` every `interval` until it breaks or fails.
pub async fn run_periodic<W: Work>(
    name: &str,
    interval: Duration,
    mut work: W,
) -> Result<(), W::Error> {
    let mut runs: u64 = 0;
    loop {
        let start = Instant::now();
        if work.run_once().await?.is_break() {
            debug!(task = name, runs, "periodic task finished");
            return Ok(());
        }
        runs += 1;

        let elapsed = start.elapsed();
        if !interval.is_zero() && elapsed > interval {
            warn!(
                task = name,
                elapsed_ms = elapsed.as_secs_f64() * 1000.0,
                interval_ms = interval.as_secs_f64() * 1000.0,
                "periodic task overran its interval"
            );
        }

        let remaining = interval.saturating_sub(elapsed);
        if remaining.is_zero() {
            tokio::task::yield_now().await;
        } else {
            trace!(task = name, runs, sleep_ms = remaining.as_millis() as u64, "sleeping");
            tokio::time::sleep(remaining).await;
        }
    }
}

// ---------------------------------------------------------------------------
// Task group
// ---------------------------------------------------------------------------

/// How a [`TaskGroup`] ended.
#[derive(Debug)]
pub struct GroupExit<E> {
    /// Name of the task that finished first.
    pub task: String,
    /// What that task returned.
    pub result: Result<(), E>,
    /// Names of the tasks that were cancelled because of it.
    pub cancelled: Vec<String>,
}

/// A fixed set of periodic tasks raced as a whole.
pub struct TaskGroup<'a, E> {
    names: Vec<String>,
    tasks: Vec<LocalBoxFuture<'a, Result<(), E>>>,
}

impl<'a, E: 'a> TaskGroup<'a, E> {
    /// Creates an empty group.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a task that runs `work` every `interval`.
    ///
    /// Nothing runs until [`run`](Self::run) is awaited.
    pub fn register<W>(
        &mut self,
        name: impl Into<String>,
        interval: Duration,
        work: W,
    ) -> &mut Self
    where
        W: Work<Error = E> + 'a,
    {
        let name = name.into();
        let task_name = name.clone();
        self.tasks.push(
            async move { run_periodic(&task_name, interval, work).await }.boxed_local(),
        );
        self.names.push(name);
        self
    }

    /// Names of the registered tasks, in registration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Starts every task and waits for the first one to finish.
    ///
    /// All other tasks are cancelled before this returns. Returns `None`
    /// for an empty group.
    pub async fn run(self) -> Option<GroupExit<E>> {
        let Self { mut names, tasks } = self;
        if tasks.is_empty() {
            return None;
        }

        debug!(tasks = ?names, "starting task group");
        let (result, index, remaining) = select_all(tasks).await;
        // `select_all` swap-removes the finished future; mirror it.
        let task = names.swap_remove(index);
        drop(remaining);

        match &result {
            Ok(()) => debug!(%task, cancelled = ?names, "task finished, group cancelled"),
            Err(_) => warn!(%task, cancelled = ?names, "task failed, group cancelled"),
        }

        Some(GroupExit {
            task,
            result,
            cancelled: names,
        })
    }
}

impl<'a, E: 'a> Default for TaskGroup<'a, E> {
    fn default() -> Self {
        Self {
            names: Vec::new(),
            tasks: Vec::new(),
        }
    }
}
