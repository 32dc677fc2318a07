// certrefresh - CDN certificate rotation
// Copyright (C) 2025 certrefresh Contributors
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published
// by the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.

//! Bounded concurrent fan-out with first-error-wins semantics
//!
//! A [`TaskGroup`] runs labelled tasks on a [`JoinSet`]. Each task waits for a
//! permit of the shared [`ConcurrencyBudget`] before it starts.
//!
//! When a task fails (or panics) the group stops waiting:
//! - tasks that have not obtained a permit yet skip their work
//! - tasks already running are detached, they keep running to completion
//!   but their outcome is no longer observed
//!
//! The [`GroupFailure`] tells the caller which tasks were confirmed done and
//! which are unconfirmed.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::{Id, JoinSet};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Default number of concurrent tasks
pub const DEFAULT_MAX_CONCURRENCY: usize = 8;

/// Shared cap on concurrently running tasks
///
/// Clones share the same permits, so one budget handed to several groups (or
/// several accounts) bounds all of them together.
#[derive(Debug, Clone)]
pub struct ConcurrencyBudget {
    permits: Arc<Semaphore>,
    limit: usize,
}

impl ConcurrencyBudget {
    /// Create a budget of `limit` permits (at least one)
    pub fn new(limit: usize) -> Self {
        let limit = limit.max(1);
        ConcurrencyBudget {
            permits: Arc::new(Semaphore::new(limit)),
            limit,
        }
    }

    /// Configured number of permits
    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Permits not currently held
    pub fn available(&self) -> usize {
        self.permits.available_permits()
    }
}

impl Default for ConcurrencyBudget {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_CONCURRENCY)
    }
}

/// Why a task failed
#[derive(Debug)]
pub enum TaskError<E> {
    /// The task returned an error
    Failed(E),
    /// The task panicked or was aborted
    Panicked,
}

/// First failure of a group
#[derive(Debug)]
pub struct GroupFailure<E> {
    /// Label of the failed task
    pub failed: String,
    /// What went wrong
    pub error: TaskError<E>,
    /// Labels of tasks confirmed successful, in completion order
    pub completed: Vec<String>,
    /// Labels of tasks still running or never started, in spawn order
    pub outstanding: Vec<String>,
}

/// Labelled tasks sharing a budget
pub struct TaskGroup<T, E> {
    set: JoinSet<Option<Result<T, E>>>,
    labels: HashMap<Id, (usize, String)>,
    spawned: usize,
    budget: ConcurrencyBudget,
    halt: CancellationToken,
}

impl<T, E> TaskGroup<T, E>
where
    T: Send + 'static,
    E: Send + 'static,
{
    /// Create an empty group drawing permits from `budget`
    pub fn new(budget: ConcurrencyBudget) -> Self {
        TaskGroup {
            set: JoinSet::new(),
            labels: HashMap::new(),
            spawned: 0,
            budget,
            halt: CancellationToken::new(),
        }
    }

    /// Number of tasks not yet joined
    pub fn len(&self) -> usize {
        self.set.len()
    }

    /// Whether every task has been joined
    pub fn is_empty(&self) -> bool {
        self.set.is_empty()
    }

    /// Spawn a task
    ///
    /// The future is not polled until a permit is available, and is dropped
    /// without being polled if the group fails first.
    pub fn spawn<F>(&mut self, label: impl Into<String>, task: F)
    where
        F: Future<Output = Result<T, E>> + Send + 'static,
    {
        let label = label.into();
        let permits = Arc::clone(&self.budget.permits);
        let halt = self.halt.clone();
        let task_label = label.clone();

        let handle = self.set.spawn(async move {
            let permit = tokio::select! {
                biased;
                _ = halt.cancelled() => None,
                permit = permits.acquire_owned() => permit.ok(),
            };
            let Some(_permit) = permit else {
                debug!(task = %task_label, "group halted, skipping task");
                return None;
            };
            if halt.is_cancelled() {
                debug!(task = %task_label, "group halted, skipping task");
                return None;
            }
            Some(task.await)
        });

        self.labels.insert(handle.id(), (self.spawned, label));
        self.spawned += 1;
    }

    /// Wait for every task, or for the first failure
    ///
    /// On success returns each task's label and output in completion order.
    pub async fn join(mut self) -> Result<Vec<(String, T)>, GroupFailure<E>> {
        let mut done = Vec::with_capacity(self.set.len());

        while let Some(joined) = self.set.join_next_with_id().await {
            match joined {
                Ok((id, Some(Ok(output)))) => {
                    if let Some((_, label)) = self.labels.remove(&id) {
                        done.push((label, output));
                    }
                }
                Ok((id, Some(Err(e)))) => {
                    return Err(self.fail(id, TaskError::Failed(e), done));
                }
                Ok((id, None)) => {
                    self.labels.remove(&id);
                }
                Err(join_err) => {
                    warn!(error = %join_err, "task did not run to completion");
                    let id = join_err.id();
                    return Err(self.fail(id, TaskError::Panicked, done));
                }
            }
        }

        Ok(done)
    }

    fn fail(mut self, id: Id, error: TaskError<E>, done: Vec<(String, T)>) -> GroupFailure<E> {
        self.halt.cancel();
        self.set.detach_all();

        let failed = self
            .labels
            .remove(&id)
            .map(|(_, label)| label)
            .unwrap_or_default();

        let mut outstanding: Vec<(usize, String)> = self.labels.drain().map(|(_, v)| v).collect();
        outstanding.sort_by_key(|(index, _)| *index);

        GroupFailure {
            failed,
            error,
            completed: done.into_iter().map(|(label, _)| label).collect(),
            outstanding: outstanding.into_iter().map(|(_, label)| label).collect(),
        }
    }
}

impl<T, E> std::fmt::Debug for TaskGroup<T, E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskGroup")
            .field("pending", &self.set.len())
            .field("budget", &self.budget)
            .field("halted", &self.halt.is_cancelled())
            .finish()
    }
}
