//! Bounded fan-out/fan-in over independent async lookups.

use std::fmt::Display;
use std::future::Future;
use std::sync::Arc;

use tokio::sync::Semaphore;

/// Result of one fanned-out task.
#[derive(Debug, Clone, PartialEq)]
pub enum TaskOutcome<T> {
    Success(T),
    Failure(String),
}

impl<T> TaskOutcome<T> {
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, TaskOutcome::Success(_))
    }

    pub fn success(self) -> Option<T> {
        match self {
            TaskOutcome::Success(value) => Some(value),
            TaskOutcome::Failure(_) => None,
        }
    }

    #[must_use]
    pub fn as_success(&self) -> Option<&T> {
        match self {
            TaskOutcome::Success(value) => Some(value),
            TaskOutcome::Failure(_) => None,
        }
    }
}

/// Runs tasks concurrently, at most `max_concurrent` at a time, and returns
/// one outcome per task in input order.
///
/// Each task is spawned onto the runtime, so dropping the returned future
/// does not cancel tasks that already started. A failing or panicking task
/// only affects its own outcome.
#[derive(Debug, Clone)]
pub struct ParallelTaskRunner {
    permits: Arc<Semaphore>,
    max_concurrent: usize,
}

impl ParallelTaskRunner {
    #[must_use]
    pub fn new(max_concurrent: usize) -> Self {
        let max_concurrent = max_concurrent.max(1);
        Self {
            permits: Arc::new(Semaphore::new(max_concurrent)),
            max_concurrent,
        }
    }

    #[must_use]
    pub fn max_concurrent(&self) -> usize {
        self.max_concurrent
    }

    pub async fn run_all<I, F, T, E>(&self, tasks: I) -> Vec<TaskOutcome<T>>
    where
        I: IntoIterator<Item = F>,
        F: Future<Output = Result<T, E>> + Send + 'static,
        T: Send + 'static,
        E: Display + Send + 'static,
    {
        let handles: Vec<_> = tasks
            .into_iter()
            .map(|task| {
                let permits = Arc::clone(&self.permits);
                tokio::spawn(async move {
                    // The semaphore is never closed, so acquisition only fails
                    // if that changes; run unthrottled rather than drop the task.
                    let _permit = permits.acquire_owned().await.ok();
                    task.await.map_err(|e| e.to_string())
                })
            })
            .collect();

        let mut outcomes = Vec::with_capacity(handles.len());
        for handle in handles {
            let outcome = match handle.await {
                Ok(Ok(value)) => TaskOutcome::Success(value),
                Ok(Err(reason)) => TaskOutcome::Failure(reason),
                Err(e) if e.is_panic() => TaskOutcome::Failure("task panicked".to_string()),
                Err(e) => TaskOutcome::Failure(format!("task did not complete: {e}")),
            };
            outcomes.push(outcome);
        }
        outcomes
    }
}

impl Default for ParallelTaskRunner {
    fn default() -> Self {
        Self::new(10)
    }
}

/// Keep successful values in order, dropping failures.
pub fn successes<T>(outcomes: Vec<TaskOutcome<T>>) -> Vec<T> {
    outcomes.into_iter().filter_map(TaskOutcome::success).collect()
}
