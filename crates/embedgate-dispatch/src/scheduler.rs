//! Injected executor for asynchronous embedding work.

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use embedgate_core::{EmbeddingError, EmbeddingResult, VectorOrError};
use tokio::runtime::Handle;
use tokio::task::{JoinError, JoinHandle};

/// Named handle to the runtime that runs dispatch tasks, retry sleeps, and
/// blocking provider calls.
#[derive(Clone)]
pub struct TaskScheduler {
    name: Arc<str>,
    handle: Handle,
}

impl TaskScheduler {
    pub fn new(name: impl Into<String>, handle: Handle) -> Self {
        Self {
            name: Arc::from(name.into()),
            handle,
        }
    }

    /// Scheduler on the runtime the caller is running in.
    pub fn try_current(name: impl Into<String>) -> EmbeddingResult<Self> {
        let handle = Handle::try_current()
            .map_err(|e| EmbeddingError::invalid_config(format!("no tokio runtime: {e}")))?;
        Ok(Self::new(name, handle))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn spawn<F>(&self, future: F) -> JoinHandle<F::Output>
    where
        F: Future + Send + 'static,
        F::Output: Send + 'static,
    {
        self.handle.spawn(future)
    }

    pub fn spawn_blocking<F, R>(&self, f: F) -> JoinHandle<R>
    where
        F: FnOnce() -> R + Send + 'static,
        R: Send + 'static,
    {
        self.handle.spawn_blocking(f)
    }
}

impl fmt::Debug for TaskScheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskScheduler")
            .field("name", &self.name)
            .finish()
    }
}

/// Flatten a join result into the embedding error taxonomy.
pub(crate) fn flatten_join<T>(joined: Result<EmbeddingResult<T>, JoinError>) -> EmbeddingResult<T> {
    match joined {
        Ok(result) => result,
        Err(e) if e.is_panic() => Err(EmbeddingError::non_transient(
            "embedding task panicked",
        )),
        Err(_) => Err(EmbeddingError::non_transient("embedding task was cancelled")),
    }
}

type EmbedOutput = EmbeddingResult<Vec<VectorOrError>>;

enum TaskState {
    Spawned(JoinHandle<EmbedOutput>),
    Ready(Option<EmbedOutput>),
}

/// Handle to an in-flight embedding request.
///
/// Dropping the handle detaches the work: retries and rebatching still run
/// to completion, and their result is discarded.
pub struct EmbedTask {
    state: TaskState,
}

impl EmbedTask {
    pub(crate) fn spawned(handle: JoinHandle<EmbedOutput>) -> Self {
        Self {
            state: TaskState::Spawned(handle),
        }
    }

    /// An already-completed task.
    pub fn ready(result: EmbedOutput) -> Self {
        Self {
            state: TaskState::Ready(Some(result)),
        }
    }

    pub fn failed(error: EmbeddingError) -> Self {
        Self::ready(Err(error))
    }

    pub fn is_finished(&self) -> bool {
        match &self.state {
            TaskState::Spawned(handle) => handle.is_finished(),
            TaskState::Ready(_) => true,
        }
    }
}

impl Future for EmbedTask {
    type Output = EmbedOutput;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match &mut self.state {
            TaskState::Spawned(handle) => Pin::new(handle).poll(cx).map(flatten_join),
            TaskState::Ready(result) => match result.take() {
                Some(result) => Poll::Ready(result),
                None => Poll::Ready(Err(EmbeddingError::non_transient(
                    "embedding task polled after completion",
                ))),
            },
        }
    }
}

impl fmt::Debug for EmbedTask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EmbedTask")
            .field("finished", &self.is_finished())
            .finish()
    }
}
