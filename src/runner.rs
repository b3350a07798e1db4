//! Background task runners for discovery and artifact deletion.

use std::fmt::Debug;

use tokio::runtime::Handle;
use tracing::error;

use crate::error::{RegistryError, RegistryResult};

/// A unit of background work.
pub type Task = Box<dyn FnOnce() + Send + 'static>;

/// Executes tasks off the calling thread.
///
/// Each submitted task runs at most once. No ordering is guaranteed between
/// separate submissions.
pub trait TaskRunner: Send + Sync + Debug {
    /// Schedule `task` for asynchronous execution.
    fn schedule(&self, task: Task);
}

/// Runs every task on a fresh named OS thread.
#[derive(Debug, Clone)]
pub struct ThreadTaskRunner {
    thread_name: String,
}

impl ThreadTaskRunner {
    pub fn new(thread_name: impl Into<String>) -> Self {
        Self {
            thread_name: thread_name.into(),
        }
    }
}

impl Default for ThreadTaskRunner {
    fn default() -> Self {
        Self::new(crate::config::DEFAULT_WORKER_THREAD)
    }
}

impl TaskRunner for ThreadTaskRunner {
    fn schedule(&self, task: Task) {
        let spawned = std::thread::Builder::new()
            .name(self.thread_name.clone())
            .spawn(task);
        if let Err(err) = spawned {
            error!(thread = %self.thread_name, error = %err, "Failed to spawn background task");
        }
    }
}

/// Runs tasks on the blocking pool of a tokio runtime.
#[derive(Debug, Clone)]
pub struct TokioTaskRunner {
    handle: Handle,
}

impl TokioTaskRunner {
    pub fn new(handle: Handle) -> Self {
        Self { handle }
    }

    /// Use the runtime the caller is running on.
    pub fn current() -> RegistryResult<Self> {
        Handle::try_current()
            .map(Self::new)
            .map_err(|err| RegistryError::NoRuntime(err.to_string()))
    }
}

impl TaskRunner for TokioTaskRunner {
    fn schedule(&self, task: Task) {
        // Profile stores do blocking file-system work.
        drop(self.handle.spawn_blocking(task));
    }
}
