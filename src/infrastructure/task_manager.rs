use std::future::Future;
use tokio::task::JoinHandle;

/// Tracks spawned virtual-user tasks so a run can wait for or abort all of them
pub struct TaskManager<T> {
    handles: Vec<JoinHandle<T>>,
}

impl<T: Send + 'static> TaskManager<T> {
    /// Create a new empty task manager
    pub fn new() -> Self {
        Self {
            handles: Vec::new(),
        }
    }

    /// Spawn a task and track it
    pub fn spawn<F>(&mut self, future: F)
    where
        F: Future<Output = T> + Send + 'static,
    {
        self.handles.push(tokio::spawn(future));
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    /// Wait for every task; tasks that panicked or were aborted are logged and skipped
    pub async fn join_all(self) -> Vec<T> {
        let mut results = Vec::with_capacity(self.handles.len());
        for handle in self.handles {
            match handle.await {
                Ok(result) => results.push(result),
                Err(e) => tracing::error!("Task did not finish: {}", e),
            }
        }
        results
    }

    /// Abort all tasks without waiting
    pub fn abort_all(&mut self) {
        for handle in &self.handles {
            handle.abort();
        }
        self.handles.clear();
    }
}

impl<T: Send + 'static> Default for TaskManager<T> {
    fn default() -> Self {
        Self::new()
    }
}
