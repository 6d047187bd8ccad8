use std::collections::HashMap;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use super::task::{RecurringTask, TaskState};

struct RunningTask {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

/// Owns the recurring tasks of the process.
/// Tasks are registered, started together, and stopped together.
pub struct TaskSupervisor {
    pending: Vec<RecurringTask>,
    tasks: HashMap<String, RunningTask>,
    states: HashMap<String, watch::Receiver<TaskState>>,
    cancel: CancellationToken,
}

impl TaskSupervisor {
    pub fn new() -> Self {
        Self {
            pending: Vec::new(),
            tasks: HashMap::new(),
            states: HashMap::new(),
            cancel: CancellationToken::new(),
        }
    }

    /// Register a task to run on [`Self::start`].
    /// A pending task with the same name is replaced.
    pub fn register(&mut self, task: RecurringTask) {
        if let Some(pos) = self.pending.iter().position(|t| t.name() == task.name()) {
            tracing::warn!(task = %task.name(), "Replacing registered task");
            self.pending.remove(pos);
        }
        self.states.insert(task.name().to_string(), task.state());
        self.pending.push(task);
    }

    /// Spawn every registered task.
    ///
    /// A task already running under the same name is asked to stop; the
    /// replacement starts once that task has finished its current tick.
    pub fn start(&mut self) {
        for task in self.pending.drain(..) {
            let name = task.name().to_string();
            tracing::info!(task = %name, schedule = %task.expression(), "Starting task");

            let cancel = self.cancel.child_token();
            let previous = self.tasks.remove(&name);
            let run_cancel = cancel.clone();
            let task_name = name.clone();

            let handle = tokio::spawn(async move {
                if let Some(previous) = previous {
                    tracing::info!(task = %task_name, "Waiting for previous instance to stop");
                    previous.cancel.cancel();
                    if let Err(e) = previous.handle.await {
                        tracing::error!(task = %task_name, "Previous instance ended abnormally: {}", e);
                    }
                }
                task.run(run_cancel).await;
            });

            self.tasks.insert(name, RunningTask { cancel, handle });
        }
    }

    pub fn state(&self, name: &str) -> Option<TaskState> {
        self.states.get(name).map(|rx| *rx.borrow())
    }

    pub fn task_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.states.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn running(&self) -> usize {
        self.tasks.len()
    }

    /// Ask every task to stop and wait until each has finished its current
    /// tick and reached [`TaskState::Stopped`]
    pub async fn shutdown(&mut self) {
        tracing::info!(tasks = self.tasks.len(), "Stopping scheduled tasks");
        self.cancel.cancel();
        self.pending.clear();

        for (name, running) in self.tasks.drain() {
            if let Err(e) = running.handle.await {
                tracing::error!(task = %name, "Task ended abnormally: {}", e);
            }
        }
        tracing::info!("All scheduled tasks stopped");
    }
}

impl Default for TaskSupervisor {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for TaskSupervisor {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
