use chrono::{DateTime, Utc};
use futures::future::{BoxFuture, FutureExt};
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use super::clock::{Clock, SystemClock};
use super::cron::CronSchedule;

pub type Action = Arc<dyn Fn() -> BoxFuture<'static, anyhow::Result<()>> + Send + Sync>;
pub type Guard = Arc<dyn Fn() -> bool + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskState {
    Idle,
    Waiting,
    Firing,
    Stopped,
}

/// A cron schedule bound to an action and a guard.
///
/// Each cycle waits until the next fire instant (computed from the clock at
/// that moment), evaluates the guard and, if it holds, runs the action.
/// Action errors and panics are logged and never end the loop; only
/// cancellation does, and an in-flight action always finishes first.
pub struct RecurringTask {
    name: String,
    schedule: CronSchedule,
    guard: Guard,
    action: Action,
    clock: Arc<dyn Clock>,
    state: watch::Sender<TaskState>,
}

impl RecurringTask {
    pub fn new<A, Fut>(name: impl Into<String>, schedule: CronSchedule, action: A) -> Self
    where
        A: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        let (state, _) = watch::channel(TaskState::Idle);
        Self {
            name: name.into(),
            schedule,
            guard: Arc::new(|| true),
            action: Arc::new(move || action().boxed()),
            clock: Arc::new(SystemClock),
            state,
        }
    }

    /// Only fire while `guard` returns true
    pub fn with_guard(mut self, guard: impl Fn() -> bool + Send + Sync + 'static) -> Self {
        self.guard = Arc::new(guard);
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn expression(&self) -> &str {
        self.schedule.expression()
    }

    pub fn state(&self) -> watch::Receiver<TaskState> {
        self.state.subscribe()
    }

    fn set_state(&self, state: TaskState) {
        self.state.send_replace(state);
    }

    pub async fn run(mut self, cancel: CancellationToken) {
        tracing::info!(task = %self.name, schedule = %self.schedule.expression(), "Task started");

        loop {
            let now = self.clock.now();
            let wait = self.schedule.seconds_until_next(now);
            let fire_at = self.schedule.last_computed_fire();

            self.set_state(TaskState::Waiting);
            tracing::debug!(task = %self.name, next = ?fire_at, wait_secs = wait.as_secs(), "Waiting");

            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                _ = tokio::time::sleep(wait) => {}
            }

            if cancel.is_cancelled() {
                break;
            }

            self.fire(fire_at).await;
        }

        self.set_state(TaskState::Stopped);
        tracing::info!(task = %self.name, "Task stopped");
    }

    async fn fire(&self, scheduled: Option<DateTime<Utc>>) {
        self.set_state(TaskState::Firing);

        if !(self.guard)() {
            tracing::debug!(task = %self.name, "Guard closed, skipping tick");
            return;
        }

        tracing::info!(task = %self.name, scheduled = ?scheduled, "Firing");
        let started = tokio::time::Instant::now();

        match AssertUnwindSafe((self.action)()).catch_unwind().await {
            Ok(Ok(())) => {
                tracing::debug!(
                    task = %self.name,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "Tick complete"
                );
            }
            Ok(Err(e)) => {
                tracing::error!(task = %self.name, "Tick failed: {:#}", e);
            }
            Err(_) => {
                tracing::error!(task = %self.name, "Tick panicked");
            }
        }
    }
}
