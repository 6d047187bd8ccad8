//! Cron-driven recurring tasks.
//!
//! [`CronSchedule`] computes fire instants, [`RecurringTask`] runs one
//! action per instant, and [`TaskSupervisor`] starts and stops the set.

mod clock;
pub mod cron;
mod supervisor;
mod task;

pub use clock::{Clock, SystemClock};
pub use cron::{next_fire, seconds_until_next, CronSchedule};
pub use supervisor::TaskSupervisor;
pub use task::{Action, Guard, RecurringTask, TaskState};
