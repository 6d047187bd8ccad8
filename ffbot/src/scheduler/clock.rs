use chrono::{DateTime, Utc};

/// Wall-clock source for computing fire instants
pub trait Clock: Send + Sync + 'static {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Wall clock pinned to a start instant and advanced by tokio's clock, so
/// paused-time tests move both together
#[cfg(test)]
pub(crate) struct TestClock {
    start: DateTime<Utc>,
    origin: tokio::time::Instant,
}

#[cfg(test)]
impl TestClock {
    pub(crate) fn starting_at(start: DateTime<Utc>) -> std::sync::Arc<Self> {
        std::sync::Arc::new(Self {
            start,
            origin: tokio::time::Instant::now(),
        })
    }
}

#[cfg(test)]
impl Clock for TestClock {
    fn now(&self) -> DateTime<Utc> {
        let elapsed = tokio::time::Instant::now() - self.origin;
        self.start + chrono::TimeDelta::from_std(elapsed).unwrap_or(chrono::TimeDelta::zero())
    }
}
