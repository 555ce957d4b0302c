use std::time::Duration;

/// Port for blocking waits between readiness checks
pub trait Sleeper {
    fn sleep(&self, duration: Duration);
}

/// Sleeper backed by the current thread
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadSleeper;

impl Sleeper for ThreadSleeper {
    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

/// Bounded polling policy: at most `max_attempts` checks, `interval` apart
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub interval: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, interval: Duration) -> Self {
        Self { max_attempts, interval }
    }

    /// Upper bound on time spent sleeping under this policy
    pub fn budget(&self) -> Duration {
        self.interval * self.max_attempts
    }
}

impl Default for RetryPolicy {
    /// 30 checks, 10 seconds apart
    fn default() -> Self {
        Self::new(30, Duration::from_secs(10))
    }
}
