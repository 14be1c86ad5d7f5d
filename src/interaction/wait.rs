//! Bounded condition polling

use std::time::Duration;
use tokio::time::Instant;

/// A polling window: a bound and the gap between probes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExplicitWait {
    pub timeout: Duration,
    pub poll_interval: Duration,
}

impl ExplicitWait {
    pub fn new(timeout: Duration, poll_interval: Duration) -> Self {
        Self {
            timeout,
            poll_interval,
        }
    }

    /// Start the clock
    pub fn begin(&self) -> WaitWindow {
        WaitWindow {
            deadline: Instant::now() + self.timeout,
            poll_interval: self.poll_interval,
            started: Instant::now(),
        }
    }
}

/// An ExplicitWait in progress
#[derive(Debug, Clone, Copy)]
pub struct WaitWindow {
    deadline: Instant,
    poll_interval: Duration,
    started: Instant,
}

impl WaitWindow {
    pub fn expired(&self) -> bool {
        Instant::now() >= self.deadline
    }

    pub fn remaining(&self) -> Duration {
        self.deadline.saturating_duration_since(Instant::now())
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    pub fn deadline(&self) -> Instant {
        self.deadline
    }

    /// Sleep until the next probe, never past the deadline
    pub async fn tick(&self) {
        let pause = self.poll_interval.min(self.remaining());
        if !pause.is_zero() {
            tokio::time::sleep(pause).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_tick_stops_at_deadline() {
        let wait = ExplicitWait::new(Duration::from_millis(250), Duration::from_millis(100));
        let window = wait.begin();

        let mut ticks = 0;
        while !window.expired() {
            window.tick().await;
            ticks += 1;
        }

        assert_eq!(ticks, 3);
        assert_eq!(window.elapsed(), Duration::from_millis(250));
        assert_eq!(window.remaining(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_timeout_is_expired() {
        let window = ExplicitWait::new(Duration::ZERO, Duration::from_millis(100)).begin();
        assert!(window.expired());
        window.tick().await;
        assert_eq!(window.elapsed(), Duration::ZERO);
    }
}
