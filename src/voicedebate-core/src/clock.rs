//! One-second countdown source.

use std::time::Duration;
use tokio::time::{Instant, Interval, MissedTickBehavior, interval_at};

/// Below this many seconds the countdown is shown as running low.
pub const LOW_TIME_SECS: u32 = 60;

/// Periodic tick that only exists while running.
#[derive(Debug)]
pub struct Clock {
    period: Duration,
    interval: Option<Interval>,
}

impl Default for Clock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock {
    pub fn new() -> Self {
        Self::with_period(Duration::from_secs(1))
    }

    pub fn with_period(period: Duration) -> Self {
        Self {
            period,
            interval: None,
        }
    }

    /// Start ticking; the first tick lands one period from now.
    pub fn start(&mut self) {
        let mut interval = interval_at(Instant::now() + self.period, self.period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        self.interval = Some(interval);
    }

    pub fn stop(&mut self) {
        self.interval = None;
    }

    pub fn is_running(&self) -> bool {
        self.interval.is_some()
    }

    /// Wait for the next tick. Never resolves while stopped.
    pub async fn tick(&mut self) {
        match self.interval.as_mut() {
            Some(interval) => {
                interval.tick().await;
            }
            None => std::future::pending::<()>().await,
        }
    }
}

/// Render seconds as `m:ss`.
pub fn format_clock(seconds: u32) -> String {
    format!("{}:{:02}", seconds / 60, seconds % 60)
}

pub fn is_low_time(seconds: u32) -> bool {
    seconds < LOW_TIME_SECS
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_clock() {
        assert_eq!(format_clock(300), "5:00");
        assert_eq!(format_clock(65), "1:05");
        assert_eq!(format_clock(9), "0:09");
        assert_eq!(format_clock(0), "0:00");
    }

    #[test]
    fn test_low_time() {
        assert!(is_low_time(59));
        assert!(!is_low_time(60));
    }

    #[tokio::test(start_paused = true)]
    async fn test_ticks_once_per_period() {
        let mut clock = Clock::new();
        clock.start();
        let started = Instant::now();

        clock.tick().await;
        assert_eq!(started.elapsed(), Duration::from_secs(1));
        clock.tick().await;
        assert_eq!(started.elapsed(), Duration::from_secs(2));
    }

    #[tokio::test(start_paused = true)]
    async fn test_stopped_clock_never_ticks() {
        let mut clock = Clock::new();
        clock.start();
        clock.stop();
        assert!(!clock.is_running());

        let outcome = tokio::time::timeout(Duration::from_secs(10), clock.tick()).await;
        assert!(outcome.is_err());
    }
}
