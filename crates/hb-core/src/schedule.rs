//! Component update scheduling
//!
//! Checks are spread out with a random delay so that many hosts started at
//! the same moment do not all hit the update server together.

use rand::Rng;
use std::time::{Duration, SystemTime};

use crate::config::UpdateConfig;

/// Tracks when the next component update check is due
#[derive(Debug, Clone)]
pub struct UpdateSchedule {
    interval: Duration,
    wiggle: Duration,
    next_check: SystemTime,
}

impl UpdateSchedule {
    /// New schedule whose first check is due immediately
    pub fn new(config: &UpdateConfig, now: SystemTime) -> Self {
        Self {
            interval: config.interval,
            wiggle: config.wiggle,
            next_check: now,
        }
    }

    pub fn next_check(&self) -> SystemTime {
        self.next_check
    }

    /// A check is due once setup has finished and the deadline has passed
    pub fn is_due(&self, setup_done: bool, now: SystemTime) -> bool {
        setup_done && now >= self.next_check
    }

    /// Push the next check out by the interval plus a random delay in
    /// `[0, wiggle)`; returns the new deadline
    pub fn reschedule(&mut self, now: SystemTime) -> SystemTime {
        self.reschedule_with(now, &mut rand::thread_rng())
    }

    pub fn reschedule_with<R: Rng + ?Sized>(&mut self, now: SystemTime, rng: &mut R) -> SystemTime {
        let jitter = if self.wiggle.is_zero() {
            Duration::ZERO
        } else {
            self.wiggle.mul_f64(rng.gen::<f64>())
        };
        self.next_check = now + self.interval + jitter;
        tracing::debug!(
            interval = ?self.interval,
            jitter = ?jitter,
            "next component update check scheduled"
        );
        self.next_check
    }
}
