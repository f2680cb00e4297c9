// Health check schedule.
//
// A health request goes out once per interval, counted from the previous
// send. A forced poll (short press on the override button) sends at once
// and restarts the interval from that tick.

use std::time::Duration;

use super::model::AlertRequest;
use crate::core::clock::Timestamp;

/// Periodic keepalive schedule. Independent of trigger state.
#[derive(Debug, Clone)]
pub struct HealthScheduler {
    interval: Duration,
    last_sent_time: Timestamp,
}

impl HealthScheduler {
    /// `started` counts as the last send, so the first scheduled check
    /// goes out one interval after startup.
    pub fn new(interval: Duration, started: Timestamp) -> Self {
        Self {
            interval,
            last_sent_time: started,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn last_sent_time(&self) -> Timestamp {
        self.last_sent_time
    }

    /// Emit a health request when forced or when the interval has elapsed.
    pub fn poll(&mut self, now: Timestamp, forced: bool) -> Option<AlertRequest> {
        if forced || now.since(self.last_sent_time) > self.interval {
            self.last_sent_time = now;
            Some(AlertRequest::Health)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(ms: u32) -> Timestamp {
        Timestamp::from_millis(ms)
    }

    #[test]
    fn test_one_health_per_interval() {
        let mut health = HealthScheduler::new(Duration::from_millis(1_000), at(0));
        let mut sent = Vec::new();
        for t in (0..=5_000).step_by(100) {
            if health.poll(at(t), false).is_some() {
                sent.push(t);
            }
        }
        assert_eq!(sent, vec![1_100, 2_200, 3_300, 4_400]);
    }

    #[test]
    fn test_forced_health_restarts_interval() {
        let mut health = HealthScheduler::new(Duration::from_millis(1_000), at(0));
        assert_eq!(health.poll(at(400), true), Some(AlertRequest::Health));
        assert_eq!(health.last_sent_time(), at(400));

        assert_eq!(health.poll(at(1_100), false), None);
        assert_eq!(health.poll(at(1_401), false), Some(AlertRequest::Health));
    }

    #[test]
    fn test_each_forced_poll_emits() {
        let mut health = HealthScheduler::new(Duration::from_secs(60), at(0));
        assert!(health.poll(at(10), true).is_some());
        assert!(health.poll(at(20), true).is_some());
        assert!(health.poll(at(30), false).is_none());
    }
}
