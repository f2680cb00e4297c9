// Per-trigger alert state machine.
//
// A trigger goes Idle -> Waiting when its input becomes active, Waiting ->
// Alerting once the input has stayed active past the alert threshold, and
// back to Idle on release. While alerting, the alert is re-sent every
// retrigger interval.

use super::model::{AlertRequest, TriggerId, TriggerTiming};
use crate::core::clock::Timestamp;

/// Observable phase of a trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerPhase {
    Idle,
    /// Input active, threshold not yet exceeded.
    Waiting,
    /// Threshold exceeded, alert sent.
    Alerting,
}

/// Runtime state for one monitored trigger.
#[derive(Debug, Clone)]
pub struct TriggerMonitor {
    id: TriggerId,
    timing: TriggerTiming,
    press_start_time: Option<Timestamp>,
    is_alerting: bool,
    last_alert_time: Option<Timestamp>,
}

impl TriggerMonitor {
    pub fn new(id: TriggerId, timing: TriggerTiming) -> Self {
        Self {
            id,
            timing,
            press_start_time: None,
            is_alerting: false,
            last_alert_time: None,
        }
    }

    pub fn id(&self) -> &TriggerId {
        &self.id
    }

    pub fn timing(&self) -> &TriggerTiming {
        &self.timing
    }

    pub fn phase(&self) -> TriggerPhase {
        match (self.press_start_time, self.is_alerting) {
            (None, _) => TriggerPhase::Idle,
            (Some(_), false) => TriggerPhase::Waiting,
            (Some(_), true) => TriggerPhase::Alerting,
        }
    }

    pub fn press_start_time(&self) -> Option<Timestamp> {
        self.press_start_time
    }

    pub fn last_alert_time(&self) -> Option<Timestamp> {
        self.last_alert_time
    }

    pub fn is_alerting(&self) -> bool {
        self.is_alerting
    }

    /// Feed one sample of the input. Returns the request to dispatch, if any.
    pub fn sample(&mut self, pressed: bool, now: Timestamp) -> Option<AlertRequest> {
        match (self.press_start_time, pressed) {
            (None, false) => None,

            (None, true) => {
                self.press_start_time = Some(now);
                None
            }

            (Some(_), false) => {
                let was_alerting = self.is_alerting;
                self.press_start_time = None;
                self.last_alert_time = None;
                self.is_alerting = false;
                if was_alerting {
                    log::info!("Trigger {} released, sending reset", self.id);
                    Some(AlertRequest::Reset {
                        id: self.id.clone(),
                    })
                } else {
                    log::debug!("Trigger {} released before threshold", self.id);
                    None
                }
            }

            (Some(start), true) if !self.is_alerting => {
                if now.since(start) > self.timing.alert_threshold {
                    self.is_alerting = true;
                    self.last_alert_time = Some(now);
                    log::info!(
                        "Trigger {} held past {:?}, raising alert",
                        self.id,
                        self.timing.alert_threshold
                    );
                    Some(AlertRequest::InitialAlert {
                        id: self.id.clone(),
                    })
                } else {
                    None
                }
            }

            (Some(_), true) => {
                // Alerting implies an alert time; fall back to now if the
                // invariant was somehow broken rather than spamming.
                let last = *self.last_alert_time.get_or_insert(now);
                if now.since(last) > self.timing.retrigger_interval {
                    self.last_alert_time = Some(now);
                    log::info!("Trigger {} still held, retriggering", self.id);
                    Some(AlertRequest::Retrigger {
                        id: self.id.clone(),
                    })
                } else {
                    None
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::alerts::model::AlertKind;
    use std::time::Duration;

    fn make_monitor(threshold_ms: u64, retrigger_ms: u64) -> TriggerMonitor {
        TriggerMonitor::new(
            TriggerId::new("left"),
            TriggerTiming {
                alert_threshold: Duration::from_millis(threshold_ms),
                retrigger_interval: Duration::from_millis(retrigger_ms),
            },
        )
    }

    fn at(ms: u32) -> Timestamp {
        Timestamp::from_millis(ms)
    }

    /// Hold the input from `from` to `to` (inclusive) in `step` ms ticks and
    /// collect every emitted request with its tick time.
    fn hold(
        monitor: &mut TriggerMonitor,
        from: u32,
        to: u32,
        step: u32,
    ) -> Vec<(u32, AlertKind)> {
        let mut emitted = Vec::new();
        let mut t = from;
        while t <= to {
            if let Some(req) = monitor.sample(true, at(t)) {
                emitted.push((t, req.kind()));
            }
            t += step;
        }
        emitted
    }

    #[test]
    fn test_short_hold_never_dispatches() {
        let mut monitor = make_monitor(10_000, 9_000);
        let emitted = hold(&mut monitor, 0, 10_000, 50);
        assert!(emitted.is_empty(), "Hold of exactly the threshold must not alert");
        assert_eq!(monitor.phase(), TriggerPhase::Waiting);

        assert_eq!(monitor.sample(false, at(10_050)), None);
        assert_eq!(monitor.phase(), TriggerPhase::Idle);
        assert_eq!(monitor.press_start_time(), None);
    }

    #[test]
    fn test_initial_alert_fires_once_at_crossing() {
        let mut monitor = make_monitor(10_000, 9_000);
        let emitted = hold(&mut monitor, 0, 15_000, 50);
        assert_eq!(emitted, vec![(10_050, AlertKind::InitialAlert)]);
        assert!(monitor.is_alerting());
        assert_eq!(monitor.last_alert_time(), Some(at(10_050)));
    }

    #[test]
    fn test_retrigger_cadence() {
        let mut monitor = make_monitor(1_000, 2_000);
        let emitted = hold(&mut monitor, 0, 9_000, 100);
        assert_eq!(
            emitted,
            vec![
                (1_100, AlertKind::InitialAlert),
                (3_200, AlertKind::Retrigger),
                (5_300, AlertKind::Retrigger),
                (7_400, AlertKind::Retrigger),
            ]
        );
    }

    #[test]
    fn test_scenario_a() {
        let mut monitor = make_monitor(10_000, 9_000);

        assert_eq!(monitor.sample(true, at(0)), None);
        assert_eq!(monitor.sample(true, at(10_000)), None);
        assert_eq!(
            monitor.sample(true, at(10_001)).map(|r| r.kind()),
            Some(AlertKind::InitialAlert)
        );
        assert_eq!(monitor.sample(true, at(19_000)), None);
        assert_eq!(monitor.sample(true, at(19_001)), None);
        assert_eq!(
            monitor.sample(true, at(19_002)).map(|r| r.kind()),
            Some(AlertKind::Retrigger)
        );

        let reset = monitor.sample(false, at(19_500));
        assert_eq!(
            reset,
            Some(AlertRequest::Reset {
                id: TriggerId::new("left")
            })
        );
        assert_eq!(monitor.phase(), TriggerPhase::Idle);
        assert!(!monitor.is_alerting());
        assert_eq!(monitor.last_alert_time(), None);
    }

    #[test]
    fn test_release_while_alerting_resets_exactly_once() {
        let mut monitor = make_monitor(100, 1_000);
        hold(&mut monitor, 0, 200, 50);
        assert_eq!(monitor.phase(), TriggerPhase::Alerting);

        assert_eq!(
            monitor.sample(false, at(250)).map(|r| r.kind()),
            Some(AlertKind::Reset)
        );
        assert_eq!(monitor.sample(false, at(300)), None);
        assert_eq!(monitor.sample(false, at(350)), None);
    }

    #[test]
    fn test_idle_release_is_noop() {
        let mut monitor = make_monitor(100, 1_000);
        for t in (0..1_000).step_by(50) {
            assert_eq!(monitor.sample(false, at(t)), None);
        }
        assert_eq!(monitor.phase(), TriggerPhase::Idle);
        assert_eq!(monitor.press_start_time(), None);
        assert_eq!(monitor.last_alert_time(), None);
        assert!(!monitor.is_alerting());
    }

    #[test]
    fn test_threshold_across_clock_wrap() {
        let mut monitor = make_monitor(1_000, 5_000);
        let start = at(u32::MAX - 400);

        assert_eq!(monitor.sample(true, start), None);
        assert_eq!(monitor.sample(true, start.wrapping_add_millis(600)), None);
        assert_eq!(monitor.sample(true, start.wrapping_add_millis(1_000)), None);
        assert_eq!(
            monitor
                .sample(true, start.wrapping_add_millis(1_001))
                .map(|r| r.kind()),
            Some(AlertKind::InitialAlert)
        );
    }

    #[test]
    fn test_new_press_after_reset_starts_fresh() {
        let mut monitor = make_monitor(100, 1_000);
        hold(&mut monitor, 0, 200, 50);
        monitor.sample(false, at(250));

        assert_eq!(monitor.sample(true, at(300)), None);
        assert_eq!(monitor.press_start_time(), Some(at(300)));
        assert_eq!(monitor.sample(true, at(400)), None);
        assert_eq!(
            monitor.sample(true, at(401)).map(|r| r.kind()),
            Some(AlertKind::InitialAlert)
        );
    }
}
