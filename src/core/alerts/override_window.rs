// Override button handling.
//
// A long press opens the override window, a longer press (or the window
// timing out) closes it, and a short press asks for an immediate health
// check. The window is an acknowledgment indicator only; it never gates
// trigger evaluation.

use std::time::Duration;

use crate::core::clock::Timestamp;

/// Press-duration limits and window length.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OverrideTiming {
    pub long_press_limit: Duration,
    /// Extra hold beyond `long_press_limit` needed to close an open window.
    pub grace: Duration,
    pub override_length: Duration,
}

impl OverrideTiming {
    pub fn extended_limit(&self) -> Duration {
        self.long_press_limit + self.grace
    }
}

/// What the current hold has already done, so one hold acts at most once
/// per direction and never doubles as a short press.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum HoldAction {
    None,
    Activated,
    Deactivated,
}

/// Something the driver has to react to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverrideEvent {
    Activated,
    Deactivated,
    /// Released before the long-press limit: force a health check.
    ShortPress,
}

/// Override window state plus the button timer.
#[derive(Debug, Clone)]
pub struct OverrideController {
    timing: OverrideTiming,
    active: bool,
    window_start_time: Option<Timestamp>,
    button_press_start_time: Option<Timestamp>,
    hold_action: HoldAction,
}

impl OverrideController {
    pub fn new(timing: OverrideTiming) -> Self {
        Self {
            timing,
            active: false,
            window_start_time: None,
            button_press_start_time: None,
            hold_action: HoldAction::None,
        }
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn window_start_time(&self) -> Option<Timestamp> {
        self.window_start_time
    }

    pub fn button_press_start_time(&self) -> Option<Timestamp> {
        self.button_press_start_time
    }

    /// Feed one sample of the override button.
    pub fn sample(&mut self, pressed: bool, now: Timestamp) -> Option<OverrideEvent> {
        let Some(start) = self.button_press_start_time else {
            if pressed {
                self.button_press_start_time = Some(now);
                self.hold_action = HoldAction::None;
            }
            return None;
        };

        let held = now.since(start);

        if !pressed {
            let was_short =
                self.hold_action == HoldAction::None && held < self.timing.long_press_limit;
            self.button_press_start_time = None;
            self.hold_action = HoldAction::None;
            return was_short.then_some(OverrideEvent::ShortPress);
        }

        match self.hold_action {
            HoldAction::None if !self.active && held > self.timing.long_press_limit => {
                self.activate(now);
                // Re-arm so the extended limit counts from activation.
                self.button_press_start_time = Some(now);
                self.hold_action = HoldAction::Activated;
                Some(OverrideEvent::Activated)
            }
            HoldAction::None | HoldAction::Activated
                if self.active && held > self.timing.extended_limit() =>
            {
                self.deactivate();
                self.hold_action = HoldAction::Deactivated;
                Some(OverrideEvent::Deactivated)
            }
            _ => None,
        }
    }

    /// Close the window once it has been open longer than `override_length`.
    /// Returns true when this call closed it.
    pub fn expire(&mut self, now: Timestamp) -> bool {
        match (self.active, self.window_start_time) {
            (true, Some(start)) if now.since(start) > self.timing.override_length => {
                self.deactivate();
                true
            }
            _ => false,
        }
    }

    fn activate(&mut self, now: Timestamp) {
        self.active = true;
        self.window_start_time = Some(now);
    }

    fn deactivate(&mut self) {
        self.active = false;
        self.window_start_time = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_controller() -> OverrideController {
        OverrideController::new(OverrideTiming {
            long_press_limit: Duration::from_millis(3_000),
            grace: Duration::from_millis(2_000),
            override_length: Duration::from_millis(60_000),
        })
    }

    fn at(ms: u32) -> Timestamp {
        Timestamp::from_millis(ms)
    }

    fn hold(
        ctl: &mut OverrideController,
        from: u32,
        to: u32,
        step: u32,
    ) -> Vec<(u32, OverrideEvent)> {
        let mut events = Vec::new();
        let mut t = from;
        while t <= to {
            if let Some(event) = ctl.sample(true, at(t)) {
                events.push((t, event));
            }
            t += step;
        }
        events
    }

    #[test]
    fn test_short_press_requests_health() {
        let mut ctl = make_controller();
        assert_eq!(hold(&mut ctl, 0, 500, 50), vec![]);
        assert_eq!(ctl.button_press_start_time(), Some(at(0)));

        assert_eq!(ctl.sample(false, at(550)), Some(OverrideEvent::ShortPress));
        assert_eq!(ctl.button_press_start_time(), None);
        assert!(!ctl.is_active());

        // Idle releases afterwards do nothing.
        assert_eq!(ctl.sample(false, at(600)), None);
    }

    #[test]
    fn test_long_hold_activates_once() {
        let mut ctl = make_controller();
        let events = hold(&mut ctl, 0, 4_000, 100);
        assert_eq!(events, vec![(3_100, OverrideEvent::Activated)]);
        assert!(ctl.is_active());
        assert_eq!(ctl.window_start_time(), Some(at(3_100)));
        assert_eq!(ctl.button_press_start_time(), Some(at(3_100)));

        // Releasing a hold that activated is not a short press.
        assert_eq!(ctl.sample(false, at(4_100)), None);
        assert!(ctl.is_active());
    }

    #[test]
    fn test_continued_hold_deactivates_once() {
        let mut ctl = make_controller();
        let events = hold(&mut ctl, 0, 20_000, 100);
        assert_eq!(
            events,
            vec![
                (3_100, OverrideEvent::Activated),
                // 3_100 + 5_000 extended limit, strictly exceeded.
                (8_200, OverrideEvent::Deactivated),
            ]
        );
        assert!(!ctl.is_active());
        assert_eq!(ctl.sample(false, at(20_100)), None);
    }

    #[test]
    fn test_hold_while_active_deactivates_after_extended_limit() {
        let mut ctl = make_controller();
        hold(&mut ctl, 0, 3_100, 100);
        ctl.sample(false, at(3_200));
        assert!(ctl.is_active());

        // A fresh hold past only the long-press limit leaves it open.
        let events = hold(&mut ctl, 10_000, 14_000, 100);
        assert!(events.is_empty());
        assert!(ctl.is_active());

        let events = hold(&mut ctl, 14_100, 16_000, 100);
        assert_eq!(events, vec![(15_100, OverrideEvent::Deactivated)]);
    }

    #[test]
    fn test_window_expires() {
        let mut ctl = make_controller();
        hold(&mut ctl, 0, 3_100, 100);
        ctl.sample(false, at(3_200));

        assert!(!ctl.expire(at(63_100)));
        assert!(ctl.is_active());
        assert!(ctl.expire(at(63_101)));
        assert!(!ctl.is_active());
        assert_eq!(ctl.window_start_time(), None);
        assert!(!ctl.expire(at(70_000)));
    }

    #[test]
    fn test_press_of_exactly_the_limit_is_not_short() {
        let mut ctl = make_controller();
        ctl.sample(true, at(0));
        ctl.sample(true, at(3_000));
        assert_eq!(ctl.sample(false, at(3_000)), None);
        assert!(!ctl.is_active());
    }
}
