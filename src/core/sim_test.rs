#[cfg(test)]
mod sim_tests {
    use crate::core::alerts::model::AlertKind;
    use crate::core::clock::{Clock, Timestamp};
    use crate::core::config::Settings;
    use crate::core::coordinator::{Coordinator, DispatchRecord};
    use crate::core::dispatch::request::OutboundRequest;
    use crate::core::dispatch::transport::Transport;
    use crate::core::dispatch::Dispatcher;
    use crate::core::error::TransportError;
    use crate::core::hardware::{FeedbackSink, PinIo};
    use crate::core::model::{FeedbackEvent, PinId};
    use std::collections::HashSet;
    use std::sync::{Arc, Mutex};

    /// Inputs currently held, shared with the test body.
    #[derive(Clone, Default)]
    struct Held(Arc<Mutex<HashSet<u32>>>);

    impl Held {
        fn press(&self, pin: u32) {
            self.0.lock().unwrap().insert(pin);
        }

        fn release(&self, pin: u32) {
            self.0.lock().unwrap().remove(&pin);
        }
    }

    impl PinIo for Held {
        fn read_digital(&mut self, pin: PinId) -> bool {
            self.0.lock().unwrap().contains(&pin.0)
        }

        fn write_digital(&mut self, _pin: PinId, _high: bool) {}
    }

    struct Quiet;

    impl FeedbackSink for Quiet {
        fn emit(&mut self, _event: FeedbackEvent) {}
    }

    struct Accepting;

    impl Transport for Accepting {
        fn send(&mut self, _request: &OutboundRequest) -> Result<Vec<u8>, TransportError> {
            Ok(b"HTTP/1.1 200 OK\r\nContent-Type: application/json\r\n\r\n{}".to_vec())
        }
    }

    struct StartAt(u32);

    impl Clock for StartAt {
        fn now(&self) -> Timestamp {
            Timestamp::from_millis(self.0)
        }
    }

    fn make_coordinator(settings: &Settings, held: &Held, start: u32) -> Coordinator {
        let dispatcher = Dispatcher::new(
            settings.endpoint.host.clone(),
            settings.endpoint.base_path.clone(),
            Box::new(Accepting),
        );
        Coordinator::new(
            settings,
            dispatcher,
            Box::new(held.clone()),
            Box::new(Quiet),
            Box::new(StartAt(start)),
        )
    }

    /// Tick every `step` ms from `from` (inclusive) to `to` (exclusive),
    /// running `script` before each pass.
    fn simulate(
        coordinator: &mut Coordinator,
        from: u32,
        to: u32,
        step: u32,
        mut script: impl FnMut(u32),
    ) -> Vec<(u32, DispatchRecord)> {
        let mut log = Vec::new();
        let mut t = from;
        while t < to {
            script(t);
            let out = coordinator.tick(Timestamp::from_millis(t));
            log.extend(out.dispatches.into_iter().map(|d| (t, d)));
            t += step;
        }
        log
    }

    #[test]
    fn simulate_scenario_a_with_default_tick() {
        let settings = Settings::default();
        let held = Held::default();
        let mut coordinator = make_coordinator(&settings, &held, 0);

        let log = simulate(&mut coordinator, 0, 20_000, 50, |t| match t {
            0 => held.press(17),
            19_500 => held.release(17),
            _ => {}
        });

        let left: Vec<(u32, AlertKind)> = log
            .iter()
            .map(|(t, d)| (*t, d.request.kind()))
            .collect();
        assert_eq!(
            left,
            vec![
                (10_050, AlertKind::InitialAlert),
                (19_100, AlertKind::Retrigger),
                (19_500, AlertKind::Reset),
            ]
        );
        assert!(log.iter().all(|(_, d)| d.delivered));
    }

    #[test]
    fn simulate_both_triggers_in_stable_order() {
        let settings = Settings::default();
        let held = Held::default();
        let mut coordinator = make_coordinator(&settings, &held, 0);

        held.press(17);
        held.press(27);
        let log = simulate(&mut coordinator, 0, 10_100, 50, |_| {});

        let ids: Vec<&str> = log
            .iter()
            .filter_map(|(_, d)| d.request.trigger_id().map(|id| id.as_str()))
            .collect();
        assert_eq!(ids, vec!["left", "right"]);
        assert_eq!(log[0].0, log[1].0, "Both cross in the same pass");
    }

    #[test]
    fn simulate_health_schedule_with_short_presses() {
        let mut settings = Settings::default();
        settings.health_interval_ms = 10_000;
        let held = Held::default();
        let mut coordinator = make_coordinator(&settings, &held, 0);

        // Two short presses (200 ms) and one long press that opens the window.
        let log = simulate(&mut coordinator, 0, 35_000, 50, |t| match t {
            4_000 | 12_000 | 20_000 => held.press(22),
            4_200 | 12_200 | 24_000 => held.release(22),
            _ => {}
        });

        let health_times: Vec<u32> = log
            .iter()
            .filter(|(_, d)| d.request.is_health())
            .map(|(t, _)| *t)
            .collect();
        // Forced at 4_200 and 12_200; each later send comes one interval
        // after the previous one, forced or not.
        assert_eq!(health_times, vec![4_200, 12_200, 22_250, 32_300]);
        assert!(coordinator.is_override_active());
    }

    #[test]
    fn simulate_press_across_clock_wrap() {
        let settings = Settings::default();
        let held = Held::default();
        let start = u32::MAX - 5_000;
        let mut coordinator = make_coordinator(&settings, &held, start);

        held.press(17);
        let mut alerts = Vec::new();
        let mut now = Timestamp::from_millis(start);
        for _ in 0..400 {
            let out = coordinator.tick(now);
            alerts.extend(out.dispatches.into_iter().map(|d| (now, d.request.kind())));
            now = now.wrapping_add_millis(50);
        }

        let origin = Timestamp::from_millis(start);
        let offsets: Vec<(u128, AlertKind)> = alerts
            .iter()
            .map(|(at, kind)| (at.since(origin).as_millis(), *kind))
            .collect();
        assert_eq!(
            offsets,
            vec![(10_050, AlertKind::InitialAlert), (19_100, AlertKind::Retrigger)]
        );
    }
}
