use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use super::alerts::health::HealthScheduler;
use super::alerts::model::AlertRequest;
use super::alerts::override_window::{OverrideController, OverrideEvent};
use super::alerts::triggers::TriggerMonitor;
use super::clock::{Clock, Timestamp};
use super::config::Settings;
use super::dispatch::response::Delivery;
use super::dispatch::Dispatcher;
use super::error::{DispatchError, ProtocolError};
use super::hardware::{FeedbackSink, PinIo};
use super::model::{FeedbackEvent, PinId};

/// A trigger monitor together with its input and indicator lines.
struct TriggerChannel {
    monitor: TriggerMonitor,
    input_pin: PinId,
    success_pin: PinId,
    error_pin: PinId,
}

/// Outcome of one dispatch, as seen by the driver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchRecord {
    pub request: AlertRequest,
    pub delivered: bool,
    pub error: Option<String>,
}

/// Everything that happened during one pass.
#[derive(Debug, Default)]
pub struct TickOutput {
    pub override_event: Option<OverrideEvent>,
    pub override_expired: bool,
    pub dispatches: Vec<DispatchRecord>,
}

/// The poll loop driver. Owns all mutable device state.
pub struct Coordinator {
    triggers: Vec<TriggerChannel>,
    override_ctl: OverrideController,
    button_pin: PinId,
    indicator_pin: PinId,
    indicator_lit: bool,
    health: HealthScheduler,
    dispatcher: Dispatcher,
    pins: Box<dyn PinIo + Send>,
    feedback: Box<dyn FeedbackSink + Send>,
    clock: Box<dyn Clock + Send>,
    tick_interval: Duration,
}

impl Coordinator {
    pub fn new(
        settings: &Settings,
        dispatcher: Dispatcher,
        mut pins: Box<dyn PinIo + Send>,
        feedback: Box<dyn FeedbackSink + Send>,
        clock: Box<dyn Clock + Send>,
    ) -> Self {
        let triggers: Vec<TriggerChannel> = settings
            .triggers
            .iter()
            .map(|t| TriggerChannel {
                monitor: TriggerMonitor::new(t.id.clone(), t.timing()),
                input_pin: t.input_pin,
                success_pin: t.success_pin,
                error_pin: t.error_pin,
            })
            .collect();

        for channel in &triggers {
            pins.write_digital(channel.success_pin, false);
            pins.write_digital(channel.error_pin, false);
        }
        pins.write_digital(settings.override_button.indicator_pin, false);

        let started = clock.now();
        Self {
            triggers,
            override_ctl: OverrideController::new(settings.override_button.timing()),
            button_pin: settings.override_button.button_pin,
            indicator_pin: settings.override_button.indicator_pin,
            indicator_lit: false,
            health: HealthScheduler::new(settings.health_interval(), started),
            dispatcher,
            pins,
            feedback,
            clock,
            tick_interval: settings.tick(),
        }
    }

    pub fn is_override_active(&self) -> bool {
        self.override_ctl.is_active()
    }

    /// Run passes until `stop` is raised. Each pass is followed by a fixed sleep.
    pub fn run(&mut self, stop: &AtomicBool) {
        log::info!(
            "Poll loop started: {} triggers, tick {:?}",
            self.triggers.len(),
            self.tick_interval
        );
        while !stop.load(Ordering::Relaxed) {
            let now = self.clock.now();
            self.tick(now);
            std::thread::sleep(self.tick_interval);
        }
        log::info!("Poll loop stopped");
    }

    /// One evaluation pass: override button, each trigger in order, health
    /// schedule, then override window expiry.
    pub fn tick(&mut self, now: Timestamp) -> TickOutput {
        let mut output = TickOutput::default();

        // 1. Override button
        let pressed = self.pins.read_digital(self.button_pin);
        output.override_event = self.override_ctl.sample(pressed, now);
        let force_health = match output.override_event {
            Some(OverrideEvent::Activated) => {
                log::info!("Override window opened");
                self.feedback.emit(FeedbackEvent::ButtonPushed);
                false
            }
            Some(OverrideEvent::Deactivated) => {
                log::info!("Override window closed by button");
                self.feedback.emit(FeedbackEvent::ButtonPushed);
                false
            }
            Some(OverrideEvent::ShortPress) => {
                log::info!("Short press, forcing health check");
                self.feedback.emit(FeedbackEvent::ButtonPushed);
                true
            }
            None => false,
        };

        // 2. Triggers, in configured order. Each dispatch blocks the pass.
        for idx in 0..self.triggers.len() {
            let request = {
                let channel = &mut self.triggers[idx];
                let pressed = self.pins.read_digital(channel.input_pin);
                channel.monitor.sample(pressed, now)
            };
            if let Some(request) = request {
                let result = self.dispatch(&request);
                self.show_trigger_result(idx, &request, &result);
                output.dispatches.push(DispatchRecord::new(request, &result));
            }
        }

        // 3. Health
        if let Some(request) = self.health.poll(now, force_health) {
            let result = self.dispatch(&request);
            self.feedback.emit(health_feedback(&result));
            output.dispatches.push(DispatchRecord::new(request, &result));
        }

        // 4. Override window expiry and blink
        output.override_expired = self.override_ctl.expire(now);
        if output.override_expired {
            log::info!("Override window expired");
        }
        if self.override_ctl.is_active() {
            self.indicator_lit = !self.indicator_lit;
            self.pins.write_digital(self.indicator_pin, self.indicator_lit);
        } else if self.indicator_lit {
            self.indicator_lit = false;
            self.pins.write_digital(self.indicator_pin, false);
        }

        output
    }

    fn dispatch(&mut self, request: &AlertRequest) -> Result<Delivery, DispatchError> {
        let kind = request.kind().display_name();
        let label = request
            .trigger_id()
            .map(|id| format!("{kind} for {id}"))
            .unwrap_or_else(|| kind.to_string());

        let result = self.dispatcher.dispatch(request);
        match &result {
            Ok(delivery) => log::info!("Sent {label}: status {}", delivery.status),
            Err(e) if e.is_delivered() => log::warn!("Sent {label}, but {e}"),
            Err(e) => log::error!("Failed to send {label}: {e}"),
        }
        result
    }

    fn show_trigger_result(
        &mut self,
        idx: usize,
        request: &AlertRequest,
        result: &Result<Delivery, DispatchError>,
    ) {
        let (success_pin, error_pin) = {
            let channel = &self.triggers[idx];
            (channel.success_pin, channel.error_pin)
        };
        let (success, error, event) = match result {
            Ok(_) if request.is_resetting() => (false, false, FeedbackEvent::GenericSuccess),
            Ok(_) => (true, false, FeedbackEvent::GenericSuccess),
            Err(DispatchError::Transport(_)) => (false, true, FeedbackEvent::Disconnected),
            Err(DispatchError::Protocol(_)) => (false, true, FeedbackEvent::Confused),
        };
        self.pins.write_digital(success_pin, success);
        self.pins.write_digital(error_pin, error);
        self.feedback.emit(event);
    }
}

impl DispatchRecord {
    fn new(request: AlertRequest, result: &Result<Delivery, DispatchError>) -> Self {
        match result {
            Ok(_) => Self {
                request,
                delivered: true,
                error: None,
            },
            Err(e) => Self {
                request,
                delivered: e.is_delivered(),
                error: Some(e.to_string()),
            },
        }
    }
}

fn health_feedback(result: &Result<Delivery, DispatchError>) -> FeedbackEvent {
    match result {
        Ok(_) => FeedbackEvent::Connected,
        Err(DispatchError::Protocol(ProtocolError::BadBody { .. })) => FeedbackEvent::Disgruntled,
        Err(DispatchError::Protocol(_)) => FeedbackEvent::Confused,
        Err(DispatchError::Transport(_)) => FeedbackEvent::Disconnected,
    }
}
