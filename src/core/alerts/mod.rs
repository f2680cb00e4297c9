// Alert timing logic.
//
// Architecture:
// - model.rs: Request and identifier types
// - triggers.rs: Per-trigger hold/alert/retrigger/reset state machine
// - override_window.rs: Override button long/short press handling
// - health.rs: Keepalive schedule

pub mod health;
pub mod model;
pub mod override_window;
pub mod triggers;
