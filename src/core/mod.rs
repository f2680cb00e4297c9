pub mod alerts;
pub mod clock;
pub mod config;
pub mod coordinator;
pub mod dispatch;
pub mod error;
pub mod hardware;
pub mod model;

#[cfg(test)]
mod sim_test;
