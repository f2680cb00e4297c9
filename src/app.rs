use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::core::{
    clock::MonotonicClock,
    config::{ConfigManager, Settings},
    coordinator::Coordinator,
    dispatch::{transport::TcpTransport, Dispatcher},
    error::Result,
    hardware::{LogFeedback, SysfsGpio},
};

const CONFIG_DIR_ENV: &str = "PIN_SENTINEL_CONFIG_DIR";

/// First CLI argument, else `PIN_SENTINEL_CONFIG_DIR`, else the working directory.
fn config_dir() -> PathBuf {
    std::env::args()
        .nth(1)
        .or_else(|| std::env::var(CONFIG_DIR_ENV).ok())
        .map_or_else(|| PathBuf::from("."), PathBuf::from)
}

/// Wire the production collaborators into a coordinator.
///
/// Fails with a module failure when the network endpoint cannot be resolved
/// or a GPIO line is missing.
pub fn build_coordinator(settings: &Settings) -> Result<Coordinator> {
    let endpoint = &settings.endpoint;
    let transport = TcpTransport::new(
        &endpoint.host,
        endpoint.port,
        endpoint.tls,
        settings.io_timeout(),
    )?;
    let dispatcher = Dispatcher::new(
        endpoint.host.clone(),
        endpoint.base_path.clone(),
        Box::new(transport),
    );
    let pins = SysfsGpio::open(
        settings.gpio.root.clone(),
        settings.gpio.active_low,
        &settings.all_pins(),
    )?;

    Ok(Coordinator::new(
        settings,
        dispatcher,
        Box::new(pins),
        Box::new(LogFeedback),
        Box::new(MonotonicClock::new()),
    ))
}

fn halt(message: impl std::fmt::Display) -> ! {
    log::error!("{message}");
    std::process::exit(1);
}

pub fn run() {
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or("pin_sentinel=info"),
    )
    .init();

    let manager = ConfigManager::new(config_dir());
    let settings = manager.load().unwrap_or_else(|e| halt(e));
    log::info!(
        "Loaded {} ({} triggers, endpoint {}:{})",
        manager.path().display(),
        settings.triggers.len(),
        settings.endpoint.host,
        settings.endpoint.port
    );

    let mut coordinator = build_coordinator(&settings).unwrap_or_else(|e| {
        if e.is_fatal() {
            halt(format!("Device halted, no recovery: {e}"))
        } else {
            halt(e)
        }
    });

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap_or_else(|e| halt(format!("Failed to start runtime: {e}")));

    let stop = Arc::new(AtomicBool::new(false));
    runtime.block_on(async move {
        let signal_stop = stop.clone();
        tokio::spawn(async move {
            match tokio::signal::ctrl_c().await {
                Ok(()) => {
                    log::info!("Shutdown requested");
                    signal_stop.store(true, Ordering::Relaxed);
                }
                Err(e) => log::warn!("Cannot listen for Ctrl-C: {e}"),
            }
        });

        // The poll loop blocks on every dispatch, so it gets its own thread.
        let poll = tokio::task::spawn_blocking(move || coordinator.run(&stop));
        if let Err(e) = poll.await {
            log::error!("Poll loop panicked: {e}");
        }
    });
}
