//! Application entry point — Voice Stopwatch.
//!
//! # Startup sequence
//!
//! 1. Initialise logging.
//! 2. Load [`AppConfig`] from disk (returns default on first run).
//! 3. Create [`tokio`] runtime (multi-thread, 2 workers).
//! 4. Build the microphone sampler and the rodio alarm sink.
//! 5. Create the core command channel and shared snapshot.
//! 6. Spawn the core runner on the tokio runtime.
//! 7. Run [`eframe::run_native`] — blocks the main thread until the window
//!    is closed; closing it drops the command sender, which shuts the
//!    runner down and releases the microphone.

use std::sync::Arc;

use tokio::sync::mpsc;
use voice_stopwatch::{
    app::StopwatchApp,
    audio::{AlarmSink, MicSampler, RodioAlarm},
    config::AppConfig,
    timer::{new_shared_snapshot, CoreCommand, CoreRunner},
};

use eframe::egui;

// ---------------------------------------------------------------------------
// Native options builder
// ---------------------------------------------------------------------------

fn native_options(config: &AppConfig) -> eframe::NativeOptions {
    let mut vp = egui::ViewportBuilder::default()
        .with_inner_size([420.0, 560.0])
        .with_min_inner_size([360.0, 420.0]);

    if config.ui.always_on_top {
        vp = vp.with_always_on_top();
    }

    if let Some((x, y)) = config.ui.window_position {
        vp = vp.with_position(egui::pos2(x, y));
    }

    eframe::NativeOptions {
        viewport: vp,
        ..Default::default()
    }
}

// ---------------------------------------------------------------------------
// main
// ---------------------------------------------------------------------------

fn main() -> eframe::Result<()> {
    // 1. Logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    log::info!("Voice Stopwatch starting up");

    // 2. Configuration
    let config = AppConfig::load().unwrap_or_else(|e| {
        log::warn!("Failed to load config ({e}); using defaults");
        AppConfig::default()
    });

    // 3. Tokio runtime (core runner + scheduled alarms)
    let rt = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()
        .expect("failed to create tokio runtime");

    // 4. Audio endpoints.  The sampler spawns its `audio-input` worker here
    //    but does not touch the device until the first start request.
    let sampler = MicSampler::new(config.audio.frame_size);
    let alarm: Arc<dyn AlarmSink> = Arc::new(RodioAlarm::new(config.alarm.clone()));

    // 5. Channel + snapshot shared between runner and UI
    let (command_tx, command_rx) = mpsc::channel::<CoreCommand>(16);
    let snapshot = new_shared_snapshot();

    // 6. Spawn the core runner onto the tokio runtime
    {
        let runner = CoreRunner::new(
            config.clone(),
            Arc::clone(&snapshot),
            Box::new(sampler),
            alarm,
        );
        rt.spawn(runner.run(command_rx));
    }

    // 7. Build the egui app and run it (blocks until the window is closed)
    let app = StopwatchApp::new(command_tx, snapshot, config.clone());
    let options = native_options(&config);

    eframe::run_native(
        "Voice Stopwatch",
        options,
        Box::new(move |_cc| Ok(Box::new(app))),
    )
}
