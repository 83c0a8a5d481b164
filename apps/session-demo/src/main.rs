//! localmedia demo
//!
//! Runs a media session against the in-memory platform: switches devices,
//! shares the screen, plugs in a camera, and prints the final session state
//! as JSON.
//!
//! Usage: `localmedia-demo [config.json]`

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use localmedia_core::{DeviceDescriptor, DeviceKind};
use localmedia_session::{
    CaptureStream, LoggingEventHandler, MediaSessionController, SessionConfig,
};
use localmedia_virtual::VirtualPlatform;

/// Time allowed for a device-change notification to reach the session
const DEVICE_CHANGE_GRACE: Duration = Duration::from_millis(100);

fn init_logging() {
    #[cfg(debug_assertions)]
    {
        tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_file(true)
            .with_line_number(true)
            .with_thread_ids(true)
            .init();
        tracing::info!("Debug mode logging enabled");
    }

    #[cfg(not(debug_assertions))]
    {
        tracing_subscriber::fmt()
            .with_max_level(tracing::Level::INFO)
            .compact()
            .init();
    }
}

fn load_config() -> anyhow::Result<SessionConfig> {
    match std::env::args().nth(1) {
        Some(path) => SessionConfig::load(&path)
            .with_context(|| format!("Failed to load session config from {}", path)),
        None => Ok(SessionConfig::default()),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging();
    let config = load_config()?;

    let platform = Arc::new(VirtualPlatform::new());

    let session = MediaSessionController::builder(Arc::clone(&platform))
        .config(config)
        .event_handler(Arc::new(LoggingEventHandler))
        .start();
    session.settle().await;

    if let Some(mic) = session.audio_devices().last() {
        session.set_audio_source(mic.device_id.clone());
    }
    if let Some(camera) = session.video_devices().last() {
        session.set_video_source(camera.device_id.clone());
    }
    session.settle().await;

    session.share_screen();
    session.settle().await;

    platform.plug(DeviceDescriptor::new(
        "cam-3",
        DeviceKind::VideoInput,
        "Document Camera",
    ));
    // Give the device watcher time to pick up the change
    tokio::time::sleep(DEVICE_CHANGE_GRACE).await;
    session.settle().await;

    if let Some(stream) = session
        .current_stream()
        .and_then(|current| platform.stream(current.id()))
    {
        tracing::info!(
            stream_id = %stream.id(),
            started_at = %stream.started_at().to_rfc3339(),
            "Capturing"
        );
    }

    let snapshot = serde_json::to_string_pretty(&session.snapshot())?;
    println!("{}", snapshot);

    session.close().await;
    tracing::info!(captures = platform.requests().len(), "Demo finished");
    Ok(())
}
