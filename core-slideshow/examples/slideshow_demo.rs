//! Slideshow demonstration
//!
//! Parks a photo list in the handoff cache, resolves it on the "screen" side
//! and runs a short looping slideshow while printing every event.
//!
//! Run with:
//! ```bash
//! cargo run -p core-slideshow --example slideshow_demo
//!
//! # JSON logs
//! cargo run -p core-slideshow --example slideshow_demo -- json
//! ```

use anyhow::Context;
use bridge_traits::log::LogLevel;
use core_runtime::config::{EndOfList, SlideshowConfig};
use core_runtime::events::EventBus;
use core_runtime::logging::{init_logging, LogFormat, LoggingConfig};
use core_slideshow::{
    HandoffCache, SessionDeps, SlideDuration, SlideshowEngine, SlideshowLaunch, SlideshowSession,
};
use std::env;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let format = match env::args().nth(1).as_deref() {
        Some("json") => LogFormat::Json,
        Some("compact") => LogFormat::Compact,
        _ => LogFormat::Pretty,
    };

    init_logging(
        LoggingConfig::default()
            .with_format(format)
            .with_level(LogLevel::Debug)
            .with_uri_redaction(true),
    )
    .context("initializing logging")?;

    let photos: Vec<String> = (1..=4)
        .map(|i| format!("file:///home/demo/Pictures/IMG_{:04}.jpg", i))
        .collect();

    let cache = Arc::new(HandoffCache::new());
    let launch = SlideshowLaunch::via_cache(&cache, photos);
    let token = launch.token.clone().context("launch without token")?;

    let config = SlideshowConfig {
        slide_duration: Duration::from_secs(1),
        end_of_list: EndOfList::Loop,
        ..SlideshowConfig::default()
    };
    let engine = SlideshowEngine::new(launch.resolve(&cache)?, &config)?;

    let bus = EventBus::default();
    let mut events = bus.subscribe();
    tokio::spawn(async move {
        while let Ok(event) = events.recv().await {
            info!(event = event.description(), "Core event");
        }
    });

    let deps = SessionDeps::new(bus).with_handoff(cache.clone(), token);
    let session = SlideshowSession::start(engine, deps).await?;
    let mut snapshots = session.subscribe();

    let watcher = tokio::spawn(async move {
        while snapshots.changed().await.is_ok() {
            let snapshot = snapshots.borrow_and_update().clone();
            println!("[{}] {}", snapshot.counter_label, snapshot.uri);
            if snapshot.closed {
                break;
            }
        }
    });

    tokio::time::sleep(Duration::from_millis(4500)).await;
    session.pause().await?;
    session.previous().await?;
    session
        .set_slide_duration(SlideDuration::from_slider(1)?)
        .await?;
    session.play().await?;
    tokio::time::sleep(Duration::from_secs(3)).await;

    session.close(false).await?;
    watcher.await?;

    info!(parked_lists = cache.len(), "Demo complete");
    Ok(())
}
