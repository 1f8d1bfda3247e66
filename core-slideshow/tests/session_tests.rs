//! Timer, audio and lifecycle behaviour of a running slideshow session.
//!
//! All tests run on paused tokio time, so slide deadlines fire as soon as
//! the runtime is otherwise idle.

use async_trait::async_trait;
use bridge_traits::error::Result as BridgeResult;
use bridge_traits::{
    AudioOptions, AudioPlayer, AudioSessionId, AudioSource, AudioState, LifecycleChangeStream,
    LifecycleObserver, LifecycleState,
};
use core_runtime::config::{EndOfList, SlideshowConfig};
use core_runtime::events::{CoreEvent, EventBus, SlideshowEvent};
use core_slideshow::{
    HandoffCache, SessionDeps, SlideDuration, SlideshowEngine, SlideshowLaunch, SlideshowSession,
    SlideshowState,
};
use mockall::{mock, Sequence};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::sleep;

mock! {
    Player {}

    #[async_trait]
    impl AudioPlayer for Player {
        async fn prepare(&self, source: AudioSource, options: AudioOptions)
            -> BridgeResult<AudioSessionId>;
        async fn play(&self, session: AudioSessionId) -> BridgeResult<()>;
        async fn pause(&self, session: AudioSessionId) -> BridgeResult<()>;
        async fn stop(&self, session: AudioSessionId) -> BridgeResult<()>;
        async fn unload(&self, session: AudioSessionId) -> BridgeResult<()>;
        async fn state(&self, session: AudioSessionId) -> BridgeResult<AudioState>;
    }
}

/// Lifecycle observer fed from the test through a channel.
struct ChannelLifecycle {
    receiver: Mutex<Option<mpsc::UnboundedReceiver<LifecycleState>>>,
}

struct ChannelStream(mpsc::UnboundedReceiver<LifecycleState>);

#[async_trait]
impl LifecycleChangeStream for ChannelStream {
    async fn next(&mut self) -> Option<LifecycleState> {
        self.0.recv().await
    }
}

#[async_trait]
impl LifecycleObserver for ChannelLifecycle {
    async fn get_state(&self) -> BridgeResult<LifecycleState> {
        Ok(LifecycleState::Foreground)
    }

    async fn subscribe_changes(&self) -> BridgeResult<Box<dyn LifecycleChangeStream>> {
        let receiver = self
            .receiver
            .lock()
            .unwrap()
            .take()
            .expect("single subscriber");
        Ok(Box::new(ChannelStream(receiver)))
    }
}

fn uris(n: usize) -> Vec<String> {
    (1..=n).map(|i| format!("content://media/{}", i)).collect()
}

fn config(seconds: u64, end_of_list: EndOfList) -> SlideshowConfig {
    SlideshowConfig {
        slide_duration: Duration::from_secs(seconds),
        end_of_list,
        ..SlideshowConfig::default()
    }
}

fn engine(n: usize, seconds: u64, end_of_list: EndOfList) -> SlideshowEngine {
    SlideshowEngine::new(uris(n), &config(seconds, end_of_list)).unwrap()
}

fn music() -> AudioSource {
    AudioSource::Bundled {
        name: "background_music".to_string(),
    }
}

#[tokio::test(start_paused = true)]
async fn test_advances_on_timer_and_stops_at_end() {
    let bus = EventBus::new(64);
    let mut events = bus.subscribe();
    let session = SlideshowSession::start(engine(3, 1, EndOfList::StopAtEnd), SessionDeps::new(bus))
        .await
        .unwrap();

    assert_eq!(session.snapshot().index, 0);
    assert_eq!(session.snapshot().state, SlideshowState::Playing);

    sleep(Duration::from_millis(1500)).await;
    assert_eq!(session.snapshot().index, 1);
    assert_eq!(session.snapshot().counter_label, "2 / 3");

    sleep(Duration::from_secs(2)).await;
    let snapshot = session.snapshot();
    assert_eq!(snapshot.index, 2);
    assert!(snapshot.finished);
    assert_eq!(snapshot.state, SlideshowState::Stopped);

    let mut saw_finished = false;
    let mut saw_notice = false;
    while let Ok(event) = events.try_recv() {
        match event {
            CoreEvent::Slideshow(SlideshowEvent::Finished { total }) => {
                assert_eq!(total, 3);
                saw_finished = true;
            }
            CoreEvent::Notice(notice) if notice.message == "Slideshow finished" => {
                saw_notice = true;
            }
            _ => {}
        }
    }
    assert!(saw_finished);
    assert!(saw_notice);
}

#[tokio::test(start_paused = true)]
async fn test_loop_wraps_to_first() {
    let session = SlideshowSession::start(
        engine(2, 1, EndOfList::Loop),
        SessionDeps::new(EventBus::default()),
    )
    .await
    .unwrap();

    sleep(Duration::from_millis(2500)).await;
    let snapshot = session.snapshot();
    assert_eq!(snapshot.index, 0);
    assert!(!snapshot.finished);
    assert_eq!(snapshot.state, SlideshowState::Playing);
}

#[tokio::test(start_paused = true)]
async fn test_pause_stops_the_timer() {
    let session = SlideshowSession::start(
        engine(3, 1, EndOfList::StopAtEnd),
        SessionDeps::new(EventBus::default()),
    )
    .await
    .unwrap();

    session.pause().await.unwrap();
    sleep(Duration::from_secs(5)).await;
    assert_eq!(session.snapshot().index, 0);
    assert_eq!(session.snapshot().state, SlideshowState::Paused);

    session.toggle().await.unwrap();
    sleep(Duration::from_millis(1200)).await;
    assert_eq!(session.snapshot().index, 1);
}

#[tokio::test(start_paused = true)]
async fn test_background_pauses_slides_until_played() {
    let (lifecycle_tx, lifecycle_rx) = mpsc::unbounded_channel();
    let lifecycle = ChannelLifecycle {
        receiver: Mutex::new(Some(lifecycle_rx)),
    };
    let bus = EventBus::default();
    let mut events = bus.subscribe();
    let session = SlideshowSession::start(
        engine(5, 1, EndOfList::StopAtEnd),
        SessionDeps::new(bus).with_lifecycle(Arc::new(lifecycle)),
    )
    .await
    .unwrap();

    lifecycle_tx.send(LifecycleState::Background).unwrap();
    sleep(Duration::from_millis(3500)).await;
    let snapshot = session.snapshot();
    assert_eq!(snapshot.index, 0);
    assert_eq!(snapshot.state, SlideshowState::Paused);

    // Coming back does not resume on its own
    lifecycle_tx.send(LifecycleState::Foreground).unwrap();
    sleep(Duration::from_secs(3)).await;
    assert_eq!(session.snapshot().index, 0);
    assert_eq!(session.snapshot().state, SlideshowState::Paused);

    let mut paused = false;
    while let Ok(event) = events.try_recv() {
        if matches!(event, CoreEvent::Slideshow(SlideshowEvent::Paused { index: 0 })) {
            paused = true;
        }
    }
    assert!(paused);

    session.play().await.unwrap();
    sleep(Duration::from_millis(1200)).await;
    assert_eq!(session.snapshot().index, 1);
}

#[tokio::test(start_paused = true)]
async fn test_manual_navigation_restarts_the_deadline() {
    let session = SlideshowSession::start(
        engine(5, 2, EndOfList::StopAtEnd),
        SessionDeps::new(EventBus::default()),
    )
    .await
    .unwrap();

    sleep(Duration::from_millis(1500)).await;
    session.next().await.unwrap();
    // The old deadline at 2s must not fire
    sleep(Duration::from_millis(1000)).await;
    assert_eq!(session.snapshot().index, 1);

    sleep(Duration::from_millis(1200)).await;
    assert_eq!(session.snapshot().index, 2);
}

#[tokio::test(start_paused = true)]
async fn test_next_while_paused_stays_paused() {
    let session = SlideshowSession::start(
        engine(3, 1, EndOfList::StopAtEnd),
        SessionDeps::new(EventBus::default()),
    )
    .await
    .unwrap();

    session.pause().await.unwrap();
    session.next().await.unwrap();
    session.next().await.unwrap();
    session.next().await.unwrap();
    sleep(Duration::from_secs(3)).await;

    let snapshot = session.snapshot();
    assert_eq!(snapshot.index, 2);
    assert_eq!(snapshot.state, SlideshowState::Paused);

    session.previous().await.unwrap();
    sleep(Duration::from_millis(10)).await;
    assert_eq!(session.snapshot().index, 1);
}

#[tokio::test(start_paused = true)]
async fn test_duration_change_applies_to_next_slide() {
    let session = SlideshowSession::start(
        engine(4, 1, EndOfList::StopAtEnd),
        SessionDeps::new(EventBus::default()),
    )
    .await
    .unwrap();

    session
        .set_slide_duration(SlideDuration::from_slider(4).unwrap())
        .await
        .unwrap();
    sleep(Duration::from_secs(3)).await;
    assert_eq!(session.snapshot().index, 0);
    assert_eq!(
        session.snapshot().slide_duration.as_duration(),
        Duration::from_secs(5)
    );

    sleep(Duration::from_secs(3)).await;
    assert_eq!(session.snapshot().index, 1);
}

#[tokio::test(start_paused = true)]
async fn test_music_follows_lifecycle_and_is_released_on_close() {
    let id = AudioSessionId::new();
    let mut seq = Sequence::new();
    let mut player = MockPlayer::new();
    player
        .expect_prepare()
        .withf(|source, options| {
            *source == AudioSource::Bundled {
                name: "background_music".to_string(),
            } && options.looping
        })
        .times(1)
        .in_sequence(&mut seq)
        .returning(move |_, _| Ok(id));
    // Once on start, once when the app comes back
    player.expect_play().times(2).returning(|_| Ok(()));
    player
        .expect_pause()
        .times(1)
        .in_sequence(&mut seq)
        .returning(|_| Ok(()));
    player
        .expect_stop()
        .times(1)
        .in_sequence(&mut seq)
        .returning(|_| Ok(()));
    player
        .expect_unload()
        .withf(move |session| *session == id)
        .times(1)
        .in_sequence(&mut seq)
        .returning(|_| Ok(()));

    let (lifecycle_tx, lifecycle_rx) = mpsc::unbounded_channel();
    let lifecycle = ChannelLifecycle {
        receiver: Mutex::new(Some(lifecycle_rx)),
    };

    let deps = SessionDeps::new(EventBus::default())
        .with_audio(Arc::new(player), music())
        .with_lifecycle(Arc::new(lifecycle));
    let session = SlideshowSession::start(engine(3, 10, EndOfList::StopAtEnd), deps)
        .await
        .unwrap();

    lifecycle_tx.send(LifecycleState::Background).unwrap();
    sleep(Duration::from_millis(10)).await;
    lifecycle_tx.send(LifecycleState::Foreground).unwrap();
    sleep(Duration::from_millis(10)).await;

    session.close(false).await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_music_failure_does_not_stop_the_show() {
    let mut player = MockPlayer::new();
    player.expect_prepare().returning(|_, _| {
        Err(bridge_traits::BridgeError::NotAvailable(
            "no audio device".to_string(),
        ))
    });
    player.expect_unload().never();

    let deps = SessionDeps::new(EventBus::default()).with_audio(Arc::new(player), music());
    let session = SlideshowSession::start(engine(2, 1, EndOfList::StopAtEnd), deps)
        .await
        .unwrap();

    sleep(Duration::from_millis(1100)).await;
    assert_eq!(session.snapshot().index, 1);
}

#[tokio::test(start_paused = true)]
async fn test_close_releases_handoff_unless_config_change() {
    let cache = Arc::new(HandoffCache::new());

    let launch = SlideshowLaunch::via_cache(&cache, uris(3));
    let token = launch.token.clone().unwrap();
    let engine = SlideshowEngine::new(
        launch.resolve(&cache).unwrap(),
        &config(3, EndOfList::StopAtEnd),
    )
    .unwrap();
    let deps = SessionDeps::new(EventBus::default()).with_handoff(cache.clone(), token.clone());
    let session = SlideshowSession::start(engine, deps).await.unwrap();

    // Screen recreated: the token must still resolve
    session.close(true).await.unwrap();
    assert_eq!(launch.resolve(&cache).unwrap(), uris(3));

    let engine = SlideshowEngine::new(
        launch.resolve(&cache).unwrap(),
        &config(3, EndOfList::StopAtEnd),
    )
    .unwrap();
    let deps = SessionDeps::new(EventBus::default()).with_handoff(cache.clone(), token.clone());
    let session = SlideshowSession::start(engine, deps).await.unwrap();
    let mut snapshots = session.subscribe();

    session.close(false).await.unwrap();
    assert!(cache.get(&token).is_none());
    assert!(snapshots.borrow_and_update().closed);
}

#[tokio::test(start_paused = true)]
async fn test_close_publishes_final_snapshot() {
    let session = SlideshowSession::start(
        engine(2, 1, EndOfList::StopAtEnd),
        SessionDeps::new(EventBus::default()),
    )
    .await
    .unwrap();
    let mut snapshots = session.subscribe();

    session.close(false).await.unwrap();
    let last = snapshots.borrow().clone();
    assert!(last.closed);
    assert_eq!(last.state, SlideshowState::Stopped);
}
