//! # Slideshow Session
//!
//! Runs a [`SlideshowEngine`] on its own task. The task owns the engine, the
//! auto-advance deadline and the optional background music, and reacts to:
//!
//! - user commands sent through [`SlideshowSession`]
//! - the slide deadline firing
//! - app lifecycle changes (hiding the app pauses the slides and the music)
//! - cancellation
//!
//! Every state change is published as a [`SlideshowSnapshot`] on a watch
//! channel and as a [`SlideshowEvent`] on the core event bus.

use crate::engine::{AdvanceOutcome, SlideDuration, SlideshowEngine, SlideshowState, Transition};
use crate::error::{Result, SlideshowError};
use crate::handoff::{HandoffCache, HandoffToken};
use bridge_traits::{
    AudioOptions, AudioPlayer, AudioSessionId, AudioSource, LifecycleChangeStream,
    LifecycleObserver, LifecycleState,
};
use core_runtime::events::{CoreEvent, EventBus, Notice, SlideshowEvent};
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{sleep_until, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

const COMMAND_BUFFER: usize = 32;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SlideshowCommand {
    Play,
    Pause,
    TogglePlayPause,
    Next,
    Previous,
    SetSlideDuration(SlideDuration),
    /// End the session. `config_change` keeps the handoff entry so a
    /// recreated screen can resolve the same token.
    Close { config_change: bool },
}

/// What the host renders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlideshowSnapshot {
    pub index: usize,
    pub total: usize,
    pub uri: String,
    pub state: SlideshowState,
    pub counter_label: String,
    pub slide_duration: SlideDuration,
    pub transition: Transition,
    /// Set once the show stopped on the last slide
    pub finished: bool,
    /// Set once the session task has shut down
    pub closed: bool,
}

impl SlideshowSnapshot {
    fn from_engine(engine: &SlideshowEngine, finished: bool) -> Self {
        Self {
            index: engine.index(),
            total: engine.len(),
            uri: engine.current_uri().to_string(),
            state: engine.state(),
            counter_label: engine.counter_label(),
            slide_duration: engine.slide_duration(),
            transition: engine.transition(),
            finished,
            closed: false,
        }
    }
}

/// Optional collaborators of a session.
#[derive(Clone, Default)]
pub struct SessionDeps {
    pub events: EventBus,
    pub audio: Option<(Arc<dyn AudioPlayer>, AudioSource)>,
    pub lifecycle: Option<Arc<dyn LifecycleObserver>>,
    /// Entry to release when the session closes for good
    pub handoff: Option<(Arc<HandoffCache>, HandoffToken)>,
}

impl SessionDeps {
    pub fn new(events: EventBus) -> Self {
        Self {
            events,
            ..Self::default()
        }
    }

    pub fn with_audio(mut self, player: Arc<dyn AudioPlayer>, source: AudioSource) -> Self {
        self.audio = Some((player, source));
        self
    }

    pub fn with_lifecycle(mut self, observer: Arc<dyn LifecycleObserver>) -> Self {
        self.lifecycle = Some(observer);
        self
    }

    pub fn with_handoff(mut self, cache: Arc<HandoffCache>, token: HandoffToken) -> Self {
        self.handoff = Some((cache, token));
        self
    }
}

/// Handle to a running slideshow.
///
/// Dropping the handle cancels the task, which releases audio but keeps the
/// handoff entry.
pub struct SlideshowSession {
    commands: mpsc::Sender<SlideshowCommand>,
    snapshot: watch::Receiver<SlideshowSnapshot>,
    cancel: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl SlideshowSession {
    /// Start playing `engine` from its current slide.
    ///
    /// Must be called from within a tokio runtime. Audio and lifecycle
    /// failures are logged and degrade the session instead of failing it.
    pub async fn start(mut engine: SlideshowEngine, deps: SessionDeps) -> Result<Self> {
        let lifecycle = match &deps.lifecycle {
            Some(observer) => match observer.subscribe_changes().await {
                Ok(stream) => Some(stream),
                Err(e) => {
                    warn!(error = %e, "Lifecycle updates unavailable for slideshow");
                    None
                }
            },
            None => None,
        };

        engine.start();
        let (snapshot_tx, snapshot_rx) =
            watch::channel(SlideshowSnapshot::from_engine(&engine, false));
        let (command_tx, command_rx) = mpsc::channel(COMMAND_BUFFER);
        let cancel = CancellationToken::new();

        let mut runner = SessionRunner {
            engine,
            finished: false,
            events: deps.events,
            audio: deps
                .audio
                .map(|(player, source)| SessionAudio::new(player, source)),
            handoff: deps.handoff,
            snapshot: snapshot_tx,
        };

        info!(photos = runner.engine.len(), "Slideshow started");
        runner.emit(SlideshowEvent::Started {
            total: runner.engine.len(),
        });
        runner.emit_slide();
        if let Some(audio) = runner.audio.as_mut() {
            audio.start(&runner.events).await;
        }

        let task = tokio::spawn(runner.run(command_rx, lifecycle, cancel.clone()));

        Ok(Self {
            commands: command_tx,
            snapshot: snapshot_rx,
            cancel,
            task: Some(task),
        })
    }

    pub fn snapshot(&self) -> SlideshowSnapshot {
        self.snapshot.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<SlideshowSnapshot> {
        self.snapshot.clone()
    }

    pub async fn send(&self, command: SlideshowCommand) -> Result<()> {
        self.commands
            .send(command)
            .await
            .map_err(|_| SlideshowError::SessionClosed)
    }

    pub async fn play(&self) -> Result<()> {
        self.send(SlideshowCommand::Play).await
    }

    pub async fn pause(&self) -> Result<()> {
        self.send(SlideshowCommand::Pause).await
    }

    pub async fn toggle(&self) -> Result<()> {
        self.send(SlideshowCommand::TogglePlayPause).await
    }

    pub async fn next(&self) -> Result<()> {
        self.send(SlideshowCommand::Next).await
    }

    pub async fn previous(&self) -> Result<()> {
        self.send(SlideshowCommand::Previous).await
    }

    pub async fn set_slide_duration(&self, duration: SlideDuration) -> Result<()> {
        self.send(SlideshowCommand::SetSlideDuration(duration)).await
    }

    /// Close the session and wait for its task to finish teardown.
    pub async fn close(mut self, config_change: bool) -> Result<()> {
        self.send(SlideshowCommand::Close { config_change }).await?;
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                warn!(error = %e, "Slideshow task ended abnormally");
            }
        }
        Ok(())
    }
}

impl Drop for SlideshowSession {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

// ============================================================================
// Task
// ============================================================================

struct SessionRunner {
    engine: SlideshowEngine,
    finished: bool,
    events: EventBus,
    audio: Option<SessionAudio>,
    handoff: Option<(Arc<HandoffCache>, HandoffToken)>,
    snapshot: watch::Sender<SlideshowSnapshot>,
}

/// Resolves at `deadline`, or never when there is none.
async fn wait_for(deadline: Option<Instant>) {
    match deadline {
        Some(at) => sleep_until(at).await,
        None => std::future::pending().await,
    }
}

/// Next lifecycle change, or never when there is no stream.
async fn next_lifecycle(
    stream: &mut Option<Box<dyn LifecycleChangeStream>>,
) -> Option<LifecycleState> {
    match stream {
        Some(stream) => stream.next().await,
        None => std::future::pending().await,
    }
}

impl SessionRunner {
    async fn run(
        mut self,
        mut commands: mpsc::Receiver<SlideshowCommand>,
        mut lifecycle: Option<Box<dyn LifecycleChangeStream>>,
        cancel: CancellationToken,
    ) {
        let mut deadline = self.arm();

        loop {
            let mut lifecycle_closed = false;

            tokio::select! {
                _ = cancel.cancelled() => {
                    debug!("Slideshow cancelled");
                    self.teardown(true).await;
                    break;
                }
                command = commands.recv() => match command {
                    Some(SlideshowCommand::Close { config_change }) => {
                        self.teardown(config_change).await;
                        break;
                    }
                    Some(command) => {
                        if self.handle(command).await {
                            deadline = self.arm();
                        }
                    }
                    None => {
                        self.teardown(true).await;
                        break;
                    }
                },
                _ = wait_for(deadline) => {
                    deadline = self.tick().await;
                }
                change = next_lifecycle(&mut lifecycle) => match change {
                    Some(state) => {
                        if self.on_lifecycle(state).await {
                            deadline = self.arm();
                        }
                    }
                    None => lifecycle_closed = true,
                },
            }

            if lifecycle_closed {
                debug!("Lifecycle stream closed");
                lifecycle = None;
            }
        }
    }

    /// Deadline for the current slide, if the show is playing.
    fn arm(&self) -> Option<Instant> {
        self.engine
            .is_playing()
            .then(|| Instant::now() + self.engine.slide_duration().as_duration())
    }

    /// Apply a command. Returns whether the deadline must be restarted.
    async fn handle(&mut self, command: SlideshowCommand) -> bool {
        debug!(?command, "Slideshow command");
        match command {
            SlideshowCommand::Play => self.resume().await,
            SlideshowCommand::Pause => self.pause(),
            SlideshowCommand::TogglePlayPause => {
                if self.engine.is_playing() {
                    self.pause()
                } else {
                    self.resume().await
                }
            }
            SlideshowCommand::Next => {
                let moved = self.engine.next();
                if moved {
                    self.emit_slide();
                }
                moved
            }
            SlideshowCommand::Previous => {
                let moved = self.engine.previous();
                if moved {
                    self.emit_slide();
                }
                moved
            }
            SlideshowCommand::SetSlideDuration(duration) => {
                self.engine.set_slide_duration(duration);
                info!(duration = %duration, "Slide duration changed");
                self.publish();
                true
            }
            SlideshowCommand::Close { .. } => false,
        }
    }

    async fn resume(&mut self) -> bool {
        if !self.engine.start() {
            return false;
        }
        if self.finished {
            self.finished = false;
            if let Some(audio) = self.audio.as_mut() {
                audio.start(&self.events).await;
            }
        }
        self.emit(SlideshowEvent::Resumed {
            index: self.engine.index(),
        });
        self.publish();
        true
    }

    fn pause(&mut self) -> bool {
        if !self.engine.pause() {
            return false;
        }
        self.emit(SlideshowEvent::Paused {
            index: self.engine.index(),
        });
        self.publish();
        // Dropping the deadline is enough to stop the timer
        true
    }

    async fn tick(&mut self) -> Option<Instant> {
        match self.engine.advance() {
            AdvanceOutcome::Advanced { .. } | AdvanceOutcome::Wrapped => {
                self.emit_slide();
                self.arm()
            }
            AdvanceOutcome::Finished => {
                let total = self.engine.len();
                info!(total, "Slideshow finished");
                self.finished = true;
                if let Some(audio) = self.audio.as_mut() {
                    audio.release().await;
                }
                self.emit(SlideshowEvent::Finished { total });
                self.events.notify(Notice::info("Slideshow finished"));
                self.publish();
                None
            }
            AdvanceOutcome::Idle => None,
        }
    }

    /// Hiding the screen pauses the show; it stays paused when the screen
    /// comes back. Returns whether the deadline must be restarted.
    async fn on_lifecycle(&mut self, state: LifecycleState) -> bool {
        debug!(?state, "Slideshow lifecycle change");
        if let Some(audio) = self.audio.as_mut() {
            if state.is_visible() {
                audio.resume_visible().await;
            } else {
                audio.pause_hidden().await;
            }
        }
        !state.is_visible() && self.pause()
    }

    async fn teardown(&mut self, config_change: bool) {
        self.engine.stop();
        if let Some(audio) = self.audio.as_mut() {
            audio.release().await;
        }

        let released_handoff = match (&self.handoff, config_change) {
            (Some((cache, token)), false) => cache.remove(token),
            _ => false,
        };

        info!(config_change, released_handoff, "Slideshow closed");
        self.emit(SlideshowEvent::Closed { released_handoff });

        let mut snapshot = SlideshowSnapshot::from_engine(&self.engine, self.finished);
        snapshot.closed = true;
        self.snapshot.send_replace(snapshot);
    }

    fn emit_slide(&self) {
        self.emit(SlideshowEvent::SlideChanged {
            index: self.engine.index(),
            total: self.engine.len(),
            uri: self.engine.current_uri().to_string(),
        });
        self.publish();
    }

    fn emit(&self, event: SlideshowEvent) {
        // No subscribers is fine
        let _ = self.events.emit(CoreEvent::Slideshow(event));
    }

    fn publish(&self) {
        self.snapshot
            .send_replace(SlideshowSnapshot::from_engine(&self.engine, self.finished));
    }
}

// ============================================================================
// Audio
// ============================================================================

/// Background music for one session. Failures disable music, never the show.
struct SessionAudio {
    player: Arc<dyn AudioPlayer>,
    source: AudioSource,
    session: Option<AudioSessionId>,
    paused_while_hidden: bool,
}

impl SessionAudio {
    fn new(player: Arc<dyn AudioPlayer>, source: AudioSource) -> Self {
        Self {
            player,
            source,
            session: None,
            paused_while_hidden: false,
        }
    }

    async fn start(&mut self, events: &EventBus) {
        if self.session.is_some() {
            return;
        }
        let options = AudioOptions {
            looping: true,
            ..AudioOptions::default()
        };
        let session = match self.player.prepare(self.source.clone(), options).await {
            Ok(session) => session,
            Err(e) => {
                warn!(source = %self.source, error = %e, "Could not prepare slideshow music");
                events.notify(Notice::warning(SlideshowError::Audio(e).user_message()));
                return;
            }
        };
        if let Err(e) = self.player.play(session).await {
            warn!(error = %e, "Could not start slideshow music");
        }
        self.session = Some(session);
    }

    async fn pause_hidden(&mut self) {
        let Some(session) = self.session else { return };
        match self.player.pause(session).await {
            Ok(()) => self.paused_while_hidden = true,
            Err(e) => warn!(error = %e, "Could not pause slideshow music"),
        }
    }

    async fn resume_visible(&mut self) {
        let Some(session) = self.session else { return };
        if !self.paused_while_hidden {
            return;
        }
        self.paused_while_hidden = false;
        if let Err(e) = self.player.play(session).await {
            warn!(error = %e, "Could not resume slideshow music");
        }
    }

    async fn release(&mut self) {
        let Some(session) = self.session.take() else {
            return;
        };
        self.paused_while_hidden = false;
        if let Err(e) = self.player.stop(session).await {
            debug!(error = %e, "Stopping slideshow music failed");
        }
        if let Err(e) = self.player.unload(session).await {
            warn!(error = %e, "Could not release slideshow music");
        }
    }
}
