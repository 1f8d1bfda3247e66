//! Desktop lifecycle observer
//!
//! Desktop windows have no OS-driven background state, so the host pushes
//! minimize/restore transitions in through [`DesktopLifecycleObserver::set_state`].

use async_trait::async_trait;
use bridge_traits::{
    background::{LifecycleChangeStream, LifecycleObserver, LifecycleState},
    error::Result,
};
use tokio::sync::{broadcast, RwLock};
use tracing::debug;

const CHANGE_BUFFER: usize = 16;

/// Lifecycle observer whose state is driven by the desktop host.
pub struct DesktopLifecycleObserver {
    state: RwLock<LifecycleState>,
    changes: broadcast::Sender<LifecycleState>,
}

impl DesktopLifecycleObserver {
    /// Create an observer that starts in the foreground.
    pub fn new() -> Self {
        let (changes, _) = broadcast::channel(CHANGE_BUFFER);
        Self {
            state: RwLock::new(LifecycleState::Foreground),
            changes,
        }
    }

    /// Record a transition and notify subscribers. Repeating the current
    /// state is ignored.
    pub async fn set_state(&self, next: LifecycleState) {
        let mut state = self.state.write().await;
        if *state == next {
            return;
        }
        *state = next;
        debug!(state = ?next, "Lifecycle transition");
        let _ = self.changes.send(next);
    }
}

impl Default for DesktopLifecycleObserver {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LifecycleObserver for DesktopLifecycleObserver {
    async fn get_state(&self) -> Result<LifecycleState> {
        Ok(*self.state.read().await)
    }

    async fn subscribe_changes(&self) -> Result<Box<dyn LifecycleChangeStream>> {
        Ok(Box::new(DesktopLifecycleChangeStream {
            receiver: self.changes.subscribe(),
        }))
    }
}

struct DesktopLifecycleChangeStream {
    receiver: broadcast::Receiver<LifecycleState>,
}

#[async_trait]
impl LifecycleChangeStream for DesktopLifecycleChangeStream {
    async fn next(&mut self) -> Option<LifecycleState> {
        loop {
            match self.receiver.recv().await {
                Ok(state) => return Some(state),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    debug!(skipped = skipped, "Lifecycle subscriber lagged");
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }
}
