//! # Event Bus System
//!
//! Decoupled notifications between the gallery components and the host UI,
//! built on `tokio::sync::broadcast`.
//!
//! ## Overview
//!
//! - **Event Types**: one enum per domain (albums, tags, collection view,
//!   slideshow) plus user-facing [`Notice`]s
//! - **EventBus**: central broadcast channel for publishing events
//! - **EventStream**: receiver wrapper with optional filtering
//!
//! ```text
//! ┌────────────────┐  emit   ┌───────────┐  subscribe  ┌──────────────┐
//! │ AlbumDirectory ├────────>│           ├────────────>│ Host: toasts │
//! └────────────────┘         │ EventBus  │             └──────────────┘
//! ┌────────────────┐  emit   │ (broadcast│  subscribe  ┌──────────────┐
//! │ Slideshow      ├────────>│  channel) ├────────────>│ Host: logs   │
//! └────────────────┘         └───────────┘             └──────────────┘
//! ```
//!
//! ## Notices
//!
//! Validation failures, denied permissions and storage errors never abort a
//! flow. They surface as `CoreEvent::Notice`, which hosts render as a
//! transient message (a toast on Android).
//!
//! ```rust
//! use core_runtime::events::{CoreEvent, EventBus, Notice};
//!
//! let bus = EventBus::new(16);
//! let mut rx = bus.subscribe();
//! bus.notify(Notice::info("Album created: Trip"));
//!
//! match rx.try_recv() {
//!     Ok(CoreEvent::Notice(notice)) => assert_eq!(notice.message, "Album created: Trip"),
//!     other => panic!("unexpected: {:?}", other),
//! }
//! ```
//!
//! ## Error Handling
//!
//! Subscribers that fall behind receive `RecvError::Lagged(n)` and can keep
//! reading. `RecvError::Closed` means every sender was dropped.

use serde::{Deserialize, Serialize};
use std::fmt;
use tokio::sync::broadcast;

// Re-export commonly used types
pub use tokio::sync::broadcast::error::{RecvError, SendError};
pub use tokio::sync::broadcast::Receiver;

/// Default buffer size for the event bus channel.
pub const DEFAULT_EVENT_BUFFER_SIZE: usize = 100;

// ============================================================================
// Core Event Types
// ============================================================================

/// Top-level event enum encompassing all event categories.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", content = "payload")]
pub enum CoreEvent {
    Album(AlbumEvent),
    Tag(TagEvent),
    Collection(CollectionEvent),
    Slideshow(SlideshowEvent),
    /// Transient user-facing message
    Notice(Notice),
}

impl CoreEvent {
    /// Short human-readable description, for logs.
    pub fn description(&self) -> &str {
        match self {
            CoreEvent::Album(e) => e.description(),
            CoreEvent::Tag(e) => e.description(),
            CoreEvent::Collection(e) => e.description(),
            CoreEvent::Slideshow(e) => e.description(),
            CoreEvent::Notice(n) => &n.message,
        }
    }

    pub fn severity(&self) -> EventSeverity {
        match self {
            CoreEvent::Notice(n) => n.severity,
            CoreEvent::Album(_) | CoreEvent::Tag(_) => EventSeverity::Info,
            CoreEvent::Slideshow(SlideshowEvent::Finished { .. }) => EventSeverity::Info,
            _ => EventSeverity::Debug,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EventSeverity {
    Debug,
    Info,
    Warning,
    Error,
}

// ============================================================================
// Notices
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Notice {
    pub message: String,
    pub severity: EventSeverity,
}

impl Notice {
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            severity: EventSeverity::Info,
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            severity: EventSeverity::Warning,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            severity: EventSeverity::Error,
        }
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

// ============================================================================
// Album Events
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event")]
pub enum AlbumEvent {
    Created { name: String },
    Renamed { from: String, to: String },
    PhotoAdded { album: String, uri: String },
}

impl AlbumEvent {
    fn description(&self) -> &str {
        match self {
            AlbumEvent::Created { .. } => "Album created",
            AlbumEvent::Renamed { .. } => "Album renamed",
            AlbumEvent::PhotoAdded { .. } => "Photo added to album",
        }
    }
}

// ============================================================================
// Tag Events
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event")]
pub enum TagEvent {
    /// A tag record was created lazily for a photo
    RecordCreated { uri: String, record_id: i64 },
    TagAdded { uri: String, tag: String },
    TagRemoved { uri: String, tag: String },
}

impl TagEvent {
    fn description(&self) -> &str {
        match self {
            TagEvent::RecordCreated { .. } => "Tag record created",
            TagEvent::TagAdded { .. } => "Tag added",
            TagEvent::TagRemoved { .. } => "Tag removed",
        }
    }
}

// ============================================================================
// Collection View Events
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event")]
pub enum CollectionEvent {
    /// The displayed list now comes from a different source
    SourceChanged { source: String, photo_count: usize },
    ViewModeChanged { mode: String },
    SearchCompleted { query: String, result_count: usize },
}

impl CollectionEvent {
    fn description(&self) -> &str {
        match self {
            CollectionEvent::SourceChanged { .. } => "Collection source changed",
            CollectionEvent::ViewModeChanged { .. } => "View mode changed",
            CollectionEvent::SearchCompleted { .. } => "Search completed",
        }
    }
}

// ============================================================================
// Slideshow Events
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event")]
pub enum SlideshowEvent {
    Started { total: usize },
    Paused { index: usize },
    Resumed { index: usize },
    SlideChanged { index: usize, total: usize, uri: String },
    /// Reached the last slide with the stop-at-end policy
    Finished { total: usize },
    Closed { released_handoff: bool },
}

impl SlideshowEvent {
    fn description(&self) -> &str {
        match self {
            SlideshowEvent::Started { .. } => "Slideshow started",
            SlideshowEvent::Paused { .. } => "Slideshow paused",
            SlideshowEvent::Resumed { .. } => "Slideshow resumed",
            SlideshowEvent::SlideChanged { .. } => "Slide changed",
            SlideshowEvent::Finished { .. } => "Slideshow finished",
            SlideshowEvent::Closed { .. } => "Slideshow closed",
        }
    }
}

// ============================================================================
// Event Bus
// ============================================================================

/// Central event broadcast channel.
///
/// Cloning the bus is cheap; all clones publish into the same channel.
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<CoreEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish an event.
    ///
    /// Fails only when nobody is subscribed, which callers normally ignore.
    pub fn emit(&self, event: CoreEvent) -> Result<usize, SendError<CoreEvent>> {
        self.sender.send(event)
    }

    /// Publish a notice, ignoring the no-subscriber case.
    pub fn notify(&self, notice: Notice) {
        let _ = self.sender.send(CoreEvent::Notice(notice));
    }

    pub fn subscribe(&self) -> Receiver<CoreEvent> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_BUFFER_SIZE)
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("subscriber_count", &self.subscriber_count())
            .finish()
    }
}

// ============================================================================
// Event Stream Wrapper
// ============================================================================

type EventFilter = Box<dyn Fn(&CoreEvent) -> bool + Send + Sync>;

/// Receiver wrapper that skips events rejected by a predicate.
pub struct EventStream {
    receiver: Receiver<CoreEvent>,
    filter: Option<EventFilter>,
}

impl EventStream {
    pub fn new(receiver: Receiver<CoreEvent>) -> Self {
        Self {
            receiver,
            filter: None,
        }
    }

    pub fn filter<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&CoreEvent) -> bool + Send + Sync + 'static,
    {
        self.filter = Some(Box::new(predicate));
        self
    }

    /// Only notices, e.g. for a toast presenter.
    pub fn notices(receiver: Receiver<CoreEvent>) -> Self {
        Self::new(receiver).filter(|event| matches!(event, CoreEvent::Notice(_)))
    }

    fn accepts(&self, event: &CoreEvent) -> bool {
        self.filter.as_ref().map_or(true, |f| f(event))
    }

    pub async fn recv(&mut self) -> Result<CoreEvent, RecvError> {
        loop {
            let event = self.receiver.recv().await?;
            if self.accepts(&event) {
                return Ok(event);
            }
        }
    }

    pub fn try_recv(&mut self) -> Option<Result<CoreEvent, RecvError>> {
        loop {
            match self.receiver.try_recv() {
                Ok(event) if self.accepts(&event) => return Some(Ok(event)),
                Ok(_) => continue,
                Err(broadcast::error::TryRecvError::Empty) => return None,
                Err(broadcast::error::TryRecvError::Lagged(n)) => {
                    return Some(Err(RecvError::Lagged(n)))
                }
                Err(broadcast::error::TryRecvError::Closed) => return Some(Err(RecvError::Closed)),
            }
        }
    }
}

impl fmt::Debug for EventStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventStream")
            .field("has_filter", &self.filter.is_some())
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_event_bus_subscription() {
        let bus = EventBus::new(10);
        assert_eq!(bus.subscriber_count(), 0);
        let _sub1 = bus.subscribe();
        let _sub2 = bus.subscribe();
        assert_eq!(bus.subscriber_count(), 2);
    }

    #[tokio::test]
    async fn test_emit_without_subscribers_errors() {
        let bus = EventBus::new(10);
        let event = CoreEvent::Album(AlbumEvent::Created {
            name: "Trip".to_string(),
        });
        assert!(bus.emit(event).is_err());
        // notify swallows the same condition
        bus.notify(Notice::info("nobody listening"));
    }

    #[tokio::test]
    async fn test_multiple_subscribers_receive_same_event() {
        let bus = EventBus::new(10);
        let mut sub1 = bus.subscribe();
        let mut sub2 = bus.subscribe();

        let event = CoreEvent::Album(AlbumEvent::Renamed {
            from: "Trip".to_string(),
            to: "Trip 2024".to_string(),
        });
        assert_eq!(bus.emit(event.clone()).unwrap(), 2);

        assert_eq!(sub1.recv().await.unwrap(), event);
        assert_eq!(sub2.recv().await.unwrap(), event);
    }

    #[tokio::test]
    async fn test_notice_stream_filters_other_events() {
        let bus = EventBus::new(10);
        let mut notices = EventStream::notices(bus.subscribe());

        bus.emit(CoreEvent::Slideshow(SlideshowEvent::Started { total: 3 }))
            .unwrap();
        bus.notify(Notice::warning("Photo already in album"));

        let received = notices.recv().await.unwrap();
        assert_eq!(
            received,
            CoreEvent::Notice(Notice::warning("Photo already in album"))
        );
        assert!(notices.try_recv().is_none());
    }

    #[tokio::test]
    async fn test_lagged_subscriber() {
        let bus = EventBus::new(2);
        let mut sub = bus.subscribe();

        for index in 0..5 {
            bus.emit(CoreEvent::Slideshow(SlideshowEvent::Paused { index }))
                .ok();
        }

        assert!(matches!(sub.recv().await, Err(RecvError::Lagged(_))));
    }

    #[test]
    fn test_event_severity() {
        assert_eq!(
            CoreEvent::Notice(Notice::error("Failed to save albums")).severity(),
            EventSeverity::Error
        );
        assert_eq!(
            CoreEvent::Tag(TagEvent::TagAdded {
                uri: "content://media/1".to_string(),
                tag: "beach".to_string(),
            })
            .severity(),
            EventSeverity::Info
        );
        assert_eq!(
            CoreEvent::Slideshow(SlideshowEvent::SlideChanged {
                index: 1,
                total: 3,
                uri: "content://media/2".to_string(),
            })
            .severity(),
            EventSeverity::Debug
        );
    }

    #[test]
    fn test_event_description() {
        let event = CoreEvent::Slideshow(SlideshowEvent::Finished { total: 4 });
        assert_eq!(event.description(), "Slideshow finished");
        let notice = CoreEvent::Notice(Notice::info("Album created: Trip"));
        assert_eq!(notice.description(), "Album created: Trip");
    }

    #[test]
    fn test_event_serialization_shape() {
        let event = CoreEvent::Collection(CollectionEvent::SearchCompleted {
            query: "cat".to_string(),
            result_count: 2,
        });

        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "Collection");
        assert_eq!(json["payload"]["event"], "SearchCompleted");
        assert_eq!(json["payload"]["result_count"], 2);

        let back: CoreEvent = serde_json::from_value(json).unwrap();
        assert_eq!(back, event);
    }

    #[tokio::test]
    async fn test_concurrent_publishers() {
        let bus = EventBus::new(100);
        let mut sub = bus.subscribe();

        let albums = bus.clone();
        let slides = bus.clone();

        let h1 = tokio::spawn(async move {
            for i in 0..10 {
                albums
                    .emit(CoreEvent::Album(AlbumEvent::Created {
                        name: format!("Album {}", i),
                    }))
                    .ok();
            }
        });
        let h2 = tokio::spawn(async move {
            for index in 0..10 {
                slides
                    .emit(CoreEvent::Slideshow(SlideshowEvent::Resumed { index }))
                    .ok();
            }
        });
        h1.await.unwrap();
        h2.await.unwrap();

        let mut count = 0;
        while sub.try_recv().is_ok() {
            count += 1;
        }
        assert_eq!(count, 20);
    }
}
