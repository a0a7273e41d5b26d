//! # Event Bus System
//!
//! Broadcast channel for typed core events, built on `core_async::sync::broadcast`.
//!
//! ## Overview
//!
//! - **Event Types**: `CoreEvent` wraps per-domain enums (currently the
//!   response cache)
//! - **EventBus**: central broadcast sender; cheap to clone
//! - **EventStream**: receiver wrapper with optional filtering
//!
//! ```text
//! ┌────────────────┐   emit    ┌───────────┐  subscribe  ┌────────────┐
//! │ RelistenCacher ├──────────>│ EventBus  ├────────────>│ Subscriber │
//! └────────────────┘           └───────────┘             └────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust
//! use core_runtime::events::{CacheEvent, CoreEvent, EventBus};
//!
//! let event_bus = EventBus::new(100);
//! let mut subscriber = event_bus.subscribe();
//!
//! event_bus
//!     .emit(CoreEvent::Cache(CacheEvent::ArtistsCached { count: 3 }))
//!     .ok();
//!
//! assert!(subscriber.try_recv().is_ok());
//! ```
//!
//! ## Error Handling
//!
//! - **`RecvError::Lagged(n)`**: the subscriber missed `n` events; it can keep
//!   receiving.
//! - **`RecvError::Closed`**: every sender was dropped; treat it as shutdown.
//!
//! Emitting with no subscribers returns `Err(SendError)`. Publishers that do
//! not care about delivery ignore it.

use core_async::sync::broadcast;
use serde::{Deserialize, Serialize};
use std::fmt;

pub use core_async::sync::broadcast::error::{RecvError, SendError};
pub use core_async::sync::broadcast::Receiver;

/// Default buffer size for the event bus channel.
pub const DEFAULT_EVENT_BUFFER_SIZE: usize = 100;

// ============================================================================
// Core Event Types
// ============================================================================

/// Top-level event enum published through the event bus.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", content = "payload")]
pub enum CoreEvent {
    /// Response cache events
    Cache(CacheEvent),
}

impl CoreEvent {
    /// Returns a human-readable description of the event.
    pub fn description(&self) -> &str {
        match self {
            CoreEvent::Cache(e) => e.description(),
        }
    }

    /// Returns the severity level of the event.
    pub fn severity(&self) -> EventSeverity {
        match self {
            CoreEvent::Cache(CacheEvent::StoreWriteFailed { .. })
            | CoreEvent::Cache(CacheEvent::TierWriteFailed { .. }) => EventSeverity::Warning,
            CoreEvent::Cache(_) => EventSeverity::Debug,
        }
    }
}

/// Event severity levels for filtering and logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EventSeverity {
    Debug,
    Info,
    Warning,
    Error,
}

// ============================================================================
// Cache Events
// ============================================================================

/// Events emitted by the response cache after its background writes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event")]
pub enum CacheEvent {
    /// A show was written to the show cache tiers.
    ShowCached {
        /// Cache key (upper-case UUID string) of the show.
        show_uuid: String,
    },
    /// An artist list was written to the durable store.
    ArtistsCached {
        /// Number of artists in the list.
        count: usize,
    },
    /// A durable store write failed.
    StoreWriteFailed {
        /// `"show"` or `"artists"`.
        entity: String,
        message: String,
    },
    /// A memory/disk tier write failed.
    TierWriteFailed {
        /// Name of the tier pair (`"show_cache"`, `"artist_cache"`).
        cache: String,
        key: String,
        message: String,
    },
}

impl CacheEvent {
    fn description(&self) -> &str {
        match self {
            CacheEvent::ShowCached { .. } => "Show cached",
            CacheEvent::ArtistsCached { .. } => "Artists cached",
            CacheEvent::StoreWriteFailed { .. } => "Durable store write failed",
            CacheEvent::TierWriteFailed { .. } => "Cache tier write failed",
        }
    }
}

// ============================================================================
// Event Bus
// ============================================================================

/// Central broadcast channel for [`CoreEvent`]s.
///
/// Cloning the bus clones the sender; all clones publish to the same
/// subscribers.
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<CoreEvent>,
}

impl EventBus {
    /// Creates a new event bus with the specified buffer size.
    ///
    /// A subscriber that falls behind by more than `capacity` events
    /// receives `RecvError::Lagged`.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publishes an event to all subscribers.
    ///
    /// Returns the number of subscribers that received the event, or an
    /// error if there are none.
    pub fn emit(&self, event: CoreEvent) -> Result<usize, SendError<CoreEvent>> {
        self.sender.send(event)
    }

    /// Creates a new subscriber. Past events are not replayed.
    pub fn subscribe(&self) -> Receiver<CoreEvent> {
        self.sender.subscribe()
    }

    /// Returns the number of active subscribers.
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

/// A wrapper around `broadcast::Receiver` with optional filtering.
///
/// ```rust
/// use core_runtime::events::{CacheEvent, CoreEvent, EventBus, EventStream};
///
/// let event_bus = EventBus::new(100);
/// let failures = EventStream::new(event_bus.subscribe()).filter(|event| {
///     matches!(event, CoreEvent::Cache(CacheEvent::TierWriteFailed { .. }))
/// });
/// ```
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

    /// Only events matching `predicate` are returned by `recv()`.
    pub fn filter<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&CoreEvent) -> bool + Send + Sync + 'static,
    {
        self.filter = Some(Box::new(predicate));
        self
    }

    fn accepts(&self, event: &CoreEvent) -> bool {
        self.filter.as_ref().map_or(true, |filter| filter(event))
    }

    /// Receives the next event that passes the filter.
    ///
    /// # Errors
    ///
    /// Returns `RecvError::Lagged(n)` if the subscriber fell behind by `n` events.
    /// Returns `RecvError::Closed` if all senders have been dropped.
    pub async fn recv(&mut self) -> Result<CoreEvent, RecvError> {
        loop {
            let event = self.receiver.recv().await?;
            if self.accepts(&event) {
                return Ok(event);
            }
        }
    }

    /// Attempts to receive an event without waiting.
    ///
    /// Returns `None` if no matching event is currently available.
    pub fn try_recv(&mut self) -> Option<Result<CoreEvent, RecvError>> {
        loop {
            match self.receiver.try_recv() {
                Ok(event) => {
                    if self.accepts(&event) {
                        return Some(Ok(event));
                    }
                }
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

    fn show_cached(uuid: &str) -> CoreEvent {
        CoreEvent::Cache(CacheEvent::ShowCached {
            show_uuid: uuid.to_string(),
        })
    }

    fn tier_failed() -> CoreEvent {
        CoreEvent::Cache(CacheEvent::TierWriteFailed {
            cache: "show_cache".to_string(),
            key: "ABC".to_string(),
            message: "disk full".to_string(),
        })
    }

    #[core_async::test]
    async fn test_event_emission_no_subscribers() {
        let bus = EventBus::new(10);
        assert_eq!(bus.subscriber_count(), 0);
        assert!(bus.emit(show_cached("A")).is_err());
    }

    #[core_async::test]
    async fn test_multiple_subscribers_receive_same_event() {
        let bus = EventBus::new(10);
        let mut sub1 = bus.subscribe();
        let mut sub2 = bus.subscribe();

        assert_eq!(bus.emit(show_cached("A")).unwrap(), 2);

        assert_eq!(sub1.recv().await.unwrap(), show_cached("A"));
        assert_eq!(sub2.recv().await.unwrap(), show_cached("A"));
    }

    #[core_async::test]
    async fn test_event_stream_with_filter() {
        let bus = EventBus::new(10);
        let mut stream = EventStream::new(bus.subscribe())
            .filter(|event| event.severity() >= EventSeverity::Warning);

        bus.emit(show_cached("A")).unwrap();
        bus.emit(CoreEvent::Cache(CacheEvent::ArtistsCached { count: 2 }))
            .unwrap();
        bus.emit(tier_failed()).unwrap();

        assert_eq!(stream.recv().await.unwrap(), tier_failed());
        assert!(stream.try_recv().is_none());
    }

    #[core_async::test]
    async fn test_lagged_subscriber() {
        let bus = EventBus::new(2);
        let mut sub = bus.subscribe();

        for i in 0..5 {
            bus.emit(show_cached(&i.to_string())).unwrap();
        }

        match sub.recv().await {
            Err(RecvError::Lagged(n)) => assert_eq!(n, 3),
            other => panic!("expected lag, got {:?}", other),
        }
        assert_eq!(sub.recv().await.unwrap(), show_cached("3"));
    }

    #[test]
    fn test_event_severity_and_description() {
        assert_eq!(tier_failed().severity(), EventSeverity::Warning);
        assert_eq!(show_cached("A").severity(), EventSeverity::Debug);
        assert_eq!(tier_failed().description(), "Cache tier write failed");
    }

    #[test]
    fn test_event_serialization() {
        let json = serde_json::to_string(&tier_failed()).unwrap();
        assert!(json.contains("\"type\":\"Cache\""));
        assert!(json.contains("\"event\":\"TierWriteFailed\""));

        let back: CoreEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(back, tier_failed());
    }

    #[core_async::test(multi_thread)]
    async fn test_concurrent_publishers() {
        let bus = EventBus::new(100);
        let mut sub = bus.subscribe();

        let mut handles = Vec::new();
        for i in 0..10 {
            let bus = bus.clone();
            handles.push(core_async::spawn(async move {
                bus.emit(show_cached(&i.to_string())).unwrap();
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        let mut received = 0;
        while sub.try_recv().is_ok() {
            received += 1;
        }
        assert_eq!(received, 10);
    }
}
