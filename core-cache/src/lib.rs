//! # Relisten Response Cache
//!
//! Persists catalogue responses (shows and artist lists) off the request
//! path, into three places:
//!
//! - a bounded in-memory LRU tier ([`memory::MemoryTier`])
//! - a size-capped on-disk tier ([`disk::DiskTier`])
//! - the durable store ([`core_library::RelistenStore`])
//!
//! ## Architecture
//!
//! ```text
//! HTTP pipeline ──> RelistenCacher::process ──> (same Response)
//!                          │
//!                          │ TaskExecutor::submit
//!                          ▼
//!        ┌─────────────────┴──────────────────┐
//!        │                                    │
//!  RelistenStore                  HybridStorage<String, V>
//!  (SQLite)                        ├── MemoryTier (200 / 25 MiB)
//!                                  └── DiskTier  (RelistenCache/<type>, 100 MiB)
//! ```
//!
//! Each entity type gets its own [`HybridStorage`] so keys from different
//! types never collide. Keys are upper-case UUID strings, the same form the
//! durable store uses.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use core_cache::{Payload, RelistenCacher, Response};
//!
//! # async fn example(cacher: &RelistenCacher, show: core_library::models::ShowWithSources) {
//! let key = show.cache_key();
//! let response = cacher.process(Response::success("/api/v3/shows", Payload::Show(show)));
//! // `response` is handed back before anything is written.
//!
//! cacher.wait_for_pending_writes().await;
//! assert!(cacher.show_cache().object(&key).await.unwrap().is_some());
//! # }
//! ```
//!
//! ## Failure Handling
//!
//! Nothing on the write path surfaces an error to the caller. Durable store
//! failures are logged; tier failures are reported to the host
//! [`DiagnosticSink`](bridge_traits::DiagnosticSink) and, when attached, as
//! [`CacheEvent`](core_runtime::events::CacheEvent)s.

pub mod cacher;
pub mod config;
pub mod disk;
pub mod error;
pub mod memory;
pub mod response;
pub mod stats;
pub mod storage;

pub use cacher::{ArtistCache, RelistenCacher, ShowCache, ARTIST_NAMESPACE, SHOW_NAMESPACE};
pub use config::{DiskConfig, Expiry, MemoryConfig, StorageConfig};
pub use error::{CacheError, Result};
pub use response::{Entity, Payload, PayloadKind, RequestFailure, Response, ResponseTransformer};
pub use stats::{DiskStats, MemoryStats, StorageStats};
pub use storage::HybridStorage;
