//! Office Hours Watcher - open-state change detection.
//!
//! A single background task keeps the current open/closed state up to date
//! and publishes an [`OpenChangeEvent`] whenever it flips. Rule mutations
//! call [`Trigger::fire`] so the change is noticed without waiting for the
//! next predicted edge.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use officehours_core::{NoHolidays, Resolver};
//! use officehours_storage::Database;
//! use officehours_watcher::{LogEventSink, Watcher};
//!
//! # async fn run() {
//! let store = Arc::new(Database::in_memory().unwrap());
//! let resolver = Resolver::new(store, Arc::new(NoHolidays));
//!
//! let handle = Watcher::new(resolver, Arc::new(LogEventSink)).start();
//! handle.trigger().fire();
//! handle.stop().await;
//! # }
//! ```

pub mod clock;
pub mod error;
pub mod event;
pub mod sink;
pub mod trigger;
pub mod watcher;

pub use clock::{Clock, SystemClock};
pub use error::{Result, WatcherError};
pub use event::OpenChangeEvent;
pub use sink::{EventSink, HttpEventSink, LogEventSink};
pub use trigger::Trigger;
pub use watcher::{
    OpenStateTracker, Watcher, WatcherConfig, WatcherHandle, WatcherState,
    DEFAULT_FALLBACK_INTERVAL,
};
