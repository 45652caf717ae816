//! The open-state watcher loop.
//!
//! One watcher runs per process. Each pass asks the [`Resolver`] for the open
//! state at "now", publishes an [`OpenChangeEvent`] when it differs from the
//! last observed state, and then sleeps until the next predicted edge, a
//! [`Trigger`] fire, or shutdown.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use officehours_core::Resolver;
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use crate::clock::{Clock, SystemClock};
use crate::event::OpenChangeEvent;
use crate::sink::EventSink;
use crate::trigger::Trigger;

/// Default re-check interval when no edge is predicted.
pub const DEFAULT_FALLBACK_INTERVAL: Duration = Duration::from_secs(60);

/// Watcher configuration.
#[derive(Debug, Clone)]
pub struct WatcherConfig {
    /// Sleep used when no edge is predicted or evaluation failed.
    pub fallback_interval: Duration,
}

impl Default for WatcherConfig {
    fn default() -> Self {
        Self {
            fallback_interval: DEFAULT_FALLBACK_INTERVAL,
        }
    }
}

impl WatcherConfig {
    /// Sets the fallback interval.
    pub fn with_fallback_interval(mut self, interval: Duration) -> Self {
        self.fallback_interval = interval;
        self
    }
}

/// Lifecycle of the watcher task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatcherState {
    /// Started, first evaluation not begun yet.
    Idle,
    /// Resolving and publishing.
    Evaluating,
    /// Waiting for an edge, a trigger or shutdown.
    Sleeping,
    /// Loop exited. Terminal.
    Stopped,
}

/// Remembers the last observed open state.
#[derive(Debug, Default)]
pub struct OpenStateTracker {
    last: Option<bool>,
}

impl OpenStateTracker {
    /// Records `is_open` and returns true if it differs from the previous
    /// observation. The first observation always counts as a change.
    pub fn observe(&mut self, is_open: bool) -> bool {
        let changed = self.last != Some(is_open);
        self.last = Some(is_open);
        changed
    }

    pub fn last(&self) -> Option<bool> {
        self.last
    }
}

/// Builder for the watcher task.
pub struct Watcher {
    resolver: Resolver,
    sink: Arc<dyn EventSink>,
    clock: Arc<dyn Clock>,
    config: WatcherConfig,
    trigger: Trigger,
}

impl Watcher {
    pub fn new(resolver: Resolver, sink: Arc<dyn EventSink>) -> Self {
        Self {
            resolver,
            sink,
            clock: Arc::new(SystemClock),
            config: WatcherConfig::default(),
            trigger: Trigger::new(),
        }
    }

    pub fn with_config(mut self, config: WatcherConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// The trigger wired to this watcher.
    pub fn trigger(&self) -> Trigger {
        self.trigger.clone()
    }

    /// Spawns the watcher loop on the current tokio runtime.
    pub fn start(self) -> WatcherHandle {
        let (shutdown_tx, shutdown_rx) = broadcast::channel::<()>(1);
        let (state_tx, state_rx) = watch::channel(WatcherState::Idle);
        let trigger = self.trigger.clone();

        info!(
            fallback_secs = self.config.fallback_interval.as_secs(),
            "Starting office hours watcher"
        );
        let handle = tokio::spawn(self.run(shutdown_rx, state_tx));

        WatcherHandle {
            shutdown_tx,
            trigger,
            state_rx,
            handle,
        }
    }

    async fn run(
        self,
        mut shutdown_rx: broadcast::Receiver<()>,
        state_tx: watch::Sender<WatcherState>,
    ) {
        let mut tracker = OpenStateTracker::default();

        loop {
            state_tx.send_replace(WatcherState::Evaluating);
            let sleep_for = self.evaluate(&mut tracker).await;
            state_tx.send_replace(WatcherState::Sleeping);

            tokio::select! {
                biased;
                _ = shutdown_rx.recv() => {
                    info!("Watcher shutdown signal received");
                    break;
                }
                _ = self.trigger.notified() => {
                    debug!("Re-evaluation triggered");
                }
                _ = tokio::time::sleep(sleep_for) => {}
            }
        }

        state_tx.send_replace(WatcherState::Stopped);
    }

    /// One evaluation pass. Returns how long to sleep afterwards.
    async fn evaluate(&self, tracker: &mut OpenStateTracker) -> Duration {
        let now = self.clock.now();

        let state = match self.resolver.open_state_at(&now).await {
            Ok(state) => state,
            Err(e) => {
                error!("Failed to evaluate office hours: {}", e);
                return self.config.fallback_interval;
            }
        };

        if tracker.observe(state.is_open) {
            let event =
                OpenChangeEvent::new(state.is_open, state.applied.clone(), now.with_timezone(&Utc));
            info!(
                is_open = event.is_open,
                office_hour = event.office_hour.as_ref().and_then(|r| r.id()).unwrap_or("-"),
                "Open state changed"
            );

            // The new state stays recorded even if delivery fails
            if let Err(e) = self.sink.publish(&event).await {
                error!("Failed to publish open state change: {}", e);
            }
        }

        match state.next_edge {
            Some(edge) => {
                info!(expected_change = %edge, "Next open state change");
                (edge - now).to_std().unwrap_or(Duration::ZERO)
            }
            None => {
                debug!(
                    fallback_secs = self.config.fallback_interval.as_secs(),
                    "No open state change predicted today"
                );
                self.config.fallback_interval
            }
        }
    }
}

/// Handle for controlling a running watcher.
///
/// Dropping the handle also stops the loop.
pub struct WatcherHandle {
    shutdown_tx: broadcast::Sender<()>,
    trigger: Trigger,
    state_rx: watch::Receiver<WatcherState>,
    handle: JoinHandle<()>,
}

impl WatcherHandle {
    /// Trigger for requesting re-evaluation.
    pub fn trigger(&self) -> Trigger {
        self.trigger.clone()
    }

    /// Current lifecycle state.
    pub fn state(&self) -> WatcherState {
        *self.state_rx.borrow()
    }

    /// Receiver for lifecycle state changes.
    pub fn subscribe_state(&self) -> watch::Receiver<WatcherState> {
        self.state_rx.clone()
    }

    /// Signals the watcher to shut down.
    pub fn shutdown(&self) {
        let _ = self.shutdown_tx.send(());
    }

    /// Waits for the watcher to finish.
    pub async fn wait(self) {
        let _ = self.handle.await;
    }

    /// Shuts down the watcher and waits for it to finish.
    pub async fn stop(self) {
        self.shutdown();
        self.wait().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{Result, WatcherError};
    use async_trait::async_trait;
    use chrono::{DateTime, Local, NaiveDate, TimeZone};
    use officehours_core::{
        DayTimeRange, Error, NoHolidays, OfficeHour, RuleStore, Selector, Weekday,
    };
    use officehours_storage::Database;
    use parking_lot::Mutex;
    use tokio::sync::mpsc;
    use tokio::time::timeout;

    const WAIT: Duration = Duration::from_secs(5);

    struct ManualClock(Mutex<DateTime<Local>>);

    impl ManualClock {
        fn at(h: u32, m: u32) -> Arc<Self> {
            Self::starting(monday(h, m))
        }

        fn starting(now: DateTime<Local>) -> Arc<Self> {
            Arc::new(Self(Mutex::new(now)))
        }

        fn set(&self, h: u32, m: u32) {
            *self.0.lock() = monday(h, m);
        }
    }

    impl Clock for ManualClock {
        fn now(&self) -> DateTime<Local> {
            *self.0.lock()
        }
    }

    /// 2024-01-08 is a Monday.
    fn monday(h: u32, m: u32) -> DateTime<Local> {
        Local.with_ymd_and_hms(2024, 1, 8, h, m, 0).unwrap()
    }

    /// Forwards every publish attempt to a channel, optionally failing.
    struct ChannelSink {
        tx: mpsc::UnboundedSender<OpenChangeEvent>,
        fail: bool,
    }

    #[async_trait]
    impl EventSink for ChannelSink {
        async fn publish(&self, event: &OpenChangeEvent) -> Result<()> {
            let _ = self.tx.send(event.clone());
            if self.fail {
                return Err(WatcherError::Rejected("sink offline".into()));
            }
            Ok(())
        }
    }

    struct BrokenStore;

    #[async_trait]
    impl RuleStore for BrokenStore {
        async fn upsert(&self, _rule: OfficeHour) -> officehours_core::Result<OfficeHour> {
            Err(Error::UpstreamUnavailable("offline".into()))
        }
        async fn list_all(&self) -> officehours_core::Result<Vec<OfficeHour>> {
            Err(Error::UpstreamUnavailable("offline".into()))
        }
        async fn get(&self, id: &str) -> officehours_core::Result<OfficeHour> {
            Err(Error::NotFound(id.into()))
        }
        async fn delete_by_id(&self, id: &str) -> officehours_core::Result<()> {
            Err(Error::NotFound(id.into()))
        }
        async fn find_by_calendar_date(
            &self,
            _date: NaiveDate,
        ) -> officehours_core::Result<Vec<OfficeHour>> {
            Err(Error::UpstreamUnavailable("offline".into()))
        }
        async fn find_by_weekday(
            &self,
            _weekday: Weekday,
        ) -> officehours_core::Result<Vec<OfficeHour>> {
            Err(Error::UpstreamUnavailable("offline".into()))
        }
    }

    fn monday_rule() -> OfficeHour {
        OfficeHour::new(
            Selector::Weekday(Weekday::Monday),
            vec![DayTimeRange::from_hours(8, 12), DayTimeRange::from_hours(13, 17)],
        )
        .unwrap()
    }

    async fn store_with_monday() -> Arc<dyn RuleStore> {
        let db = Database::in_memory().unwrap();
        db.upsert(monday_rule()).await.unwrap();
        Arc::new(db)
    }

    fn start(
        store: Arc<dyn RuleStore>,
        clock: Arc<ManualClock>,
        fail: bool,
    ) -> (WatcherHandle, mpsc::UnboundedReceiver<OpenChangeEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let resolver = Resolver::new(store, Arc::new(NoHolidays));
        let handle = Watcher::new(resolver, Arc::new(ChannelSink { tx, fail }))
            .with_clock(clock)
            .start();
        (handle, rx)
    }

    /// Waits for the current pass to finish, fires the trigger and waits for
    /// the resulting pass to finish.
    async fn run_another_pass(handle: &WatcherHandle) {
        let mut rx = handle.subscribe_state();
        timeout(WAIT, rx.wait_for(|s| *s == WatcherState::Sleeping))
            .await
            .unwrap()
            .unwrap();

        handle.trigger().fire();

        timeout(WAIT, async {
            loop {
                rx.changed().await.unwrap();
                if *rx.borrow_and_update() == WatcherState::Sleeping {
                    break;
                }
            }
        })
        .await
        .unwrap();
    }

    // ==================== Tracker Tests ====================

    #[test]
    fn test_tracker_first_observation_is_change() {
        let mut tracker = OpenStateTracker::default();
        assert_eq!(tracker.last(), None);
        assert!(tracker.observe(false));
        assert_eq!(tracker.last(), Some(false));
    }

    #[test]
    fn test_tracker_only_reports_flips() {
        let mut tracker = OpenStateTracker::default();
        assert!(tracker.observe(true));
        assert!(!tracker.observe(true));
        assert!(tracker.observe(false));
        assert!(!tracker.observe(false));
        assert!(tracker.observe(true));
    }

    #[test]
    fn test_config_builder() {
        let config = WatcherConfig::default().with_fallback_interval(Duration::from_secs(5));
        assert_eq!(config.fallback_interval, Duration::from_secs(5));
        assert_eq!(
            WatcherConfig::default().fallback_interval,
            DEFAULT_FALLBACK_INTERVAL
        );
    }

    // ==================== Sleep Duration Tests ====================

    fn idle_watcher(store: Arc<dyn RuleStore>, clock: Arc<ManualClock>) -> Watcher {
        let (tx, _rx) = mpsc::unbounded_channel();
        Watcher::new(
            Resolver::new(store, Arc::new(NoHolidays)),
            Arc::new(ChannelSink { tx, fail: false }),
        )
        .with_clock(clock)
        .with_config(WatcherConfig::default().with_fallback_interval(Duration::from_secs(7)))
    }

    #[tokio::test]
    async fn test_sleeps_until_next_edge() {
        let store = store_with_monday().await;
        let mut tracker = OpenStateTracker::default();

        let watcher = idle_watcher(store.clone(), ManualClock::at(9, 0));
        assert_eq!(
            watcher.evaluate(&mut tracker).await,
            Duration::from_secs(3 * 3600)
        );

        let watcher = idle_watcher(store, ManualClock::at(12, 30));
        assert_eq!(
            watcher.evaluate(&mut tracker).await,
            Duration::from_secs(30 * 60)
        );
    }

    #[tokio::test]
    async fn test_sleeps_fallback_without_edge() {
        let watcher = idle_watcher(store_with_monday().await, ManualClock::at(18, 0));
        let mut tracker = OpenStateTracker::default();

        assert_eq!(watcher.evaluate(&mut tracker).await, Duration::from_secs(7));
        assert_eq!(tracker.last(), Some(false));
    }

    #[tokio::test]
    async fn test_sleeps_fallback_after_resolver_failure() {
        let watcher = idle_watcher(Arc::new(BrokenStore), ManualClock::at(9, 0));
        let mut tracker = OpenStateTracker::default();

        assert_eq!(watcher.evaluate(&mut tracker).await, Duration::from_secs(7));
        assert_eq!(tracker.last(), None);
    }

    // ==================== Loop Tests ====================

    #[tokio::test]
    async fn test_wakes_at_edge_without_trigger() {
        let clock = ManualClock::starting(monday(11, 59) + chrono::Duration::milliseconds(59_500));
        let (handle, mut events) = start(store_with_monday().await, clock.clone(), false);
        assert!(timeout(WAIT, events.recv()).await.unwrap().unwrap().is_open);

        // Noon arrives; only the edge timer can notice
        clock.set(12, 0);

        let event = timeout(WAIT, events.recv()).await.unwrap().unwrap();
        assert!(!event.is_open);
        assert_eq!(event.changed_at, monday(12, 0).with_timezone(&Utc));

        handle.stop().await;
    }

    #[tokio::test]
    async fn test_wakes_after_fallback_without_trigger() {
        let db = Database::in_memory().unwrap();
        let store: Arc<dyn RuleStore> = Arc::new(db);
        let (tx, mut events) = mpsc::unbounded_channel();
        let handle = Watcher::new(
            Resolver::new(store.clone(), Arc::new(NoHolidays)),
            Arc::new(ChannelSink { tx, fail: false }),
        )
        .with_clock(ManualClock::at(18, 0))
        .with_config(WatcherConfig::default().with_fallback_interval(Duration::from_millis(50)))
        .start();

        assert!(!timeout(WAIT, events.recv()).await.unwrap().unwrap().is_open);

        // Stored without firing the trigger
        let evening = OfficeHour::new(
            Selector::Weekday(Weekday::Monday),
            vec![DayTimeRange::from_hours(17, 20)],
        )
        .unwrap();
        store.upsert(evening).await.unwrap();

        assert!(timeout(WAIT, events.recv()).await.unwrap().unwrap().is_open);
        handle.stop().await;
    }

    #[tokio::test]
    async fn test_baseline_event_on_start() {
        let (handle, mut events) = start(store_with_monday().await, ManualClock::at(9, 0), false);

        let event = timeout(WAIT, events.recv()).await.unwrap().unwrap();
        assert!(event.is_open);
        assert!(event.office_hour.is_some());
        assert_eq!(event.changed_at, monday(9, 0).with_timezone(&Utc));

        handle.stop().await;
    }

    #[tokio::test]
    async fn test_baseline_closed_event() {
        let (handle, mut events) = start(store_with_monday().await, ManualClock::at(12, 30), false);

        let event = timeout(WAIT, events.recv()).await.unwrap().unwrap();
        assert!(!event.is_open);
        assert!(event.office_hour.is_none());

        handle.stop().await;
    }

    #[tokio::test]
    async fn test_emits_only_on_change() {
        let clock = ManualClock::at(9, 0);
        let (handle, mut events) = start(store_with_monday().await, clock.clone(), false);
        assert!(timeout(WAIT, events.recv()).await.unwrap().unwrap().is_open);

        // Still open, nothing published
        clock.set(10, 0);
        run_another_pass(&handle).await;
        assert!(events.try_recv().is_err());

        // Lunch break
        clock.set(12, 30);
        run_another_pass(&handle).await;
        let event = events.try_recv().unwrap();
        assert!(!event.is_open);

        // Open again
        clock.set(13, 0);
        run_another_pass(&handle).await;
        assert!(events.try_recv().unwrap().is_open);

        handle.stop().await;
    }

    #[tokio::test]
    async fn test_rule_change_picked_up_on_trigger() {
        let db = Database::in_memory().unwrap();
        let store: Arc<dyn RuleStore> = Arc::new(db);
        let (handle, mut events) = start(store.clone(), ManualClock::at(9, 0), false);

        assert!(!timeout(WAIT, events.recv()).await.unwrap().unwrap().is_open);

        store.upsert(monday_rule()).await.unwrap();
        run_another_pass(&handle).await;

        assert!(events.try_recv().unwrap().is_open);
        handle.stop().await;
    }

    #[tokio::test]
    async fn test_resolver_failure_publishes_nothing() {
        let (handle, mut events) = start(Arc::new(BrokenStore), ManualClock::at(9, 0), false);

        run_another_pass(&handle).await;
        assert!(events.try_recv().is_err());
        assert_eq!(handle.state(), WatcherState::Sleeping);

        handle.stop().await;
    }

    #[tokio::test]
    async fn test_publish_failure_is_not_retried() {
        let clock = ManualClock::at(9, 0);
        let (handle, mut events) = start(store_with_monday().await, clock.clone(), true);

        // One failed attempt for the baseline
        assert!(timeout(WAIT, events.recv()).await.unwrap().unwrap().is_open);

        clock.set(9, 30);
        run_another_pass(&handle).await;
        assert!(events.try_recv().is_err());

        handle.stop().await;
    }

    // ==================== Lifecycle Tests ====================

    #[tokio::test]
    async fn test_stop_reaches_stopped() {
        let (handle, _events) = start(store_with_monday().await, ManualClock::at(9, 0), false);
        let mut state = handle.subscribe_state();

        handle.stop().await;

        assert_eq!(*state.borrow_and_update(), WatcherState::Stopped);
    }

    #[tokio::test]
    async fn test_dropping_handle_stops_loop() {
        let (handle, _events) = start(store_with_monday().await, ManualClock::at(9, 0), false);
        let mut state = handle.subscribe_state();

        drop(handle);

        timeout(WAIT, state.wait_for(|s| *s == WatcherState::Stopped))
            .await
            .unwrap()
            .unwrap();
    }
}
