use crossbeam_channel::{unbounded, Receiver, Sender};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use crate::error::Result;
use crate::groups::{GroupCatalog, LogGroup};
use crate::records::{self, LogRecord};
use crate::scheduler::StreamScheduler;
use crate::source::{LogQuery, LogSource};

/// Delay between a merge and the display following to the newest record.
pub const SCROLL_DELAY: Duration = Duration::from_millis(100);

/// State the display reads.
#[derive(Debug, Clone, Default)]
pub struct SessionState {
    /// Ascending by timestamp, no duplicate (timestamp, message) pairs.
    pub accumulated: Vec<LogRecord>,
    pub is_streaming: bool,
    pub selected_group: Option<LogGroup>,
    pub correlation_filter: Option<String>,
    pub last_error: Option<String>,
}

/// Result of a background call, applied on the owning thread.
enum Outcome {
    Groups(Result<Vec<LogGroup>>),
    Records {
        group_id: String,
        append: bool,
        result: Result<Vec<LogRecord>>,
    },
}

/// A log streaming session for one display.
///
/// External calls run on short-lived worker threads. Their outcomes are
/// queued and applied by [`StreamSession::tick`] on the thread that owns the
/// session, so the state itself is never shared.
pub struct StreamSession<S: LogSource> {
    source: Arc<S>,
    group_prefix: String,
    state: SessionState,
    catalog: GroupCatalog,
    scheduler: StreamScheduler,
    fetch_in_flight: bool,
    discovery_in_flight: bool,
    scroll_due: Option<Instant>,
    track_new_records: bool,
    new_records: Vec<LogRecord>,
    outcome_tx: Sender<Outcome>,
    outcome_rx: Receiver<Outcome>,
}

impl<S: LogSource> StreamSession<S> {
    pub fn new(source: Arc<S>, group_prefix: impl Into<String>) -> Self {
        Self::with_scheduler(source, group_prefix, StreamScheduler::default())
    }

    pub fn with_scheduler(
        source: Arc<S>,
        group_prefix: impl Into<String>,
        scheduler: StreamScheduler,
    ) -> Self {
        let (outcome_tx, outcome_rx) = unbounded();
        Self {
            source,
            group_prefix: group_prefix.into(),
            state: SessionState::default(),
            catalog: GroupCatalog::default(),
            scheduler,
            fetch_in_flight: false,
            discovery_in_flight: false,
            scroll_due: None,
            track_new_records: false,
            new_records: Vec::new(),
            outcome_tx,
            outcome_rx,
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn catalog(&self) -> &GroupCatalog {
        &self.catalog
    }

    pub fn scheduler(&self) -> &StreamScheduler {
        &self.scheduler
    }

    pub fn is_fetching(&self) -> bool {
        self.fetch_in_flight
    }

    pub fn is_discovering(&self) -> bool {
        self.discovery_in_flight
    }

    /// Starts a group listing in the background.
    pub fn discover_groups(&mut self) -> bool {
        if self.discovery_in_flight {
            debug!("group discovery already running");
            return false;
        }

        let source = Arc::clone(&self.source);
        let prefix = self.group_prefix.clone();
        let tx = self.outcome_tx.clone();
        let spawned = std::thread::Builder::new()
            .name("log-group-discovery".into())
            .spawn(move || {
                let result = source.describe_log_groups(&prefix);
                let _ = tx.send(Outcome::Groups(result));
            });

        match spawned {
            Ok(_) => {
                self.discovery_in_flight = true;
                true
            }
            Err(e) => {
                self.state.last_error = Some(format!("Failed to list log groups: {}", e));
                false
            }
        }
    }

    /// Switches to `group`. Changing group clears accumulated records.
    pub fn select_group(&mut self, group: LogGroup) {
        if self.state.selected_group.as_ref() == Some(&group) {
            return;
        }
        info!(group = %group.id, "selected log group");
        self.state.accumulated.clear();
        self.new_records.clear();
        self.state.selected_group = Some(group);
    }

    pub fn set_correlation(&mut self, correlation: Option<String>) {
        self.state.correlation_filter = correlation.filter(|c| !c.is_empty());
    }

    pub fn clear(&mut self) {
        self.state.accumulated.clear();
        self.new_records.clear();
    }

    /// Fresh fetch replacing accumulated records. Dropped while a fetch is
    /// in flight or no group is selected.
    pub fn refresh(&mut self) -> bool {
        self.dispatch_fetch(false)
    }

    /// Enters streaming: fetches once now, then every scheduler period.
    pub fn start_streaming(&mut self, now: Instant) -> bool {
        if !self.scheduler.start(now) {
            return false;
        }
        self.state.is_streaming = true;
        info!("streaming started");
        self.dispatch_fetch(true);
        true
    }

    /// Leaves streaming. A fetch already in flight still lands.
    pub fn stop_streaming(&mut self) -> bool {
        if !self.scheduler.stop() {
            return false;
        }
        self.state.is_streaming = false;
        info!("streaming stopped");
        true
    }

    pub fn toggle_streaming(&mut self, now: Instant) {
        if self.state.is_streaming {
            self.stop_streaming();
        } else {
            self.start_streaming(now);
        }
    }

    /// Applies finished calls and fires the timer if due.
    ///
    /// Returns the number of outcomes applied.
    pub fn tick(&mut self, now: Instant) -> usize {
        let mut applied = 0;
        while let Ok(outcome) = self.outcome_rx.try_recv() {
            self.apply(outcome, now);
            applied += 1;
        }

        if self.scheduler.poll_due(now) {
            self.dispatch_fetch(true);
        }
        applied
    }

    /// Blocks up to `timeout` for one outcome and applies it.
    pub fn wait_for_outcome(&mut self, timeout: Duration) -> bool {
        match self.outcome_rx.recv_timeout(timeout) {
            Ok(outcome) => {
                self.apply(outcome, Instant::now());
                true
            }
            Err(_) => false,
        }
    }

    /// Records to display, filtered by the correlation string.
    pub fn projection(&self) -> Vec<&LogRecord> {
        records::project(
            &self.state.accumulated,
            self.state.correlation_filter.as_deref(),
        )
    }

    /// Returns `true` once per merge, after [`SCROLL_DELAY`] has passed.
    pub fn take_scroll_request(&mut self, now: Instant) -> bool {
        match self.scroll_due {
            Some(due) if now >= due => {
                self.scroll_due = None;
                true
            }
            _ => false,
        }
    }

    /// Collects records added by merges for [`StreamSession::take_new_records`].
    /// Off by default; turning it off drops anything not yet taken.
    pub fn track_new_records(&mut self, enabled: bool) {
        self.track_new_records = enabled;
        if !enabled {
            self.new_records.clear();
        }
    }

    /// Records added by merges since the last call, in timestamp order.
    ///
    /// Always empty unless tracking is on.
    pub fn take_new_records(&mut self) -> Vec<LogRecord> {
        let mut added = std::mem::take(&mut self.new_records);
        added.sort_by_key(|record| record.timestamp);
        added
    }

    fn dispatch_fetch(&mut self, append: bool) -> bool {
        let Some(group) = self.state.selected_group.as_ref() else {
            debug!("fetch skipped, no log group selected");
            return false;
        };
        if self.fetch_in_flight {
            debug!(append, "fetch dropped, previous fetch still running");
            return false;
        }

        let source = Arc::clone(&self.source);
        let tx = self.outcome_tx.clone();
        let group_id = group.id.clone();
        let query = LogQuery::trailing_window(&group_id, chrono::Utc::now().timestamp_millis());
        debug!(group = %group_id, append, "dispatching fetch");

        let spawned = std::thread::Builder::new()
            .name("log-fetch".into())
            .spawn(move || {
                let result = source.filter_log_events(&query);
                let _ = tx.send(Outcome::Records {
                    group_id,
                    append,
                    result,
                });
            });

        match spawned {
            Ok(_) => {
                self.fetch_in_flight = true;
                true
            }
            Err(e) => {
                self.state.last_error = Some(format!("Failed to fetch logs: {}", e));
                false
            }
        }
    }

    fn apply(&mut self, outcome: Outcome, now: Instant) {
        match outcome {
            Outcome::Groups(Ok(groups)) => {
                self.discovery_in_flight = false;
                let catalog = GroupCatalog::from_groups(groups);
                info!(
                    total = catalog.all.len(),
                    relevant = catalog.relevant.len(),
                    "discovered log groups"
                );

                self.state.last_error = None;

                let current_still_listed = self
                    .state
                    .selected_group
                    .as_ref()
                    .is_some_and(|current| catalog.all.contains(current));
                if !current_still_listed {
                    match catalog.selected.clone() {
                        Some(default) => self.select_group(default),
                        None => self.drop_selection(),
                    }
                }
                self.catalog = catalog;
            }
            Outcome::Groups(Err(e)) => {
                self.discovery_in_flight = false;
                warn!(error = %e, "log group discovery failed");
                self.state.last_error = Some(format!("Failed to list log groups: {}", e));
            }
            Outcome::Records {
                group_id,
                append,
                result,
            } => {
                self.fetch_in_flight = false;

                let current = self.state.selected_group.as_ref().map(|g| g.id.as_str());
                if current != Some(group_id.as_str()) {
                    debug!(group = %group_id, "discarding records for previously selected group");
                    return;
                }

                match result {
                    Ok(fetched) => {
                        let fetched_count = fetched.len();
                        let merged = if append {
                            records::merge_append(&self.state.accumulated, fetched)
                        } else {
                            records::replace(fetched)
                        };
                        self.note_new_records(&merged, append);
                        debug!(
                            fetched = fetched_count,
                            total = merged.len(),
                            append,
                            "merged records"
                        );
                        self.state.accumulated = merged;
                        self.state.last_error = None;
                        self.scroll_due = Some(now + SCROLL_DELAY);
                    }
                    Err(e) => {
                        warn!(group = %group_id, error = %e, "log fetch failed");
                        self.state.last_error = Some(format!("Failed to fetch logs: {}", e));
                    }
                }
            }
        }
    }

    fn drop_selection(&mut self) {
        if let Some(group) = self.state.selected_group.take() {
            info!(group = %group.id, "selected log group is no longer listed");
        }
        self.state.accumulated.clear();
        self.new_records.clear();
    }

    fn note_new_records(&mut self, merged: &[LogRecord], append: bool) {
        if !self.track_new_records {
            return;
        }
        if !append {
            self.new_records.clear();
            self.new_records.extend(merged.iter().cloned());
            return;
        }
        let previous: HashSet<(i64, &str)> = self
            .state
            .accumulated
            .iter()
            .map(|record| (record.timestamp, record.message.as_str()))
            .collect();
        self.new_records.extend(
            merged
                .iter()
                .filter(|record| !previous.contains(&(record.timestamp, record.message.as_str())))
                .cloned(),
        );
    }
}

impl<S: LogSource> Drop for StreamSession<S> {
    fn drop(&mut self) {
        if self.scheduler.stop() {
            debug!("streaming timer cleared on teardown");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    const WAIT: Duration = Duration::from_secs(5);

    /// Scripted source; when gated, each fetch blocks until released.
    struct FakeSource {
        calls: AtomicUsize,
        responses: Mutex<VecDeque<Result<Vec<LogRecord>>>>,
        groups: Mutex<VecDeque<Result<Vec<LogGroup>>>>,
        gate: Option<Receiver<()>>,
    }

    impl FakeSource {
        fn new() -> Self {
            Self {
                calls: AtomicUsize::new(0),
                responses: Mutex::new(VecDeque::new()),
                groups: Mutex::new(VecDeque::new()),
                gate: None,
            }
        }

        fn gated() -> (Self, Sender<()>) {
            let (tx, rx) = unbounded();
            let mut source = Self::new();
            source.gate = Some(rx);
            (source, tx)
        }

        fn respond(self, response: Result<Vec<LogRecord>>) -> Self {
            self.responses.lock().unwrap().push_back(response);
            self
        }

        fn with_groups(self, groups: Result<Vec<LogGroup>>) -> Self {
            self.groups.lock().unwrap().push_back(groups);
            self
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl LogSource for FakeSource {
        fn describe_log_groups(&self, _prefix: &str) -> Result<Vec<LogGroup>> {
            self.groups
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok(Vec::new()))
        }

        fn filter_log_events(&self, _query: &LogQuery) -> Result<Vec<LogRecord>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(gate) = &self.gate {
                let _ = gate.recv_timeout(WAIT);
            }
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok(Vec::new()))
        }
    }

    fn group(name: &str) -> LogGroup {
        LogGroup::from_name(&format!("/aws/lambda/{name}"), "/aws/lambda/")
    }

    fn rec(t: i64, m: &str) -> LogRecord {
        LogRecord::new(t, m)
    }

    fn io_error(msg: &str) -> Error {
        Error::Io(std::io::Error::new(std::io::ErrorKind::Other, msg.to_string()))
    }

    fn session_for(source: FakeSource) -> (StreamSession<FakeSource>, Arc<FakeSource>) {
        let source = Arc::new(source);
        let mut session = StreamSession::new(Arc::clone(&source), "/aws/lambda/");
        session.select_group(group("email-processor"));
        (session, source)
    }

    #[test]
    fn fetch_without_group_is_noop() {
        let source = Arc::new(FakeSource::new());
        let mut session = StreamSession::new(Arc::clone(&source), "/aws/lambda/");

        assert!(!session.refresh());
        assert!(!session.is_fetching());
        assert_eq!(source.calls(), 0);
    }

    #[test]
    fn refresh_replaces_and_append_merges() {
        let source = FakeSource::new()
            .respond(Ok(vec![rec(2, "b"), rec(1, "a")]))
            .respond(Ok(vec![rec(1, "a"), rec(3, "c")]))
            .respond(Ok(vec![rec(9, "z")]));
        let (mut session, _source) = session_for(source);
        session.track_new_records(true);

        assert!(session.refresh());
        assert!(session.wait_for_outcome(WAIT));
        assert_eq!(session.state().accumulated, vec![rec(1, "a"), rec(2, "b")]);

        assert!(session.dispatch_fetch(true));
        assert!(session.wait_for_outcome(WAIT));
        assert_eq!(
            session.state().accumulated,
            vec![rec(1, "a"), rec(2, "b"), rec(3, "c")]
        );
        assert_eq!(session.take_new_records().len(), 3);

        assert!(session.refresh());
        assert!(session.wait_for_outcome(WAIT));
        assert_eq!(session.state().accumulated, vec![rec(9, "z")]);
    }

    #[test]
    fn failed_fetch_keeps_accumulated_and_selection() {
        let source = FakeSource::new()
            .respond(Ok(vec![rec(1, "a")]))
            .respond(Err(io_error("connection reset")));
        let (mut session, _source) = session_for(source);

        session.refresh();
        session.wait_for_outcome(WAIT);
        let before = session.state().accumulated.clone();

        session.dispatch_fetch(true);
        session.wait_for_outcome(WAIT);

        assert_eq!(session.state().accumulated, before);
        assert_eq!(session.state().selected_group, Some(group("email-processor")));
        let error = session.state().last_error.clone().unwrap();
        assert!(error.contains("connection reset"), "{error}");
        assert!(!session.is_fetching());
    }

    #[test]
    fn refresh_while_in_flight_is_dropped() {
        let (source, release) = FakeSource::gated();
        let (mut session, source) = session_for(source);

        assert!(session.refresh());
        assert!(session.is_fetching());
        assert!(!session.refresh());
        assert_eq!(session.tick(Instant::now()), 0);

        release.send(()).unwrap();
        assert!(session.wait_for_outcome(WAIT));
        assert_eq!(source.calls(), 1);
        assert!(!session.is_fetching());
    }

    #[test]
    fn streaming_fetches_immediately_then_every_period() {
        let (mut session, source) = session_for(FakeSource::new());
        let t0 = Instant::now();

        assert!(session.start_streaming(t0));
        assert!(!session.start_streaming(t0));
        assert!(session.state().is_streaming);
        assert!(session.wait_for_outcome(WAIT));
        assert_eq!(source.calls(), 1);

        session.tick(t0 + Duration::from_secs(1));
        assert!(!session.is_fetching());

        session.tick(t0 + Duration::from_secs(3));
        assert!(session.wait_for_outcome(WAIT));
        session.tick(t0 + Duration::from_secs(6));
        assert!(session.wait_for_outcome(WAIT));
        assert_eq!(source.calls(), 3);

        assert!(session.stop_streaming());
        assert!(!session.stop_streaming());
        session.tick(t0 + Duration::from_secs(9));
        session.tick(t0 + Duration::from_secs(12));
        assert!(!session.is_fetching());
        assert_eq!(source.calls(), 3);
        assert!(!session.state().is_streaming);
    }

    #[test]
    fn tick_while_busy_is_dropped_not_queued() {
        let (source, release) = FakeSource::gated();
        let (mut session, source) = session_for(source);
        let t0 = Instant::now();

        session.start_streaming(t0);
        session.tick(t0 + Duration::from_secs(3));
        session.tick(t0 + Duration::from_secs(6));

        release.send(()).unwrap();
        assert!(session.wait_for_outcome(WAIT));
        assert!(!session.is_fetching());
        assert_eq!(source.calls(), 1);
    }

    #[test]
    fn in_flight_result_lands_after_stop() {
        let (source, release) = FakeSource::gated();
        let source = source.respond(Ok(vec![rec(5, "late")]));
        let (mut session, _source) = session_for(source);

        session.start_streaming(Instant::now());
        session.stop_streaming();
        release.send(()).unwrap();

        assert!(session.wait_for_outcome(WAIT));
        assert_eq!(session.state().accumulated, vec![rec(5, "late")]);
    }

    #[test]
    fn result_for_previous_group_is_discarded() {
        let (source, release) = FakeSource::gated();
        let source = source.respond(Ok(vec![rec(1, "old group")]));
        let (mut session, _source) = session_for(source);

        session.refresh();
        session.select_group(group("supplier-matcher"));
        release.send(()).unwrap();

        assert!(session.wait_for_outcome(WAIT));
        assert!(session.state().accumulated.is_empty());
        assert!(!session.is_fetching());
    }

    #[test]
    fn group_change_and_clear_empty_accumulated() {
        let source = FakeSource::new().respond(Ok(vec![rec(1, "a")]));
        let (mut session, _source) = session_for(source);
        session.refresh();
        session.wait_for_outcome(WAIT);
        assert_eq!(session.state().accumulated.len(), 1);

        session.select_group(group("email-processor"));
        assert_eq!(session.state().accumulated.len(), 1);

        session.select_group(group("email-parser"));
        assert!(session.state().accumulated.is_empty());

        session.state.accumulated.push(rec(2, "b"));
        session.clear();
        assert!(session.state().accumulated.is_empty());
    }

    #[test]
    fn projection_uses_correlation_filter() {
        let source = FakeSource::new().respond(Ok(vec![
            rec(1, "processing email-123"),
            rec(2, "unrelated"),
        ]));
        let (mut session, _source) = session_for(source);
        session.refresh();
        session.wait_for_outcome(WAIT);

        session.set_correlation(Some("email-123".to_string()));
        let view = session.projection();
        assert_eq!(view, vec![&rec(1, "processing email-123")]);
        assert_eq!(session.state().accumulated.len(), 2);

        session.set_correlation(None);
        assert_eq!(session.projection().len(), 2);
    }

    #[test]
    fn scroll_request_fires_once_after_delay() {
        let source = FakeSource::new().respond(Ok(vec![rec(1, "a")]));
        let (mut session, _source) = session_for(source);
        session.refresh();
        session.wait_for_outcome(WAIT);

        let now = Instant::now();
        assert!(session.take_scroll_request(now + SCROLL_DELAY));
        assert!(!session.take_scroll_request(now + SCROLL_DELAY * 2));
    }

    #[test]
    fn discovery_selects_default_group() {
        let source = FakeSource::new().with_groups(Ok(vec![
            group("billing"),
            group("supplier-matcher"),
            group("email-processor-prod"),
        ]));
        let source = Arc::new(source);
        let mut session = StreamSession::new(Arc::clone(&source), "/aws/lambda/");

        assert!(session.discover_groups());
        assert!(session.wait_for_outcome(WAIT));

        assert_eq!(
            session.state().selected_group,
            Some(group("email-processor-prod"))
        );
        assert_eq!(session.catalog().relevant.len(), 2);
        assert_eq!(session.catalog().all.len(), 3);
        assert!(!session.is_discovering());
    }

    #[test]
    fn failed_discovery_records_error_without_selection() {
        let source = FakeSource::new().with_groups(Err(io_error("access denied")));
        let source = Arc::new(source);
        let mut session = StreamSession::new(Arc::clone(&source), "/aws/lambda/");

        session.discover_groups();
        session.wait_for_outcome(WAIT);

        assert!(session.state().selected_group.is_none());
        assert!(session
            .state()
            .last_error
            .as_deref()
            .unwrap()
            .contains("access denied"));
    }

    #[test]
    fn streaming_survives_fetch_error_and_retries_on_next_tick() {
        let source = FakeSource::new()
            .respond(Err(io_error("throttled")))
            .respond(Ok(vec![rec(1, "recovered")]));
        let (mut session, source) = session_for(source);
        let t0 = Instant::now();

        session.start_streaming(t0);
        assert!(session.wait_for_outcome(WAIT));
        assert!(session.state().is_streaming);
        assert!(session.scheduler().is_armed());
        assert!(session
            .state()
            .last_error
            .as_deref()
            .unwrap()
            .contains("throttled"));

        session.tick(t0 + Duration::from_secs(3));
        assert!(session.wait_for_outcome(WAIT));

        assert_eq!(source.calls(), 2);
        assert!(session.state().is_streaming);
        assert!(session.state().last_error.is_none());
        assert_eq!(session.state().accumulated, vec![rec(1, "recovered")]);
    }

    #[test]
    fn rediscovery_keeps_listed_selection_and_drops_vanished_one() {
        let source = FakeSource::new()
            .with_groups(Ok(vec![group("email-processor"), group("supplier-matcher")]))
            .with_groups(Ok(vec![group("supplier-matcher"), group("email-processor")]))
            .with_groups(Ok(vec![group("billing")]))
            .respond(Ok(vec![rec(1, "a")]));
        let source = Arc::new(source);
        let mut session = StreamSession::new(Arc::clone(&source), "/aws/lambda/");

        session.discover_groups();
        session.wait_for_outcome(WAIT);
        session.select_group(group("supplier-matcher"));
        session.refresh();
        session.wait_for_outcome(WAIT);

        session.discover_groups();
        session.wait_for_outcome(WAIT);
        assert_eq!(session.state().selected_group, Some(group("supplier-matcher")));
        assert_eq!(session.state().accumulated, vec![rec(1, "a")]);

        session.discover_groups();
        session.wait_for_outcome(WAIT);
        assert!(session.state().selected_group.is_none());
        assert!(session.state().accumulated.is_empty());
        assert!(session.catalog().diagnostic.is_some());
        assert!(!session.refresh());
    }

    #[test]
    fn successful_rediscovery_clears_discovery_error() {
        let source = FakeSource::new()
            .with_groups(Err(io_error("access denied")))
            .with_groups(Ok(vec![group("email-processor")]));
        let source = Arc::new(source);
        let mut session = StreamSession::new(Arc::clone(&source), "/aws/lambda/");

        session.discover_groups();
        session.wait_for_outcome(WAIT);
        assert!(session.state().last_error.is_some());

        session.discover_groups();
        session.wait_for_outcome(WAIT);
        assert!(session.state().last_error.is_none());
        assert_eq!(session.state().selected_group, Some(group("email-processor")));
    }

    #[test]
    fn new_records_are_only_kept_when_tracked() {
        let source = FakeSource::new()
            .respond(Ok(vec![rec(1, "a")]))
            .respond(Ok(vec![rec(1, "a"), rec(2, "b")]))
            .respond(Ok(vec![rec(3, "c")]));
        let (mut session, _source) = session_for(source);

        session.dispatch_fetch(true);
        session.wait_for_outcome(WAIT);
        assert!(session.new_records.is_empty());
        assert!(session.take_new_records().is_empty());

        session.track_new_records(true);
        session.dispatch_fetch(true);
        session.wait_for_outcome(WAIT);
        assert_eq!(session.take_new_records(), vec![rec(2, "b")]);

        session.track_new_records(false);
        session.dispatch_fetch(true);
        session.wait_for_outcome(WAIT);
        assert!(session.new_records.is_empty());
        assert_eq!(session.state().accumulated.len(), 3);
    }

    #[test]
    fn dropping_streaming_session_with_fetch_in_flight() {
        let (source, release) = FakeSource::gated();
        let (mut session, source) = session_for(source);
        session.start_streaming(Instant::now());
        drop(session);
        release.send(()).unwrap();

        let deadline = Instant::now() + WAIT;
        while source.calls() == 0 && Instant::now() < deadline {
            std::thread::sleep(Duration::from_millis(10));
        }
        assert_eq!(source.calls(), 1);
    }
}
