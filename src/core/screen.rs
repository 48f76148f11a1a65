//! State holder for the soldier lookup screen.
//!
//! All observable state lives in one `watch` channel so a subscriber can
//! never see a half-applied update (say, a new bundle next to the previous
//! error). [`ScreenView`] exposes the four values a UI binds to: bundle,
//! query text, loading flag and error message.
//!
//! Each query runs as its own task. Starting another query or calling
//! [`LookupScreen::reset`] first bumps a generation counter under the
//! channel lock and only then aborts the running task, so neither a late
//! finisher nor a dropped task can overwrite newer state.

use crate::core::facade::LookupFacade;
use crate::domain::model::{QueryPhase, ResultBundle};
use crate::domain::ports::DataAccess;
use crate::utils::error::{ErrorSeverity, Result};
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::watch;
use tokio::task::{AbortHandle, JoinHandle};

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ScreenState {
    pub query_text: String,
    pub bundle: ResultBundle,
    pub loading: bool,
    pub error: Option<String>,
    /// Severity of the failure behind `error`, for exit codes and styling.
    pub error_severity: Option<ErrorSeverity>,
    pub phase: QueryPhase,
}

/// Read-only view over the screen state.
#[derive(Clone)]
pub struct ScreenView {
    rx: watch::Receiver<ScreenState>,
}

impl ScreenView {
    pub fn bundle(&self) -> ResultBundle {
        self.rx.borrow().bundle.clone()
    }

    pub fn query_text(&self) -> String {
        self.rx.borrow().query_text.clone()
    }

    pub fn is_loading(&self) -> bool {
        self.rx.borrow().loading
    }

    pub fn error(&self) -> Option<String> {
        self.rx.borrow().error.clone()
    }

    pub fn error_severity(&self) -> Option<ErrorSeverity> {
        self.rx.borrow().error_severity
    }

    pub fn phase(&self) -> QueryPhase {
        self.rx.borrow().phase
    }

    pub fn snapshot(&self) -> ScreenState {
        self.rx.borrow().clone()
    }

    /// Waits for the next published change. Returns `false` once the
    /// screen has been dropped.
    pub async fn changed(&mut self) -> bool {
        self.rx.changed().await.is_ok()
    }

    /// Waits until no query is loading and returns that state.
    pub async fn settled(&mut self) -> ScreenState {
        if let Ok(state) = self.rx.wait_for(|state| !state.loading).await {
            return state.clone();
        }
        // sender gone, last value is final
        self.rx.borrow().clone()
    }
}

/// Which entry point started a query.
#[derive(Debug, Clone)]
enum Query {
    Text(String),
    Handle(String),
}

pub struct LookupScreen<D: DataAccess + 'static> {
    facade: Arc<LookupFacade<D>>,
    state: Arc<watch::Sender<ScreenState>>,
    generation: Arc<AtomicU64>,
    in_flight: Mutex<Option<AbortHandle>>,
}

impl<D: DataAccess + 'static> LookupScreen<D> {
    pub fn new(facade: LookupFacade<D>) -> Self {
        let (state, _) = watch::channel(ScreenState::default());
        Self {
            facade: Arc::new(facade),
            state: Arc::new(state),
            generation: Arc::new(AtomicU64::new(0)),
            in_flight: Mutex::new(None),
        }
    }

    pub fn view(&self) -> ScreenView {
        ScreenView {
            rx: self.state.subscribe(),
        }
    }

    pub fn snapshot(&self) -> ScreenState {
        self.state.borrow().clone()
    }

    pub fn set_query_text(&self, text: impl Into<String>) {
        let text = text.into();
        self.state.send_if_modified(|state| {
            if state.query_text == text {
                return false;
            }
            state.query_text = text;
            true
        });
    }

    /// Looks up whatever is in the query text. Must be called from within a
    /// Tokio runtime.
    pub fn load_by_id(&self) -> JoinHandle<()> {
        let text = self.state.borrow().query_text.clone();
        self.start(Query::Text(text))
    }

    /// Looks up a record by the store's document handle. On success the
    /// query text is replaced with the resolved service number.
    pub fn load_by_handle(&self, handle: impl Into<String>) -> JoinHandle<()> {
        self.start(Query::Handle(handle.into()))
    }

    /// Back to the initial state, cancelling any running query.
    pub fn reset(&self) {
        let generation = &self.generation;
        self.state.send_modify(|state| {
            generation.fetch_add(1, Ordering::SeqCst);
            *state = ScreenState::default();
        });
        // only after the bump, so the aborted task's guard sees itself stale
        self.replace_in_flight(None);
        tracing::debug!("Lookup screen reset");
    }

    fn start(&self, query: Query) -> JoinHandle<()> {
        let mut generation = 0;
        let counter = &self.generation;
        self.state.send_modify(|state| {
            generation = counter.fetch_add(1, Ordering::SeqCst) + 1;
            state.loading = true;
            state.error = None;
            state.error_severity = None;
            state.phase = QueryPhase::Validating;
        });

        let guard = CommitGuard {
            state: Arc::clone(&self.state),
            generation: Arc::clone(&self.generation),
            expected: generation,
            done: false,
        };
        let facade = Arc::clone(&self.facade);

        let task = tokio::spawn(async move {
            let mut guard = guard;
            let outcome = {
                let progress = |phase: QueryPhase| guard.publish_phase(phase);
                match &query {
                    Query::Text(text) => facade.resolve_with_progress(text, &progress).await,
                    Query::Handle(handle) => {
                        facade.resolve_handle_with_progress(handle, &progress).await
                    }
                }
            };
            guard.commit(outcome, matches!(query, Query::Handle(_)));
        });

        self.replace_in_flight(Some(task.abort_handle()));
        task
    }

    /// Swaps the tracked task and aborts the one it replaces. Callers bump
    /// the generation first.
    fn replace_in_flight(&self, next: Option<AbortHandle>) {
        let previous = std::mem::replace(
            &mut *self.in_flight.lock().unwrap_or_else(PoisonError::into_inner),
            next,
        );
        if let Some(handle) = previous {
            handle.abort();
        }
    }
}

impl<D: DataAccess + 'static> Drop for LookupScreen<D> {
    fn drop(&mut self) {
        self.replace_in_flight(None);
    }
}

/// Publishes a query's outcome. If the task dies before committing, the
/// drop still clears the loading flag, unless a newer query owns the state.
struct CommitGuard {
    state: Arc<watch::Sender<ScreenState>>,
    generation: Arc<AtomicU64>,
    expected: u64,
    done: bool,
}

impl CommitGuard {
    fn is_current(&self) -> bool {
        self.generation.load(Ordering::SeqCst) == self.expected
    }

    fn publish_phase(&self, phase: QueryPhase) {
        self.state.send_if_modified(|state| {
            if !self.is_current() || state.phase == phase {
                return false;
            }
            state.phase = phase;
            true
        });
    }

    fn commit(&mut self, outcome: Result<ResultBundle>, sync_query_text: bool) {
        self.done = true;
        let committed = self.state.send_if_modified(|state| {
            if !self.is_current() {
                return false;
            }
            match outcome {
                Ok(bundle) => {
                    if sync_query_text {
                        if let Some(soldier) = &bundle.soldier {
                            state.query_text = soldier.id.to_string();
                        }
                    }
                    state.bundle = bundle;
                    state.error = None;
                    state.error_severity = None;
                    state.phase = QueryPhase::Ready;
                }
                Err(e) => {
                    if e.is_user_facing() {
                        tracing::info!(
                            error = %e,
                            category = ?e.category(),
                            "Lookup failed: {}",
                            e.recovery_suggestion()
                        );
                    } else {
                        tracing::warn!(
                            error = %e,
                            category = ?e.category(),
                            "Lookup failed unexpectedly: {}",
                            e.recovery_suggestion()
                        );
                    }
                    state.bundle = ResultBundle::default();
                    state.error = Some(e.user_friendly_message());
                    state.error_severity = Some(e.severity());
                    state.phase = QueryPhase::Error;
                }
            }
            state.loading = false;
            true
        });

        if !committed {
            tracing::debug!(generation = self.expected, "Dropped result of superseded query");
        }
    }
}

impl Drop for CommitGuard {
    fn drop(&mut self) {
        if self.done {
            return;
        }
        self.state.send_if_modified(|state| {
            if !self.is_current() {
                return false;
            }
            tracing::warn!(generation = self.expected, "Lookup task ended without a result");
            state.bundle = ResultBundle::default();
            state.error = Some("lookup was interrupted".to_string());
            state.error_severity = Some(ErrorSeverity::Critical);
            state.phase = QueryPhase::Error;
            state.loading = false;
            true
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::sampler::VisitSampler;
    use crate::core::test_support::MockDataAccess;
    use crate::domain::model::SoldierId;
    use std::time::Duration;

    fn screen(data: MockDataAccess) -> LookupScreen<MockDataAccess> {
        LookupScreen::new(LookupFacade::new(data, VisitSampler::seeded(11)))
    }

    fn full_record() -> MockDataAccess {
        MockDataAccess::new()
            .with_soldier(42, Some("500001"))
            .with_status(42, "Active")
            .with_postings(42, 5)
            .with_visits(42, 4)
            .with_location("500001", "Hyderabad")
    }

    #[tokio::test]
    async fn test_initial_state() {
        let screen = screen(MockDataAccess::new());
        let view = screen.view();

        assert_eq!(view.snapshot(), ScreenState::default());
        assert_eq!(view.query_text(), "");
        assert!(view.bundle().is_empty());
        assert!(!view.is_loading());
        assert_eq!(view.error(), None);
        assert_eq!(view.phase(), QueryPhase::Idle);
    }

    #[tokio::test]
    async fn test_successful_lookup_publishes_bundle() {
        let screen = screen(full_record());
        let view = screen.view();

        screen.set_query_text("42");
        screen.load_by_id().await.unwrap();

        let state = view.snapshot();
        assert!(!state.loading);
        assert_eq!(state.error, None);
        assert_eq!(state.phase, QueryPhase::Ready);
        assert!(state.phase.is_terminal());
        assert_eq!(state.query_text, "42");
        assert_eq!(state.bundle.postings.len(), 5);
        assert_eq!(state.bundle.visits.len(), 2);
        assert!(state.bundle.status.is_some());
        assert!(state.bundle.birth_location.is_some());
    }

    #[tokio::test]
    async fn test_validation_error_clears_bundle() {
        let data = full_record();
        let screen = screen(data.clone());
        let view = screen.view();

        screen.set_query_text("42");
        screen.load_by_id().await.unwrap();
        assert!(!view.bundle().is_empty());
        let calls_before = data.calls().len();

        screen.set_query_text("abc");
        screen.load_by_id().await.unwrap();

        let state = view.snapshot();
        assert!(state.bundle.is_empty());
        assert_eq!(state.error.as_deref(), Some("invalid identifier"));
        assert_eq!(state.phase, QueryPhase::Error);
        assert!(!state.loading);
        assert_eq!(data.calls().len(), calls_before);
    }

    #[tokio::test]
    async fn test_not_found_leaves_loading_false() {
        let screen = screen(full_record());
        let view = screen.view();

        screen.set_query_text("9999");
        screen.load_by_id().await.unwrap();

        assert!(view.bundle().is_empty());
        assert_eq!(view.error().as_deref(), Some("no record for identifier"));
        assert!(!view.is_loading());
    }

    #[tokio::test]
    async fn test_transport_failure_is_reported() {
        let screen = screen(full_record().failing("record_by_id"));

        screen.set_query_text("42");
        screen.load_by_id().await.unwrap();

        let state = screen.snapshot();
        assert_eq!(
            state.error.as_deref(),
            Some("could not reach the record store")
        );
        assert_eq!(state.error_severity, Some(ErrorSeverity::Medium));
        assert!(!state.loading);
    }

    #[tokio::test]
    async fn test_error_severity_follows_failure_kind() {
        let screen = screen(full_record());
        let view = screen.view();

        screen.set_query_text("abc");
        screen.load_by_id().await.unwrap();
        assert_eq!(view.error_severity(), Some(ErrorSeverity::Low));

        screen.set_query_text("42");
        screen.load_by_id().await.unwrap();
        assert_eq!(view.error(), None);
        assert_eq!(view.error_severity(), None);
    }

    #[tokio::test]
    async fn test_reset_returns_to_initial_state() {
        let screen = screen(full_record());

        screen.set_query_text("42");
        screen.load_by_id().await.unwrap();
        screen.reset();
        assert_eq!(screen.snapshot(), ScreenState::default());

        screen.set_query_text("oops");
        screen.load_by_id().await.unwrap();
        screen.reset();
        assert_eq!(screen.snapshot(), ScreenState::default());

        screen.reset();
        assert_eq!(screen.snapshot(), ScreenState::default());
    }

    #[tokio::test]
    async fn test_reset_cancels_running_query() {
        let data = full_record().slow(42, Duration::from_millis(200));
        let screen = screen(data);

        screen.set_query_text("42");
        let handle = screen.load_by_id();
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(screen.snapshot().loading);

        screen.reset();
        assert!(handle.await.unwrap_err().is_cancelled());
        assert_eq!(screen.snapshot(), ScreenState::default());
    }

    #[tokio::test]
    async fn test_newer_query_wins() {
        let data = full_record()
            .with_soldier(7, None)
            .slow(42, Duration::from_millis(200));
        let screen = screen(data);
        let mut view = screen.view();

        screen.set_query_text("42");
        let first = screen.load_by_id();
        tokio::time::sleep(Duration::from_millis(20)).await;

        screen.set_query_text("7");
        let second = screen.load_by_id();

        second.await.unwrap();
        assert!(first.await.unwrap_err().is_cancelled());

        let state = view.settled().await;
        assert_eq!(state.bundle.soldier.unwrap().id, SoldierId(7));
        assert_eq!(state.phase, QueryPhase::Ready);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_superseded_query_never_publishes_its_own_error() {
        let data = full_record()
            .with_soldier(7, None)
            .slow(42, Duration::from_secs(5))
            .slow(7, Duration::from_millis(20));
        let screen = screen(data);
        let mut view = screen.view();

        screen.set_query_text("7");
        screen.load_by_id().await.unwrap();
        let previous = view.bundle();

        for _ in 0..200 {
            screen.set_query_text("42");
            let first = screen.load_by_id();
            tokio::task::yield_now().await;

            screen.set_query_text("7");
            let second = screen.load_by_id();
            assert!(first.await.unwrap_err().is_cancelled());

            // the cancelled task has been dropped by now
            let state = view.snapshot();
            assert_ne!(state.phase, QueryPhase::Error, "{:?}", state);
            assert_eq!(state.error, None);
            assert_eq!(state.bundle, previous);

            second.await.unwrap();
            let state = view.settled().await;
            assert_eq!(state.phase, QueryPhase::Ready);
            assert_eq!(state.bundle.soldier.unwrap().id, SoldierId(7));
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_reset_during_query_stays_reset() {
        let data = full_record().slow(42, Duration::from_secs(5));
        let screen = screen(data);

        for _ in 0..300 {
            screen.set_query_text("42");
            let handle = screen.load_by_id();
            tokio::task::yield_now().await;

            screen.reset();
            assert!(handle.await.unwrap_err().is_cancelled());
            assert_eq!(screen.snapshot(), ScreenState::default());
        }
    }

    #[tokio::test]
    async fn test_load_by_handle_syncs_query_text() {
        let data = full_record().with_document("doc-42", serde_json::json!({"id": 42}));
        let screen = screen(data);

        screen.load_by_handle("doc-42").await.unwrap();

        let state = screen.snapshot();
        assert_eq!(state.query_text, "42");
        assert_eq!(state.bundle.postings.len(), 5);
        assert_eq!(state.phase, QueryPhase::Ready);
    }

    #[tokio::test]
    async fn test_view_observes_loading_transition() {
        let data = full_record().slow(42, Duration::from_millis(50));
        let screen = screen(data);
        let mut view = screen.view();

        screen.set_query_text("42");
        let handle = screen.load_by_id();

        assert!(view.is_loading());
        let settled = view.settled().await;
        assert!(!settled.loading);
        assert_eq!(settled.phase, QueryPhase::Ready);
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn test_set_query_text_only_notifies_on_change() {
        let screen = screen(MockDataAccess::new());
        let mut view = screen.view();

        screen.set_query_text("");
        assert!(!view.rx.has_changed().unwrap());

        screen.set_query_text("12");
        assert!(view.changed().await);
        assert_eq!(view.query_text(), "12");
    }
}
