//! Debounced, single-flight lookup scheduling.
//!
//! The scheduler never touches [`SearchState`] directly. It watches each new
//! state through [`EffectScheduler::sync`] and reports back over an mpsc
//! channel; the owner turns those messages into [`Event`]s.
//!
//! Must be used from within a tokio runtime.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::lookup::CityLookup;
use crate::state::{Event, Mode, RequestId, SearchState};
use crate::types::{City, LookupError};

/// Messages sent from timers and lookups back to the owning component.
#[derive(Debug)]
pub enum SearchMessage {
    /// A debounce timer expired. `timer` identifies which arming it was.
    DebounceElapsed {
        timer: u64,
        request_id: RequestId,
        query: String,
    },
    /// A lookup resolved, failed, or was cancelled.
    LookupDone {
        request_id: RequestId,
        result: Result<Vec<City>, LookupError>,
    },
}

/// The parts of the state the debounce effect is keyed on.
#[derive(Debug, Clone, PartialEq, Eq)]
struct EffectKey {
    input_text: String,
    has_selection: bool,
    mode: Mode,
    request_id: RequestId,
}

impl EffectKey {
    fn of(state: &SearchState) -> Self {
        Self {
            input_text: state.input_text().to_string(),
            has_selection: state.selection().is_some(),
            mode: state.mode(),
            request_id: state.request_id(),
        }
    }
}

#[derive(Debug)]
struct PendingTimer {
    id: u64,
    handle: JoinHandle<()>,
}

#[derive(Debug)]
struct InFlight {
    request_id: RequestId,
    query: String,
    token: CancellationToken,
}

pub struct EffectScheduler<L> {
    lookup: Arc<L>,
    debounce: Duration,
    tx: mpsc::UnboundedSender<SearchMessage>,
    timer: Option<PendingTimer>,
    next_timer_id: u64,
    in_flight: Option<InFlight>,
    last_key: Option<EffectKey>,
    lookups_issued: u64,
}

impl<L> EffectScheduler<L> {
    /// Discard the pending debounce timer, if any.
    pub fn clear_timer(&mut self) -> bool {
        match self.timer.take() {
            Some(timer) => {
                timer.handle.abort();
                true
            }
            None => false,
        }
    }

    /// Signal the outstanding lookup to stop. Idempotent.
    pub fn cancel_in_flight(&mut self) -> bool {
        match self.in_flight.take() {
            Some(flight) => {
                tracing::debug!(
                    "Cancelling lookup #{} for {:?}",
                    flight.request_id,
                    flight.query
                );
                flight.token.cancel();
                true
            }
            None => false,
        }
    }

    /// Release the in-flight handle once its lookup has reported back.
    pub fn settle(&mut self, request_id: RequestId) {
        if self
            .in_flight
            .as_ref()
            .is_some_and(|f| f.request_id == request_id)
        {
            self.in_flight = None;
        }
    }

    /// Teardown: no timer or lookup outlives the component.
    pub fn shutdown(&mut self) {
        self.clear_timer();
        self.cancel_in_flight();
    }

    pub fn has_pending_timer(&self) -> bool {
        self.timer.is_some()
    }

    pub fn in_flight_request(&self) -> Option<RequestId> {
        self.in_flight.as_ref().map(|f| f.request_id)
    }

    /// Total lookups started since mount.
    pub fn lookups_issued(&self) -> u64 {
        self.lookups_issued
    }
}

impl<L: CityLookup> EffectScheduler<L> {
    pub fn new(
        lookup: Arc<L>,
        debounce: Duration,
        tx: mpsc::UnboundedSender<SearchMessage>,
    ) -> Self {
        Self {
            lookup,
            debounce,
            tx,
            timer: None,
            next_timer_id: 0,
            in_flight: None,
            last_key: None,
            lookups_issued: 0,
        }
    }

    /// React to a new state.
    ///
    /// Re-arms the debounce timer whenever the keyed fields change while the
    /// state wants a lookup. A lookup that failed back into `Typing` does not
    /// re-arm while its error stands; the next keystroke clears it and retries.
    pub fn sync(&mut self, state: &SearchState) {
        let key = EffectKey::of(state);
        if self.last_key.as_ref() == Some(&key) {
            return;
        }
        let previous = self.last_key.replace(key);

        if self.clear_timer() {
            tracing::trace!("Debounce timer cleared");
        }

        if !state.wants_lookup() {
            return;
        }

        let failed_here = previous.is_some_and(|prev| {
            prev.mode == Mode::SuggestionsLoading && prev.input_text == state.input_text()
        });
        if failed_here && state.error().is_some() {
            tracing::debug!("Lookup failed for {:?}; waiting for input", state.input_text());
            return;
        }

        self.arm(state.request_id() + 1, state.input_text().to_string());
    }

    fn arm(&mut self, request_id: RequestId, query: String) {
        self.next_timer_id += 1;
        let id = self.next_timer_id;
        let tx = self.tx.clone();
        let delay = self.debounce;

        tracing::debug!("Debounce armed for {:?} ({:?})", query, delay);
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = tx.send(SearchMessage::DebounceElapsed {
                timer: id,
                request_id,
                query,
            });
        });

        self.timer = Some(PendingTimer { id, handle });
    }

    /// Handle an expired debounce timer.
    ///
    /// Returns the `SuggestionsRequested` event to dispatch, or `None` when
    /// the timer had already been cleared.
    pub fn fire(&mut self, timer: u64, request_id: RequestId, query: String) -> Option<Event> {
        match &self.timer {
            Some(pending) if pending.id == timer => {}
            _ => {
                tracing::trace!("Ignoring cleared debounce timer {}", timer);
                return None;
            }
        }
        self.timer = None;

        self.cancel_in_flight();
        self.start_lookup(request_id, query);
        Some(Event::SuggestionsRequested { request_id })
    }

    fn start_lookup(&mut self, request_id: RequestId, query: String) {
        let token = CancellationToken::new();
        let task_token = token.clone();
        let lookup = Arc::clone(&self.lookup);
        let tx = self.tx.clone();
        let task_query = query.clone();

        tracing::debug!("Issuing lookup #{} for {:?}", request_id, query);
        tokio::spawn(async move {
            // Poll the lookup first so it always sees its token, even one
            // cancelled before this task ran.
            let result = tokio::select! {
                biased;
                result = lookup.lookup_cities(&task_query, task_token.clone()) => result,
                _ = task_token.cancelled() => Err(LookupError::Cancelled),
            };
            // A result that raced a cancel is still a cancellation.
            let result = if task_token.is_cancelled() {
                Err(LookupError::Cancelled)
            } else {
                result
            };
            let _ = tx.send(SearchMessage::LookupDone { request_id, result });
        });

        self.lookups_issued += 1;
        self.in_flight = Some(InFlight {
            request_id,
            query,
            token,
        });
    }
}

impl<L> Drop for EffectScheduler<L> {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::InputSource;
    use crate::testing::{city, Reply, ScriptedLookup};

    const DEBOUNCE: Duration = Duration::from_millis(300);

    fn typed(state: SearchState, text: &str) -> SearchState {
        state.reduce(Event::InputChanged {
            text: text.to_string(),
            source: InputSource::User,
        })
    }

    fn scheduler(
        lookup: Arc<ScriptedLookup>,
    ) -> (
        EffectScheduler<ScriptedLookup>,
        mpsc::UnboundedReceiver<SearchMessage>,
    ) {
        let (tx, rx) = mpsc::unbounded_channel();
        (EffectScheduler::new(lookup, DEBOUNCE, tx), rx)
    }

    async fn next_debounce(
        rx: &mut mpsc::UnboundedReceiver<SearchMessage>,
    ) -> (u64, RequestId, String) {
        match rx.recv().await {
            Some(SearchMessage::DebounceElapsed {
                timer,
                request_id,
                query,
            }) => (timer, request_id, query),
            other => panic!("expected debounce, got {:?}", other),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn short_input_never_arms() {
        let (mut sched, _rx) = scheduler(ScriptedLookup::new());
        sched.sync(&typed(SearchState::default(), "S"));
        assert!(!sched.has_pending_timer());
    }

    #[tokio::test(start_paused = true)]
    async fn timer_fires_after_debounce() {
        let (mut sched, mut rx) = scheduler(ScriptedLookup::new());
        let state = typed(SearchState::default(), "Sa");
        sched.sync(&state);
        assert!(sched.has_pending_timer());

        let start = tokio::time::Instant::now();
        let msg = rx.recv().await.unwrap();
        assert!(start.elapsed() >= DEBOUNCE);
        match msg {
            SearchMessage::DebounceElapsed {
                request_id, query, ..
            } => {
                assert_eq!(request_id, 1);
                assert_eq!(query, "Sa");
            }
            other => panic!("unexpected message {:?}", other),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn rearming_discards_previous_timer() {
        let (mut sched, mut rx) = scheduler(ScriptedLookup::new());
        let s1 = typed(SearchState::default(), "Sa");
        sched.sync(&s1);
        tokio::time::sleep(Duration::from_millis(100)).await;
        let s2 = typed(s1, "Sao");
        sched.sync(&s2);

        let Some(SearchMessage::DebounceElapsed { query, .. }) = rx.recv().await else {
            panic!("expected debounce");
        };
        assert_eq!(query, "Sao");
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn stale_timer_id_is_ignored() {
        let (mut sched, _rx) = scheduler(ScriptedLookup::new());
        sched.sync(&typed(SearchState::default(), "Sa"));
        assert!(sched.fire(999, 1, "Sa".into()).is_none());
        assert_eq!(sched.lookups_issued(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn fire_cancels_previous_lookup() {
        let lookup = ScriptedLookup::new();
        lookup.respond("Sa", Duration::from_secs(5), Reply::Cities(vec![city("Santos")]));
        let (mut sched, mut rx) = scheduler(Arc::clone(&lookup));

        let s1 = typed(SearchState::default(), "Sa");
        sched.sync(&s1);
        let (timer, request_id, query) = next_debounce(&mut rx).await;
        let event = sched.fire(timer, request_id, query).unwrap();
        assert_eq!(event, Event::SuggestionsRequested { request_id: 1 });
        assert_eq!(sched.in_flight_request(), Some(1));
        let s1 = s1.reduce(event);
        sched.sync(&s1);

        let s2 = typed(s1, "Sao");
        sched.sync(&s2);
        let (timer, request_id, query) = next_debounce(&mut rx).await;
        sched.fire(timer, request_id, query).unwrap();
        assert_eq!(sched.in_flight_request(), Some(2));

        // The first lookup reports a cancellation, never its cities.
        let Some(SearchMessage::LookupDone { request_id, result }) = rx.recv().await else {
            panic!("expected lookup result");
        };
        assert_eq!(request_id, 1);
        assert!(matches!(result, Err(LookupError::Cancelled)));
        assert_eq!(sched.lookups_issued(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn failure_does_not_rearm_until_input_changes() {
        let lookup = ScriptedLookup::new();
        lookup.respond("Sa", Duration::from_millis(10), Reply::Fail(500));
        let (mut sched, _rx) = scheduler(lookup);

        let loading = typed(SearchState::default(), "Sa")
            .reduce(Event::SuggestionsRequested { request_id: 1 });
        sched.sync(&loading);
        let failed = loading.reduce(Event::SuggestionsFailed {
            request_id: 1,
            message: "x".into(),
        });
        sched.sync(&failed);
        assert!(!sched.has_pending_timer());

        sched.sync(&typed(failed, "San"));
        assert!(sched.has_pending_timer());
    }

    #[tokio::test(start_paused = true)]
    async fn same_text_while_loading_rearms() {
        let (mut sched, _rx) = scheduler(ScriptedLookup::new());

        let loading = typed(SearchState::default(), "Sa")
            .reduce(Event::SuggestionsRequested { request_id: 1 });
        sched.sync(&loading);
        assert!(!sched.has_pending_timer());

        let retyped = typed(loading, "Sa");
        assert_eq!(retyped.mode(), Mode::Typing);
        sched.sync(&retyped);
        assert!(sched.has_pending_timer());
    }

    #[tokio::test(start_paused = true)]
    async fn abort_without_error_rearms() {
        let (mut sched, _rx) = scheduler(ScriptedLookup::new());

        let loading = typed(SearchState::default(), "Sa")
            .reduce(Event::SuggestionsRequested { request_id: 1 });
        sched.sync(&loading);
        let aborted = loading.reduce(Event::SuggestionsAborted);
        sched.sync(&aborted);
        assert!(sched.has_pending_timer());
    }

    #[tokio::test(start_paused = true)]
    async fn selection_clears_timer() {
        let (mut sched, _rx) = scheduler(ScriptedLookup::new());
        let s = typed(SearchState::default(), "Sa");
        sched.sync(&s);
        sched.sync(&s.reduce(Event::CitySelected(city("Santos"))));
        assert!(!sched.has_pending_timer());
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_is_idempotent() {
        let lookup = ScriptedLookup::new();
        lookup.respond("Sa", Duration::from_secs(5), Reply::Cities(Vec::new()));
        let (mut sched, mut rx) = scheduler(Arc::clone(&lookup));
        let s = typed(SearchState::default(), "Sa");
        sched.sync(&s);
        let (timer, request_id, query) = next_debounce(&mut rx).await;
        sched.fire(timer, request_id, query);

        sched.shutdown();
        sched.shutdown();
        assert!(!sched.cancel_in_flight());
        assert!(!sched.has_pending_timer());
        let Some(SearchMessage::LookupDone { result, .. }) = rx.recv().await else {
            panic!("expected lookup result");
        };
        assert!(result.unwrap_err().is_cancelled());
    }
}
