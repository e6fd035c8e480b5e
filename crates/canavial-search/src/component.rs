//! The city search box: state, effects, and host wiring in one owner.

use std::sync::Arc;

use canavial_core::{SearchConfig, SearchError};
use tokio::sync::mpsc;

use crate::dismissal::{DismissalWatcher, PointerEvent, Rect};
use crate::keyboard::Key;
use crate::lookup::CityLookup;
use crate::scheduler::{EffectScheduler, SearchMessage};
use crate::state::{Event, InputSource, SearchState};
use crate::types::{City, LookupError};
use crate::view::{render, View};

/// Callbacks into the application hosting the search box.
pub trait SearchHost {
    /// A city was confirmed, by a row press or by host assignment.
    fn on_city_select(&mut self, city: &City);
    /// The user cleared the field.
    fn on_clear(&mut self);
}

/// Owns a [`SearchState`] and everything that reacts to it.
///
/// All transitions happen on the caller's task: user intents are applied
/// immediately, and async results arrive through [`next_message`] and are
/// applied with [`handle_message`].
///
/// [`next_message`]: CitySearchBox::next_message
/// [`handle_message`]: CitySearchBox::handle_message
pub struct CitySearchBox<L, H> {
    state: SearchState,
    scheduler: EffectScheduler<L>,
    messages: mpsc::UnboundedReceiver<SearchMessage>,
    watcher: DismissalWatcher,
    host: H,
    selected_city: Option<City>,
}

impl<L: CityLookup, H: SearchHost> CitySearchBox<L, H> {
    /// Mount a search box. Must be called inside a tokio runtime.
    pub fn mount(lookup: Arc<L>, host: H, config: &SearchConfig) -> Self {
        let (tx, messages) = mpsc::unbounded_channel();
        let mut watcher = DismissalWatcher::default();
        watcher.register();

        tracing::debug!(
            "City search mounted (debounce {:?}, min {} chars)",
            config.debounce(),
            config.min_query_chars
        );

        Self {
            state: SearchState::with_min_query_chars(config.min_query_chars),
            scheduler: EffectScheduler::new(lookup, config.debounce(), tx),
            messages,
            watcher,
            host,
            selected_city: None,
        }
    }

    pub fn state(&self) -> &SearchState {
        &self.state
    }

    pub fn view(&self) -> View {
        render(&self.state)
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    pub fn scheduler(&self) -> &EffectScheduler<L> {
        &self.scheduler
    }

    /// Apply one event and let the scheduler react to the result.
    pub fn dispatch(&mut self, event: Event) {
        tracing::trace!("dispatch {:?}", event);
        let state = std::mem::take(&mut self.state);
        self.state = state.reduce(event);
        self.scheduler.sync(&self.state);
    }

    pub fn input_changed(&mut self, text: impl Into<String>) {
        self.dispatch(Event::InputChanged {
            text: text.into(),
            source: InputSource::User,
        });
    }

    pub fn key_down(&mut self, key: Key) {
        if let Some(event) = key.event() {
            self.dispatch(event);
        }
    }

    pub fn focus_gained(&mut self) {
        self.dispatch(Event::DropdownOpen);
    }

    /// A suggestion row was pressed.
    ///
    /// Consumes the pointer event so the dismissal watcher ignores it.
    /// Returns false when no such row is showing.
    pub fn suggestion_pressed(&mut self, index: usize, event: &mut PointerEvent) -> bool {
        event.prevent_default();

        if !self.state.dropdown_open() {
            return false;
        }
        let Some(city) = self.state.suggestions().get(index).cloned() else {
            return false;
        };

        self.scheduler.cancel_in_flight();
        self.dispatch(Event::CitySelected(city.clone()));
        tracing::info!("City selected: {}", city.display_label());
        self.host.on_city_select(&city);
        true
    }

    /// The clear control was pressed. Returns false when the field was already empty.
    pub fn clear_pressed(&mut self) -> bool {
        if self.state.input_text().is_empty() {
            return false;
        }
        self.dispatch(Event::SelectionCleared);
        tracing::info!("City search cleared");
        self.host.on_clear();
        true
    }

    /// Document-level pointer-down, after inner controls have seen it.
    pub fn pointer_down(&mut self, event: &PointerEvent) {
        if let Some(close) = self.watcher.observe(event) {
            self.dispatch(close);
        }
    }

    /// Layout pass: where the search box sits on screen.
    pub fn set_bounds(&mut self, bounds: Rect) {
        self.watcher.set_bounds(bounds);
    }

    /// Host-assigned selection.
    ///
    /// A new city cancels any pending lookup, is mirrored into the box, and
    /// is confirmed through `on_city_select` once. Re-assigning the same city
    /// is a no-op.
    pub fn set_selected_city(&mut self, city: Option<City>) {
        if city == self.selected_city {
            return;
        }
        self.selected_city = city.clone();

        if let Some(city) = city {
            tracing::info!("City assigned by host: {}", city.display_label());
            self.scheduler.cancel_in_flight();
            self.dispatch(Event::CitySelected(city.clone()));
            self.host.on_city_select(&city);
        }
    }

    /// Wait for the next timer or lookup message.
    pub async fn next_message(&mut self) -> Option<SearchMessage> {
        self.messages.recv().await
    }

    /// Turn an effect message into state changes.
    pub fn handle_message(&mut self, message: SearchMessage) {
        match message {
            SearchMessage::DebounceElapsed {
                timer,
                request_id,
                query,
            } => {
                if let Some(event) = self.scheduler.fire(timer, request_id, query) {
                    self.dispatch(event);
                }
            }
            SearchMessage::LookupDone { request_id, result } => {
                self.scheduler.settle(request_id);
                let event = match result {
                    Ok(suggestions) => Event::SuggestionsSucceeded {
                        request_id,
                        suggestions,
                    },
                    // Whitespace-padded input can pass the length gate and
                    // still be too short once trimmed; that is not a failure.
                    Err(LookupError::QueryTooShort(query)) => {
                        tracing::debug!("Lookup #{} skipped short query {:?}", request_id, query);
                        Event::SuggestionsSucceeded {
                            request_id,
                            suggestions: Vec::new(),
                        }
                    }
                    Err(e) if e.is_cancelled() => {
                        if request_id != self.state.request_id() {
                            tracing::debug!(
                                "Dropping cancellation of superseded lookup #{}",
                                request_id
                            );
                            return;
                        }
                        Event::SuggestionsAborted
                    }
                    Err(e) => {
                        tracing::warn!("City lookup #{} failed: {}", request_id, e);
                        let error: SearchError = e.into();
                        Event::SuggestionsFailed {
                            request_id,
                            message: error.user_message().to_string(),
                        }
                    }
                };
                self.dispatch(event);
            }
        }
    }

    /// Wait for and apply the next message. Returns false if the channel closed.
    pub async fn process_next(&mut self) -> bool {
        match self.next_message().await {
            Some(message) => {
                self.handle_message(message);
                true
            }
            None => false,
        }
    }

    /// Apply every message already queued, without waiting.
    pub fn process_pending(&mut self) -> usize {
        let mut handled = 0;
        while let Ok(message) = self.messages.try_recv() {
            self.handle_message(message);
            handled += 1;
        }
        handled
    }

    /// Tear down: stop listening, drop timers, cancel the lookup.
    pub fn unmount(mut self) -> H {
        self.watcher.deregister();
        self.scheduler.shutdown();
        tracing::debug!("City search unmounted");
        self.host
    }
}
