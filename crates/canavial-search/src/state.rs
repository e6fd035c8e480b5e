//! Search state and its transition function.
//!
//! [`SearchState::reduce`] is the only place state changes. It is pure: no
//! timers, no IO, no logging.

use crate::types::City;

/// Queries shorter than this never reach the lookup.
pub const MIN_QUERY_CHARS: usize = 2;

/// Identifier of an issued lookup; grows monotonically.
pub type RequestId = u64;

/// Coarse phase of the search lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    #[default]
    Idle,
    Typing,
    SuggestionsLoading,
    SuggestionsReady,
    Selected,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorScope {
    Suggestions,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScopedError {
    pub scope: ErrorScope,
    pub message: String,
}

/// Where an input change came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputSource {
    /// Typed by the user; restarts the search.
    User,
    /// Mirrors an externally assigned label; never triggers a search.
    Programmatic,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    InputChanged { text: String, source: InputSource },
    SuggestionsRequested { request_id: RequestId },
    SuggestionsSucceeded { request_id: RequestId, suggestions: Vec<City> },
    SuggestionsFailed { request_id: RequestId, message: String },
    SuggestionsAborted,
    DropdownOpen,
    DropdownClose,
    HighlightNext,
    HighlightPrev,
    CitySelected(City),
    SelectionCleared,
    ErrorReset,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SearchState {
    input_text: String,
    selection: Option<City>,
    mode: Mode,
    dropdown_open: bool,
    highlighted: Option<usize>,
    suggestions: Vec<City>,
    error: Option<ScopedError>,
    request_id: RequestId,
    min_query_chars: usize,
}

impl Default for SearchState {
    fn default() -> Self {
        Self::with_min_query_chars(MIN_QUERY_CHARS)
    }
}

impl SearchState {
    /// Fresh state with a custom search threshold (clamped to at least 1).
    pub fn with_min_query_chars(min_query_chars: usize) -> Self {
        Self {
            input_text: String::new(),
            selection: None,
            mode: Mode::Idle,
            dropdown_open: false,
            highlighted: None,
            suggestions: Vec::new(),
            error: None,
            request_id: 0,
            min_query_chars: min_query_chars.max(1),
        }
    }

    pub fn input_text(&self) -> &str {
        &self.input_text
    }

    pub fn selection(&self) -> Option<&City> {
        self.selection.as_ref()
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn dropdown_open(&self) -> bool {
        self.dropdown_open
    }

    /// Highlighted suggestion index; `None` when nothing is highlighted.
    pub fn highlighted_index(&self) -> Option<usize> {
        self.highlighted
    }

    pub fn highlighted(&self) -> Option<&City> {
        self.highlighted.and_then(|i| self.suggestions.get(i))
    }

    pub fn suggestions(&self) -> &[City] {
        &self.suggestions
    }

    pub fn error(&self) -> Option<&ScopedError> {
        self.error.as_ref()
    }

    /// Id of the most recently issued lookup.
    pub fn request_id(&self) -> RequestId {
        self.request_id
    }

    pub fn min_query_chars(&self) -> usize {
        self.min_query_chars
    }

    /// True when `text` is long enough to search for.
    pub fn is_searchable(&self, text: &str) -> bool {
        text.chars().count() >= self.min_query_chars
    }

    /// True when the effect scheduler should be waiting to issue a lookup.
    pub fn wants_lookup(&self) -> bool {
        self.selection.is_none()
            && self.mode == Mode::Typing
            && self.is_searchable(&self.input_text)
    }

    /// Apply one event.
    pub fn reduce(self, event: Event) -> Self {
        match event {
            Event::InputChanged {
                text,
                source: InputSource::User,
            } => {
                let searchable = self.is_searchable(&text);
                let (suggestions, highlighted) = if searchable {
                    (self.suggestions, self.highlighted)
                } else {
                    (Vec::new(), None)
                };
                Self {
                    input_text: text,
                    selection: None,
                    mode: if searchable { Mode::Typing } else { Mode::Idle },
                    dropdown_open: searchable,
                    suggestions,
                    highlighted,
                    error: None,
                    ..self
                }
            }
            Event::InputChanged {
                text,
                source: InputSource::Programmatic,
            } => Self {
                input_text: text,
                ..self
            },
            Event::SuggestionsRequested { request_id } => Self {
                request_id,
                mode: Mode::SuggestionsLoading,
                error: None,
                ..self
            },
            Event::SuggestionsSucceeded {
                request_id,
                suggestions,
            } => {
                if request_id != self.request_id
                    || self.selection.is_some()
                    || self.mode != Mode::SuggestionsLoading
                {
                    return self;
                }
                let highlighted = if suggestions.is_empty() { None } else { Some(0) };
                Self {
                    suggestions,
                    mode: Mode::SuggestionsReady,
                    dropdown_open: true,
                    highlighted,
                    ..self
                }
            }
            Event::SuggestionsFailed {
                request_id,
                message,
            } => {
                if request_id != self.request_id {
                    return self;
                }
                Self {
                    error: Some(ScopedError {
                        scope: ErrorScope::Suggestions,
                        message,
                    }),
                    mode: Mode::Typing,
                    ..self
                }
            }
            Event::SuggestionsAborted => {
                let mode = if self.is_searchable(&self.input_text) {
                    Mode::Typing
                } else {
                    Mode::Idle
                };
                Self { mode, ..self }
            }
            Event::DropdownOpen => Self {
                dropdown_open: true,
                ..self
            },
            Event::DropdownClose => Self {
                dropdown_open: false,
                ..self
            },
            Event::HighlightNext => {
                let len = self.suggestions.len();
                let highlighted = match (len, self.highlighted) {
                    (0, _) => None,
                    (_, Some(i)) => Some((i + 1) % len),
                    (_, None) => Some(0),
                };
                Self {
                    highlighted,
                    ..self
                }
            }
            Event::HighlightPrev => {
                let len = self.suggestions.len();
                let highlighted = match (len, self.highlighted) {
                    (0, _) => None,
                    (_, Some(i)) => Some((i + len - 1) % len),
                    (_, None) => Some(len - 1),
                };
                Self {
                    highlighted,
                    ..self
                }
            }
            Event::CitySelected(city) => Self {
                input_text: city.display_label().to_string(),
                selection: Some(city),
                mode: Mode::Selected,
                dropdown_open: false,
                suggestions: Vec::new(),
                error: None,
                highlighted: None,
                request_id: self.request_id + 1,
                ..self
            },
            // The request counter survives so late responses stay stale.
            Event::SelectionCleared => Self {
                request_id: self.request_id,
                ..Self::with_min_query_chars(self.min_query_chars)
            },
            Event::ErrorReset => Self {
                error: None,
                ..self
            },
        }
    }
}
