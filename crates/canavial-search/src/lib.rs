//! City search for the Canavial field dashboard.
//!
//! A debounced, cancellable autocomplete that resolves free text to a
//! [`City`]. State lives in [`SearchState`] and only changes through
//! [`SearchState::reduce`]; timers and lookups are driven by the
//! [`EffectScheduler`], whose results come back as [`SearchMessage`]s that
//! the owning [`CitySearchBox`] applies on the host's task.

pub mod component;
pub mod dismissal;
pub mod keyboard;
pub mod lookup;
pub mod scheduler;
pub mod state;
pub mod types;
pub mod view;

#[cfg(test)]
pub(crate) mod testing;

pub use component::{CitySearchBox, SearchHost};
pub use dismissal::{DismissalWatcher, Point, PointerEvent, PointerKind, Rect};
pub use keyboard::Key;
pub use lookup::{CityLookup, HttpCityLookup};
pub use scheduler::{EffectScheduler, SearchMessage};
pub use state::{ErrorScope, Event, InputSource, Mode, RequestId, ScopedError, SearchState};
pub use types::{parse_suggestions, City, LookupError, Suggestion};
pub use view::{render, SuggestionRow, View};
