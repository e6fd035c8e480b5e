//! Key bindings for the search field.

use crate::state::Event;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Escape,
    ArrowDown,
    ArrowUp,
    Enter,
    Tab,
    Char(char),
}

impl Key {
    /// Event bound to this key, if any.
    ///
    /// Enter and Tab do not confirm the highlighted suggestion; selection
    /// happens by pressing a row.
    pub fn event(self) -> Option<Event> {
        match self {
            Key::Escape => Some(Event::DropdownClose),
            Key::ArrowDown => Some(Event::HighlightNext),
            Key::ArrowUp => Some(Event::HighlightPrev),
            Key::Enter | Key::Tab | Key::Char(_) => None,
        }
    }
}
