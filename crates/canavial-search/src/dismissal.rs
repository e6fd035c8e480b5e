//! Closes the suggestion list on pointer-down outside the search box.

use crate::state::Event;

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Axis-aligned bounds of the search box, in the host's coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Half-open containment: the right and bottom edges are outside.
    pub fn contains(&self, point: Point) -> bool {
        point.x >= self.x
            && point.y >= self.y
            && point.x < self.x + self.width
            && point.y < self.y + self.height
    }
}

/// Input device that produced a pointer-down.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerKind {
    Mouse,
    Touch,
    Pointer,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerEvent {
    pub kind: PointerKind,
    pub position: Point,
    default_prevented: bool,
}

impl PointerEvent {
    pub fn new(kind: PointerKind, position: Point) -> Self {
        Self {
            kind,
            position,
            default_prevented: false,
        }
    }

    /// Mark the event as consumed by an inner control.
    pub fn prevent_default(&mut self) {
        self.default_prevented = true;
    }

    pub fn is_default_prevented(&self) -> bool {
        self.default_prevented
    }
}

/// Document-level listener for pointer-down events.
///
/// All pointer kinds are handled the same way. Until bounds are known the
/// watcher cannot tell inside from outside and stays quiet.
#[derive(Debug, Default)]
pub struct DismissalWatcher {
    bounds: Option<Rect>,
    registered: bool,
}

impl DismissalWatcher {
    pub fn register(&mut self) {
        if !self.registered {
            tracing::trace!("Dismissal watcher registered");
            self.registered = true;
        }
    }

    pub fn deregister(&mut self) {
        if self.registered {
            tracing::trace!("Dismissal watcher deregistered");
            self.registered = false;
        }
    }

    pub fn is_registered(&self) -> bool {
        self.registered
    }

    pub fn set_bounds(&mut self, bounds: Rect) {
        self.bounds = Some(bounds);
    }

    pub fn bounds(&self) -> Option<Rect> {
        self.bounds
    }

    /// The event to dispatch for a pointer-down, if any.
    pub fn observe(&self, event: &PointerEvent) -> Option<Event> {
        if !self.registered || event.is_default_prevented() {
            return None;
        }
        let bounds = self.bounds?;
        if bounds.contains(event.position) {
            None
        } else {
            Some(Event::DropdownClose)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn watcher() -> DismissalWatcher {
        let mut w = DismissalWatcher::default();
        w.register();
        w.set_bounds(Rect::new(10.0, 10.0, 200.0, 40.0));
        w
    }

    #[test]
    fn outside_press_closes_for_every_kind() {
        let w = watcher();
        for kind in [PointerKind::Mouse, PointerKind::Touch, PointerKind::Pointer] {
            let ev = PointerEvent::new(kind, Point::new(500.0, 500.0));
            assert_eq!(w.observe(&ev), Some(Event::DropdownClose));
        }
    }

    #[test]
    fn inside_press_is_ignored() {
        let w = watcher();
        let ev = PointerEvent::new(PointerKind::Mouse, Point::new(20.0, 20.0));
        assert_eq!(w.observe(&ev), None);
    }

    #[test]
    fn edges_are_half_open() {
        let r = Rect::new(0.0, 0.0, 10.0, 10.0);
        assert!(r.contains(Point::new(0.0, 0.0)));
        assert!(!r.contains(Point::new(10.0, 5.0)));
        assert!(!r.contains(Point::new(5.0, 10.0)));
    }

    #[test]
    fn prevented_press_is_ignored() {
        let w = watcher();
        let mut ev = PointerEvent::new(PointerKind::Pointer, Point::new(500.0, 500.0));
        ev.prevent_default();
        assert_eq!(w.observe(&ev), None);
    }

    #[test]
    fn deregistered_watcher_is_silent() {
        let mut w = watcher();
        w.deregister();
        let ev = PointerEvent::new(PointerKind::Mouse, Point::new(500.0, 500.0));
        assert_eq!(w.observe(&ev), None);
        assert!(!w.is_registered());
    }

    #[test]
    fn unknown_bounds_never_close() {
        let mut w = DismissalWatcher::default();
        w.register();
        let ev = PointerEvent::new(PointerKind::Mouse, Point::new(500.0, 500.0));
        assert_eq!(w.observe(&ev), None);
    }
}
