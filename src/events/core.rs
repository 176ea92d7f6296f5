use crossterm::event::{
    Event as CrosstermEvent, KeyCode, KeyEventKind, MouseButton as CrosstermButton,
    MouseEventKind,
};

use crate::geometry::{Point, Size};

/// Mouse button reported with a mouse event. A move while a button is
/// held arrives as another event carrying that button.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MouseButton {
    Left,
    Middle,
    Right,
    Release,
    WheelUp,
    WheelDown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MouseEvent {
    pub position: Point,
    pub button: MouseButton,
}

impl MouseEvent {
    pub const fn new(position: Point, button: MouseButton) -> Self {
        Self { position, button }
    }
}

/// Closed sum of everything the distributor delivers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Key(KeyCode),
    Mouse(MouseEvent),
    Resize(Size),
    Error(String),
}

impl Event {
    pub fn kind(&self) -> EventKind {
        match self {
            Event::Key(_) => EventKind::Key,
            Event::Mouse(_) => EventKind::Mouse,
            Event::Resize(_) => EventKind::Resize,
            Event::Error(_) => EventKind::Error,
        }
    }

    /// Map a crossterm input event onto the closed sum. Events with no
    /// counterpart (paste, focus, bare moves) map to none.
    pub fn from_crossterm(event: CrosstermEvent) -> Option<Event> {
        match event {
            CrosstermEvent::Key(key) if key.kind != KeyEventKind::Release => {
                Some(Event::Key(key.code))
            }
            CrosstermEvent::Key(_) => None,
            CrosstermEvent::Mouse(mouse) => {
                let button = match mouse.kind {
                    MouseEventKind::Down(b) | MouseEventKind::Drag(b) => match b {
                        CrosstermButton::Left => MouseButton::Left,
                        CrosstermButton::Middle => MouseButton::Middle,
                        CrosstermButton::Right => MouseButton::Right,
                    },
                    MouseEventKind::Up(_) => MouseButton::Release,
                    MouseEventKind::ScrollUp => MouseButton::WheelUp,
                    MouseEventKind::ScrollDown => MouseButton::WheelDown,
                    _ => return None,
                };
                Some(Event::Mouse(MouseEvent::new(
                    Point::new(mouse.column as i32, mouse.row as i32),
                    button,
                )))
            }
            CrosstermEvent::Resize(width, height) => {
                Some(Event::Resize(Size::new(width, height)))
            }
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    Key,
    Mouse,
    Resize,
    Error,
}

/// Subscriber predicate over event kinds.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct EventFilter {
    keys: bool,
    mouse: bool,
    resize: bool,
    errors: bool,
}

impl EventFilter {
    pub const fn none() -> Self {
        Self {
            keys: false,
            mouse: false,
            resize: false,
            errors: false,
        }
    }

    pub const fn all() -> Self {
        Self {
            keys: true,
            mouse: true,
            resize: true,
            errors: true,
        }
    }

    /// Keyboard, mouse and resize: what an interactive surface consumes.
    pub const fn input() -> Self {
        Self {
            keys: true,
            mouse: true,
            resize: true,
            errors: false,
        }
    }

    pub const fn keys() -> Self {
        Self::none().with_kind(EventKind::Key)
    }

    pub const fn mouse() -> Self {
        Self::none().with_kind(EventKind::Mouse)
    }

    pub const fn errors() -> Self {
        Self::none().with_kind(EventKind::Error)
    }

    pub const fn with_kind(mut self, kind: EventKind) -> Self {
        match kind {
            EventKind::Key => self.keys = true,
            EventKind::Mouse => self.mouse = true,
            EventKind::Resize => self.resize = true,
            EventKind::Error => self.errors = true,
        }
        self
    }

    pub fn matches(&self, event: &Event) -> bool {
        match event.kind() {
            EventKind::Key => self.keys,
            EventKind::Mouse => self.mouse,
            EventKind::Resize => self.resize,
            EventKind::Error => self.errors,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::{KeyEvent, KeyModifiers};

    #[test]
    fn filter_matches_kinds() {
        let filter = EventFilter::input();
        assert!(filter.matches(&Event::Key(KeyCode::Tab)));
        assert!(filter.matches(&Event::Resize(Size::new(1, 1))));
        assert!(!filter.matches(&Event::Error("boom".into())));
        assert!(EventFilter::errors().matches(&Event::Error("boom".into())));
    }

    #[test]
    fn crossterm_key_press_maps() {
        let event = Event::from_crossterm(CrosstermEvent::Key(KeyEvent::new(
            KeyCode::Char('n'),
            KeyModifiers::NONE,
        )));
        assert_eq!(event, Some(Event::Key(KeyCode::Char('n'))));
    }

    #[test]
    fn crossterm_drag_is_a_press_of_the_held_button() {
        let mouse = crossterm::event::MouseEvent {
            kind: MouseEventKind::Drag(CrosstermButton::Left),
            column: 4,
            row: 7,
            modifiers: KeyModifiers::NONE,
        };
        let event = Event::from_crossterm(CrosstermEvent::Mouse(mouse)).unwrap();
        assert_eq!(
            event,
            Event::Mouse(MouseEvent::new(Point::new(4, 7), MouseButton::Left))
        );
    }

    #[test]
    fn crossterm_bare_move_maps_to_none() {
        let mouse = crossterm::event::MouseEvent {
            kind: MouseEventKind::Moved,
            column: 0,
            row: 0,
            modifiers: KeyModifiers::NONE,
        };
        assert_eq!(Event::from_crossterm(CrosstermEvent::Mouse(mouse)), None);
    }
}
