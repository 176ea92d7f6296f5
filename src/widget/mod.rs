//! The leaf widget seam.
//!
//! Containers know nothing about what a widget draws; they hand it the
//! inner rectangle and forward the input the focus layer routed to it.

use crossterm::event::KeyCode;

use crate::error::Result;
use crate::events::MouseEvent;
use crate::geometry::Rect;
use crate::terminal::CellGrid;

/// A widget's verdict on an input event. `Consumed` events are counted
/// and logged by the tree; `Continue` means the widget left the event
/// alone and it is discarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventFlow {
    Continue,
    Consumed,
}

/// Behaviour injection point for leaf containers.
pub trait Widget: Send {
    /// Paint into `area`, the container's inner rectangle for this draw.
    /// `area` may be empty when the terminal is small; widgets should
    /// paint nothing rather than fail.
    fn paint(&mut self, grid: &mut dyn CellGrid, area: Rect) -> Result<()>;

    /// A key event routed to this widget because its container holds
    /// focus and no traversal binding claimed the key.
    fn on_key(&mut self, _key: KeyCode) -> Result<EventFlow> {
        Ok(EventFlow::Continue)
    }

    /// A mouse event whose position resolved to this widget's container.
    fn on_mouse(&mut self, _event: &MouseEvent) -> Result<EventFlow> {
        Ok(EventFlow::Continue)
    }
}
