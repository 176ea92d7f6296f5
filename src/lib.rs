//! Terminal dashboard core: a container tree that tiles the terminal
//! through recursive splits, a focus tracker driven by mouse gestures
//! and traversal keys, and an event distributor whose processed counter
//! makes delivery observable.
//!
//! Concrete terminal drivers and widget implementations live in
//! downstream crates; the core paints borders, routes input and asks
//! leaf widgets to paint into their rectangles.

pub mod container;
pub mod error;
pub mod events;
pub mod geometry;
pub mod logging;
pub mod metrics;
pub mod style;
pub mod terminal;
pub mod widget;

pub use container::{ContainerSpec, ContainerTree, FocusTracker, NodeId, SharedTree};
pub use error::{DeckError, Result};
pub use events::{
    Event, EventDistributor, EventFilter, EventKind, EventReporter, MouseButton, MouseEvent,
    SubscriberHandle,
};
pub use geometry::{Point, Rect, Size};
pub use logging::{
    LogEvent, LogFields, LogLevel, LogSink, Logger, LoggingError, LoggingResult, MemorySink,
};
pub use metrics::{DeliverySnapshot, TreeSnapshot};
pub use style::{BorderGlyphs, CellStyle, Color, LineStyle};
pub use terminal::{Cell, CellBuffer, CellGrid};
pub use widget::{EventFlow, Widget};
