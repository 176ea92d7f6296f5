//! Event module orchestrator following the RSB module specification.
//!
//! Terminal input is modeled as a closed [`Event`] sum type and fanned
//! out by the [`EventDistributor`], whose processed counter is the
//! synchronization point for tests and cooperative shutdown.

mod core;
mod distributor;

pub use core::{Event, EventFilter, EventKind, MouseButton, MouseEvent};
pub use distributor::{EventDistributor, EventReporter, SubscriberHandle};
