//! Container module orchestrator following the RSB module specification.
//!
//! The container tree tiles the terminal through recursive binary
//! splits, resolves mouse positions to containers, and owns the focus
//! tracker that decides where keyboard input goes.

mod core;
mod focus;
mod layout;
mod options;

pub use core::{ContainerTree, NodeId, SharedTree};
pub use focus::FocusTracker;
pub use options::ContainerSpec;
