//! Style module orchestrator following the RSB module specification.
//!
//! Color and line-style tokens stay opaque to the layout core; terminal
//! drivers translate them to whatever attribute model the backend uses.

mod core;

pub use core::{BorderGlyphs, CellStyle, Color, LineStyle};
