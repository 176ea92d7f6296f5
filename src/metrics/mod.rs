//! Counter snapshots for observability.
//!
//! The distributor and the container tree expose their counters as
//! plain snapshot structs; callers log them through the structured
//! logging layer or inspect them directly in tests.

use serde_json::json;

use crate::geometry::Size;
use crate::logging::{LogEvent, LogFields, LogLevel};

/// Event distribution counters at one instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeliverySnapshot {
    pub submitted: u64,
    pub processed: u64,
    pub failures: u64,
    pub subscribers: usize,
}

impl DeliverySnapshot {
    /// Events submitted but not yet fully delivered.
    pub fn backlog(&self) -> u64 {
        self.submitted.saturating_sub(self.processed)
    }

    pub fn as_fields(&self) -> LogFields {
        let mut fields = LogFields::new();
        fields.insert("submitted".to_string(), json!(self.submitted));
        fields.insert("processed".to_string(), json!(self.processed));
        fields.insert("failures".to_string(), json!(self.failures));
        fields.insert("subscribers".to_string(), json!(self.subscribers));
        fields
    }

    pub fn to_log_event(&self, target: &str) -> LogEvent {
        LogEvent::with_fields(LogLevel::Info, target, "delivery_metrics", self.as_fields())
    }
}

/// Container tree counters at one instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TreeSnapshot {
    pub draws: u64,
    pub containers: usize,
    /// Input events a widget reported as consumed.
    pub consumed_events: u64,
    pub last_size: Option<Size>,
}

impl TreeSnapshot {
    pub fn to_log_event(&self, target: &str) -> LogEvent {
        let mut fields = LogFields::new();
        fields.insert("draws".to_string(), json!(self.draws));
        fields.insert("containers".to_string(), json!(self.containers));
        fields.insert("consumed_events".to_string(), json!(self.consumed_events));
        if let Some(size) = self.last_size {
            fields.insert("width".to_string(), json!(size.width));
            fields.insert("height".to_string(), json!(size.height));
        }
        LogEvent::with_fields(LogLevel::Info, target, "tree_metrics", fields)
    }
}
