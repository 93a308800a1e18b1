//! Shared primitive types used across the analytics core.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A customer identifier. Today this is the display name delivered by the
/// ingestion layer; grouping on it is pluggable (see `CustomerAggregator`)
/// so a stable ID can replace name matching later.
pub type CustomerId = String;

/// Whole days since a customer's most recent visit.
pub type DaysSinceVisit = i64;

/// An optional inclusive [start, end] bound applied before aggregation.
/// Either edge may be open.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct AnalysisWindow {
    pub start: Option<DateTime<Utc>>,
    pub end:   Option<DateTime<Utc>>,
}

impl AnalysisWindow {
    /// A window with both edges open — every transaction qualifies.
    pub fn unbounded() -> Self {
        Self::default()
    }

    pub fn between(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start: Some(start), end: Some(end) }
    }

    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        if let Some(start) = self.start {
            if instant < start {
                return false;
            }
        }
        if let Some(end) = self.end {
            if instant > end {
                return false;
            }
        }
        true
    }
}
