//! Frequency-based segmentation.
//!
//! This component:
//!   1. Assigns each customer the first band matching its visit frequency
//!   2. Produces an aggregate revenue/frequency table in canonical band order
//!
//! Band coverage is validated when the classifier is built, so `classify`
//! is total over frequency >= 1 and never falls back.

use crate::{
    aggregator::CustomerSummary,
    config::SegmentBand,
    error::AnalyticsResult,
};
use serde::{Deserialize, Serialize};

// ── Public types ─────────────────────────────────────────────────────────────

/// Aggregate row for one segment, in canonical band order. Segments with no
/// customers still appear, with zero counts.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SegmentSummary {
    pub segment:        String,
    pub customer_count: u64,
    pub total_revenue:  f64,
    pub avg_revenue:    f64,
    pub avg_frequency:  f64,
}

// ── Classifier ───────────────────────────────────────────────────────────────

pub struct SegmentClassifier {
    bands: Vec<SegmentBand>,
}

impl SegmentClassifier {
    /// Build a classifier over validated bands. Gaps, overlaps, and a
    /// bounded top band are configuration errors, rejected here — at load
    /// time — rather than surfacing as unmatched customers later.
    pub fn new(bands: Vec<SegmentBand>) -> AnalyticsResult<Self> {
        crate::config::validate_band_coverage(&bands)?;
        Ok(Self { bands })
    }

    pub fn bands(&self) -> &[SegmentBand] {
        &self.bands
    }

    /// Band name for a frequency. Coverage guarantees a match for any
    /// frequency >= 1; frequency 0 cannot occur in a customer table.
    pub fn classify(&self, frequency: u64) -> &str {
        self.bands
            .iter()
            .find(|band| band.matches(frequency))
            .map(|band| band.name.as_str())
            .unwrap_or_else(|| self.bands[0].name.as_str())
    }

    /// Fill the segment column of a customer table. Re-running on an
    /// unchanged table reassigns identical labels.
    pub fn assign(&self, customers: &mut [CustomerSummary]) {
        for row in customers.iter_mut() {
            row.segment = self.classify(row.frequency).to_string();
        }
    }

    /// Aggregate table per segment, in canonical band order.
    pub fn summarize(&self, customers: &[CustomerSummary]) -> Vec<SegmentSummary> {
        self.bands
            .iter()
            .map(|band| {
                let members: Vec<&CustomerSummary> = customers
                    .iter()
                    .filter(|c| band.matches(c.frequency))
                    .collect();

                let count = members.len() as u64;
                let total_revenue: f64 =
                    members.iter().map(|c| c.total_spend).sum();
                let total_frequency: u64 =
                    members.iter().map(|c| c.frequency).sum();

                SegmentSummary {
                    segment: band.name.clone(),
                    customer_count: count,
                    total_revenue,
                    avg_revenue: if count > 0 {
                        total_revenue / count as f64
                    } else {
                        0.0
                    },
                    avg_frequency: if count > 0 {
                        total_frequency as f64 / count as f64
                    } else {
                        0.0
                    },
                }
            })
            .collect()
    }
}
