//! Customer aggregation — collapses the per-visit transaction log into one
//! row per customer.
//!
//! This component:
//!   1. Filters transactions to the optional analysis window
//!   2. Groups rows by a pluggable customer key (default: trimmed name)
//!   3. Computes frequency, recency, first visit, spend totals
//!   4. Derives days-since-last-visit from an injected reference instant
//!
//! The reference instant is always a parameter — nothing in the core reads
//! a global clock, so identical inputs produce identical outputs.
//!
//! Output order is the order in which customers first appear in the log;
//! downstream rank ties rely on this being stable.

use crate::types::{AnalysisWindow, CustomerId, DaysSinceVisit};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// ── Public types ─────────────────────────────────────────────────────────────

/// One visit, as delivered by the ingestion collaborator. Only rows already
/// filtered to accepted status reach the core.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TransactionRecord {
    pub customer_id:     CustomerId,
    pub visit_timestamp: DateTime<Utc>,
    pub status:          String,
    pub price:           f64,
    #[serde(default)]
    pub email:           Option<String>,
    #[serde(default)]
    pub phone:           Option<String>,
}

/// One row of the customer table every analysis component consumes.
///
/// Invariants: `frequency >= 1` (zero-visit customers never appear);
/// `total_spend ≈ avg_spend * frequency` within floating tolerance.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CustomerSummary {
    pub customer_id:          CustomerId,
    pub frequency:            u64,
    pub recency:              DateTime<Utc>,
    pub first_visit:          DateTime<Utc>,
    pub total_spend:          f64,
    pub avg_spend:            f64,
    pub days_since_last_visit: DaysSinceVisit,
    pub email:                Option<String>,
    pub phone:                Option<String>,
    /// Filled in by the segment classifier; empty until then.
    #[serde(default)]
    pub segment:              String,
}

// ── Aggregator ───────────────────────────────────────────────────────────────

/// Function that extracts the grouping key from a transaction. Name-based
/// identity is fragile (collisions merge history); injecting the key lets a
/// stable-ID join replace it without touching any other component.
pub type GroupingKeyFn = dyn Fn(&TransactionRecord) -> CustomerId + Send + Sync;

pub struct CustomerAggregator {
    key: Box<GroupingKeyFn>,
}

impl Default for CustomerAggregator {
    fn default() -> Self {
        Self::new()
    }
}

impl CustomerAggregator {
    /// Aggregator grouping on the trimmed display name.
    pub fn new() -> Self {
        Self {
            key: Box::new(|txn| txn.customer_id.trim().to_string()),
        }
    }

    /// Aggregator with a caller-supplied grouping key.
    pub fn with_key(key: Box<GroupingKeyFn>) -> Self {
        Self { key }
    }

    /// Collapse the transaction log into one row per customer.
    ///
    /// An empty result is not an error: downstream components report an
    /// insufficient-data condition for an empty table rather than failing
    /// here.
    pub fn aggregate(
        &self,
        transactions: &[TransactionRecord],
        window: AnalysisWindow,
        reference: DateTime<Utc>,
    ) -> Vec<CustomerSummary> {
        // First-appearance order; the map only carries indices.
        let mut order: Vec<CustomerSummary> = Vec::new();
        let mut index: HashMap<CustomerId, usize> = HashMap::new();

        for txn in transactions {
            if !window.contains(txn.visit_timestamp) {
                continue;
            }

            let key = (self.key)(txn);
            match index.get(&key).copied() {
                Some(i) => {
                    let row = &mut order[i];
                    row.frequency += 1;
                    row.total_spend += txn.price;
                    if txn.visit_timestamp > row.recency {
                        row.recency = txn.visit_timestamp;
                    }
                    if txn.visit_timestamp < row.first_visit {
                        row.first_visit = txn.visit_timestamp;
                    }
                    if row.email.is_none() {
                        row.email = non_empty(&txn.email);
                    }
                    if row.phone.is_none() {
                        row.phone = non_empty(&txn.phone);
                    }
                }
                None => {
                    index.insert(key.clone(), order.len());
                    order.push(CustomerSummary {
                        customer_id: key,
                        frequency: 1,
                        recency: txn.visit_timestamp,
                        first_visit: txn.visit_timestamp,
                        total_spend: txn.price,
                        avg_spend: 0.0, // finalized below
                        days_since_last_visit: 0,
                        email: non_empty(&txn.email),
                        phone: non_empty(&txn.phone),
                        segment: String::new(),
                    });
                }
            }
        }

        for row in &mut order {
            row.avg_spend = row.total_spend / row.frequency as f64;
            row.days_since_last_visit =
                (reference - row.recency).num_days().max(0);
        }

        log::debug!(
            "aggregated {} transactions into {} customers",
            transactions.len(),
            order.len(),
        );

        order
    }
}

fn non_empty(field: &Option<String>) -> Option<String> {
    field
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}
