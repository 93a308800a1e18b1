//! Churn risk scoring — normalized recency/frequency heuristic with
//! discrete tiers and revenue-at-risk.
//!
//! This component:
//!   1. Normalizes recency and frequency against the table maxima
//!   2. Combines them into p_churn with recency weighted more heavily
//!   3. Buckets customers into low / medium / high risk tiers
//!   4. Totals revenue at risk over the high tier
//!
//! Deliberately simplified — no recursive probability-alive formula. The
//! combination lives behind `ChurnScorer` so a calibrated model can be
//! swapped in; the default weights and thresholds must keep the documented
//! values for behavioral parity.

use crate::{
    aggregator::CustomerSummary,
    config::ChurnConfig,
    error::{AnalyticsError, AnalyticsResult, InsufficientDataReason},
    types::CustomerId,
};
use serde::{Deserialize, Serialize};

// ── Public types ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RiskTier {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CustomerChurnScore {
    pub customer_id:     CustomerId,
    pub frequency:       u64,
    pub total_spend:     f64,
    pub days_since_last_visit: i64,
    /// days_since_last_visit / table max, 0 when the max is 0.
    pub recency_score:   f64,
    /// 1 - frequency / table max, 0 when the max is 0.
    pub frequency_score: f64,
    pub p_churn:         f64,
    pub tier:            RiskTier,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChurnResult {
    /// One score per customer, input order.
    pub scores: Vec<CustomerChurnScore>,
    pub high_risk_count:   usize,
    pub medium_risk_count: usize,
    pub low_risk_count:    usize,
    /// High-tier spend discounted by the configured factor.
    pub revenue_at_risk: f64,
    /// |low tier| / |population|.
    pub still_active_fraction: f64,
}

// ── Scoring strategy ─────────────────────────────────────────────────────────

/// Replaceable churn-probability formula over the two normalized scores.
pub trait ChurnScorer: Send + Sync {
    fn probability(&self, recency_score: f64, frequency_score: f64) -> f64;
}

/// The documented heuristic: 0.7 recency + 0.3 frequency, clipped to [0, 1].
pub struct WeightedRecencyScorer {
    pub recency_weight:   f64,
    pub frequency_weight: f64,
}

impl ChurnScorer for WeightedRecencyScorer {
    fn probability(&self, recency_score: f64, frequency_score: f64) -> f64 {
        (recency_score * self.recency_weight
            + frequency_score * self.frequency_weight)
            .clamp(0.0, 1.0)
    }
}

// ── Scorer ───────────────────────────────────────────────────────────────────

pub struct ChurnRiskScorer {
    config: ChurnConfig,
    model:  Box<dyn ChurnScorer>,
}

impl ChurnRiskScorer {
    pub fn new(config: ChurnConfig) -> Self {
        let model = Box::new(WeightedRecencyScorer {
            recency_weight: config.recency_weight,
            frequency_weight: config.frequency_weight,
        });
        Self { config, model }
    }

    /// Swap in a different probability formula, keeping normalization,
    /// tiering, and the aggregates as-is.
    pub fn with_model(config: ChurnConfig, model: Box<dyn ChurnScorer>) -> Self {
        Self { config, model }
    }

    pub fn score(&self, customers: &[CustomerSummary]) -> AnalyticsResult<ChurnResult> {
        if customers.is_empty() {
            return Err(AnalyticsError::insufficient(
                InsufficientDataReason::EmptyCustomerTable,
            ));
        }

        let max_days = customers
            .iter()
            .map(|c| c.days_since_last_visit)
            .max()
            .unwrap_or(0);
        let max_freq = customers.iter().map(|c| c.frequency).max().unwrap_or(0);

        let scores: Vec<CustomerChurnScore> = customers
            .iter()
            .map(|c| {
                // Zero maxima short-circuit to 0 rather than dividing.
                let recency_score = if max_days > 0 {
                    c.days_since_last_visit as f64 / max_days as f64
                } else {
                    0.0
                };
                let frequency_score = if max_freq > 0 {
                    1.0 - c.frequency as f64 / max_freq as f64
                } else {
                    0.0
                };

                let p_churn =
                    self.model.probability(recency_score, frequency_score);
                let tier = self.tier(p_churn);

                CustomerChurnScore {
                    customer_id: c.customer_id.clone(),
                    frequency: c.frequency,
                    total_spend: c.total_spend,
                    days_since_last_visit: c.days_since_last_visit,
                    recency_score,
                    frequency_score,
                    p_churn,
                    tier,
                }
            })
            .collect();

        let high_risk_count =
            scores.iter().filter(|s| s.tier == RiskTier::High).count();
        let medium_risk_count =
            scores.iter().filter(|s| s.tier == RiskTier::Medium).count();
        let low_risk_count =
            scores.iter().filter(|s| s.tier == RiskTier::Low).count();

        let high_tier_spend: f64 = scores
            .iter()
            .filter(|s| s.tier == RiskTier::High)
            .map(|s| s.total_spend)
            .sum();
        let revenue_at_risk =
            high_tier_spend * self.config.revenue_at_risk_discount;

        let still_active_fraction = low_risk_count as f64 / scores.len() as f64;

        log::info!(
            "churn: {}/{}/{} high/medium/low, revenue_at_risk={revenue_at_risk:.2}",
            high_risk_count,
            medium_risk_count,
            low_risk_count,
        );

        Ok(ChurnResult {
            scores,
            high_risk_count,
            medium_risk_count,
            low_risk_count,
            revenue_at_risk,
            still_active_fraction,
        })
    }

    fn tier(&self, p_churn: f64) -> RiskTier {
        if p_churn >= self.config.high_risk_threshold {
            RiskTier::High
        } else if p_churn >= self.config.medium_risk_threshold {
            RiskTier::Medium
        } else {
            RiskTier::Low
        }
    }
}
