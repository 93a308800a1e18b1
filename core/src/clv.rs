//! Lifetime value heuristic and hidden-gem detection.
//!
//! This component:
//!   1. Scores repeat customers with a documented CLV heuristic
//!   2. Aggregates mean / total / top-decile CLV
//!   3. Flags "hidden gems" — low-frequency, above-median-spend customers
//!
//! The heuristic stands in for a full two-sided monetary model (out of
//! scope): clv = avg_spend * frequency * growth_factor. The formula lives
//! behind `ClvScorer` so a calibrated model can replace it without touching
//! the rest of the core; the default constants must not change, published
//! results depend on them.

use crate::{
    aggregator::CustomerSummary,
    config::ClvConfig,
    error::{AnalyticsError, AnalyticsResult, InsufficientDataReason},
    types::CustomerId,
};
use serde::{Deserialize, Serialize};

// ── Public types ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CustomerClv {
    pub customer_id: CustomerId,
    pub frequency:   u64,
    pub avg_spend:   f64,
    pub total_spend: f64,
    pub clv:         f64,
}

/// A customer who visits rarely but spends well above the population median
/// per visit — an upsell/retention target.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HiddenGem {
    pub customer_id: CustomerId,
    pub frequency:   u64,
    pub avg_spend:   f64,
    /// What the customer would be worth on a monthly cadence.
    pub projected_clv_if_regular: f64,
    pub email:       Option<String>,
    pub phone:       Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ClvResult {
    /// One row per qualifying (frequency >= 2) customer, input order.
    pub customers: Vec<CustomerClv>,
    pub n_repeat:  usize,
    pub avg_clv:   f64,
    pub total_clv: f64,
    /// Mean CLV of the top decile, decile size at least one customer.
    pub top_decile_clv: f64,
    /// Ranked by avg_spend descending, capped; ties keep input order.
    pub hidden_gems: Vec<HiddenGem>,
}

// ── Scoring strategy ─────────────────────────────────────────────────────────

/// Replaceable CLV formula. Implementations must be pure.
pub trait ClvScorer: Send + Sync {
    fn clv(&self, customer: &CustomerSummary) -> f64;
}

/// The documented heuristic: expected continued patronage folded into a
/// single fixed multiplier.
pub struct GrowthFactorScorer {
    pub growth_factor: f64,
}

impl ClvScorer for GrowthFactorScorer {
    fn clv(&self, customer: &CustomerSummary) -> f64 {
        customer.avg_spend * customer.frequency as f64 * self.growth_factor
    }
}

// ── Estimator ────────────────────────────────────────────────────────────────

pub struct LifetimeValueEstimator {
    config: ClvConfig,
    scorer: Box<dyn ClvScorer>,
}

impl LifetimeValueEstimator {
    pub fn new(config: ClvConfig) -> Self {
        let scorer = Box::new(GrowthFactorScorer {
            growth_factor: config.growth_factor,
        });
        Self { config, scorer }
    }

    /// Swap in a different CLV formula, keeping the eligibility and
    /// hidden-gem machinery as-is.
    pub fn with_scorer(config: ClvConfig, scorer: Box<dyn ClvScorer>) -> Self {
        Self { config, scorer }
    }

    /// Estimate CLV over the customer table.
    ///
    /// Monetary-value estimation needs at least one repeat per customer, so
    /// only frequency >= 2 qualifies; below `min_repeat_customers`
    /// qualifying rows the result is a hard insufficient-data error, never
    /// a partial number.
    pub fn estimate(&self, customers: &[CustomerSummary]) -> AnalyticsResult<ClvResult> {
        if customers.is_empty() {
            return Err(AnalyticsError::insufficient(
                InsufficientDataReason::EmptyCustomerTable,
            ));
        }

        let repeat: Vec<&CustomerSummary> =
            customers.iter().filter(|c| c.frequency >= 2).collect();
        if repeat.len() < self.config.min_repeat_customers {
            return Err(AnalyticsError::insufficient(
                InsufficientDataReason::TooFewRepeatCustomers {
                    got: repeat.len(),
                    need: self.config.min_repeat_customers,
                },
            ));
        }

        let rows: Vec<CustomerClv> = repeat
            .iter()
            .map(|c| CustomerClv {
                customer_id: c.customer_id.clone(),
                frequency: c.frequency,
                avg_spend: c.avg_spend,
                total_spend: c.total_spend,
                clv: self.scorer.clv(c),
            })
            .collect();

        let n_repeat = rows.len();
        let total_clv: f64 = rows.iter().map(|r| r.clv).sum();
        let avg_clv = total_clv / n_repeat as f64;

        let mut ranked: Vec<f64> = rows.iter().map(|r| r.clv).collect();
        ranked.sort_by(|a, b| b.partial_cmp(a).unwrap_or(std::cmp::Ordering::Equal));
        let decile_size = ((n_repeat as f64 * 0.1) as usize).max(1);
        let top_decile_clv =
            ranked[..decile_size].iter().sum::<f64>() / decile_size as f64;

        let hidden_gems = self.hidden_gems(customers);

        log::info!(
            "clv: {n_repeat} repeat customers, avg={avg_clv:.2} \
             top_decile={top_decile_clv:.2}, {} hidden gems",
            hidden_gems.len(),
        );

        Ok(ClvResult {
            customers: rows,
            n_repeat,
            avg_clv,
            total_clv,
            top_decile_clv,
            hidden_gems,
        })
    }

    /// Hidden gems are drawn from all customers, not just repeats: a
    /// one-visit big spender is exactly who this list is for.
    fn hidden_gems(&self, customers: &[CustomerSummary]) -> Vec<HiddenGem> {
        let median = median_avg_spend(customers);

        let mut gems: Vec<HiddenGem> = customers
            .iter()
            .filter(|c| {
                c.frequency <= self.config.hidden_gem_max_frequency
                    && c.avg_spend > median
            })
            .map(|c| HiddenGem {
                customer_id: c.customer_id.clone(),
                frequency: c.frequency,
                avg_spend: c.avg_spend,
                projected_clv_if_regular: c.avg_spend
                    * self.config.monthly_cadence_multiplier,
                email: c.email.clone(),
                phone: c.phone.clone(),
            })
            .collect();

        // sort_by is stable, so equal spends keep table order.
        gems.sort_by(|a, b| {
            b.avg_spend
                .partial_cmp(&a.avg_spend)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        gems.truncate(self.config.hidden_gem_cap);
        gems
    }
}

fn median_avg_spend(customers: &[CustomerSummary]) -> f64 {
    let mut spends: Vec<f64> = customers.iter().map(|c| c.avg_spend).collect();
    spends.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let n = spends.len();
    if n % 2 == 1 {
        spends[n / 2]
    } else {
        (spends[n / 2 - 1] + spends[n / 2]) / 2.0
    }
}
