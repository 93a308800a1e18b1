//! Latent demand estimation — zero-truncated NBD fit over the frequency
//! histogram.
//!
//! This component:
//!   1. Builds the observed visit-frequency histogram
//!   2. Fits a zero-truncated negative binomial (Gamma-mixed Poisson) by MLE
//!   3. Inverts the truncation to estimate the unobserved population
//!   4. Scores goodness of fit (chi-square) and rate heterogeneity
//!
//! Customers with zero visits are structurally invisible in the input, so
//! the standard NBD mass is conditioned on X >= 1: each log-probability is
//! shifted by -ln(1 - p0), with p0 = (alpha/(alpha+1))^r. Fitting the
//! untruncated form here would bias r downward and undercount the market.
//!
//! The optimizer is a bounded Nelder–Mead (see `optimizer`); infeasible
//! parameter excursions are absorbed as a penalty value, never an error.

use crate::{
    aggregator::CustomerSummary,
    config::OptimizerConfig,
    error::{AnalyticsError, AnalyticsResult, InsufficientDataReason},
    optimizer::NelderMead,
};
use serde::{Deserialize, Serialize};
use statrs::function::gamma::ln_gamma;
use std::collections::BTreeMap;

/// MLE over a histogram with fewer distinct values than parameters is
/// underdetermined; two is the floor for a two-parameter model.
const MIN_DISTINCT_FREQUENCIES: usize = 2;

/// Objective value returned for parameters outside the feasible region.
const INFEASIBLE_PENALTY: f64 = 1e10;

// ── Public types ─────────────────────────────────────────────────────────────

/// How widely individual visit rates diverge across the population.
/// Low r means a few heavy visitors among many light ones.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Heterogeneity {
    High,
    Moderate,
    Low,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FitQuality {
    Good,
    Moderate,
    Poor,
    /// Degrees of freedom were zero or negative; no ratio is defined.
    Undefined,
}

/// One aligned actual/predicted histogram bucket.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FrequencyBucket {
    pub frequency: u64,
    pub actual:    u64,
    pub predicted: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LatentDemandResult {
    /// Fitted Gamma shape. Drives the heterogeneity read.
    pub r: f64,
    /// Fitted Gamma rate.
    pub alpha: f64,
    /// Probability of zero visits under the fitted untruncated model.
    pub p_zero: f64,
    /// Estimated count of customers with zero visits (never observed).
    pub f_zero: f64,
    pub n_observed: usize,
    /// n_observed + f_zero.
    pub total_market: f64,
    /// n_observed / total_market, in (0, 1].
    pub market_reach: f64,
    pub chi_square: f64,
    /// (#distinct frequency values) - 2; may be <= 0.
    pub degrees_of_freedom: i64,
    pub log_likelihood: f64,
    pub heterogeneity: Heterogeneity,
    pub fit_quality: FitQuality,
    pub histogram: Vec<FrequencyBucket>,
    pub avg_visits: f64,
    /// False when the iteration budget ran out; parameters are best-so-far.
    pub converged: bool,
}

// ── Estimator ────────────────────────────────────────────────────────────────

pub struct LatentDemandEstimator {
    optimizer: OptimizerConfig,
}

impl LatentDemandEstimator {
    pub fn new(optimizer: OptimizerConfig) -> Self {
        Self { optimizer }
    }

    /// Fit the zero-truncated NBD to a customer table.
    ///
    /// Pure: identical input and config produce identical output. Each call
    /// allocates its own optimizer state, so parallel fits are independent.
    pub fn fit(&self, customers: &[CustomerSummary]) -> AnalyticsResult<LatentDemandResult> {
        if customers.is_empty() {
            return Err(AnalyticsError::insufficient(
                InsufficientDataReason::EmptyCustomerTable,
            ));
        }

        let histogram = frequency_histogram(customers);
        if histogram.len() < MIN_DISTINCT_FREQUENCIES {
            return Err(AnalyticsError::insufficient(
                InsufficientDataReason::TooFewDistinctFrequencies {
                    got: histogram.len(),
                    need: MIN_DISTINCT_FREQUENCIES,
                },
            ));
        }

        let n_observed = customers.len();
        let (mean, variance) = frequency_moments(customers);
        let start = moments_start(mean, variance);

        let bounds = [
            (self.optimizer.param_min, self.optimizer.param_max),
            (self.optimizer.param_min, self.optimizer.param_max),
        ];
        let solver = NelderMead::new(
            self.optimizer.max_iterations,
            self.optimizer.tolerance,
            bounds,
        );

        let objective =
            |params: &[f64; 2]| negative_log_likelihood(params, &histogram);
        let minimum = solver.minimize(objective, start);

        let [r, alpha] = minimum.point;
        let log_likelihood = -minimum.value;

        if !minimum.converged {
            log::warn!(
                "latent demand fit hit the {}-iteration budget, \
                 reporting best-so-far parameters (r={r:.4}, alpha={alpha:.4})",
                self.optimizer.max_iterations,
            );
        }

        // Invert the truncation: a p0 fraction of the true population is
        // invisible, so observed/unobserved ratios recover its size.
        let p_zero = (alpha / (alpha + 1.0)).powf(r);
        let f_zero = n_observed as f64 * p_zero / (1.0 - p_zero);
        let total_market = n_observed as f64 + f_zero;
        let market_reach = n_observed as f64 / total_market;

        let buckets = predicted_buckets(r, alpha, p_zero, n_observed, &histogram);
        let chi_square: f64 = buckets
            .iter()
            .map(|b| {
                let diff = b.actual as f64 - b.predicted;
                diff * diff / b.predicted
            })
            .sum();
        let degrees_of_freedom = histogram.len() as i64 - 2;

        let fit_quality = if degrees_of_freedom <= 0 {
            FitQuality::Undefined
        } else {
            match chi_square / degrees_of_freedom as f64 {
                ratio if ratio < 2.0 => FitQuality::Good,
                ratio if ratio < 4.0 => FitQuality::Moderate,
                _ => FitQuality::Poor,
            }
        };

        let heterogeneity = if r < 0.5 {
            Heterogeneity::High
        } else if r < 1.5 {
            Heterogeneity::Moderate
        } else {
            Heterogeneity::Low
        };

        log::info!(
            "latent demand: r={r:.4} alpha={alpha:.4} f0={f_zero:.1} \
             reach={market_reach:.3} chi2={chi_square:.2} ({} buckets)",
            buckets.len(),
        );

        Ok(LatentDemandResult {
            r,
            alpha,
            p_zero,
            f_zero,
            n_observed,
            total_market,
            market_reach,
            chi_square,
            degrees_of_freedom,
            log_likelihood,
            heterogeneity,
            fit_quality,
            histogram: buckets,
            avg_visits: mean,
            converged: minimum.converged,
        })
    }
}

// ── Likelihood ───────────────────────────────────────────────────────────────

/// Untruncated NBD log-mass at x for (r, alpha).
fn nbd_log_mass(r: f64, alpha: f64, x: u64) -> f64 {
    let x = x as f64;
    ln_gamma(r + x) - ln_gamma(r) - ln_gamma(x + 1.0)
        + r * (alpha / (alpha + 1.0)).ln()
        + x * (1.0 / (alpha + 1.0)).ln()
}

/// Negative zero-truncated log-likelihood over the histogram. Returns the
/// penalty (steering the optimizer back, never raising) when either
/// parameter leaves the positive region.
fn negative_log_likelihood(params: &[f64; 2], histogram: &BTreeMap<u64, u64>) -> f64 {
    let [r, alpha] = *params;
    if r <= 0.0 || alpha <= 0.0 {
        return INFEASIBLE_PENALTY;
    }

    let p_zero = (alpha / (alpha + 1.0)).powf(r);
    let ln_truncation = (1.0 - p_zero).ln();

    let mut ll = 0.0;
    for (&x, &count) in histogram {
        if x < 1 || count == 0 {
            continue;
        }
        ll += count as f64 * (nbd_log_mass(r, alpha, x) - ln_truncation);
    }

    if !ll.is_finite() {
        return INFEASIBLE_PENALTY;
    }
    -ll
}

// ── Helpers ──────────────────────────────────────────────────────────────────

fn frequency_histogram(customers: &[CustomerSummary]) -> BTreeMap<u64, u64> {
    let mut histogram = BTreeMap::new();
    for customer in customers {
        *histogram.entry(customer.frequency).or_insert(0u64) += 1;
    }
    histogram
}

/// Sample mean and (n-1) variance of the observed frequencies. Only called
/// with >= 2 distinct values, so n >= 2.
fn frequency_moments(customers: &[CustomerSummary]) -> (f64, f64) {
    let n = customers.len() as f64;
    let mean = customers.iter().map(|c| c.frequency as f64).sum::<f64>() / n;
    let variance = customers
        .iter()
        .map(|c| {
            let diff = c.frequency as f64 - mean;
            diff * diff
        })
        .sum::<f64>()
        / (n - 1.0);
    (mean, variance)
}

/// Method-of-moments start, floored to keep the simplex off the boundary.
fn moments_start(mean: f64, variance: f64) -> [f64; 2] {
    if variance > mean {
        let overdispersion = variance - mean;
        [
            (mean * mean / overdispersion).max(0.1),
            (mean / overdispersion).max(0.1),
        ]
    } else {
        [1.0, 1.0]
    }
}

/// Truncated-probability-weighted predicted count per observed frequency,
/// aligned with the actual histogram.
fn predicted_buckets(
    r: f64,
    alpha: f64,
    p_zero: f64,
    n_observed: usize,
    histogram: &BTreeMap<u64, u64>,
) -> Vec<FrequencyBucket> {
    histogram
        .iter()
        .map(|(&frequency, &actual)| {
            let truncated_mass =
                nbd_log_mass(r, alpha, frequency).exp() / (1.0 - p_zero);
            FrequencyBucket {
                frequency,
                actual,
                predicted: truncated_mass * n_observed as f64,
            }
        })
        .collect()
}
