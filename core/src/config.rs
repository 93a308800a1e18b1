//! Analysis configuration — segment bands, heuristic constants, optimizer budget.
//!
//! Defaults carry the documented constants of the scoring heuristics; they
//! must stay byte-for-byte compatible with published results, so any tuning
//! goes through an explicit config override, never an edit here.
//!
//! RULE: misconfiguration (band gaps, overlaps, bad weights) is rejected
//! when the config is loaded, never silently defaulted at query time.

use crate::error::{AnalyticsError, AnalyticsResult};
use serde::{Deserialize, Serialize};

// ── Segment bands ────────────────────────────────────────────────────────────

/// One frequency band of the segmentation scheme. `max_freq = None` marks
/// the open-ended top band.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SegmentBand {
    pub name:     String,
    pub min_freq: u64,
    #[serde(default)]
    pub max_freq: Option<u64>,
}

impl SegmentBand {
    pub fn new(name: &str, min_freq: u64, max_freq: Option<u64>) -> Self {
        Self { name: name.to_string(), min_freq, max_freq }
    }

    pub fn matches(&self, frequency: u64) -> bool {
        frequency >= self.min_freq
            && self.max_freq.map_or(true, |max| frequency <= max)
    }
}

/// The band scheme of the original dashboard.
pub fn default_segment_bands() -> Vec<SegmentBand> {
    vec![
        SegmentBand::new("Explorer", 1, Some(2)),
        SegmentBand::new("Casual", 3, Some(8)),
        SegmentBand::new("Regular", 9, Some(12)),
        SegmentBand::new("Superuser", 13, None),
    ]
}

// ── Heuristic constants ──────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ClvConfig {
    /// Multiplier standing in for expected continued patronage.
    pub growth_factor: f64,
    /// Minimum qualifying repeat customers before any CLV number is emitted.
    pub min_repeat_customers: usize,
    /// Hidden gems: frequency at or below this counts as "low".
    pub hidden_gem_max_frequency: u64,
    /// Hidden gems: cap on the returned list.
    pub hidden_gem_cap: usize,
    /// Hidden gems: projected CLV multiplier assuming a monthly cadence.
    pub monthly_cadence_multiplier: f64,
}

impl Default for ClvConfig {
    fn default() -> Self {
        Self {
            growth_factor: 1.2,
            min_repeat_customers: 10,
            hidden_gem_max_frequency: 4,
            hidden_gem_cap: 10,
            monthly_cadence_multiplier: 12.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChurnConfig {
    /// Recency is weighted more heavily than frequency by design.
    pub recency_weight: f64,
    pub frequency_weight: f64,
    /// p_churn at or above this is "high" risk.
    pub high_risk_threshold: f64,
    /// p_churn at or above this (but below high) is "medium" risk.
    pub medium_risk_threshold: f64,
    /// Fraction of high-risk customers' spend counted as revenue at risk.
    pub revenue_at_risk_discount: f64,
}

impl Default for ChurnConfig {
    fn default() -> Self {
        Self {
            recency_weight: 0.7,
            frequency_weight: 0.3,
            high_risk_threshold: 0.7,
            medium_risk_threshold: 0.4,
            revenue_at_risk_discount: 0.8,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OptimizerConfig {
    /// Iteration budget. On exhaustion the fit returns best-so-far.
    pub max_iterations: usize,
    /// Convergence tolerance on the simplex spread of objective values.
    pub tolerance: f64,
    /// Feasible interval for both shape and rate parameters.
    pub param_min: f64,
    pub param_max: f64,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            max_iterations: 500,
            tolerance: 1e-9,
            param_min: 0.01,
            param_max: 100.0,
        }
    }
}

// ── Top-level config ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AnalyticsConfig {
    #[serde(default = "default_segment_bands")]
    pub segments: Vec<SegmentBand>,
    #[serde(default)]
    pub clv: ClvConfig,
    #[serde(default)]
    pub churn: ChurnConfig,
    #[serde(default)]
    pub optimizer: OptimizerConfig,
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            segments: default_segment_bands(),
            clv: ClvConfig::default(),
            churn: ChurnConfig::default(),
            optimizer: OptimizerConfig::default(),
        }
    }
}

impl AnalyticsConfig {
    /// Parse and validate a JSON config override. Absent sections fall back
    /// to the documented defaults.
    pub fn from_json_str(raw: &str) -> AnalyticsResult<Self> {
        let config: Self = serde_json::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject any configuration that could produce undefined behavior at
    /// query time.
    pub fn validate(&self) -> AnalyticsResult<()> {
        validate_band_coverage(&self.segments)?;

        let churn = &self.churn;
        for (label, value) in [
            ("recency_weight", churn.recency_weight),
            ("frequency_weight", churn.frequency_weight),
            ("high_risk_threshold", churn.high_risk_threshold),
            ("medium_risk_threshold", churn.medium_risk_threshold),
            ("revenue_at_risk_discount", churn.revenue_at_risk_discount),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(AnalyticsError::InvalidConfig {
                    detail: format!("churn.{label} must be in [0, 1], got {value}"),
                });
            }
        }
        if churn.medium_risk_threshold > churn.high_risk_threshold {
            return Err(AnalyticsError::InvalidConfig {
                detail: "churn.medium_risk_threshold must not exceed high_risk_threshold"
                    .to_string(),
            });
        }

        if self.clv.growth_factor <= 0.0 {
            return Err(AnalyticsError::InvalidConfig {
                detail: "clv.growth_factor must be positive".to_string(),
            });
        }
        if self.clv.min_repeat_customers == 0 {
            return Err(AnalyticsError::InvalidConfig {
                detail: "clv.min_repeat_customers must be at least 1".to_string(),
            });
        }

        let opt = &self.optimizer;
        if opt.max_iterations == 0 {
            return Err(AnalyticsError::InvalidConfig {
                detail: "optimizer.max_iterations must be at least 1".to_string(),
            });
        }
        if !(opt.param_min > 0.0 && opt.param_max > opt.param_min) {
            return Err(AnalyticsError::InvalidConfig {
                detail: format!(
                    "optimizer bounds must satisfy 0 < param_min < param_max, \
                     got [{}, {}]",
                    opt.param_min, opt.param_max
                ),
            });
        }

        Ok(())
    }
}

/// Bands must cover [1, +inf) in order, with no gaps or overlaps and an
/// open-ended top band.
pub(crate) fn validate_band_coverage(bands: &[SegmentBand]) -> AnalyticsResult<()> {
    if bands.is_empty() {
        return Err(AnalyticsError::InvalidConfig {
            detail: "at least one segment band is required".to_string(),
        });
    }

    let mut expected_min = 1u64;
    for (i, band) in bands.iter().enumerate() {
        if band.min_freq != expected_min {
            return Err(AnalyticsError::InvalidConfig {
                detail: format!(
                    "segment band '{}' starts at {} but frequency {} is uncovered",
                    band.name, band.min_freq, expected_min
                ),
            });
        }
        match band.max_freq {
            Some(max) => {
                if max < band.min_freq {
                    return Err(AnalyticsError::InvalidConfig {
                        detail: format!(
                            "segment band '{}' has max_freq {} below min_freq {}",
                            band.name, max, band.min_freq
                        ),
                    });
                }
                if i == bands.len() - 1 {
                    return Err(AnalyticsError::InvalidConfig {
                        detail: format!(
                            "top segment band '{}' must be open-ended",
                            band.name
                        ),
                    });
                }
                expected_min = max + 1;
            }
            None => {
                if i != bands.len() - 1 {
                    return Err(AnalyticsError::InvalidConfig {
                        detail: format!(
                            "only the top segment band may be open-ended, \
                             '{}' is not last",
                            band.name
                        ),
                    });
                }
            }
        }
    }

    Ok(())
}
