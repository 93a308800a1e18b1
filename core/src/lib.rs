//! bizpulse-core: statistical customer-value modeling over a per-visit
//! transaction log.
//!
//! The core turns already-ingested transaction rows into population-level
//! marketing insight:
//!
//! - `aggregator`: one row per customer (frequency, recency, spend)
//! - `segmentation`: frequency-band segments and per-segment revenue
//! - `latent_demand`: zero-truncated NBD fit, unobserved-market estimate
//! - `clv`: lifetime-value heuristic and hidden-gem detection
//! - `churn`: churn-risk heuristic with tiers and revenue-at-risk
//! - `engine`: façade sequencing the above over one customer table
//!
//! Everything is pure and synchronous: results are recomputed per call from
//! the input slice, the recency reference instant is injected, and nothing
//! persists. Ingestion (CSV parsing, status filtering) and presentation
//! (charts, currency formatting, outreach links) are external collaborators.

pub mod aggregator;
pub mod churn;
pub mod clv;
pub mod config;
pub mod engine;
pub mod error;
pub mod latent_demand;
pub mod optimizer;
pub mod segmentation;
pub mod types;

pub use aggregator::{CustomerAggregator, CustomerSummary, TransactionRecord};
pub use churn::{ChurnResult, ChurnRiskScorer, RiskTier};
pub use clv::{ClvResult, HiddenGem, LifetimeValueEstimator};
pub use config::{AnalyticsConfig, SegmentBand};
pub use engine::AnalyticsEngine;
pub use error::{AnalyticsError, AnalyticsResult, InsufficientDataReason};
pub use latent_demand::{
    FitQuality, Heterogeneity, LatentDemandEstimator, LatentDemandResult,
};
pub use segmentation::{SegmentClassifier, SegmentSummary};
pub use types::AnalysisWindow;
