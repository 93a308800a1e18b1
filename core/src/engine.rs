//! Analysis engine — sequences the components over one customer table.
//!
//! The engine is a convenience façade: it validates the config once, builds
//! the customer table, and hands it to whichever analyses the caller asks
//! for. Every component remains independently usable; nothing here adds
//! semantics. Each call recomputes from the transaction log — no state is
//! carried between requests, so concurrent engines (or concurrent calls on
//! one engine) share nothing.

use crate::{
    aggregator::{CustomerAggregator, CustomerSummary, TransactionRecord},
    churn::{ChurnResult, ChurnRiskScorer},
    clv::{ClvResult, LifetimeValueEstimator},
    config::AnalyticsConfig,
    error::AnalyticsResult,
    latent_demand::{LatentDemandEstimator, LatentDemandResult},
    segmentation::{SegmentClassifier, SegmentSummary},
    types::AnalysisWindow,
};
use chrono::{DateTime, Utc};

pub struct AnalyticsEngine {
    aggregator: CustomerAggregator,
    classifier: SegmentClassifier,
    latent:     LatentDemandEstimator,
    clv:        LifetimeValueEstimator,
    churn:      ChurnRiskScorer,
}

impl AnalyticsEngine {
    /// Build an engine from a validated config. Invalid segment bands or
    /// constants are rejected here, before any query runs.
    pub fn new(config: AnalyticsConfig) -> AnalyticsResult<Self> {
        config.validate()?;
        Ok(Self {
            aggregator: CustomerAggregator::new(),
            classifier: SegmentClassifier::new(config.segments.clone())?,
            latent: LatentDemandEstimator::new(config.optimizer.clone()),
            clv: LifetimeValueEstimator::new(config.clv.clone()),
            churn: ChurnRiskScorer::new(config.churn.clone()),
        })
    }

    /// Aggregate the transaction log and assign segments. The reference
    /// instant is injected so recency math never touches a global clock.
    pub fn customer_table(
        &self,
        transactions: &[TransactionRecord],
        window: AnalysisWindow,
        reference: DateTime<Utc>,
    ) -> Vec<CustomerSummary> {
        let mut customers =
            self.aggregator.aggregate(transactions, window, reference);
        self.classifier.assign(&mut customers);
        customers
    }

    pub fn segmentation(&self, customers: &[CustomerSummary]) -> Vec<SegmentSummary> {
        self.classifier.summarize(customers)
    }

    pub fn latent_demand(
        &self,
        customers: &[CustomerSummary],
    ) -> AnalyticsResult<LatentDemandResult> {
        self.latent.fit(customers)
    }

    pub fn lifetime_value(
        &self,
        customers: &[CustomerSummary],
    ) -> AnalyticsResult<ClvResult> {
        self.clv.estimate(customers)
    }

    pub fn churn_risk(
        &self,
        customers: &[CustomerSummary],
    ) -> AnalyticsResult<ChurnResult> {
        self.churn.score(customers)
    }
}
