use bizpulse_core::churn::ChurnScorer;
use bizpulse_core::config::ChurnConfig;
use bizpulse_core::{ChurnRiskScorer, CustomerSummary, InsufficientDataReason, RiskTier};
use chrono::{TimeZone, Utc};

// ── Helpers ──────────────────────────────────────────────────────────────────

fn customer(name: &str, frequency: u64, days_since: i64, total_spend: f64) -> CustomerSummary {
    let when = Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap();
    CustomerSummary {
        customer_id: name.to_string(),
        frequency,
        recency: when,
        first_visit: when,
        total_spend,
        avg_spend: total_spend / frequency as f64,
        days_since_last_visit: days_since,
        email: None,
        phone: None,
        segment: String::new(),
    }
}

fn scorer() -> ChurnRiskScorer {
    ChurnRiskScorer::new(ChurnConfig::default())
}

// ── Tests ────────────────────────────────────────────────────────────────────

/// p_churn = clip(0.7 × recency_score + 0.3 × frequency_score) with scores
/// normalized against the table maxima.
#[test]
fn weighted_formula_matches_documented_constants() {
    let table = vec![
        customer("a", 10, 100, 500.0), // max freq, max days
        customer("b", 5, 50, 250.0),
        customer("c", 1, 0, 40.0),
    ];

    let result = scorer().score(&table).unwrap();

    // a: recency 1.0, frequency 1 - 10/10 = 0 → p = 0.7
    let a = &result.scores[0];
    assert!((a.recency_score - 1.0).abs() < 1e-12);
    assert!((a.frequency_score - 0.0).abs() < 1e-12);
    assert!((a.p_churn - 0.7).abs() < 1e-12);

    // b: recency 0.5, frequency 0.5 → p = 0.35 + 0.15 = 0.5
    let b = &result.scores[1];
    assert!((b.p_churn - 0.5).abs() < 1e-12);

    // c: recency 0, frequency 0.9 → p = 0.27
    let c = &result.scores[2];
    assert!((c.p_churn - 0.27).abs() < 1e-12);

    for s in &result.scores {
        assert!((0.0..=1.0).contains(&s.p_churn));
    }
}

/// Tier edges: >= 0.7 high, >= 0.4 medium, else low.
#[test]
fn tier_thresholds() {
    let table = vec![
        customer("high", 10, 100, 500.0),  // p = 0.7 exactly
        customer("medium", 5, 50, 250.0),  // p = 0.5
        customer("low", 10, 0, 400.0),     // p = 0.0
    ];

    let result = scorer().score(&table).unwrap();

    assert_eq!(result.scores[0].tier, RiskTier::High);
    assert_eq!(result.scores[1].tier, RiskTier::Medium);
    assert_eq!(result.scores[2].tier, RiskTier::Low);
    assert_eq!(result.high_risk_count, 1);
    assert_eq!(result.medium_risk_count, 1);
    assert_eq!(result.low_risk_count, 1);
    assert!((result.still_active_fraction - 1.0 / 3.0).abs() < 1e-12);
}

/// revenue_at_risk is the high tier's spend times the 0.8 discount, so it
/// can never exceed the high tier's total spend.
#[test]
fn revenue_at_risk_is_discounted_high_tier_spend() {
    let table = vec![
        customer("gone1", 1, 200, 300.0),
        customer("gone2", 1, 180, 200.0),
        customer("fresh", 8, 0, 900.0),
    ];

    let result = scorer().score(&table).unwrap();

    let high_spend: f64 = result
        .scores
        .iter()
        .filter(|s| s.tier == RiskTier::High)
        .map(|s| s.total_spend)
        .sum();
    assert!(high_spend > 0.0);
    assert!((result.revenue_at_risk - high_spend * 0.8).abs() < 1e-9);
    assert!(result.revenue_at_risk <= high_spend);
}

/// Zero maxima short-circuit the normalization to 0 instead of dividing:
/// everyone visited today → recency contributes nothing anywhere.
#[test]
fn zero_max_recency_guard() {
    let table = vec![
        customer("a", 3, 0, 100.0),
        customer("b", 6, 0, 200.0),
    ];

    let result = scorer().score(&table).unwrap();

    for s in &result.scores {
        assert_eq!(s.recency_score, 0.0);
        assert!(s.p_churn <= 0.3, "only the frequency term remains");
    }
}

/// Scenario: 100 single-visit customers. Frequency carries no signal
/// (everyone is at the max), so p_churn varies with recency alone.
#[test]
fn single_visit_population_varies_by_recency_only() {
    let table: Vec<CustomerSummary> = (0..100)
        .map(|i| customer(&format!("c{i}"), 1, i, 45.0))
        .collect();

    let result = scorer().score(&table).unwrap();

    for s in &result.scores {
        assert_eq!(s.frequency_score, 0.0);
    }
    let distinct: std::collections::BTreeSet<String> = result
        .scores
        .iter()
        .map(|s| format!("{:.6}", s.p_churn))
        .collect();
    assert!(distinct.len() > 50, "p_churn must vary across recencies");

    // Oldest customer: recency 1.0 → p = 0.7 → high tier.
    assert_eq!(result.scores[99].tier, RiskTier::High);
    // Visited today: p = 0 → low tier.
    assert_eq!(result.scores[0].tier, RiskTier::Low);
}

#[test]
fn empty_table_is_insufficient_data() {
    let err = scorer().score(&[]).unwrap_err();
    assert_eq!(
        err.insufficient_reason(),
        Some(InsufficientDataReason::EmptyCustomerTable),
    );
}

/// The probability formula is a replaceable strategy; tiers and aggregates
/// stay on the configured thresholds.
#[test]
fn model_is_replaceable() {
    struct AlwaysRisky;
    impl ChurnScorer for AlwaysRisky {
        fn probability(&self, _recency: f64, _frequency: f64) -> f64 {
            0.95
        }
    }

    let table = vec![
        customer("a", 3, 10, 100.0),
        customer("b", 6, 2, 200.0),
    ];
    let result =
        ChurnRiskScorer::with_model(ChurnConfig::default(), Box::new(AlwaysRisky))
            .score(&table)
            .unwrap();

    assert_eq!(result.high_risk_count, 2);
    assert!((result.revenue_at_risk - 300.0 * 0.8).abs() < 1e-9);
    assert_eq!(result.still_active_fraction, 0.0);
}
