use bizpulse_core::clv::ClvScorer;
use bizpulse_core::config::ClvConfig;
use bizpulse_core::{CustomerSummary, InsufficientDataReason, LifetimeValueEstimator};
use chrono::{TimeZone, Utc};

// ── Helpers ──────────────────────────────────────────────────────────────────

fn customer(name: &str, frequency: u64, avg_spend: f64) -> CustomerSummary {
    let when = Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap();
    CustomerSummary {
        customer_id: name.to_string(),
        frequency,
        recency: when,
        first_visit: when,
        total_spend: avg_spend * frequency as f64,
        avg_spend,
        days_since_last_visit: 20,
        email: None,
        phone: None,
        segment: String::new(),
    }
}

fn estimator() -> LifetimeValueEstimator {
    LifetimeValueEstimator::new(ClvConfig::default())
}

/// n repeat customers with slightly varied spend, plus some one-timers.
fn population(repeats: usize) -> Vec<CustomerSummary> {
    let mut table = Vec::new();
    for i in 0..repeats {
        table.push(customer(&format!("r{i}"), 2 + (i as u64 % 3), 35.0 + i as f64));
    }
    for i in 0..5 {
        table.push(customer(&format!("s{i}"), 1, 30.0));
    }
    table
}

// ── Tests ────────────────────────────────────────────────────────────────────

/// Below 10 qualifying repeat customers the result is a hard
/// insufficient-data error carrying the reason, never a partial number.
#[test]
fn too_few_repeat_customers_is_insufficient_data() {
    let table = population(9);
    let err = estimator().estimate(&table).unwrap_err();

    assert_eq!(
        err.insufficient_reason(),
        Some(InsufficientDataReason::TooFewRepeatCustomers { got: 9, need: 10 }),
    );
}

/// The documented heuristic: clv = avg_spend × frequency × 1.2, only for
/// frequency >= 2, and every score is non-negative.
#[test]
fn clv_formula_and_eligibility() {
    let table = population(12);
    let result = estimator().estimate(&table).unwrap();

    assert_eq!(result.n_repeat, 12);
    for row in &result.customers {
        let expected = row.avg_spend * row.frequency as f64 * 1.2;
        assert!((row.clv - expected).abs() < 1e-9);
        assert!(row.clv >= 0.0);
        assert!(row.frequency >= 2);
    }
}

/// Aggregates: total is the sum, mean is total / n, and the top decile's
/// mean can never fall below the overall mean.
#[test]
fn top_decile_dominates_mean() {
    let table = population(25);
    let result = estimator().estimate(&table).unwrap();

    let sum: f64 = result.customers.iter().map(|r| r.clv).sum();
    assert!((result.total_clv - sum).abs() < 1e-9);
    assert!((result.avg_clv - sum / 25.0).abs() < 1e-9);
    assert!(result.top_decile_clv >= result.avg_clv);
}

/// With 10..19 repeats the decile rounds up to a single customer: the top
/// decile equals the best individual CLV.
#[test]
fn decile_size_is_at_least_one() {
    let table = population(10);
    let result = estimator().estimate(&table).unwrap();

    let best = result
        .customers
        .iter()
        .map(|r| r.clv)
        .fold(f64::MIN, f64::max);
    assert!((result.top_decile_clv - best).abs() < 1e-9);
}

/// Hidden gems are drawn from all customers: low frequency, above-median
/// per-visit spend, ranked by spend descending, capped at 10, with the
/// monthly-cadence projection.
#[test]
fn hidden_gems_filter_rank_and_cap() {
    let mut table = Vec::new();
    // 12 repeat regulars at modest spend anchor the median near 30.
    for i in 0..12 {
        table.push(customer(&format!("r{i}"), 5, 28.0 + (i % 3) as f64));
    }
    // Low-frequency big spenders: all qualify.
    for i in 0..12 {
        table.push(customer(&format!("gem{i}"), 2, 80.0 + i as f64));
    }
    // Low-frequency low spender: below median, excluded.
    table.push(customer("cheap", 1, 5.0));
    // High-frequency big spender: spend qualifies, frequency does not.
    table.push(customer("whale", 30, 120.0));

    let result = estimator().estimate(&table).unwrap();
    let gems = &result.hidden_gems;

    assert_eq!(gems.len(), 10, "cap at 10");
    assert!(gems.iter().all(|g| g.frequency <= 4));
    assert!(gems.iter().all(|g| g.customer_id.starts_with("gem")));
    // Descending by avg_spend: gem11 (91.0) first.
    assert_eq!(gems[0].customer_id, "gem11");
    for pair in gems.windows(2) {
        assert!(pair[0].avg_spend >= pair[1].avg_spend);
    }
    for gem in gems {
        assert!((gem.projected_clv_if_regular - gem.avg_spend * 12.0).abs() < 1e-9);
    }
}

/// Equal spends keep customer-table order (stable ranking).
#[test]
fn hidden_gem_ties_keep_input_order() {
    let mut table = population(12);
    table.push(customer("tie-first", 1, 200.0));
    table.push(customer("tie-second", 1, 200.0));

    let result = estimator().estimate(&table).unwrap();
    let ids: Vec<&str> = result
        .hidden_gems
        .iter()
        .map(|g| g.customer_id.as_str())
        .collect();

    let first = ids.iter().position(|id| *id == "tie-first").unwrap();
    let second = ids.iter().position(|id| *id == "tie-second").unwrap();
    assert!(first < second);
}

/// Scenario: a frequency-20, $50-per-visit customer in a $40-ish population
/// tops the decile with clv = 50 × 20 × 1.2 = 1200.
#[test]
fn heavy_spender_tops_the_decile() {
    let mut table = Vec::new();
    table.push(customer("star", 20, 50.0));
    for i in 0..14 {
        table.push(customer(&format!("r{i}"), 2 + (i as u64 % 2), 40.0));
    }

    let result = estimator().estimate(&table).unwrap();

    assert_eq!(result.n_repeat, 15);
    assert!((result.top_decile_clv - 1200.0).abs() < 1e-9);
    assert!(result.avg_clv < 1200.0);
}

/// The formula is a replaceable strategy; swapping it leaves eligibility
/// and aggregation untouched.
#[test]
fn scorer_is_replaceable() {
    struct FlatScorer;
    impl ClvScorer for FlatScorer {
        fn clv(&self, _customer: &CustomerSummary) -> f64 {
            100.0
        }
    }

    let table = population(12);
    let result = LifetimeValueEstimator::with_scorer(
        ClvConfig::default(),
        Box::new(FlatScorer),
    )
    .estimate(&table)
    .unwrap();

    assert_eq!(result.n_repeat, 12);
    assert!((result.avg_clv - 100.0).abs() < 1e-9);
    assert!((result.top_decile_clv - 100.0).abs() < 1e-9);
}
