use std::collections::HashSet;

use affinity_core::insights::{InsightEngine, InsightSettings};
use affinity_db::{connect_with_settings, migrations, sql_snapshot_source, DemoSnapshotDataset};
use serde::Deserialize;

type SeedContractTestResult<T = ()> = Result<T, String>;

macro_rules! require {
    ($cond:expr) => {
        if !$cond {
            return Err(format!("assertion failed: `{}`", stringify!($cond)));
        }
    };
    ($cond:expr, $($arg:tt)*) => {
        if !$cond {
            return Err(format!($($arg)*));
        }
    };
}

macro_rules! require_eq {
    ($left:expr, $right:expr) => {
        if $left != $right {
            return Err(format!(
                "assertion failed: `left == right` (`{:?}` != `{:?}`)",
                $left,
                $right
            ));
        }
    };
    ($left:expr, $right:expr, $($arg:tt)*) => {
        if $left != $right {
            return Err(format!($($arg)*));
        }
    };
}

#[derive(Debug, Deserialize)]
struct Totals {
    preference_records: usize,
    order_records: usize,
    completed_orders: usize,
    known_customers: usize,
}

#[derive(Debug, Deserialize)]
struct SeedCustomerContract {
    email: String,
    preference_ids: Vec<String>,
    order_ids: Vec<String>,
    completed_orders: usize,
    current_interests: Vec<String>,
    current_frequency: Option<String>,
    description: String,
}

#[derive(Debug, Deserialize)]
struct TopRecommendation {
    email: String,
    category: String,
    score: f64,
}

#[derive(Debug, Deserialize)]
struct Expectations {
    most_popular_category: String,
    most_popular_count: u64,
    top_recommendation: TopRecommendation,
    most_central_interest: String,
    most_central_connections: usize,
}

#[derive(Debug, Deserialize)]
struct SeedContract {
    dataset_version: String,
    seed_dataset: String,
    totals: Totals,
    customers: Vec<SeedCustomerContract>,
    expectations: Expectations,
}

fn load_contract() -> SeedContractTestResult<SeedContract> {
    serde_json::from_str(include_str!("../../../config/fixtures/demo_snapshot_contract.json"))
        .map_err(|error| format!("demo snapshot contract JSON must parse: {error}"))
}

#[test]
fn seed_contract_matches_demo_sql_fixture() -> SeedContractTestResult {
    let fixture_sql = include_str!("../../../config/fixtures/demo_snapshot.sql");
    let contract = load_contract()?;
    let mut emails_seen = HashSet::new();
    let mut ids_seen = HashSet::new();

    require_eq!(contract.dataset_version, "affinity-demo-1");
    require_eq!(contract.seed_dataset, "deterministic_interest_snapshot");
    require_eq!(contract.customers.len(), contract.totals.known_customers);

    for customer in &contract.customers {
        require!(
            emails_seen.insert(customer.email.clone()),
            "duplicate customer: {}",
            customer.email
        );
        require!(!customer.description.is_empty());
        require!(customer.completed_orders <= customer.order_ids.len());
        require!(
            customer.preference_ids.is_empty() == customer.current_frequency.is_none(),
            "current frequency should exist exactly when preferences exist for {}",
            customer.email
        );

        for id in customer.preference_ids.iter().chain(&customer.order_ids) {
            require!(ids_seen.insert(id.clone()), "duplicate record id: {id}");
            require!(
                fixture_sql.contains(&format!("('{id}', ")),
                "seed SQL fixture should include record {} for {}",
                id,
                customer.email
            );
        }

        if let Some(frequency) = &customer.current_frequency {
            let interests_json =
                serde_json::to_string(&customer.current_interests).map_err(|e| e.to_string())?;
            require!(
                fixture_sql.contains(&format!("'{}', '{}'", interests_json, frequency)),
                "seed SQL fixture should include current interests {} for {}",
                interests_json,
                customer.email
            );
        }
    }

    let preference_total: usize = contract.customers.iter().map(|c| c.preference_ids.len()).sum();
    let order_total: usize = contract.customers.iter().map(|c| c.order_ids.len()).sum();
    let completed_total: usize = contract.customers.iter().map(|c| c.completed_orders).sum();
    require_eq!(preference_total, contract.totals.preference_records);
    require_eq!(order_total, contract.totals.order_records);
    require_eq!(completed_total, contract.totals.completed_orders);
    require_eq!(fixture_sql.matches("'completed',").count(), contract.totals.completed_orders);

    Ok(())
}

#[tokio::test]
async fn seeded_snapshot_meets_insight_expectations() -> SeedContractTestResult {
    let contract = load_contract()?;
    let pool = connect_with_settings("sqlite::memory:", 1, 30)
        .await
        .map_err(|error| format!("connect: {error}"))?;
    migrations::run_pending(&pool).await.map_err(|error| format!("migrate: {error}"))?;
    DemoSnapshotDataset::load(&pool).await.map_err(|error| format!("seed: {error}"))?;

    let engine =
        InsightEngine::with_settings(sql_snapshot_source(pool.clone()), InsightSettings::default());

    let summary = engine.summarize().await.map_err(|error| error.to_string())?;
    require_eq!(summary.preference_records, contract.totals.preference_records);
    require_eq!(summary.order_records, contract.totals.order_records);
    require_eq!(summary.completed_orders, contract.totals.completed_orders);
    require_eq!(summary.known_customers, contract.totals.known_customers);

    let expected = &contract.expectations;
    let popular = engine.recommend("nobody@northwind.test", 1).await.map_err(|e| e.to_string())?;
    require_eq!(popular.len(), 1);
    require_eq!(popular[0].category, expected.most_popular_category);
    require_eq!(popular[0].score, expected.most_popular_count as f64);

    let recommendations = engine
        .recommend(&expected.top_recommendation.email, 3)
        .await
        .map_err(|error| error.to_string())?;
    require!(!recommendations.is_empty(), "recommendations should not be empty");
    require_eq!(recommendations[0].category, expected.top_recommendation.category);
    require_eq!(recommendations[0].score, expected.top_recommendation.score);

    let centrality = engine.rank_interest_centrality().await.map_err(|e| e.to_string())?;
    require!(!centrality.is_empty(), "centrality should not be empty");
    require_eq!(centrality[0].interest, expected.most_central_interest);
    require_eq!(centrality[0].connections, expected.most_central_connections);
    require_eq!(centrality[0].centrality, 1.0);

    let report = engine.full_report("mia@northwind.test").await.map_err(|e| e.to_string())?;
    require!(report.recommendations.len() <= 5);
    require!(report.segment_opportunities.len() <= 10);
    require!(report.frequent_patterns.len() <= 10);
    require!(report.interest_centrality.len() <= 5);

    pool.close().await;
    Ok(())
}
