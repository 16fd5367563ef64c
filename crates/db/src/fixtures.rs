use std::collections::BTreeSet;

use sqlx::Executor;

use crate::connection::DbPool;
use crate::repositories::RepositoryError;

/// Per-customer contract for the demo snapshot.
const SEED_CUSTOMERS: &[SeedCustomerContract] = &[
    SeedCustomerContract {
        email: "mia@northwind.test",
        preference_ids: &["pd-mia-1", "pd-mia-2"],
        order_ids: &["od-mia-1", "od-mia-2"],
        completed_orders: 2,
        current_interests: &["Gaming", "Music", "Tech"],
        current_frequency: Some("weekly"),
        description: "Interest history with a widened current record",
    },
    SeedCustomerContract {
        email: "leo@northwind.test",
        preference_ids: &["pd-leo-1"],
        order_ids: &["od-leo-1", "od-leo-2", "od-leo-3"],
        completed_orders: 2,
        current_interests: &["Tech", "Travel"],
        current_frequency: Some("daily"),
        description: "High-value buyer with one refunded order",
    },
    SeedCustomerContract {
        email: "ava@northwind.test",
        preference_ids: &["pd-ava-1"],
        order_ids: &["od-ava-1", "od-ava-2"],
        completed_orders: 2,
        current_interests: &["Cooking", "Fitness", "Travel"],
        current_frequency: Some("monthly"),
        description: "Diverse interests, low spend",
    },
    SeedCustomerContract {
        email: "kai@northwind.test",
        preference_ids: &["pd-kai-1"],
        order_ids: &["od-kai-1", "od-kai-2"],
        completed_orders: 1,
        current_interests: &["Tech"],
        current_frequency: Some("weekly"),
        description: "Single interest with a pending electronics order",
    },
    SeedCustomerContract {
        email: "zoe@northwind.test",
        preference_ids: &["pd-zoe-1", "pd-zoe-2"],
        order_ids: &["od-zoe-1", "od-zoe-2", "od-zoe-3"],
        completed_orders: 2,
        current_interests: &["Beauty", "Fashion", "Travel"],
        current_frequency: Some("monthly"),
        description: "Frequency change across history, cancelled travel order",
    },
    SeedCustomerContract {
        email: "sam@northwind.test",
        preference_ids: &[],
        order_ids: &["od-sam-1", "od-sam-2"],
        completed_orders: 2,
        current_interests: &[],
        current_frequency: None,
        description: "Buyer without preferences, mixed currencies",
    },
    SeedCustomerContract {
        email: "eli@northwind.test",
        preference_ids: &["pd-eli-1"],
        order_ids: &[],
        completed_orders: 0,
        current_interests: &["Gaming", "Music"],
        current_frequency: Some("daily"),
        description: "Preferences without purchases",
    },
];

/// Deterministic demo snapshot for operators and integration tests.
///
/// Seven customers covering preference history, buyers without preferences, customers
/// without orders, and every non-completed order status.
pub struct DemoSnapshotDataset;

impl DemoSnapshotDataset {
    pub const SQL: &str = include_str!("../../../config/fixtures/demo_snapshot.sql");

    /// Load the dataset. Reloading replaces the seeded rows in place.
    pub async fn load(pool: &DbPool) -> Result<SeedResult, RepositoryError> {
        let mut tx = pool.begin().await?;

        tx.execute(sqlx::query(Self::SQL)).await?;
        tx.commit().await?;

        let customers_seeded = SEED_CUSTOMERS
            .iter()
            .map(|customer| CustomerSeedInfo {
                email: customer.email,
                description: customer.description,
            })
            .collect::<Vec<_>>();

        Ok(SeedResult {
            customers_seeded,
            preference_records: seeded_preference_ids().len(),
            order_records: seeded_order_ids().len(),
        })
    }

    /// Verify that the seeded rows exist and match the contract.
    pub async fn verify(pool: &DbPool) -> Result<VerificationResult, RepositoryError> {
        let mut checks = Vec::new();

        let preference_ids = seeded_preference_ids();
        let quoted_preferences = sql_array_from_ids(&preference_ids);
        let preference_total: i64 = sqlx::query_scalar(&format!(
            "SELECT COUNT(1) FROM preference_record WHERE id IN {quoted_preferences}"
        ))
        .fetch_one(pool)
        .await?;
        checks.push((
            "preference-records".to_string(),
            preference_total == preference_ids.len() as i64,
        ));

        let order_ids = seeded_order_ids();
        let quoted_orders = sql_array_from_ids(&order_ids);
        let order_total: i64 = sqlx::query_scalar(&format!(
            "SELECT COUNT(1) FROM order_record WHERE id IN {quoted_orders}"
        ))
        .fetch_one(pool)
        .await?;
        checks.push(("order-records".to_string(), order_total == order_ids.len() as i64));

        for customer in SEED_CUSTOMERS {
            let preference_count: i64 = sqlx::query_scalar(
                "SELECT COUNT(1) FROM preference_record WHERE email = ?1",
            )
            .bind(customer.email)
            .fetch_one(pool)
            .await?;
            checks.push((
                format!("{}:preferences", customer.email),
                preference_count == customer.preference_ids.len() as i64,
            ));

            let completed: i64 = sqlx::query_scalar(
                "SELECT COUNT(1) FROM order_record WHERE email = ?1 AND status = 'completed'",
            )
            .bind(customer.email)
            .fetch_one(pool)
            .await?;
            checks.push((
                format!("{}:completed-orders", customer.email),
                completed == customer.completed_orders,
            ));

            checks.push((
                format!("{}:current-state", customer.email),
                Self::verify_current_state(pool, customer).await?,
            ));
        }

        let all_present = checks.iter().all(|(_, ok)| *ok);
        Ok(VerificationResult { all_present, checks })
    }

    async fn verify_current_state(
        pool: &DbPool,
        customer: &SeedCustomerContract,
    ) -> Result<bool, RepositoryError> {
        let current = sqlx::query_as::<_, (String, String)>(
            "SELECT interests_json, frequency
             FROM preference_record
             WHERE email = ?1
             ORDER BY created_at DESC, updated_at DESC
             LIMIT 1",
        )
        .bind(customer.email)
        .fetch_optional(pool)
        .await?;

        let Some((interests_json, frequency)) = current else {
            return Ok(
                customer.current_frequency.is_none() && customer.current_interests.is_empty()
            );
        };

        let interests: BTreeSet<String> = serde_json::from_str(&interests_json)
            .map_err(|error| RepositoryError::Decode(error.to_string()))?;
        let expected: BTreeSet<String> =
            customer.current_interests.iter().map(|interest| interest.to_string()).collect();

        Ok(interests == expected && customer.current_frequency == Some(frequency.as_str()))
    }

    /// Remove the seeded rows.
    pub async fn clean(pool: &DbPool) -> Result<(), RepositoryError> {
        let mut tx = pool.begin().await?;

        let quoted_preferences = sql_array_from_ids(&seeded_preference_ids());
        let quoted_orders = sql_array_from_ids(&seeded_order_ids());

        sqlx::query(&format!("DELETE FROM order_record WHERE id IN {quoted_orders}"))
            .execute(&mut *tx)
            .await?;
        sqlx::query(&format!("DELETE FROM preference_record WHERE id IN {quoted_preferences}"))
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }
}

#[derive(Debug, Clone, Copy)]
struct SeedCustomerContract {
    email: &'static str,
    preference_ids: &'static [&'static str],
    order_ids: &'static [&'static str],
    completed_orders: i64,
    current_interests: &'static [&'static str],
    current_frequency: Option<&'static str>,
    description: &'static str,
}

fn seeded_preference_ids() -> Vec<&'static str> {
    SEED_CUSTOMERS.iter().flat_map(|customer| customer.preference_ids.iter().copied()).collect()
}

fn seeded_order_ids() -> Vec<&'static str> {
    SEED_CUSTOMERS.iter().flat_map(|customer| customer.order_ids.iter().copied()).collect()
}

fn sql_array_from_ids(ids: &[&str]) -> String {
    let quoted = ids.iter().map(|id| format!("'{}'", id)).collect::<Vec<_>>().join(",");
    format!("({quoted})")
}

#[derive(Debug)]
pub struct SeedResult {
    pub customers_seeded: Vec<CustomerSeedInfo>,
    pub preference_records: usize,
    pub order_records: usize,
}

#[derive(Debug)]
pub struct CustomerSeedInfo {
    pub email: &'static str,
    pub description: &'static str,
}

#[derive(Debug)]
pub struct VerificationResult {
    pub all_present: bool,
    pub checks: Vec<(String, bool)>,
}

#[cfg(test)]
mod tests {
    use serde_json::Value;

    use super::*;
    use crate::{connect_with_settings, migrations};

    #[test]
    fn sql_fixture_is_valid() {
        assert!(!DemoSnapshotDataset::SQL.is_empty());
        for id in seeded_preference_ids().into_iter().chain(seeded_order_ids()) {
            assert!(DemoSnapshotDataset::SQL.contains(&format!("'{id}'")), "{id} missing");
        }
    }

    #[tokio::test]
    async fn verify_seed_contract_and_idempotency() {
        let pool = connect_with_settings("sqlite::memory:", 1, 30)
            .await
            .expect("connect to test database");

        migrations::run_pending(&pool).await.expect("run migrations");

        let first = DemoSnapshotDataset::load(&pool).await.expect("load seed fixtures");
        let first_verification =
            DemoSnapshotDataset::verify(&pool).await.expect("verify seed fixtures");
        assert!(first_verification.all_present, "{:?}", first_verification.checks);
        assert_eq!(first.customers_seeded.len(), 7);
        assert_eq!(first.preference_records, 8);
        assert_eq!(first.order_records, 14);

        let second = DemoSnapshotDataset::load(&pool).await.expect("reload seed fixtures");
        let second_verification =
            DemoSnapshotDataset::verify(&pool).await.expect("re-verify seed fixtures");
        assert!(second_verification.all_present);
        assert_eq!(second.customers_seeded.len(), 7);
        assert_eq!(first_verification.checks, second_verification.checks);
    }

    #[tokio::test]
    async fn clean_removes_seeded_rows() {
        let pool = connect_with_settings("sqlite::memory:", 1, 30)
            .await
            .expect("connect to test database");
        migrations::run_pending(&pool).await.expect("run migrations");

        DemoSnapshotDataset::load(&pool).await.expect("load seed fixtures");
        DemoSnapshotDataset::clean(&pool).await.expect("clean seed fixtures");

        let remaining: i64 = sqlx::query_scalar(
            "SELECT (SELECT COUNT(1) FROM preference_record) + (SELECT COUNT(1) FROM order_record)",
        )
        .fetch_one(&pool)
        .await
        .expect("count rows");
        assert_eq!(remaining, 0);

        let verification = DemoSnapshotDataset::verify(&pool).await.expect("verify");
        assert!(!verification.all_present);
    }

    #[test]
    fn seed_contract_json_matches_rust_seed_constants() {
        let contract: Value = serde_json::from_str(include_str!(
            "../../../config/fixtures/demo_snapshot_contract.json"
        ))
        .expect("demo snapshot contract JSON must parse");

        assert_eq!(contract["dataset_version"].as_str(), Some("affinity-demo-1"));
        assert_eq!(contract["seed_dataset"].as_str(), Some("deterministic_interest_snapshot"));
        assert_eq!(
            contract["totals"]["preference_records"].as_u64(),
            Some(seeded_preference_ids().len() as u64)
        );
        assert_eq!(
            contract["totals"]["order_records"].as_u64(),
            Some(seeded_order_ids().len() as u64)
        );

        let contract_customers =
            contract["customers"].as_array().expect("customers should be an array");
        assert_eq!(contract_customers.len(), SEED_CUSTOMERS.len());

        for customer in SEED_CUSTOMERS {
            let entry = contract_customers
                .iter()
                .find(|candidate| candidate["email"].as_str() == Some(customer.email))
                .expect("contract should include every seeded customer");

            let strings = |field: &str| -> Vec<String> {
                entry[field]
                    .as_array()
                    .expect("array field")
                    .iter()
                    .map(|value| value.as_str().unwrap_or_default().to_string())
                    .collect()
            };

            assert_eq!(strings("preference_ids"), customer.preference_ids);
            assert_eq!(strings("order_ids"), customer.order_ids);
            assert_eq!(strings("current_interests"), customer.current_interests);
            assert_eq!(entry["completed_orders"].as_i64(), Some(customer.completed_orders));
            assert_eq!(entry["current_frequency"].as_str(), customer.current_frequency);
            assert_eq!(entry["description"].as_str(), Some(customer.description));
        }
    }
}
