use std::collections::BTreeMap;

use super::ratio;
use super::snapshot::{CustomerIndex, Snapshot};
use super::types::SnapshotSummary;

/// Record counts, completed revenue per currency and the current digest frequency mix.
pub fn summarize(snapshot: &Snapshot, customers: &CustomerIndex<'_>) -> SnapshotSummary {
    let mut revenue_by_currency: BTreeMap<String, u64> = BTreeMap::new();
    let mut orders_by_currency: BTreeMap<&str, u64> = BTreeMap::new();
    let mut completed_orders = 0usize;

    for order in snapshot.completed_orders() {
        completed_orders += 1;
        let revenue = revenue_by_currency.entry(order.currency.clone()).or_insert(0);
        *revenue = revenue.saturating_add(order.amount_minor);
        *orders_by_currency.entry(order.currency.as_str()).or_insert(0) += 1;
    }

    let average_order_value_by_currency = revenue_by_currency
        .iter()
        .map(|(currency, revenue)| {
            let orders = orders_by_currency.get(currency.as_str()).copied().unwrap_or(0);
            (currency.clone(), ratio(*revenue, orders))
        })
        .collect();

    let mut frequency_distribution: BTreeMap<String, usize> = BTreeMap::new();
    for (_, record) in customers.current_records() {
        *frequency_distribution.entry(record.frequency.as_str().to_string()).or_insert(0) += 1;
    }

    SnapshotSummary {
        preference_records: snapshot.preferences.len(),
        order_records: snapshot.orders.len(),
        known_customers: customers.known_customers(),
        completed_orders,
        revenue_by_currency,
        average_order_value_by_currency,
        frequency_distribution,
    }
}

#[cfg(test)]
mod tests {
    use super::summarize;
    use crate::domain::preference::{DigestFrequency, PreferenceRecord};
    use crate::insights::fixtures::{at, order, storefront};
    use crate::insights::{CustomerIndex, Snapshot};

    #[test]
    fn storefront_summary_counts_completed_revenue() {
        let snapshot = storefront();
        let customers = CustomerIndex::build(&snapshot);
        let summary = summarize(&snapshot, &customers);

        assert_eq!(summary.preference_records, 6);
        assert_eq!(summary.order_records, 7);
        assert_eq!(summary.known_customers, 6);
        assert_eq!(summary.completed_orders, 6);
        assert_eq!(summary.revenue_by_currency.get("USD"), Some(&69_900));
        assert_eq!(summary.average_order_value_by_currency.get("USD"), Some(&11_650.0));
        // One current record per customer with preferences.
        assert_eq!(summary.frequency_distribution.get("weekly"), Some(&5));
    }

    #[test]
    fn currencies_are_kept_apart() {
        let snapshot = Snapshot::new(
            vec![PreferenceRecord::new(
                "p-1",
                "a@x.com",
                ["Tech"],
                DigestFrequency::Monthly,
                at(0),
            )],
            vec![
                order("o-1", "a@x.com", "Books", 1_000),
                order("o-2", "a@x.com", "Books", 3_000).with_currency("EUR"),
                order("o-3", "a@x.com", "Books", 5_000).with_currency("EUR"),
            ],
        );
        let customers = CustomerIndex::build(&snapshot);
        let summary = summarize(&snapshot, &customers);

        assert_eq!(summary.revenue_by_currency.get("USD"), Some(&1_000));
        assert_eq!(summary.revenue_by_currency.get("EUR"), Some(&8_000));
        assert_eq!(summary.average_order_value_by_currency.get("EUR"), Some(&4_000.0));
        assert_eq!(summary.frequency_distribution.get("monthly"), Some(&1));
    }

    #[test]
    fn empty_snapshot_summary_is_zeroed() {
        let snapshot = Snapshot::default();
        let customers = CustomerIndex::build(&snapshot);
        let summary = summarize(&snapshot, &customers);

        assert_eq!(summary.known_customers, 0);
        assert_eq!(summary.completed_orders, 0);
        assert!(summary.revenue_by_currency.is_empty());
        assert!(summary.average_order_value_by_currency.is_empty());
        assert!(summary.frequency_distribution.is_empty());
    }
}
