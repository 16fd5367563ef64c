//! Frequent itemset mining over interests and purchase categories
//!
//! Three counting passes:
//! 1. single interests over every preference record
//! 2. unordered interest pairs within each preference record
//! 3. interest/category cross pairs over completed orders, using the buyer's current
//!    preference record
//!
//! A candidate is frequent when its count reaches
//! `max(1, floor((preference records + order records) * min_support))`. Reported support
//! divides by preference records for passes 1-2 and by order records for pass 3.

use std::cmp::Ordering;
use std::collections::HashMap;

use super::ratio;
use super::snapshot::{CustomerIndex, Snapshot};
use super::types::{FrequentItemset, ItemsetKind};

/// Frequency threshold for `total_transactions` records at `min_support`.
pub fn min_count_for(total_transactions: usize, min_support: f64) -> u64 {
    let min_support = clamp_support(min_support);
    let scaled = (total_transactions as f64 * min_support).floor() as u64;
    scaled.max(1)
}

fn clamp_support(min_support: f64) -> f64 {
    if min_support.is_nan() {
        0.0
    } else {
        min_support.clamp(0.0, 1.0)
    }
}

pub fn mine_frequent_itemsets(
    snapshot: &Snapshot,
    customers: &CustomerIndex<'_>,
    min_support: f64,
) -> Vec<FrequentItemset> {
    let total_preferences = snapshot.preferences.len() as u64;
    let total_orders = snapshot.orders.len() as u64;
    let min_count = min_count_for(snapshot.preferences.len() + snapshot.orders.len(), min_support);

    let mut singles: HashMap<&str, u64> = HashMap::new();
    let mut pairs: HashMap<(&str, &str), u64> = HashMap::new();
    let mut cross: HashMap<(&str, &str), u64> = HashMap::new();

    for record in &snapshot.preferences {
        let interests: Vec<&str> = record.interests.iter().map(String::as_str).collect();

        for (position, &first) in interests.iter().enumerate() {
            *singles.entry(first).or_insert(0) += 1;
            // BTreeSet iteration is sorted, so `first < second` holds for every pair.
            for &second in &interests[position + 1..] {
                *pairs.entry((first, second)).or_insert(0) += 1;
            }
        }
    }

    for order in snapshot.completed_orders() {
        let Some(interests) = customers.current_interests(&order.email) else {
            continue;
        };
        for interest in interests {
            *cross.entry((interest.as_str(), order.category.as_str())).or_insert(0) += 1;
        }
    }

    let mut frequent = Vec::new();

    frequent.extend(singles.into_iter().filter(|(_, count)| *count >= min_count).map(
        |(interest, count)| FrequentItemset {
            items: vec![interest.to_string()],
            support: ratio(count, total_preferences),
            count,
            kind: ItemsetKind::SingleInterest,
        },
    ));

    frequent.extend(pairs.into_iter().filter(|(_, count)| *count >= min_count).map(
        |((first, second), count)| FrequentItemset {
            items: vec![first.to_string(), second.to_string()],
            support: ratio(count, total_preferences),
            count,
            kind: ItemsetKind::InterestPair,
        },
    ));

    frequent.extend(cross.into_iter().filter(|(_, count)| *count >= min_count).map(
        |((interest, category), count)| FrequentItemset {
            items: vec![interest.to_string(), category.to_string()],
            support: ratio(count, total_orders),
            count,
            kind: ItemsetKind::InterestCategoryPair,
        },
    ));

    frequent.sort_by(compare_itemsets);
    frequent
}

fn compare_itemsets(a: &FrequentItemset, b: &FrequentItemset) -> Ordering {
    b.support
        .total_cmp(&a.support)
        .then_with(|| b.count.cmp(&a.count))
        .then_with(|| a.kind.cmp(&b.kind))
        .then_with(|| a.items.cmp(&b.items))
}
