//! Interest to purchase-category co-occurrence counts

use std::collections::{BTreeMap, HashMap};

use super::snapshot::{CustomerIndex, Snapshot};

/// `interest -> category -> count`, where each completed order adds one for every
/// interest its buyer holds (union across the buyer's preference history).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CoOccurrenceIndex {
    matrix: HashMap<String, HashMap<String, u64>>,
}

impl CoOccurrenceIndex {
    pub fn build(snapshot: &Snapshot, customers: &CustomerIndex<'_>) -> Self {
        let mut matrix: HashMap<String, HashMap<String, u64>> = HashMap::new();

        for order in snapshot.completed_orders() {
            let Some(profile) = customers.profile(&order.email) else {
                continue;
            };

            for interest in &profile.interests {
                *matrix
                    .entry(interest.clone())
                    .or_default()
                    .entry(order.category.clone())
                    .or_insert(0) += 1;
            }
        }

        Self { matrix }
    }

    pub fn count(&self, interest: &str, category: &str) -> u64 {
        self.matrix
            .get(interest)
            .and_then(|categories| categories.get(category))
            .copied()
            .unwrap_or(0)
    }

    /// Categories co-occurring with `interest`, sorted by category name.
    pub fn categories_for(&self, interest: &str) -> BTreeMap<&str, u64> {
        self.matrix
            .get(interest)
            .map(|categories| {
                categories.iter().map(|(category, count)| (category.as_str(), *count)).collect()
            })
            .unwrap_or_default()
    }

    pub fn interest_count(&self) -> usize {
        self.matrix.len()
    }

    pub fn is_empty(&self) -> bool {
        self.matrix.is_empty()
    }
}
