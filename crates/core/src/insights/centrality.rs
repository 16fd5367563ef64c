//! Normalized degree centrality over the interest/customer/category graph

use std::collections::{BTreeMap, HashSet};

use super::snapshot::{CustomerIndex, Snapshot};
use super::types::InterestCentrality;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Connection<'a> {
    Customer(&'a str),
    Category(&'a str),
}

/// Each interest connects to the customers whose current preference record holds it and
/// to the categories those customers bought. Centrality is the connection count over the
/// largest connection count of any interest.
pub fn rank_interest_centrality(
    snapshot: &Snapshot,
    customers: &CustomerIndex<'_>,
) -> Vec<InterestCentrality> {
    let mut adjacency: BTreeMap<&str, HashSet<Connection<'_>>> = BTreeMap::new();

    for (email, record) in customers.current_records() {
        for interest in &record.interests {
            adjacency.entry(interest.as_str()).or_default().insert(Connection::Customer(email));
        }
    }

    for order in snapshot.completed_orders() {
        let Some(interests) = customers.current_interests(&order.email) else {
            continue;
        };
        for interest in interests {
            adjacency
                .entry(interest.as_str())
                .or_default()
                .insert(Connection::Category(order.category.as_str()));
        }
    }

    let max_connections = adjacency.values().map(HashSet::len).max().unwrap_or(0).max(1);

    let mut ranked: Vec<InterestCentrality> = adjacency
        .into_iter()
        .map(|(interest, connections)| InterestCentrality {
            interest: interest.to_string(),
            centrality: connections.len() as f64 / max_connections as f64,
            connections: connections.len(),
        })
        .collect();

    ranked.sort_by(|a, b| {
        b.centrality.total_cmp(&a.centrality).then_with(|| a.interest.cmp(&b.interest))
    });
    ranked
}
