//! Immutable record snapshot and the per-customer views derived from it

use std::collections::{BTreeMap, BTreeSet, HashMap};

use serde::{Deserialize, Serialize};

use crate::domain::normalize_email;
use crate::domain::order::OrderRecord;
use crate::domain::preference::PreferenceRecord;

/// Both record streams as read for one computation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub preferences: Vec<PreferenceRecord>,
    pub orders: Vec<OrderRecord>,
}

impl Snapshot {
    pub fn new(preferences: Vec<PreferenceRecord>, orders: Vec<OrderRecord>) -> Self {
        Self { preferences, orders }
    }

    pub fn is_empty(&self) -> bool {
        self.preferences.is_empty() && self.orders.is_empty()
    }

    pub fn completed_orders(&self) -> impl Iterator<Item = &OrderRecord> {
        self.orders.iter().filter(|order| order.is_completed())
    }
}

/// Aggregated view of one customer. Transient: rebuilt on every call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EmailProfile {
    pub email: String,
    /// Union of interests across every preference record of the customer
    pub interests: BTreeSet<String>,
    /// Categories of completed orders
    pub purchased_categories: BTreeSet<String>,
    /// Sum of completed order amounts, minor units
    pub lifetime_spend_minor: u64,
    pub has_preferences: bool,
}

/// Profiles and current preference state keyed by normalized email.
#[derive(Debug, Clone)]
pub struct CustomerIndex<'a> {
    profiles: BTreeMap<String, EmailProfile>,
    current: HashMap<String, &'a PreferenceRecord>,
}

impl<'a> CustomerIndex<'a> {
    pub fn build(snapshot: &'a Snapshot) -> Self {
        let mut profiles: BTreeMap<String, EmailProfile> = BTreeMap::new();
        let mut current: HashMap<String, &'a PreferenceRecord> = HashMap::new();

        for record in &snapshot.preferences {
            let email = normalize_email(&record.email);

            let profile = profiles
                .entry(email.clone())
                .or_insert_with(|| EmailProfile { email: email.clone(), ..Default::default() });
            profile.has_preferences = true;
            profile.interests.extend(record.interests.iter().cloned());

            // Latest creation wins; later update, then later position, break ties.
            let replace = current.get(&email).map_or(true, |existing| {
                (record.created_at, record.updated_at) >= (existing.created_at, existing.updated_at)
            });
            if replace {
                current.insert(email, record);
            }
        }

        for order in &snapshot.orders {
            let email = normalize_email(&order.email);
            let profile = profiles
                .entry(email.clone())
                .or_insert_with(|| EmailProfile { email, ..Default::default() });

            if order.is_completed() {
                profile.purchased_categories.insert(order.category.clone());
                profile.lifetime_spend_minor =
                    profile.lifetime_spend_minor.saturating_add(order.amount_minor);
            }
        }

        Self { profiles, current }
    }

    pub fn profile(&self, email: &str) -> Option<&EmailProfile> {
        self.profiles.get(&normalize_email(email))
    }

    pub fn profiles(&self) -> impl Iterator<Item = &EmailProfile> {
        self.profiles.values()
    }

    /// Customers seen in either stream
    pub fn known_customers(&self) -> usize {
        self.profiles.len()
    }

    /// Interests of the customer's latest preference record
    pub fn current_interests(&self, email: &str) -> Option<&'a BTreeSet<String>> {
        self.current.get(&normalize_email(email)).map(|record| &record.interests)
    }

    pub fn current_records(&self) -> impl Iterator<Item = (&str, &'a PreferenceRecord)> + '_ {
        self.current.iter().map(|(email, record)| (email.as_str(), *record))
    }
}
