//! Segment discovery from frequent itemsets and profile heuristics

use std::cmp::Ordering;

use super::itemsets::mine_frequent_itemsets;
use super::snapshot::{CustomerIndex, EmailProfile, Snapshot};
use super::types::{FrequentItemset, ItemsetKind, SegmentOpportunity};
use super::{ratio, InsightSettings};

pub const HIGH_VALUE_SEGMENT: &str = "High-Value Customers";
pub const DIVERSE_INTEREST_SEGMENT: &str = "Diverse Interest Profile";

pub fn list_segment_opportunities(
    snapshot: &Snapshot,
    customers: &CustomerIndex<'_>,
    settings: &InsightSettings,
) -> Vec<SegmentOpportunity> {
    let itemsets = mine_frequent_itemsets(snapshot, customers, settings.segment_min_support);
    let mut segments: Vec<SegmentOpportunity> = itemsets
        .iter()
        .filter_map(|itemset| itemset_segment(itemset, customers))
        .collect();

    let known = customers.known_customers() as u64;

    let high_value = count_profiles(customers, |profile| {
        profile.lifetime_spend_minor >= settings.high_value_spend_minor
    });
    if high_value > 0 {
        segments.push(SegmentOpportunity {
            name: HIGH_VALUE_SEGMENT.to_string(),
            predicates: vec![format!("lifetime_spend_minor>={}", settings.high_value_spend_minor)],
            estimated_size: high_value,
            confidence: ratio(high_value, known),
        });
    }

    let diverse = count_profiles(customers, |profile| {
        profile.interests.len() >= settings.diverse_interest_threshold
    });
    if diverse > 0 {
        segments.push(SegmentOpportunity {
            name: DIVERSE_INTEREST_SEGMENT.to_string(),
            predicates: vec![format!("distinct_interests>={}", settings.diverse_interest_threshold)],
            estimated_size: diverse,
            confidence: ratio(diverse, known),
        });
    }

    segments.sort_by(compare_segments);
    segments.truncate(settings.max_segments);
    segments
}

fn itemset_segment(
    itemset: &FrequentItemset,
    customers: &CustomerIndex<'_>,
) -> Option<SegmentOpportunity> {
    let [first, second] = itemset.items.as_slice() else {
        return None;
    };

    match itemset.kind {
        ItemsetKind::SingleInterest => None,
        ItemsetKind::InterestPair => Some(SegmentOpportunity {
            name: format!("{first} & {second} Enthusiasts"),
            predicates: vec![format!("interest:{first}"), format!("interest:{second}")],
            estimated_size: count_profiles(customers, |profile| {
                profile.interests.contains(first) && profile.interests.contains(second)
            }),
            confidence: itemset.support,
        }),
        ItemsetKind::InterestCategoryPair => Some(SegmentOpportunity {
            name: format!("{first} Fans Buying {second}"),
            predicates: vec![format!("interest:{first}"), format!("purchased:{second}")],
            estimated_size: count_profiles(customers, |profile| {
                profile.interests.contains(first) && profile.purchased_categories.contains(second)
            }),
            confidence: itemset.support,
        }),
    }
}

fn count_profiles(
    customers: &CustomerIndex<'_>,
    predicate: impl Fn(&EmailProfile) -> bool,
) -> u64 {
    customers.profiles().filter(|profile| predicate(profile)).count() as u64
}

fn compare_segments(a: &SegmentOpportunity, b: &SegmentOpportunity) -> Ordering {
    b.estimated_size
        .cmp(&a.estimated_size)
        .then_with(|| b.confidence.total_cmp(&a.confidence))
        .then_with(|| a.name.cmp(&b.name))
}
