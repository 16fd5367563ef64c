//! Types produced by the insights engine

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A category suggested to a customer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub category: String,
    /// Non-negative, rounded to two decimals
    pub score: f64,
    /// Human-readable reasoning
    pub reason: String,
}

/// Which counting pass produced an itemset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ItemsetKind {
    #[serde(rename = "single-interest")]
    SingleInterest,
    #[serde(rename = "interest-pair")]
    InterestPair,
    #[serde(rename = "interest-category-pair")]
    InterestCategoryPair,
}

impl ItemsetKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemsetKind::SingleInterest => "single-interest",
            ItemsetKind::InterestPair => "interest-pair",
            ItemsetKind::InterestCategoryPair => "interest-category-pair",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrequentItemset {
    /// One interest, two interests in lexicographic order, or interest then category
    pub items: Vec<String>,
    /// Support ratio in [0, 1]
    pub support: f64,
    /// Raw occurrence count that met the threshold
    pub count: u64,
    pub kind: ItemsetKind,
}

impl FrequentItemset {
    /// `Tech|Electronics` style label
    pub fn label(&self) -> String {
        self.items.join("|")
    }
}

/// A named customer subgroup worth targeting
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmentOpportunity {
    pub name: String,
    pub predicates: Vec<String>,
    pub estimated_size: u64,
    /// Ratio in [0, 1]
    pub confidence: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InterestCentrality {
    pub interest: String,
    /// Normalized degree in [0, 1]
    pub centrality: f64,
    pub connections: usize,
}

/// Everything a dashboard needs for one customer, from a single snapshot read
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InsightReport {
    pub recommendations: Vec<Recommendation>,
    pub segment_opportunities: Vec<SegmentOpportunity>,
    pub frequent_patterns: Vec<FrequentItemset>,
    pub interest_centrality: Vec<InterestCentrality>,
}

/// Shape of the snapshot the other operations consume
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotSummary {
    pub preference_records: usize,
    pub order_records: usize,
    pub known_customers: usize,
    pub completed_orders: usize,
    /// Completed revenue per currency code, minor units
    pub revenue_by_currency: BTreeMap<String, u64>,
    /// Average completed order value per currency code, minor units
    pub average_order_value_by_currency: BTreeMap<String, f64>,
    /// Digest frequency of each customer's current preference record
    pub frequency_distribution: BTreeMap<String, usize>,
}
