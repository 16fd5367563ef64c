//! Interest Insights Engine
//!
//! Derives category recommendations, frequent interest patterns, segment candidates and
//! interest centrality from a snapshot of preference declarations and purchase orders.
//! Every call reads one snapshot and rebuilds its derived structures from scratch.

mod centrality;
mod cooccurrence;
mod engine;
mod itemsets;
mod segments;
mod snapshot;
mod source;
mod summary;
mod topk;
mod types;

pub use centrality::rank_interest_centrality;
pub use cooccurrence::CoOccurrenceIndex;
pub use engine::{InsightEngine, SnapshotInsights};
pub use itemsets::{mine_frequent_itemsets, min_count_for};
pub use segments::list_segment_opportunities;
pub use snapshot::{CustomerIndex, EmailProfile, Snapshot};
pub use source::SnapshotSource;
pub use summary::summarize;
pub use topk::TopK;
pub use types::*;

use serde::{Deserialize, Serialize};

use crate::errors::ApplicationError;

/// Result type for insight operations
pub type InsightResult<T> = Result<T, ApplicationError>;

/// Multiplier applied to categories the customer has never bought.
pub const DEFAULT_EXPLORATION_BOOST: f64 = 1.5;

/// Lifetime spend, in minor units, that qualifies a customer as high value.
pub const HIGH_VALUE_SPEND_MINOR: u64 = 10_000;

/// Distinct interests needed for the diverse-profile segment.
pub const DIVERSE_INTEREST_THRESHOLD: usize = 3;

pub const MAX_SEGMENTS: usize = 10;

pub const REPORT_MIN_SUPPORT: f64 = 0.05;

pub const POPULAR_CATEGORY_REASON: &str = "Popular category";

/// Tunables for the engine. Defaults reproduce the documented constants.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct InsightSettings {
    pub exploration_boost: f64,
    pub high_value_spend_minor: u64,
    pub diverse_interest_threshold: usize,
    /// Minimum support used when mining itemsets for segment discovery.
    pub segment_min_support: f64,
    pub max_segments: usize,
    pub report_recommendations: usize,
    pub report_min_support: f64,
    pub report_patterns: usize,
    pub report_centrality: usize,
}

pub const DEFAULT_SETTINGS: InsightSettings = InsightSettings {
    exploration_boost: DEFAULT_EXPLORATION_BOOST,
    high_value_spend_minor: HIGH_VALUE_SPEND_MINOR,
    diverse_interest_threshold: DIVERSE_INTEREST_THRESHOLD,
    segment_min_support: REPORT_MIN_SUPPORT,
    max_segments: MAX_SEGMENTS,
    report_recommendations: 5,
    report_min_support: REPORT_MIN_SUPPORT,
    report_patterns: 10,
    report_centrality: 5,
};

impl Default for InsightSettings {
    fn default() -> Self {
        DEFAULT_SETTINGS
    }
}

/// `numerator / denominator`, or zero when there is nothing to divide by.
pub(crate) fn ratio(numerator: u64, denominator: u64) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64
    }
}

pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
