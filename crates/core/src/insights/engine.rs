//! Recommendation engine orchestrating the derived structures

use std::collections::BTreeMap;

use tracing::{debug, warn};

use super::centrality::rank_interest_centrality;
use super::cooccurrence::CoOccurrenceIndex;
use super::itemsets::mine_frequent_itemsets;
use super::segments::list_segment_opportunities;
use super::snapshot::{CustomerIndex, EmailProfile, Snapshot};
use super::source::SnapshotSource;
use super::summary::summarize;
use super::topk::TopK;
use super::types::*;
use super::{round2, InsightResult, InsightSettings, POPULAR_CATEGORY_REASON};
use crate::errors::{ApplicationError, LookupError};

/// All engine operations over one snapshot that is already in memory.
#[derive(Debug, Clone)]
pub struct SnapshotInsights<'a> {
    snapshot: &'a Snapshot,
    settings: InsightSettings,
    customers: CustomerIndex<'a>,
}

impl<'a> SnapshotInsights<'a> {
    pub fn new(snapshot: &'a Snapshot, settings: InsightSettings) -> Self {
        Self { snapshot, settings, customers: CustomerIndex::build(snapshot) }
    }

    pub fn snapshot(&self) -> &'a Snapshot {
        self.snapshot
    }

    pub fn customers(&self) -> &CustomerIndex<'a> {
        &self.customers
    }

    /// Up to `k` categories for `email`, best first.
    ///
    /// Customers without a preference record get the popularity ranking. Everyone else is
    /// scored from the co-occurrence index, with never-bought categories multiplied by the
    /// exploration boost, then topped up from the popularity ranking. Only categories that
    /// appear in completed orders are ever returned.
    pub fn recommend(&self, email: &str, k: usize) -> Vec<Recommendation> {
        if k == 0 {
            return Vec::new();
        }

        let profile = match self.customers.profile(email) {
            Some(profile) if profile.has_preferences => profile,
            _ => return self.popular_categories(k),
        };

        let index = CoOccurrenceIndex::build(self.snapshot, &self.customers);
        let mut recommendations = self.personalized(profile, &index, k);

        if recommendations.len() < k {
            let backfill = self.popular_categories(k + recommendations.len());
            for popular in backfill {
                if recommendations.len() == k {
                    break;
                }
                if recommendations.iter().all(|existing| existing.category != popular.category) {
                    recommendations.push(popular);
                }
            }
        }

        recommendations
    }

    fn personalized(
        &self,
        profile: &EmailProfile,
        index: &CoOccurrenceIndex,
        k: usize,
    ) -> Vec<Recommendation> {
        // category -> (score, first interest that contributed)
        let mut scores: BTreeMap<String, (f64, &str)> = BTreeMap::new();
        for interest in &profile.interests {
            for (category, count) in index.categories_for(interest) {
                let entry =
                    scores.entry(category.to_string()).or_insert((0.0, interest.as_str()));
                entry.0 += count as f64;
            }
        }

        let mut top = TopK::new(k);
        for (category, (score, interest)) in scores {
            let score = if profile.purchased_categories.contains(&category) {
                score
            } else {
                score * self.settings.exploration_boost
            };
            top.insert((category, interest), score);
        }

        top.drain()
            .into_iter()
            .map(|((category, interest), score)| Recommendation {
                category,
                score: round2(score),
                reason: format!("Because you like {interest}"),
            })
            .collect()
    }

    /// Top `k` categories by completed-order count; the score is the count.
    pub fn popular_categories(&self, k: usize) -> Vec<Recommendation> {
        let mut counts: BTreeMap<&str, u64> = BTreeMap::new();
        for order in self.snapshot.completed_orders() {
            *counts.entry(order.category.as_str()).or_insert(0) += 1;
        }

        let mut top = TopK::new(k);
        for (category, count) in counts {
            top.insert(category, count as f64);
        }

        top.drain()
            .into_iter()
            .map(|(category, score)| Recommendation {
                category: category.to_string(),
                score,
                reason: POPULAR_CATEGORY_REASON.to_string(),
            })
            .collect()
    }

    pub fn mine_frequent_itemsets(&self, min_support: f64) -> Vec<FrequentItemset> {
        mine_frequent_itemsets(self.snapshot, &self.customers, min_support)
    }

    pub fn list_segment_opportunities(&self) -> Vec<SegmentOpportunity> {
        list_segment_opportunities(self.snapshot, &self.customers, &self.settings)
    }

    pub fn rank_interest_centrality(&self) -> Vec<InterestCentrality> {
        rank_interest_centrality(self.snapshot, &self.customers)
    }

    pub fn full_report(&self, email: &str) -> InsightReport {
        let mut frequent_patterns = self.mine_frequent_itemsets(self.settings.report_min_support);
        frequent_patterns.truncate(self.settings.report_patterns);

        let mut interest_centrality = self.rank_interest_centrality();
        interest_centrality.truncate(self.settings.report_centrality);

        InsightReport {
            recommendations: self.recommend(email, self.settings.report_recommendations),
            segment_opportunities: self.list_segment_opportunities(),
            frequent_patterns,
            interest_centrality,
        }
    }

    pub fn summarize(&self) -> SnapshotSummary {
        summarize(self.snapshot, &self.customers)
    }
}

/// Engine bound to a record source. Every operation performs exactly one snapshot read and
/// keeps nothing between calls.
#[derive(Debug, Clone)]
pub struct InsightEngine<S> {
    source: S,
    settings: InsightSettings,
}

impl<S> InsightEngine<S>
where
    S: SnapshotSource,
{
    pub fn new(source: S) -> Self {
        Self::with_settings(source, InsightSettings::default())
    }

    pub fn with_settings(source: S, settings: InsightSettings) -> Self {
        Self { source, settings }
    }

    pub fn settings(&self) -> &InsightSettings {
        &self.settings
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub async fn load_snapshot(&self) -> InsightResult<Snapshot> {
        let preferences =
            self.source.fetch_all_preferences().await.map_err(lookup_failed)?;
        let orders = self.source.fetch_all_orders().await.map_err(lookup_failed)?;

        debug!(
            event_name = "insights.snapshot.loaded",
            preference_records = preferences.len(),
            order_records = orders.len(),
            "snapshot loaded"
        );
        Ok(Snapshot::new(preferences, orders))
    }

    pub async fn recommend(&self, email: &str, k: usize) -> InsightResult<Vec<Recommendation>> {
        let snapshot = self.load_snapshot().await?;
        Ok(SnapshotInsights::new(&snapshot, self.settings).recommend(email, k))
    }

    pub async fn mine_frequent_itemsets(
        &self,
        min_support: f64,
    ) -> InsightResult<Vec<FrequentItemset>> {
        let snapshot = self.load_snapshot().await?;
        Ok(SnapshotInsights::new(&snapshot, self.settings).mine_frequent_itemsets(min_support))
    }

    pub async fn list_segment_opportunities(&self) -> InsightResult<Vec<SegmentOpportunity>> {
        let snapshot = self.load_snapshot().await?;
        Ok(SnapshotInsights::new(&snapshot, self.settings).list_segment_opportunities())
    }

    pub async fn rank_interest_centrality(&self) -> InsightResult<Vec<InterestCentrality>> {
        let snapshot = self.load_snapshot().await?;
        Ok(SnapshotInsights::new(&snapshot, self.settings).rank_interest_centrality())
    }

    pub async fn full_report(&self, email: &str) -> InsightResult<InsightReport> {
        let snapshot = self.load_snapshot().await?;
        Ok(SnapshotInsights::new(&snapshot, self.settings).full_report(email))
    }

    pub async fn summarize(&self) -> InsightResult<SnapshotSummary> {
        let snapshot = self.load_snapshot().await?;
        Ok(SnapshotInsights::new(&snapshot, self.settings).summarize())
    }
}

fn lookup_failed(error: LookupError) -> ApplicationError {
    warn!(event_name = "insights.snapshot.lookup_failed", error = %error, "snapshot read failed");
    ApplicationError::Lookup(error)
}
