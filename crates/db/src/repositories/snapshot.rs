use async_trait::async_trait;
use tracing::debug;

use affinity_core::domain::order::OrderRecord;
use affinity_core::domain::preference::PreferenceRecord;
use affinity_core::errors::LookupError;
use affinity_core::insights::SnapshotSource;

use super::{OrderRepository, PreferenceRepository};

/// Serves engine snapshots straight from the record repositories.
pub struct RepositorySnapshotSource<P, O> {
    preferences: P,
    orders: O,
}

impl<P, O> RepositorySnapshotSource<P, O>
where
    P: PreferenceRepository,
    O: OrderRepository,
{
    pub fn new(preferences: P, orders: O) -> Self {
        Self { preferences, orders }
    }

    pub fn preferences(&self) -> &P {
        &self.preferences
    }

    pub fn orders(&self) -> &O {
        &self.orders
    }
}

#[async_trait]
impl<P, O> SnapshotSource for RepositorySnapshotSource<P, O>
where
    P: PreferenceRepository,
    O: OrderRepository,
{
    async fn fetch_all_preferences(&self) -> Result<Vec<PreferenceRecord>, LookupError> {
        let records = self
            .preferences
            .list_all()
            .await
            .map_err(|error| LookupError::Preferences(error.to_string()))?;
        debug!(event_name = "db.snapshot.preferences_read", count = records.len());
        Ok(records)
    }

    async fn fetch_all_orders(&self) -> Result<Vec<OrderRecord>, LookupError> {
        let records =
            self.orders.list_all().await.map_err(|error| LookupError::Orders(error.to_string()))?;
        debug!(event_name = "db.snapshot.orders_read", count = records.len());
        Ok(records)
    }
}
