use std::sync::Arc;

use async_trait::async_trait;

use crate::domain::order::OrderRecord;
use crate::domain::preference::PreferenceRecord;
use crate::errors::LookupError;

use super::snapshot::Snapshot;

/// Read side of the record store. Implementations must not mutate state on read.
#[async_trait]
pub trait SnapshotSource: Send + Sync {
    async fn fetch_all_preferences(&self) -> Result<Vec<PreferenceRecord>, LookupError>;
    async fn fetch_all_orders(&self) -> Result<Vec<OrderRecord>, LookupError>;
}

#[async_trait]
impl<T> SnapshotSource for Arc<T>
where
    T: SnapshotSource + ?Sized,
{
    async fn fetch_all_preferences(&self) -> Result<Vec<PreferenceRecord>, LookupError> {
        self.as_ref().fetch_all_preferences().await
    }

    async fn fetch_all_orders(&self) -> Result<Vec<OrderRecord>, LookupError> {
        self.as_ref().fetch_all_orders().await
    }
}

/// A held snapshot serves as its own source.
#[async_trait]
impl SnapshotSource for Snapshot {
    async fn fetch_all_preferences(&self) -> Result<Vec<PreferenceRecord>, LookupError> {
        Ok(self.preferences.clone())
    }

    async fn fetch_all_orders(&self) -> Result<Vec<OrderRecord>, LookupError> {
        Ok(self.orders.clone())
    }
}
