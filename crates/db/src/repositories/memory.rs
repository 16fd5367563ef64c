use std::collections::BTreeMap;

use tokio::sync::RwLock;

use affinity_core::domain::order::OrderRecord;
use affinity_core::domain::preference::PreferenceRecord;

use super::{OrderRepository, PreferenceRepository, RepositoryError};

/// Keyed by record id; listing follows creation time like the SQL store.
#[derive(Default)]
pub struct InMemoryPreferenceRepository {
    records: RwLock<BTreeMap<String, PreferenceRecord>>,
}

#[async_trait::async_trait]
impl PreferenceRepository for InMemoryPreferenceRepository {
    async fn list_all(&self) -> Result<Vec<PreferenceRecord>, RepositoryError> {
        let records = self.records.read().await;
        let mut listed: Vec<PreferenceRecord> = records.values().cloned().collect();
        listed.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.0.cmp(&b.id.0)));
        Ok(listed)
    }

    async fn save(&self, record: PreferenceRecord) -> Result<(), RepositoryError> {
        record.validate()?;
        let mut records = self.records.write().await;
        records.insert(record.id.0.clone(), record);
        Ok(())
    }
}

#[derive(Default)]
pub struct InMemoryOrderRepository {
    records: RwLock<BTreeMap<String, OrderRecord>>,
}

#[async_trait::async_trait]
impl OrderRepository for InMemoryOrderRepository {
    async fn list_all(&self) -> Result<Vec<OrderRecord>, RepositoryError> {
        let records = self.records.read().await;
        let mut listed: Vec<OrderRecord> = records.values().cloned().collect();
        listed.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.0.cmp(&b.id.0)));
        Ok(listed)
    }

    async fn save(&self, record: OrderRecord) -> Result<(), RepositoryError> {
        record.validate()?;
        let mut records = self.records.write().await;
        let token_taken = records
            .values()
            .any(|existing| existing.order_token == record.order_token && existing.id != record.id);
        if token_taken {
            return Err(RepositoryError::Decode(format!(
                "order token `{}` is already used by another order",
                record.order_token
            )));
        }
        records.insert(record.id.0.clone(), record);
        Ok(())
    }
}
