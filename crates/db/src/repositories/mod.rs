use async_trait::async_trait;
use thiserror::Error;

use affinity_core::domain::order::OrderRecord;
use affinity_core::domain::preference::PreferenceRecord;
use affinity_core::errors::{ApplicationError, DomainError};

pub mod memory;
pub mod order;
pub mod preference;
pub mod snapshot;

pub use memory::{InMemoryOrderRepository, InMemoryPreferenceRepository};
pub use order::SqlOrderRepository;
pub use preference::SqlPreferenceRepository;
pub use snapshot::RepositorySnapshotSource;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("decode error: {0}")]
    Decode(String),
    #[error(transparent)]
    Domain(#[from] DomainError),
}

impl From<RepositoryError> for ApplicationError {
    fn from(error: RepositoryError) -> Self {
        match error {
            RepositoryError::Domain(domain) => Self::Domain(domain),
            other => Self::Persistence(other.to_string()),
        }
    }
}

/// Preference declarations, kept as an append-mostly history per email.
#[async_trait]
pub trait PreferenceRepository: Send + Sync {
    async fn list_all(&self) -> Result<Vec<PreferenceRecord>, RepositoryError>;
    async fn save(&self, record: PreferenceRecord) -> Result<(), RepositoryError>;
}

#[async_trait]
pub trait OrderRepository: Send + Sync {
    async fn list_all(&self) -> Result<Vec<OrderRecord>, RepositoryError>;
    async fn save(&self, record: OrderRecord) -> Result<(), RepositoryError>;
}
