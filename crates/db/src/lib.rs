pub mod connection;
pub mod fixtures;
pub mod migrations;
pub mod repositories;

pub use connection::{connect, connect_with_config, connect_with_settings, DbPool};
pub use fixtures::{CustomerSeedInfo, DemoSnapshotDataset, SeedResult, VerificationResult};
pub use repositories::{
    InMemoryOrderRepository, InMemoryPreferenceRepository, OrderRepository, PreferenceRepository,
    RepositoryError, RepositorySnapshotSource, SqlOrderRepository, SqlPreferenceRepository,
};

/// Snapshot source over the SQLite record tables.
pub type SqlSnapshotSource = RepositorySnapshotSource<SqlPreferenceRepository, SqlOrderRepository>;

pub fn sql_snapshot_source(pool: DbPool) -> SqlSnapshotSource {
    RepositorySnapshotSource::new(
        SqlPreferenceRepository::new(pool.clone()),
        SqlOrderRepository::new(pool),
    )
}
