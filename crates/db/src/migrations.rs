use sqlx::migrate::{MigrateError, Migrator};

use crate::DbPool;

pub static MIGRATOR: Migrator = sqlx::migrate!("../../migrations");

/// Tables the snapshot source reads from.
pub const RECORD_TABLES: [&str; 2] = ["preference_record", "order_record"];

pub async fn run_pending(pool: &DbPool) -> Result<(), MigrateError> {
    MIGRATOR.run(pool).await
}

/// Record tables absent from the connected database.
pub async fn missing_record_tables(pool: &DbPool) -> Result<Vec<&'static str>, sqlx::Error> {
    let mut missing = Vec::new();
    for table in RECORD_TABLES {
        let present: i64 = sqlx::query_scalar(
            "SELECT COUNT(1) FROM sqlite_master WHERE type = 'table' AND name = ?1",
        )
        .bind(table)
        .fetch_one(pool)
        .await?;
        if present == 0 {
            missing.push(table);
        }
    }
    Ok(missing)
}
