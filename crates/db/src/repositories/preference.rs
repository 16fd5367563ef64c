use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use sqlx::{sqlite::SqliteRow, Row};

use affinity_core::domain::preference::{DigestFrequency, PreferenceId, PreferenceRecord};

use super::{PreferenceRepository, RepositoryError};
use crate::DbPool;

pub struct SqlPreferenceRepository {
    pool: DbPool,
}

impl SqlPreferenceRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl PreferenceRepository for SqlPreferenceRepository {
    async fn list_all(&self) -> Result<Vec<PreferenceRecord>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT
                id,
                email,
                interests_json,
                frequency,
                created_at,
                updated_at
             FROM preference_record
             ORDER BY created_at ASC, id ASC",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(preference_from_row).collect()
    }

    async fn save(&self, record: PreferenceRecord) -> Result<(), RepositoryError> {
        record.validate()?;
        let interests_json = serde_json::to_string(&record.interests).map_err(|error| {
            RepositoryError::Decode(format!(
                "could not encode interests for preference `{}`: {error}",
                record.id.0
            ))
        })?;

        sqlx::query(
            "INSERT INTO preference_record (
                id,
                email,
                interests_json,
                frequency,
                created_at,
                updated_at
             ) VALUES (?, ?, ?, ?, ?, ?)
             ON CONFLICT(id) DO UPDATE SET
                email = excluded.email,
                interests_json = excluded.interests_json,
                frequency = excluded.frequency,
                updated_at = excluded.updated_at",
        )
        .bind(&record.id.0)
        .bind(&record.email)
        .bind(interests_json)
        .bind(record.frequency.as_str())
        .bind(record.created_at.to_rfc3339())
        .bind(record.updated_at.to_rfc3339())
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

fn preference_from_row(row: SqliteRow) -> Result<PreferenceRecord, RepositoryError> {
    let id: String = row.try_get("id")?;
    let interests_raw: String = row.try_get("interests_json")?;
    let interests: BTreeSet<String> = serde_json::from_str(&interests_raw).map_err(|error| {
        RepositoryError::Decode(format!(
            "invalid interests_json for preference `{id}`: `{interests_raw}` ({error})"
        ))
    })?;
    let frequency: DigestFrequency = row.try_get::<String, _>("frequency")?.parse()?;

    Ok(PreferenceRecord {
        id: PreferenceId(id),
        email: row.try_get("email")?,
        interests,
        frequency,
        created_at: parse_timestamp("created_at", row.try_get("created_at")?)?,
        updated_at: parse_timestamp("updated_at", row.try_get("updated_at")?)?,
    })
}

pub(crate) fn parse_timestamp(
    column: &str,
    value: String,
) -> Result<DateTime<Utc>, RepositoryError> {
    DateTime::parse_from_rfc3339(&value).map(|timestamp| timestamp.with_timezone(&Utc)).map_err(
        |error| {
            RepositoryError::Decode(format!("invalid timestamp in `{column}`: `{value}` ({error})"))
        },
    )
}
