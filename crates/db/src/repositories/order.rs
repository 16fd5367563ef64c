use sqlx::{sqlite::SqliteRow, Row};

use affinity_core::domain::order::{OrderId, OrderRecord, OrderStatus};

use super::preference::parse_timestamp;
use super::{OrderRepository, RepositoryError};
use crate::DbPool;

pub struct SqlOrderRepository {
    pool: DbPool,
}

impl SqlOrderRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl OrderRepository for SqlOrderRepository {
    async fn list_all(&self) -> Result<Vec<OrderRecord>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT
                id,
                order_token,
                email,
                amount_minor,
                currency,
                category,
                status,
                created_at
             FROM order_record
             ORDER BY created_at ASC, id ASC",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(order_from_row).collect()
    }

    async fn save(&self, record: OrderRecord) -> Result<(), RepositoryError> {
        record.validate()?;
        let amount_minor = i64::try_from(record.amount_minor).map_err(|_| {
            RepositoryError::Decode(format!(
                "amount for order `{}` exceeds storage range: {}",
                record.id.0, record.amount_minor
            ))
        })?;

        sqlx::query(
            "INSERT INTO order_record (
                id,
                order_token,
                email,
                amount_minor,
                currency,
                category,
                status,
                created_at
             ) VALUES (?, ?, ?, ?, ?, ?, ?, ?)
             ON CONFLICT(id) DO UPDATE SET
                email = excluded.email,
                amount_minor = excluded.amount_minor,
                currency = excluded.currency,
                category = excluded.category,
                status = excluded.status",
        )
        .bind(&record.id.0)
        .bind(&record.order_token)
        .bind(&record.email)
        .bind(amount_minor)
        .bind(&record.currency)
        .bind(&record.category)
        .bind(record.status.as_str())
        .bind(record.created_at.to_rfc3339())
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

fn order_from_row(row: SqliteRow) -> Result<OrderRecord, RepositoryError> {
    let id: String = row.try_get("id")?;
    let amount_raw: i64 = row.try_get("amount_minor")?;
    let amount_minor = u64::try_from(amount_raw).map_err(|_| {
        RepositoryError::Decode(format!(
            "invalid value for `amount_minor` on order `{id}` (expected non-negative): {amount_raw}"
        ))
    })?;
    let status: OrderStatus = row.try_get::<String, _>("status")?.parse()?;

    Ok(OrderRecord {
        id: OrderId(id),
        order_token: row.try_get("order_token")?,
        email: row.try_get("email")?,
        amount_minor,
        currency: row.try_get("currency")?,
        category: row.try_get("category")?,
        status,
        created_at: parse_timestamp("created_at", row.try_get("created_at")?)?,
    })
}
