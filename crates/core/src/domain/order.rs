use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::catalog::is_catalog_category;
use crate::domain::normalize_email;
use crate::errors::DomainError;

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OrderId(pub String);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Completed,
    Cancelled,
    Refunded,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
            Self::Refunded => "refunded",
        }
    }
}

impl std::str::FromStr for OrderStatus {
    type Err = DomainError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "pending" => Ok(Self::Pending),
            "completed" => Ok(Self::Completed),
            "cancelled" => Ok(Self::Cancelled),
            "refunded" => Ok(Self::Refunded),
            other => Err(DomainError::InvalidRecord(format!(
                "unsupported order status `{other}` (expected pending|completed|cancelled|refunded)"
            ))),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderRecord {
    pub id: OrderId,
    /// Externally issued, unique per order.
    pub order_token: String,
    pub email: String,
    /// Minor currency units (cents).
    pub amount_minor: u64,
    pub currency: String,
    pub category: String,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
}

impl OrderRecord {
    pub fn is_completed(&self) -> bool {
        self.status == OrderStatus::Completed
    }

    pub fn completed(
        id: impl Into<String>,
        email: &str,
        category: impl Into<String>,
        amount_minor: u64,
        created_at: DateTime<Utc>,
    ) -> Self {
        let id = id.into();
        Self {
            order_token: format!("tok-{id}"),
            id: OrderId(id),
            email: normalize_email(email),
            amount_minor,
            currency: "USD".to_string(),
            category: category.into(),
            status: OrderStatus::Completed,
            created_at,
        }
    }

    pub fn with_status(mut self, status: OrderStatus) -> Self {
        self.status = status;
        self
    }

    pub fn with_currency(mut self, currency: impl Into<String>) -> Self {
        self.currency = currency.into();
        self
    }

    /// Write-side checks applied by the record store before persisting.
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.order_token.trim().is_empty() {
            return Err(DomainError::InvalidRecord(format!(
                "order `{}` is missing its order token",
                self.id.0
            )));
        }
        if !self.email.contains('@') {
            return Err(DomainError::InvalidRecord(format!(
                "order `{}` has invalid email `{}`",
                self.id.0, self.email
            )));
        }
        if self.currency.len() != 3 || !self.currency.chars().all(|ch| ch.is_ascii_uppercase()) {
            return Err(DomainError::InvalidRecord(format!(
                "order `{}` has invalid currency code `{}`",
                self.id.0, self.currency
            )));
        }
        if !is_catalog_category(&self.category) {
            return Err(DomainError::InvalidRecord(format!(
                "order `{}` uses category `{}` outside the catalog",
                self.id.0, self.category
            )));
        }
        Ok(())
    }
}
