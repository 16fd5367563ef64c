use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::normalize_email;
use crate::errors::DomainError;

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PreferenceId(pub String);

/// How often a customer asked to hear about their interests.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DigestFrequency {
    Daily,
    Weekly,
    Monthly,
}

impl DigestFrequency {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Daily => "daily",
            Self::Weekly => "weekly",
            Self::Monthly => "monthly",
        }
    }
}

impl std::str::FromStr for DigestFrequency {
    type Err = DomainError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "daily" => Ok(Self::Daily),
            "weekly" => Ok(Self::Weekly),
            "monthly" => Ok(Self::Monthly),
            other => Err(DomainError::InvalidRecord(format!(
                "unsupported digest frequency `{other}` (expected daily|weekly|monthly)"
            ))),
        }
    }
}

/// One declaration of interests. Several records for the same email form its history.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreferenceRecord {
    pub id: PreferenceId,
    pub email: String,
    pub interests: BTreeSet<String>,
    pub frequency: DigestFrequency,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PreferenceRecord {
    pub fn new<I, T>(
        id: impl Into<String>,
        email: &str,
        interests: I,
        frequency: DigestFrequency,
        created_at: DateTime<Utc>,
    ) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        Self {
            id: PreferenceId(id.into()),
            email: normalize_email(email),
            interests: interests.into_iter().map(Into::into).collect(),
            frequency,
            created_at,
            updated_at: created_at,
        }
    }

    /// Write-side checks applied by the record store before persisting.
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.id.0.trim().is_empty() {
            return Err(DomainError::InvalidRecord("preference id must not be empty".to_string()));
        }
        if !self.email.contains('@') {
            return Err(DomainError::InvalidRecord(format!(
                "preference `{}` has invalid email `{}`",
                self.id.0, self.email
            )));
        }
        if self.interests.iter().any(|interest| interest.trim().is_empty()) {
            return Err(DomainError::InvalidRecord(format!(
                "preference `{}` contains a blank interest token",
                self.id.0
            )));
        }
        if self.updated_at < self.created_at {
            return Err(DomainError::InvalidRecord(format!(
                "preference `{}` was updated before it was created",
                self.id.0
            )));
        }
        Ok(())
    }
}
