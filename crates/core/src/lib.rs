pub mod config;
pub mod domain;
pub mod errors;
pub mod insights;

pub use domain::order::{OrderId, OrderRecord, OrderStatus};
pub use domain::preference::{DigestFrequency, PreferenceId, PreferenceRecord};
pub use errors::{ApplicationError, DomainError, InterfaceError, LookupError};
pub use insights::{
    InsightEngine, InsightReport, InsightSettings, Recommendation, Snapshot, SnapshotInsights,
    SnapshotSource,
};
