//! Engine-backed read commands
//!
//! Each invocation reads one snapshot from the configured database and answers one query.
//! The whole call, snapshot read included, runs under `insights.deadline_secs`.

use std::future::Future;
use std::time::Duration;

use affinity_core::config::{AppConfig, LoadOptions};
use affinity_core::errors::{ApplicationError, InterfaceError};
use affinity_core::insights::{
    FrequentItemset, InsightReport, InterestCentrality, Recommendation, SegmentOpportunity,
    SnapshotSummary,
};
use affinity_core::{InsightEngine, SnapshotSource};
use affinity_db::{connect_with_config, sql_snapshot_source};
use serde::Serialize;
use uuid::Uuid;

use crate::commands::CommandResult;

#[derive(Clone, Debug, PartialEq)]
pub enum InsightQuery {
    Recommend { email: String, limit: usize },
    Patterns { min_support: Option<f64>, limit: Option<usize> },
    Segments,
    Centrality { limit: Option<usize> },
    Report { email: String },
    Summary,
}

impl InsightQuery {
    pub fn command_name(&self) -> &'static str {
        match self {
            Self::Recommend { .. } => "recommend",
            Self::Patterns { .. } => "patterns",
            Self::Segments => "segments",
            Self::Centrality { .. } => "centrality",
            Self::Report { .. } => "report",
            Self::Summary => "summary",
        }
    }

    fn validate(&self) -> Result<(), String> {
        match self {
            Self::Patterns { min_support: Some(value), .. } if !(0.0..=1.0).contains(value) => {
                Err(format!("--min-support must be within [0, 1], got {value}"))
            }
            _ => Ok(()),
        }
    }

    async fn execute<S: SnapshotSource>(
        &self,
        engine: &InsightEngine<S>,
    ) -> Result<InsightOutput, ApplicationError> {
        Ok(match self {
            Self::Recommend { email, limit } => {
                InsightOutput::Recommendations(engine.recommend(email, *limit).await?)
            }
            Self::Patterns { min_support, limit } => {
                let min_support = min_support.unwrap_or(engine.settings().report_min_support);
                let mut patterns = engine.mine_frequent_itemsets(min_support).await?;
                if let Some(limit) = limit {
                    patterns.truncate(*limit);
                }
                InsightOutput::Patterns(patterns)
            }
            Self::Segments => InsightOutput::Segments(engine.list_segment_opportunities().await?),
            Self::Centrality { limit } => {
                let mut ranking = engine.rank_interest_centrality().await?;
                if let Some(limit) = limit {
                    ranking.truncate(*limit);
                }
                InsightOutput::Centrality(ranking)
            }
            Self::Report { email } => InsightOutput::Report(engine.full_report(email).await?),
            Self::Summary => InsightOutput::Summary(engine.summarize().await?),
        })
    }
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum InsightOutput {
    Recommendations(Vec<Recommendation>),
    Patterns(Vec<FrequentItemset>),
    Segments(Vec<SegmentOpportunity>),
    Centrality(Vec<InterestCentrality>),
    Report(InsightReport),
    Summary(SnapshotSummary),
}

impl InsightOutput {
    fn message(&self, query: &InsightQuery) -> String {
        match (self, query) {
            (Self::Recommendations(items), InsightQuery::Recommend { email, .. }) => {
                format!("{} category recommendations for `{email}`", items.len())
            }
            (Self::Report(report), InsightQuery::Report { email }) => format!(
                "report for `{email}`: {} recommendations, {} segments, {} patterns, {} central interests",
                report.recommendations.len(),
                report.segment_opportunities.len(),
                report.frequent_patterns.len(),
                report.interest_centrality.len()
            ),
            (Self::Patterns(items), _) => format!("{} frequent itemsets", items.len()),
            (Self::Segments(items), _) => format!("{} segment opportunities", items.len()),
            (Self::Centrality(items), _) => format!("{} interests ranked", items.len()),
            (Self::Summary(summary), _) => format!(
                "{} preference records, {} orders ({} completed) across {} customers",
                summary.preference_records,
                summary.order_records,
                summary.completed_orders,
                summary.known_customers
            ),
            (Self::Recommendations(items), _) => format!("{} recommendations", items.len()),
            (Self::Report(_), _) => "insight report".to_string(),
        }
    }
}

type Failure = (&'static str, String, u8);

pub fn run(query: InsightQuery, options: LoadOptions) -> CommandResult {
    let command = query.command_name();

    let config = match AppConfig::load(options) {
        Ok(config) => config,
        Err(error) => {
            return CommandResult::failure(
                command,
                "config_validation",
                format!("configuration issue: {error}"),
                2,
            );
        }
    };

    if let Err(message) = query.validate() {
        return CommandResult::failure(command, "invalid_input", message, 9);
    }

    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(error) => {
            return CommandResult::failure(
                command,
                "runtime_init",
                format!("failed to initialize async runtime: {error}"),
                3,
            );
        }
    };

    let correlation_id = Uuid::new_v4().to_string();
    let deadline = Duration::from_secs(config.insights.deadline_secs);

    let result = runtime.block_on(async {
        let pool = connect_with_config(&config.database)
            .await
            .map_err(|error| ("db_connectivity", error.to_string(), 4u8))?;
        let engine = InsightEngine::with_settings(
            sql_snapshot_source(pool.clone()),
            config.insights.settings(),
        );

        let outcome = with_deadline(deadline, query.execute(&engine)).await;
        pool.close().await;

        match outcome {
            Some(Ok(output)) => Ok(output),
            Some(Err(error)) => Err(classify(error, &correlation_id)),
            None => Err((
                "deadline_exceeded",
                format!(
                    "`{command}` did not finish within {}s (correlation_id={correlation_id})",
                    deadline.as_secs()
                ),
                8u8,
            )),
        }
    });

    match result {
        Ok(output) => {
            tracing::info!(
                event_name = "cli.insights.completed",
                command,
                correlation_id = %correlation_id,
                "insight command completed"
            );
            CommandResult::success_with_data(command, output.message(&query), Some(&output))
        }
        Err((error_class, message, exit_code)) => {
            tracing::warn!(
                event_name = "cli.insights.failed",
                command,
                error_class,
                correlation_id = %correlation_id,
                "insight command failed"
            );
            CommandResult::failure(command, error_class, message, exit_code)
        }
    }
}

/// `None` when `future` is still pending after `deadline`.
async fn with_deadline<F: Future>(deadline: Duration, future: F) -> Option<F::Output> {
    tokio::time::timeout(deadline, future).await.ok()
}

fn classify(error: ApplicationError, correlation_id: &str) -> Failure {
    let detail = error.to_string();
    let interface = error.into_interface(correlation_id);
    let (error_class, exit_code) = match &interface {
        InterfaceError::BadRequest { .. } => ("invalid_input", 9u8),
        InterfaceError::ServiceUnavailable { .. } => ("lookup_failed", 7u8),
        InterfaceError::Internal { .. } => ("internal", 10u8),
    };
    let message = format!(
        "{} {detail} (correlation_id={})",
        interface.user_message(),
        interface.correlation_id()
    );
    (error_class, message, exit_code)
}
