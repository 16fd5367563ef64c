use affinity_core::config::{AppConfig, LoadOptions};
use affinity_core::InsightEngine;
use affinity_db::{connect_with_config, migrations, sql_snapshot_source, DbPool};
use serde::Serialize;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
enum CheckStatus {
    Pass,
    Fail,
    Skipped,
}

#[derive(Debug, Serialize)]
struct DoctorCheck {
    name: &'static str,
    status: CheckStatus,
    details: String,
}

impl DoctorCheck {
    fn pass(name: &'static str, details: impl Into<String>) -> Self {
        Self { name, status: CheckStatus::Pass, details: details.into() }
    }

    fn fail(name: &'static str, details: impl Into<String>) -> Self {
        Self { name, status: CheckStatus::Fail, details: details.into() }
    }

    fn skipped(name: &'static str, reason: &str) -> Self {
        Self { name, status: CheckStatus::Skipped, details: format!("skipped because {reason}") }
    }
}

#[derive(Debug, Serialize)]
struct DoctorReport {
    overall_status: CheckStatus,
    summary: String,
    checks: Vec<DoctorCheck>,
}

pub fn run(options: LoadOptions, json_output: bool) -> String {
    let report = build_report(options);

    if json_output {
        return serde_json::to_string_pretty(&report).unwrap_or_else(|error| {
            format!(
                "{{\"overall_status\":\"fail\",\"summary\":\"doctor serialization failed\",\"error\":\"{}\"}}",
                escape_json(&error.to_string())
            )
        });
    }

    render_human(&report)
}

fn build_report(options: LoadOptions) -> DoctorReport {
    let mut checks = Vec::new();

    match AppConfig::load(options) {
        Ok(config) => {
            checks.push(DoctorCheck::pass(
                "config_validation",
                "configuration loaded and validated",
            ));
            checks.extend(check_database(&config));
        }
        Err(error) => {
            checks.push(DoctorCheck::fail("config_validation", error.to_string()));
            for name in ["database_connectivity", "record_schema", "snapshot_readable"] {
                checks.push(DoctorCheck::skipped(name, "configuration did not load"));
            }
        }
    }

    let all_pass = checks.iter().all(|check| check.status == CheckStatus::Pass);
    let overall_status = if all_pass { CheckStatus::Pass } else { CheckStatus::Fail };
    let summary = if all_pass {
        "doctor: all readiness checks passed".to_string()
    } else {
        "doctor: one or more readiness checks failed".to_string()
    };

    DoctorReport { overall_status, summary, checks }
}

fn check_database(config: &AppConfig) -> Vec<DoctorCheck> {
    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(error) => {
            return vec![
                DoctorCheck::fail(
                    "database_connectivity",
                    format!("failed to initialize async runtime: {error}"),
                ),
                DoctorCheck::skipped("record_schema", "the async runtime did not start"),
                DoctorCheck::skipped("snapshot_readable", "the async runtime did not start"),
            ];
        }
    };

    runtime.block_on(async {
        let pool = match connect_with_config(&config.database).await {
            Ok(pool) => pool,
            Err(error) => {
                return vec![
                    DoctorCheck::fail(
                        "database_connectivity",
                        format!("failed to connect to database: {error}"),
                    ),
                    DoctorCheck::skipped("record_schema", "the database is unreachable"),
                    DoctorCheck::skipped("snapshot_readable", "the database is unreachable"),
                ];
            }
        };

        let mut checks = vec![DoctorCheck::pass(
            "database_connectivity",
            format!("connected using `{}`", config.database.url),
        )];

        match migrations::missing_record_tables(&pool).await {
            Ok(missing) if missing.is_empty() => {
                checks.push(DoctorCheck::pass("record_schema", "record tables are present"));
                checks.push(check_snapshot(config, pool.clone()).await);
            }
            Ok(missing) => {
                checks.push(DoctorCheck::fail(
                    "record_schema",
                    format!("missing tables: {} (run `affinity migrate`)", missing.join(", ")),
                ));
                checks.push(DoctorCheck::skipped("snapshot_readable", "record tables are missing"));
            }
            Err(error) => {
                checks.push(DoctorCheck::fail("record_schema", error.to_string()));
                checks.push(DoctorCheck::skipped("snapshot_readable", "the schema check failed"));
            }
        }

        pool.close().await;
        checks
    })
}

async fn check_snapshot(config: &AppConfig, pool: DbPool) -> DoctorCheck {
    let engine =
        InsightEngine::with_settings(sql_snapshot_source(pool), config.insights.settings());
    match engine.load_snapshot().await {
        Ok(snapshot) => DoctorCheck::pass(
            "snapshot_readable",
            format!(
                "read {} preference records and {} orders",
                snapshot.preferences.len(),
                snapshot.orders.len()
            ),
        ),
        Err(error) => DoctorCheck::fail("snapshot_readable", error.to_string()),
    }
}

fn render_human(report: &DoctorReport) -> String {
    let mut lines = Vec::new();
    lines.push(report.summary.clone());

    for check in &report.checks {
        let marker = match check.status {
            CheckStatus::Pass => "ok",
            CheckStatus::Fail => "fail",
            CheckStatus::Skipped => "skip",
        };
        lines.push(format!("- [{marker}] {}: {}", check.name, check.details));
    }

    lines.join("\n")
}

fn escape_json(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}
