use crate::commands::CommandResult;
use affinity_core::config::{AppConfig, LoadOptions};
use affinity_db::{connect_with_config, migrations, CustomerSeedInfo, DemoSnapshotDataset};

pub fn run(options: LoadOptions) -> CommandResult {
    let config = match AppConfig::load(options) {
        Ok(config) => config,
        Err(error) => {
            return CommandResult::failure(
                "seed",
                "config_validation",
                format!("configuration issue: {error}"),
                2,
            );
        }
    };

    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(error) => {
            return CommandResult::failure(
                "seed",
                "runtime_init",
                format!("failed to initialize async runtime: {error}"),
                3,
            );
        }
    };

    let result = runtime.block_on(async {
        let pool = connect_with_config(&config.database)
            .await
            .map_err(|error| ("db_connectivity", error.to_string(), 4u8))?;

        migrations::run_pending(&pool)
            .await
            .map_err(|error| ("migration", error.to_string(), 5u8))?;

        let seed_result = DemoSnapshotDataset::load(&pool)
            .await
            .map_err(|error| ("seed_execution", error.to_string(), 5u8))?;

        let verification = DemoSnapshotDataset::verify(&pool)
            .await
            .map_err(|error| ("seed_verification", error.to_string(), 6u8))?;

        let run_result = if verification.all_present {
            Ok(SeedOutput {
                customers: seed_result.customers_seeded,
                preference_records: seed_result.preference_records,
                order_records: seed_result.order_records,
            })
        } else {
            let failed_checks = verification
                .checks
                .iter()
                .filter_map(|(check, passed)| (!passed).then_some(check.as_str()))
                .collect::<Vec<_>>();
            Err(("seed_verification", verification_failure_message(&failed_checks), 6u8))
        };

        pool.close().await;
        run_result
    });

    match result {
        Ok(output) => {
            tracing::info!(
                event_name = "cli.seed.loaded",
                customers = output.customers.len(),
                preference_records = output.preference_records,
                order_records = output.order_records,
                "demo snapshot loaded"
            );
            let customer_lines: Vec<String> = output
                .customers
                .iter()
                .map(|customer| format!("  - {}: {}", customer.email, customer.description))
                .collect();
            let message = format!(
                "demo snapshot loaded: {} preference records, {} orders across {} customers:\n{}",
                output.preference_records,
                output.order_records,
                output.customers.len(),
                customer_lines.join("\n")
            );
            CommandResult::success("seed", message)
        }
        Err((error_class, message, exit_code)) => {
            CommandResult::failure("seed", error_class, message, exit_code)
        }
    }
}

struct SeedOutput {
    customers: Vec<CustomerSeedInfo>,
    preference_records: usize,
    order_records: usize,
}

fn verification_failure_message(failed_checks: &[&str]) -> String {
    if failed_checks.is_empty() {
        "Some seed data failed to load".to_string()
    } else {
        format!("Seed verification failed for checks: {}", failed_checks.join(", "))
    }
}
