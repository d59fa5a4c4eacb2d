use reloom_core::config::{AppConfig, LoadOptions};
use reloom_db::{connect, migrations, seed_demo_items, SqlItemStore};

use crate::commands::{build_runtime, CommandResult};

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

    let runtime = match build_runtime() {
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
        let pool = connect(&config.database)
            .await
            .map_err(|error| ("db_connectivity", error.to_string(), 4u8))?;
        migrations::run_pending(&pool)
            .await
            .map_err(|error| ("migration", error.to_string(), 5u8))?;

        let store = SqlItemStore::new(pool.clone());
        let seeded = seed_demo_items(&store)
            .await
            .map_err(|error| ("seed", error.to_string(), 6u8))?;
        pool.close().await;
        Ok::<Vec<String>, (&'static str, String, u8)>(
            seeded.into_iter().map(|id| id.0).collect(),
        )
    });

    match result {
        Ok(seeded) => CommandResult::success_with_details(
            "seed",
            format!("seeded {} demo item(s)", seeded.len()),
            serde_json::json!({ "item_ids": seeded }),
        ),
        Err((error_class, message, exit_code)) => {
            CommandResult::failure("seed", error_class, message, exit_code)
        }
    }
}
