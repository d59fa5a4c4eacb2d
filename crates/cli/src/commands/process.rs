use std::sync::Arc;

use reloom_core::config::{AppConfig, LoadOptions};
use reloom_core::ItemId;
use reloom_db::{connect, SqlItemStore};
use reloom_pipeline::http::{
    HttpAdapterConfig, HttpKnowledgeAdapter, HttpReasoningAdapter, HttpVisionAdapter,
};
use reloom_pipeline::{Orchestrator, OrchestratorSettings};

use crate::commands::{build_runtime, CommandResult};

pub fn run(options: LoadOptions, item_id: &str) -> CommandResult {
    let config = match AppConfig::load(options) {
        Ok(config) => config,
        Err(error) => {
            return CommandResult::failure(
                "process",
                "config_validation",
                format!("configuration issue: {error}"),
                2,
            );
        }
    };

    crate::logging::init(&config.logging);

    let runtime = match build_runtime() {
        Ok(runtime) => runtime,
        Err(error) => {
            return CommandResult::failure(
                "process",
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

        let client = reqwest::Client::new();
        let orchestrator = Orchestrator::new(
            Arc::new(SqlItemStore::new(pool.clone())),
            Arc::new(HttpVisionAdapter::new(
                client.clone(),
                HttpAdapterConfig::from_endpoint(&config.services.vision),
            )),
            Arc::new(HttpKnowledgeAdapter::new(
                client.clone(),
                HttpAdapterConfig::from_endpoint(&config.services.knowledge),
            )),
            Arc::new(HttpReasoningAdapter::new(
                client,
                HttpAdapterConfig::from_endpoint(&config.services.reasoning),
            )),
            OrchestratorSettings::from_config(&config.pipeline),
        );

        let outcome = orchestrator
            .run(&ItemId(item_id.to_string()))
            .await
            .map_err(|error| ("pipeline", error.to_string(), 6u8));
        pool.close().await;
        outcome
    });

    match result {
        Ok(record) => CommandResult::success_with_details(
            "process",
            format!("item {} finished with status {}", record.id, record.status),
            serde_json::json!({
                "item_id": record.id.0,
                "status": record.status.as_str(),
            }),
        ),
        Err((error_class, message, exit_code)) => {
            CommandResult::failure("process", error_class, message, exit_code)
        }
    }
}
