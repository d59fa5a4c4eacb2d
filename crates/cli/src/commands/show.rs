use reloom_core::config::{AppConfig, LoadOptions};
use reloom_core::{InventoryItem, ItemId, ItemStatus};
use reloom_db::{connect, ItemStore, SqlItemStore};

use crate::commands::{build_runtime, CommandResult};

pub fn run(options: LoadOptions, item_id: &str) -> CommandResult {
    let config = match AppConfig::load(options) {
        Ok(config) => config,
        Err(error) => {
            return CommandResult::failure(
                "show",
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
                "show",
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

        let store = SqlItemStore::new(pool.clone());
        let record = store
            .fetch(&ItemId(item_id.to_string()))
            .await
            .map_err(|error| ("store", error.to_string(), 5u8))?;
        pool.close().await;
        Ok::<Option<InventoryItem>, (&'static str, String, u8)>(record)
    });

    match result {
        Ok(Some(record)) => {
            let message = format!("item {} is {}", record.id, record.status);
            CommandResult::success_with_details("show", message, render_record(&record))
        }
        Ok(None) => CommandResult::failure("show", "not_found", format!("no item `{item_id}`"), 7),
        Err((error_class, message, exit_code)) => {
            CommandResult::failure("show", error_class, message, exit_code)
        }
    }
}

/// Status-aware view: readers only get fields that are guaranteed populated
/// at the record's status. A failed record exposes input and the error
/// message, nothing else.
pub(crate) fn render_record(record: &InventoryItem) -> serde_json::Value {
    let mut fields = serde_json::Map::new();
    fields.insert("id".to_string(), serde_json::Value::String(record.id.0.clone()));
    fields.insert("status".to_string(), serde_json::Value::String(record.status.as_str().to_string()));
    fields.insert("input".to_string(), to_value(&record.input));
    fields.insert("updated_at".to_string(), to_value(&record.updated_at));

    match record.status {
        ItemStatus::Pending => {}
        ItemStatus::AttributesExtracted => {
            fields.insert("attributes".to_string(), to_value(&record.attributes));
        }
        ItemStatus::MarketAnalyzed => {
            fields.insert("attributes".to_string(), to_value(&record.attributes));
            fields.insert("market_analysis".to_string(), to_value(&record.market_analysis));
        }
        ItemStatus::Completed => {
            fields.insert("attributes".to_string(), to_value(&record.attributes));
            fields.insert("market_analysis".to_string(), to_value(&record.market_analysis));
            fields.insert("strategies".to_string(), to_value(&record.strategies));
            fields.insert("best_strategy_index".to_string(), to_value(&record.best_strategy_index));
            fields.insert("total_impact".to_string(), to_value(&record.total_impact));
        }
        ItemStatus::Failed => {
            fields.insert("error_message".to_string(), to_value(&record.error_message));
        }
    }

    serde_json::Value::Object(fields)
}

fn to_value<T: serde::Serialize>(value: &T) -> serde_json::Value {
    serde_json::to_value(value).unwrap_or(serde_json::Value::Null)
}
