use serde::Serialize;

use reloom_core::config::{AppConfig, LoadOptions};
use reloom_db::connect;

use crate::commands::{build_runtime, CommandResult};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
enum CheckStatus {
    Pass,
    Fail,
    Skipped,
}

#[derive(Debug, Serialize)]
struct Check {
    name: &'static str,
    status: CheckStatus,
    message: String,
}

pub fn run(options: LoadOptions) -> CommandResult {
    let mut checks = Vec::new();

    let config = match AppConfig::load(options) {
        Ok(config) => {
            checks.push(Check {
                name: "config_validation",
                status: CheckStatus::Pass,
                message: "configuration loaded and validated".to_string(),
            });
            config
        }
        Err(error) => {
            checks.push(Check {
                name: "config_validation",
                status: CheckStatus::Fail,
                message: error.to_string(),
            });
            checks.push(Check {
                name: "db_connectivity",
                status: CheckStatus::Skipped,
                message: "skipped: configuration unavailable".to_string(),
            });
            return finalize(checks);
        }
    };

    let runtime = match build_runtime() {
        Ok(runtime) => runtime,
        Err(error) => {
            checks.push(Check {
                name: "db_connectivity",
                status: CheckStatus::Fail,
                message: format!("failed to initialize async runtime: {error}"),
            });
            return finalize(checks);
        }
    };

    let db_check = runtime.block_on(async {
        match connect(&config.database).await {
            Ok(pool) => {
                pool.close().await;
                Check {
                    name: "db_connectivity",
                    status: CheckStatus::Pass,
                    message: "database reachable".to_string(),
                }
            }
            Err(error) => Check {
                name: "db_connectivity",
                status: CheckStatus::Fail,
                message: error.to_string(),
            },
        }
    });
    checks.push(db_check);

    finalize(checks)
}

fn finalize(checks: Vec<Check>) -> CommandResult {
    let failed = checks.iter().filter(|check| check.status == CheckStatus::Fail).count();
    let details = serde_json::to_value(&checks).unwrap_or(serde_json::Value::Null);

    if failed == 0 {
        CommandResult::success_with_details("doctor", "all checks passed", details)
    } else {
        CommandResult::failure_with_details(
            "doctor",
            "checks_failed",
            format!("{failed} check(s) failed"),
            details,
            8,
        )
    }
}
