//! # Veristep 入口
//!
//! 场景驱动的浏览器验证工具入口：加载配置，按顺序运行命令行给出的
//! 场景文件，每个场景使用一个全新的浏览器会话，并把汇总结果映射为
//! 进程退出码。
//!
//! ## 主要功能
//! - 初始化 tracing 日志（配置的级别，`RUST_LOG` 优先）
//! - 加载配置（`VERISTEP_CONFIG` 指定的 TOML 文件 + 环境变量覆盖）
//! - 逐个运行场景文件，打印每个场景的结果摘要
//! - 全部通过时退出码为 0，任何失败为 1，用法或配置错误为 2
//!
//! ## 环境变量
//! - `VERISTEP_BASE_URL`: 被测应用地址（默认: http://localhost:5173）
//! - `VERISTEP_DEFAULT_TIMEOUT_MS`: 默认等待上限（默认: 10000）
//! - `VERISTEP_HEADLESS`: 是否无头运行（默认: true)
//! - `VERISTEP_CDP_ENDPOINT`: 附加到已有浏览器而不是自行启动

use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use veristep::config::Config;
use veristep::scenario::{Outcome, ScenarioRunner, SessionProvider};
use veristep::session::launcher::SessionLauncher;
use veristep::Scenario;

#[tokio::main]
async fn main() {
    let config = match Config::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            std::process::exit(2);
        }
    };

    // RUST_LOG wins over the configured level
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.log_level.clone()));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let files: Vec<String> = std::env::args().skip(1).collect();
    if files.is_empty() {
        eprintln!("Usage: veristep <scenario.json> [scenario.json ...]");
        std::process::exit(2);
    }

    info!("Veristep v{} starting", veristep::VERSION);
    info!(
        "Target {} (headless: {}, default timeout: {}ms)",
        config.base_url, config.headless, config.default_timeout_ms
    );

    let provider: Arc<dyn SessionProvider> = Arc::new(SessionLauncher::new(config.clone()));
    let mut all_passed = true;

    for file in &files {
        let scenario = match Scenario::from_path(file) {
            Ok(scenario) => scenario,
            Err(e) => {
                error!("Failed to load {}: {}", file, e);
                all_passed = false;
                continue;
            }
        };

        // A fresh session per scenario: no state leaks between runs
        let mut runner = ScenarioRunner::new(provider.clone(), config.clone());
        let result = runner.run(&scenario).await;

        match &result.outcome {
            Outcome::Completed => {
                info!(
                    "PASS {:?}: {} steps, {} artifacts",
                    result.scenario,
                    result.steps.len(),
                    result.artifacts.len()
                );
            }
            Outcome::Failed {
                step_index,
                kind,
                message,
            } => {
                error!(
                    "FAIL {:?} at {}: [{}] {}",
                    result.scenario,
                    step_index.map_or("startup".to_string(), |i| format!("step {}", i)),
                    kind,
                    message
                );
                all_passed = false;
            }
        }
        for artifact in &result.artifacts {
            info!("  artifact: {}", artifact.display());
        }
    }

    std::process::exit(if all_passed { 0 } else { 1 });
}
