use clap::Parser;
use stowage::utils::monitor::SystemMonitor;
use stowage::utils::{logger, validation::Validate};
use stowage::{AppState, Inventory, LayoutConfig, ServerConfig, StowageError};

fn fail(context: &str, e: &StowageError) -> ! {
    // 記錄詳細錯誤信息
    tracing::error!(
        "❌ {}: {} (Category: {:?}, Severity: {:?})",
        context,
        e,
        e.category(),
        e.severity()
    );
    tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

    eprintln!("❌ {}", e.user_friendly_message());
    eprintln!("💡 建議: {}", e.recovery_suggestion());

    std::process::exit(e.severity().exit_code().max(1));
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = ServerConfig::parse();

    // 初始化日誌
    if config.log_json {
        logger::init_json_logger(config.debug);
    } else {
        logger::init_cli_logger(config.debug);
    }

    tracing::info!("🚀 Starting stowage server");
    if config.debug {
        tracing::debug!("Server config: {:?}", config);
    }

    // 驗證配置
    if let Err(e) = config.validate() {
        fail("Configuration validation failed", &e);
    }

    let layout = match &config.layout {
        Some(path) => {
            tracing::info!("📁 Loading layout from: {}", path);
            match LayoutConfig::from_file(path) {
                Ok(layout) => layout,
                Err(e) => fail(&format!("Failed to load layout '{}'", path), &e),
            }
        }
        None => {
            tracing::info!("📁 Using the default three-zone layout");
            LayoutConfig::default()
        }
    };

    let inventory = match Inventory::new(layout) {
        Ok(inventory) => inventory,
        Err(e) => fail("Invalid layout", &e),
    };

    let monitor = SystemMonitor::new(config.monitor);
    if monitor.is_enabled() {
        tracing::info!("🔍 System monitoring enabled");
        monitor.log_stats("Startup");
    }

    let addr = match config.socket_addr() {
        Ok(addr) => addr,
        Err(e) => fail("Invalid bind address", &e),
    };

    if let Err(e) = stowage::server::serve(addr, AppState::new(inventory, monitor)).await {
        fail("Server stopped with an error", &e);
    }

    Ok(())
}
