use clap::Parser;
use std::time::Duration;
use stowage::config::Command;
use stowage::core::arrangement;
use stowage::core::CargoApi;
use stowage::domain::model::{NewCargo, RetrievalAction, ReturnPlanRequest};
use stowage::domain::ports::{ExportFormat, Storage};
use stowage::utils::{logger, validation::Validate};
use stowage::{ClientConfig, HttpCargoClient, ImportJob, LocalStorage, Result};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = ClientConfig::parse();

    // 初始化日誌
    logger::init_cli_logger(config.debug);

    if config.debug {
        tracing::debug!("Client config: {:?}", config);
    }

    // 驗證配置
    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(1);
    }

    let command = config.command.clone();
    let refresh_interval = config.refresh_interval;
    let client = HttpCargoClient::new(config)?;

    if let Err(e) = run(&client, command, refresh_interval).await {
        // 記錄詳細錯誤信息
        tracing::error!(
            "❌ Request failed: {} (Category: {:?}, Severity: {:?})",
            e,
            e.category(),
            e.severity()
        );
        tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

        // 輸出用戶友好的錯誤信息
        eprintln!("❌ {}", e.user_friendly_message());
        eprintln!("💡 建議: {}", e.recovery_suggestion());

        let exit_code = e.severity().exit_code();
        if exit_code > 0 {
            std::process::exit(exit_code);
        }
    }

    Ok(())
}

async fn run(api: &impl CargoApi, command: Command, refresh_interval: u64) -> Result<()> {
    match command {
        Command::Health => {
            let health = api.health().await?;
            println!("{}", serde_json::to_string_pretty(&health)?);
        }
        Command::List => {
            let list = api.list_cargo().await?;
            println!("📦 {} items stored", list.total);
            for item in list.cargo {
                println!(
                    "{:<10} {:<24} {:<8} P{:<3} {:>3}d {:?}",
                    item.id, item.name, item.zone, item.priority, item.expiry_days, item.status
                );
            }
        }
        Command::Recommend(args) => {
            let rec = api.recommend(&NewCargo::from(args)).await?;
            println!("🎯 {} ({:.1}% confidence)", rec.recommended_zone, rec.confidence);
            println!("   {}", rec.reasoning);
            for alt in rec.alternatives {
                println!("   alternative: {} ({:.1}%)", alt.zone, alt.confidence);
            }
        }
        Command::Add(args) => {
            let item = api.add_cargo(&NewCargo::from(args)).await?;
            println!(
                "✅ Stored {} '{}' in {} at ({:.2}, {:.2}, {:.2})",
                item.id, item.name, item.zone, item.position_x, item.position_y, item.position_z
            );
        }
        Command::Delete { id } => {
            api.delete_cargo(&id).await?;
            println!("🗑️ Deleted {}", id);
        }
        Command::Retrieve { id } => {
            let result = api.retrieve(&id).await?;
            println!("📤 Retrieved {} '{}'", result.item.id, result.item.name);
            for step in result.steps {
                let action = match step.action {
                    RetrievalAction::Move => "move",
                    RetrievalAction::Retrieve => "retrieve",
                    RetrievalAction::PlaceBack => "place back",
                };
                match step.position {
                    Some(p) => println!(
                        "   {}. {} {} ({}) at ({:.2}, {:.2}, {:.2})",
                        step.step, action, step.item_id, step.item_name, p.x, p.y, p.z
                    ),
                    None => println!("   {}. {} {} ({})", step.step, action, step.item_id, step.item_name),
                }
            }
        }
        Command::ReturnPlan {
            days_threshold,
            max_weight,
            priority_threshold,
        } => {
            let request = ReturnPlanRequest {
                days_threshold,
                max_weight,
                priority_threshold,
            };
            let plan = api.return_plan(&request).await?;
            println!(
                "🚀 Return plan: {} items, {:.1} kg, {:.2} m³",
                plan.items.len(),
                plan.total_mass,
                plan.total_volume
            );
            for item in plan.items {
                println!("   {} {} ({}) - {}", item.id, item.name, item.zone, item.reason);
            }
            if !plan.excluded.is_empty() {
                println!("   over weight limit: {}", plan.excluded.join(", "));
            }
        }
        Command::Simulate { days } => {
            let result = api.simulate(days).await?;
            println!("⏩ {} -> {}", result.previous_date, result.new_date);
            for item in result.expired_items {
                println!("   ⚠️ expired: {} {} ({})", item.id, item.name, item.zone);
            }
        }
        Command::Export { format, output_dir } => {
            let format: ExportFormat = format.parse()?;
            let data = api.export_arrangement(format).await?;
            let file_name = arrangement::file_name(format);

            let storage = LocalStorage::new(output_dir.clone());
            storage.write_file(&file_name, &data).await?;
            println!("📁 Arrangement saved to {}/{}", output_dir, file_name);
        }
        Command::Import { file, report } => {
            let mut job = ImportJob::new(LocalStorage::new(".".to_string()), api, file);
            if let Some(report) = report {
                job = job.with_report_path(report);
            }
            let report = job.run().await?;
            println!("📥 Imported {} items", report.success_count);
            for failed in report.failed_items {
                println!("   ❌ row {} '{}': {}", failed.index + 1, failed.name, failed.error);
            }
        }
        Command::Watch => watch(api, refresh_interval).await?,
    }
    Ok(())
}

/// Prints health and metrics until Ctrl-C.
async fn watch(api: &impl CargoApi, refresh_interval: u64) -> Result<()> {
    let mut interval = tokio::time::interval(Duration::from_secs(refresh_interval));

    loop {
        tokio::select! {
            _ = interval.tick() => {
                match api.health().await {
                    Ok(_) => match api.metrics().await {
                        Ok(metrics) => println!(
                            "🟢 {} | {} items | {:.1}% used | {} expiring ≤3 days",
                            metrics.current_date,
                            metrics.total_items,
                            metrics.utilization_percent,
                            metrics.expiring_within_3_days
                        ),
                        Err(e) => tracing::warn!("⚠️ Metrics unavailable: {}", e),
                    },
                    Err(e) => println!("🔴 API offline: {}", e.user_friendly_message()),
                }
            }
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("👋 Stopping watch");
                return Ok(());
            }
        }
    }
}
