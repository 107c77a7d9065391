use auction_rules::domain::model::{Listing, UserId};
use auction_rules::utils::logger;
use auction_rules::utils::validation::{validate_required_field, Validate};
use auction_rules::{
    AdmissionDecision, CliConfig, LayeredThresholds, MarketSnapshot, MarketplaceEngine,
    MemoryMarket, TomlThresholds,
};
use clap::Parser;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = CliConfig::parse();

    // 初始化日誌
    if config.log_json {
        logger::init_json_logger();
    } else {
        logger::init_cli_logger(config.verbose);
    }

    tracing::info!("Starting auction-rules CLI");
    if config.verbose {
        tracing::debug!("CLI config: {:?}", config);
    }

    // 驗證配置
    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(1);
    }

    if config.monitor {
        tracing::info!("🔍 System monitoring enabled");
    }

    match run(&config).await {
        Ok(()) => {
            tracing::info!("✅ Evaluation completed");
        }
        Err(e) => {
            // 記錄詳細錯誤信息
            tracing::error!(
                "❌ Evaluation failed: {} (Category: {:?}, Severity: {:?})",
                e,
                e.category(),
                e.severity()
            );
            tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

            // 輸出用戶友好的錯誤信息
            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 建議: {}", e.recovery_suggestion());

            // 根據錯誤嚴重程度決定退出碼
            let exit_code = match e.severity() {
                auction_rules::utils::error::ErrorSeverity::Low => 0, // 警告，但成功
                auction_rules::utils::error::ErrorSeverity::Medium => 2, // 重試錯誤
                auction_rules::utils::error::ErrorSeverity::High => 1, // 處理錯誤
                auction_rules::utils::error::ErrorSeverity::Critical => 3, // 系統錯誤
            };

            if exit_code > 0 {
                std::process::exit(exit_code);
            }
        }
    }

    Ok(())
}

async fn run(config: &CliConfig) -> auction_rules::Result<()> {
    // 載入門檻檔（可選），命令列旗標優先於檔案值
    let file_thresholds = match &config.thresholds {
        Some(path) => {
            tracing::info!("📁 Loading thresholds from: {}", path);
            let thresholds = TomlThresholds::from_file(path)?;
            thresholds.validate()?;
            Some(thresholds)
        }
        None => None,
    };
    let thresholds = LayeredThresholds::new(config.clone(), file_thresholds);

    // 載入市場快照；檔案不存在就從空市場開始
    let snapshot = if std::path::Path::new(&config.snapshot).exists() {
        MarketSnapshot::from_file(&config.snapshot)?
    } else {
        tracing::warn!(
            "📁 Snapshot {} not found, starting from an empty market",
            config.snapshot
        );
        MarketSnapshot::default()
    };
    tracing::info!(
        "🔍 Market loaded: {} listings, {} bids, {} ratings",
        snapshot.listings.len(),
        snapshot.bids.len(),
        snapshot.ratings.len()
    );

    let market = MemoryMarket::from_snapshot(snapshot);
    let engine =
        MarketplaceEngine::new_with_monitoring(market.clone(), thresholds, config.monitor);

    if let Some(candidate_path) = &config.candidate {
        tracing::info!("📁 Reviewing candidate listing from: {}", candidate_path);
        let content = std::fs::read_to_string(candidate_path)?;
        let candidate: Listing = serde_json::from_str(&content)?;

        let decision = engine.create_listing(candidate).await?;
        match &decision {
            AdmissionDecision::Admitted => {
                println!("✅ Listing admitted");
                if config.save {
                    market.snapshot().await.to_file(&config.snapshot)?;
                    println!("📁 Snapshot updated: {}", config.snapshot);
                }
            }
            AdmissionDecision::Rejected(reason) => {
                println!("❌ Listing rejected: {}", reason);
            }
        }
    } else {
        // 沒有候選刊登時就必須指定賣家
        let seller = *validate_required_field("candidate or seller", &config.seller)?;
        let standing = engine.seller_standing(UserId(seller)).await?;
        println!("📊 Seller {}", seller);
        println!("  Score: {:.2}", standing.score);
        println!("  Listing limit: {}", standing.limit);
    }

    engine.log_final_stats();
    Ok(())
}
