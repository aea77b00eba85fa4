use clap::Parser;
use farm_analytics::core::{ConfigProvider, Pipeline};
use farm_analytics::utils::error::ErrorSeverity;
use farm_analytics::utils::{logger, validation::Validate};
use farm_analytics::{
    AnalysisEngine, AnalysisPipeline, AnalysisReport, Granularity, LocalStorage, TomlConfig,
};

#[derive(Parser)]
#[command(name = "toml-report")]
#[command(about = "Farm report generator driven by a TOML configuration file")]
struct Args {
    /// Path to TOML configuration file
    #[arg(short, long, default_value = "farm-report.toml")]
    config: String,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Override the aggregation period from config
    #[arg(long)]
    period: Option<Granularity>,

    /// Dry run - load and analyse the records without writing any output
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    // 初始化日誌
    logger::init_cli_logger(args.verbose);

    tracing::info!("🚀 Starting TOML-based farm report");
    tracing::info!("📁 Loading configuration from: {}", args.config);

    let mut config = match TomlConfig::from_file(&args.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ Failed to load config file '{}': {}", args.config, e);
            eprintln!("💡 Make sure the file exists and is valid TOML format");
            std::process::exit(1);
        }
    };

    // 應用命令列覆蓋設定
    if let Some(period) = args.period {
        config.report.period = period;
        tracing::info!("🔧 Period overridden to: {}", period);
    }

    // 驗證配置
    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(1);
    }

    tracing::info!("✅ Configuration loaded and validated successfully");
    display_config_summary(&config, &args);

    let repository = config.record_repository();
    let storage = LocalStorage::new(config.output_path().to_string());
    let pipeline = AnalysisPipeline::new(repository, storage, config);

    if args.dry_run {
        tracing::info!("🔍 DRY RUN MODE - No output will be written");
        let records = pipeline.extract().await?;
        let report = pipeline.transform(records).await?;
        display_dry_run(&report);
        return Ok(());
    }

    let engine = AnalysisEngine::new(pipeline);

    match engine.run().await {
        Ok(output_path) => {
            tracing::info!("✅ Farm report completed successfully!");
            println!("✅ Farm report completed successfully!");
            println!("📁 Output saved to: {}", output_path);
        }
        Err(e) => {
            tracing::error!(
                "❌ Farm report failed: {} (Category: {:?}, Severity: {:?})",
                e,
                e.category(),
                e.severity()
            );
            tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 建議: {}", e.recovery_suggestion());

            let exit_code = match e.severity() {
                ErrorSeverity::Low => 0,
                ErrorSeverity::Medium => 2,
                ErrorSeverity::High => 1,
                ErrorSeverity::Critical => 3,
            };

            if exit_code > 0 {
                std::process::exit(exit_code);
            }
        }
    }

    Ok(())
}

fn display_config_summary(config: &TomlConfig, args: &Args) {
    println!("📋 Configuration Summary:");
    println!("  Report: {}", config.report_name());
    println!("  Period: {}", config.granularity());
    println!("  Data dir: {}", config.input.data_dir);
    for (kind, file) in [
        ("Work", &config.input.work_file),
        ("Cost", &config.input.cost_file),
        ("Sales", &config.input.sales_file),
    ] {
        if let Some(file) = file {
            println!("  {} records: {}", kind, file);
        }
    }
    println!("  Output: {}", config.output_path());

    let formats: Vec<String> = config
        .output_formats()
        .iter()
        .map(|f| format!("{:?}", f).to_lowercase())
        .collect();
    println!("  Formats: {}", formats.join(", "));

    if config.compress_output() {
        println!("  Compression: ZIP");
    }
    if config.compare_with_previous() {
        println!("  Previous-year comparison: enabled");
    }
    if args.dry_run {
        println!("  🔍 DRY RUN MODE ENABLED");
    }

    println!();
}

fn display_dry_run(report: &AnalysisReport) {
    println!("🔍 Dry Run Analysis:");
    println!(
        "  Records after filtering: {} work, {} cost, {} sales",
        report.record_counts.work, report.record_counts.cost, report.record_counts.sales
    );
    println!("  Work periods: {}", report.work.len());
    println!("  Cost periods: {}", report.cost.len());
    println!(
        "  Overall efficiency score: {}",
        report.efficiency.efficiency_score
    );
    println!(
        "  Hours trend: {} ({} data points)",
        report.trends.hours.direction, report.trends.hours.data_points
    );

    if report.consistency.is_valid {
        println!("  ✅ No data consistency issues");
    } else {
        println!("  ⚠️ Data consistency issues:");
        for issue in &report.consistency.issues {
            println!("    - {}", issue);
        }
    }

    println!();
    println!("✅ Dry run complete. Run without --dry-run to write the report.");
}
