use chrono::Datelike;
use clap::Parser;
use price_etl::core::resolver::Tier;
use price_etl::utils::{logger, validation::Validate};
use price_etl::{
    CliConfig, EtlEngine, EtlError, LocalStorage, PriceConfig, PricePipeline, ReportSpec,
    SerpApiClient,
};

#[tokio::main]
async fn main() {
    // A missing .env file is fine; the key may come from the real environment.
    let _ = dotenvy::dotenv();

    let cli = CliConfig::parse();

    if cli.json_logs {
        logger::init_json_logger(cli.verbose);
    } else {
        logger::init_cli_logger(cli.verbose);
    }

    tracing::info!("Starting price-etl");
    if cli.verbose {
        tracing::debug!("CLI config: {:?}", cli);
    }

    let config = cli.load_price_config().unwrap_or_else(|e| exit_with(&e));
    if let Err(e) = config.validate() {
        exit_with(&e);
    }
    let reports = config
        .selected_reports(&cli.reports)
        .unwrap_or_else(|e| exit_with(&e));

    // The credential is checked before any work, dry runs included.
    let api_key = config.resolve_api_key().unwrap_or_else(|e| exit_with(&e));

    tracing::info!(
        "✅ Configuration loaded: {} items, {} reports, {}ms between calls",
        config.items.len(),
        reports.len(),
        config.run.throttle_ms
    );

    if cli.dry_run {
        tracing::info!("🔍 DRY RUN MODE - no search requests will be made");
        perform_dry_run(&config, &reports);
        return;
    }

    let client = SerpApiClient::new(&config.search, api_key).unwrap_or_else(|e| exit_with(&e));
    let storage = LocalStorage::new(config.output_path());
    let pipeline = PricePipeline::new(storage, client, &config, reports);
    let engine = EtlEngine::new(pipeline);

    match engine.run().await {
        Ok(output_path) => {
            tracing::info!("✅ Price collection completed successfully!");
            println!("✅ Price collection completed successfully!");
            println!("📁 Output saved to: {}", output_path);
        }
        Err(e) => exit_with(&e),
    }
}

fn exit_with(err: &EtlError) -> ! {
    tracing::error!(
        "❌ {} (Category: {:?}, Severity: {:?})",
        err,
        err.category(),
        err.severity()
    );
    tracing::error!("💡 Recovery suggestion: {}", err.recovery_suggestion());

    eprintln!("❌ {}", err.user_friendly_message());
    eprintln!("💡 {}", err.recovery_suggestion());

    std::process::exit(err.severity().exit_code().max(1));
}

fn perform_dry_run(config: &PriceConfig, reports: &[ReportSpec]) {
    let current_year = chrono::Local::now().year();
    let items = config.items();

    for report in reports {
        tracing::info!("📋 Report: {}", report.name);
        for item in &items {
            tracing::info!(
                "  {} (bounds {:.2}..={:.2}, {} sites)",
                item.key,
                item.bounds.min,
                item.bounds.max,
                item.sites.len()
            );
            for label in &report.years {
                let year = label.resolve(current_year);
                for tier in Tier::ORDER {
                    for query in tier.queries(item, year) {
                        tracing::info!("    [{:?}] {}", tier, query);
                    }
                }
            }
        }
    }
}
