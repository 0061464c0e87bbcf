pub mod cli;
pub mod price_config;

pub use price_config::PriceConfig;

#[cfg(feature = "cli")]
use clap::Parser;

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Parser)]
#[command(name = "price-etl")]
#[command(about = "Estimate item prices across years from search results")]
pub struct CliConfig {
    /// Path to a TOML configuration file; built-in items and reports when omitted
    #[arg(short, long)]
    pub config: Option<String>,

    /// Override run.output_path from the config
    #[arg(long)]
    pub output_path: Option<String>,

    /// Override run.throttle_ms (delay between search calls)
    #[arg(long)]
    pub throttle_ms: Option<u64>,

    /// Only build the named report; repeat for several
    #[arg(long = "report")]
    pub reports: Vec<String>,

    /// Log every query the fallback tiers could issue, without calling the search API
    #[arg(long)]
    pub dry_run: bool,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Emit logs as JSON lines")]
    pub json_logs: bool,
}

#[cfg(feature = "cli")]
impl CliConfig {
    /// Loads the configured file (or built-in defaults) and applies the
    /// command line overrides on top.
    pub fn load_price_config(&self) -> crate::Result<PriceConfig> {
        let mut config = match &self.config {
            Some(path) => PriceConfig::from_file(path)?,
            None => PriceConfig::default(),
        };

        if let Some(output_path) = &self.output_path {
            config.run.output_path = output_path.clone();
        }
        if let Some(throttle_ms) = self.throttle_ms {
            config.run.throttle_ms = throttle_ms;
        }

        Ok(config)
    }
}
