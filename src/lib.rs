pub mod adapters;
pub mod app;
pub mod config;
pub mod core;
pub mod domain;
pub mod report;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;

pub use adapters::serpapi::SerpApiClient;
pub use app::pipelines::PricePipeline;
pub use config::{cli::LocalStorage, PriceConfig};
pub use crate::core::{etl::EtlEngine, resolver::YearPriceResolver, table::TableBuilder};
pub use domain::model::{
    BoundsRule, ChangeYears, ChartKind, Item, ReportSpec, ResultRow, ResultTable, YearLabel,
};
pub use domain::ports::{Pipeline, SearchService, Storage};
pub use utils::error::{EtlError, Result};
