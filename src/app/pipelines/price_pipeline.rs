use crate::config::PriceConfig;
use crate::core::resolver::YearPriceResolver;
use crate::core::source::PriceSource;
use crate::core::table::TableBuilder;
use crate::core::{Item, Pipeline, RenderedReport, ResultTable, SearchService, Storage};
use crate::domain::model::ReportSpec;
use crate::report;
use crate::utils::error::Result;
use chrono::Datelike;

pub const DATA_DIR: &str = "data";
pub const PLOTS_DIR: &str = "plots";

pub struct PricePipeline<S: Storage, Q: SearchService> {
    storage: S,
    resolver: YearPriceResolver<Q>,
    items: Vec<Item>,
    reports: Vec<ReportSpec>,
    output_path: String,
    current_year: i32,
}

impl<S: Storage, Q: SearchService> PricePipeline<S, Q> {
    pub fn new(storage: S, search: Q, config: &PriceConfig, reports: Vec<ReportSpec>) -> Self {
        Self {
            storage,
            resolver: YearPriceResolver::new(PriceSource::new(search), config.throttle()),
            items: config.items(),
            reports,
            output_path: config.output_path().to_string(),
            current_year: chrono::Local::now().year(),
        }
    }

    /// Pins the year that `current` columns resolve to.
    pub fn with_current_year(mut self, year: i32) -> Self {
        self.current_year = year;
        self
    }

    fn report_spec(&self, name: &str) -> Option<&ReportSpec> {
        self.reports.iter().find(|r| r.name == name)
    }
}

#[async_trait::async_trait]
impl<S: Storage, Q: SearchService> Pipeline for PricePipeline<S, Q> {
    async fn extract(&self) -> Result<Vec<ResultTable>> {
        let builder = TableBuilder::new(&self.resolver, self.current_year);
        let mut tables = Vec::with_capacity(self.reports.len());

        for report in &self.reports {
            tracing::info!(
                "Building {} ({} items x {} years)",
                report.name,
                self.items.len(),
                report.years.len()
            );
            tables.push(builder.build(&self.items, report).await?);
        }

        Ok(tables)
    }

    async fn transform(&self, tables: Vec<ResultTable>) -> Result<Vec<RenderedReport>> {
        let mut reports = Vec::with_capacity(tables.len());

        for table in tables {
            let chart_kinds = self
                .report_spec(&table.name)
                .map(|spec| spec.charts.clone())
                .unwrap_or_default();
            let rendered = report::render_report(table, &chart_kinds)?;

            if let Some((from, to)) = rendered.table.change_years() {
                tracing::info!("📢 Formatted ({} → {}):", from, to);
                for line in &rendered.summary {
                    tracing::info!("{}", line);
                }
            }
            reports.push(rendered);
        }

        Ok(reports)
    }

    async fn load(&self, reports: Vec<RenderedReport>) -> Result<String> {
        for rendered in &reports {
            let csv_path = format!("{}/{}.csv", DATA_DIR, rendered.table.name);
            self.storage
                .write_file(&csv_path, rendered.csv_output.as_bytes())
                .await?;
            tracing::info!("💾 Saved table: {}/{}", self.output_path, csv_path);

            for chart in &rendered.charts {
                let chart_path = format!("{}/{}", PLOTS_DIR, chart.file_name);
                self.storage
                    .write_file(&chart_path, chart.svg.as_bytes())
                    .await?;
                tracing::info!("📈 Saved plot: {}/{}", self.output_path, chart_path);
            }
        }

        Ok(self.output_path.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::{ChangeYears, ChartKind, ShoppingPrice, ShoppingResult, YearLabel};
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Arc;
    use tokio::sync::Mutex;

    #[derive(Clone)]
    struct MockStorage {
        files: Arc<Mutex<HashMap<String, Vec<u8>>>>,
    }

    impl MockStorage {
        fn new() -> Self {
            Self {
                files: Arc::new(Mutex::new(HashMap::new())),
            }
        }

        async fn get_file(&self, path: &str) -> Option<Vec<u8>> {
            let files = self.files.lock().await;
            files.get(path).cloned()
        }
    }

    impl Storage for MockStorage {
        async fn write_file(&self, path: &str, data: &[u8]) -> Result<()> {
            let mut files = self.files.lock().await;
            files.insert(path.to_string(), data.to_vec());
            Ok(())
        }
    }

    /// Shopping results priced by year; the web engine never answers.
    struct YearPricedSearch {
        prices: HashMap<i32, f64>,
    }

    #[async_trait]
    impl SearchService for YearPricedSearch {
        async fn structured_search(&self, query: &str) -> Result<Vec<ShoppingResult>> {
            Ok(self
                .prices
                .iter()
                .filter(|(year, _)| query.contains(&format!("price in {} USA", year)))
                .map(|(_, price)| ShoppingResult {
                    title: None,
                    price: Some(ShoppingPrice::Number(*price)),
                })
                .collect())
        }

        async fn web_search(&self, _query: &str) -> Result<Option<String>> {
            Ok(None)
        }
    }

    fn test_config() -> PriceConfig {
        let mut config = PriceConfig::default();
        config.run.throttle_ms = 0;
        config.run.output_path = "test_output".to_string();
        config.items.truncate(1);
        config.default_sites = vec!["walmart.com".to_string()];
        config
    }

    fn change_report() -> ReportSpec {
        ReportSpec {
            name: "changes".to_string(),
            years: vec![YearLabel::Fixed(2024), YearLabel::Current],
            change: Some(ChangeYears {
                from: YearLabel::Fixed(2024),
                to: YearLabel::Current,
            }),
            charts: vec![ChartKind::PercentChange, ChartKind::ReferencePaths],
        }
    }

    fn pipeline(storage: MockStorage) -> PricePipeline<MockStorage, YearPricedSearch> {
        let search = YearPricedSearch {
            prices: HashMap::from([(2024, 4.0), (2026, 5.0)]),
        };
        PricePipeline::new(storage, search, &test_config(), vec![change_report()])
            .with_current_year(2026)
    }

    #[tokio::test]
    async fn test_extract_resolves_current_year() {
        let pipeline = pipeline(MockStorage::new());

        let tables = pipeline.extract().await.unwrap();

        assert_eq!(tables.len(), 1);
        assert_eq!(tables[0].years, vec![2024, 2026]);
        let row = &tables[0].rows[0];
        assert_eq!(row.item, "Sugar");
        assert_eq!(row.prices, vec![Some(4.0), Some(5.0)]);
        assert_eq!(row.change.unwrap().percent, Some(25.0));
        assert_eq!(row.change.unwrap().absolute, Some(1.0));
    }

    #[tokio::test]
    async fn test_transform_renders_csv_charts_and_summary() {
        let pipeline = pipeline(MockStorage::new());
        let tables = pipeline.extract().await.unwrap();

        let reports = pipeline.transform(tables).await.unwrap();

        assert_eq!(reports.len(), 1);
        assert!(reports[0].csv_output.starts_with("Item,2024 Price ($),2026 Price ($)"));
        assert_eq!(reports[0].charts.len(), 2);
        assert_eq!(
            reports[0].summary,
            vec!["Sugar: $4.00 → $5.00 | Change: $1.00 (25.0%)"]
        );
    }

    #[tokio::test]
    async fn test_load_writes_data_and_plots() {
        let storage = MockStorage::new();
        let pipeline = pipeline(storage.clone());
        let tables = pipeline.extract().await.unwrap();
        let reports = pipeline.transform(tables).await.unwrap();

        let output_path = pipeline.load(reports).await.unwrap();

        assert_eq!(output_path, "test_output");
        let csv = storage.get_file("data/changes.csv").await.unwrap();
        assert!(String::from_utf8(csv).unwrap().contains("Sugar,4.00,5.00,1.00,25.0"));
        assert!(storage
            .get_file("plots/changes_percent_change.svg")
            .await
            .is_some());
        assert!(storage
            .get_file("plots/changes_reference_paths.svg")
            .await
            .is_some());
    }

    #[tokio::test]
    async fn test_no_data_rows_still_written() {
        let storage = MockStorage::new();
        let search = YearPricedSearch {
            prices: HashMap::new(),
        };
        let pipeline =
            PricePipeline::new(storage.clone(), search, &test_config(), vec![change_report()])
                .with_current_year(2026);

        let tables = pipeline.extract().await.unwrap();
        let reports = pipeline.transform(tables).await.unwrap();
        assert!(reports[0].charts.is_empty());
        pipeline.load(reports).await.unwrap();

        let csv = String::from_utf8(storage.get_file("data/changes.csv").await.unwrap()).unwrap();
        assert_eq!(csv.lines().nth(1), Some("Sugar,,,,"));
    }
}
