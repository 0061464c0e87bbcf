use async_trait::async_trait;
use price_etl::domain::model::{SearchMode, ShoppingPrice, ShoppingResult};
use price_etl::{EtlEngine, LocalStorage, PriceConfig, PricePipeline, Result, SearchService};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

type CallLog = Arc<Mutex<Vec<(SearchMode, String)>>>;

/// Deterministic prices keyed by (item query, year); records every call.
struct StubSearch {
    prices: HashMap<(&'static str, i32), f64>,
    calls: CallLog,
}

impl StubSearch {
    fn new(prices: HashMap<(&'static str, i32), f64>) -> Self {
        Self {
            prices,
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

#[async_trait]
impl SearchService for StubSearch {
    async fn structured_search(&self, query: &str) -> Result<Vec<ShoppingResult>> {
        self.calls
            .lock()
            .unwrap()
            .push((SearchMode::Structured, query.to_string()));

        Ok(self
            .prices
            .iter()
            .filter(|((item_query, year), _)| {
                query.starts_with(item_query) && query.contains(&format!("price in {} USA", year))
            })
            .map(|(_, price)| ShoppingResult {
                title: None,
                price: Some(ShoppingPrice::Text(format!("${:.2}", price))),
            })
            .collect())
    }

    async fn web_search(&self, query: &str) -> Result<Option<String>> {
        self.calls
            .lock()
            .unwrap()
            .push((SearchMode::FreeText, query.to_string()));
        Ok(None)
    }
}

fn config_for(output_path: &str) -> PriceConfig {
    let toml = format!(
        r#"
default_sites = ["walmart.com"]

[run]
throttle_ms = 0
output_path = "{}"

[[items]]
key = "Sugar"
query = "price of sugar"
[items.bounds]
min = 1.0
max = 10.0

[[items]]
key = "Ground_Beef"
query = "price of ground beef"
[items.bounds]
min = 5.0
max = 50.0

[[items]]
key = "Eye_Drops"
query = "price of eye drops"

[[reports]]
name = "changes"
years = ["2016", "2024", "current"]
change = {{ from = "2024", to = "current" }}
charts = ["percent_change", "reference_paths"]

[[reports]]
name = "paths"
years = ["2016", "2020", "2024", "current"]
charts = ["price_paths"]
"#,
        output_path.replace('\\', "/")
    );
    PriceConfig::from_toml_str(&toml).unwrap()
}

fn stub_prices() -> HashMap<(&'static str, i32), f64> {
    HashMap::from([
        (("price of sugar", 2024), 4.0),
        (("price of sugar", 2026), 5.0),
        (("price of ground beef", 2016), 4.5),
        (("price of ground beef", 2024), 6.0),
        (("price of ground beef", 2026), 5.4),
        (("price of eye drops", 2020), 15.0),
        (("price of eye drops", 2026), 19.99),
    ])
}

#[tokio::test]
async fn test_end_to_end_three_items() {
    let temp_dir = TempDir::new().unwrap();
    let output_path = temp_dir.path().to_str().unwrap().to_string();
    let config = config_for(&output_path);

    let search = StubSearch::new(stub_prices());
    let storage = LocalStorage::new(config.output_path());
    let reports = config.selected_reports(&[]).unwrap();
    let pipeline = PricePipeline::new(storage, search, &config, reports).with_current_year(2026);
    let engine = EtlEngine::new(pipeline);

    let result = engine.run().await.unwrap();
    assert_eq!(result, config.output_path());

    let csv = std::fs::read_to_string(temp_dir.path().join("data/changes.csv")).unwrap();
    let lines: Vec<&str> = csv.lines().collect();
    assert_eq!(lines.len(), 4);
    assert_eq!(
        lines[0],
        "Item,2016 Price ($),2024 Price ($),2026 Price ($),Change (2024 → 2026) ($),Change (2024 → 2026) (%)"
    );
    assert_eq!(lines[1], "Sugar,,4.00,5.00,1.00,25.0");
    assert_eq!(lines[2], "Ground_Beef,,6.00,5.40,-0.60,-10.0");
    assert_eq!(lines[3], "Eye_Drops,,,19.99,,");

    let paths = std::fs::read_to_string(temp_dir.path().join("data/paths.csv")).unwrap();
    let lines: Vec<&str> = paths.lines().collect();
    assert_eq!(lines.len(), 4);
    // 4.50 is below the beef bounds, so 2016 is no data.
    assert_eq!(lines[2], "Ground_Beef,,,6.00,5.40");
    assert_eq!(lines[3], "Eye_Drops,,15.00,,19.99");

    for plot in [
        "plots/changes_percent_change.svg",
        "plots/changes_reference_paths.svg",
        "plots/paths_price_paths.svg",
    ] {
        let svg = std::fs::read_to_string(temp_dir.path().join(plot)).unwrap();
        assert!(svg.contains("<svg"), "{} is not an SVG", plot);
    }
}

#[tokio::test]
async fn test_per_site_hit_short_circuits_every_later_tier() {
    let temp_dir = TempDir::new().unwrap();
    let config = config_for(temp_dir.path().to_str().unwrap());

    let search = StubSearch::new(stub_prices());
    let calls = search.calls.clone();
    let reports = config
        .selected_reports(&["changes".to_string()])
        .unwrap();
    let pipeline = PricePipeline::new(
        LocalStorage::new(config.output_path()),
        search,
        &config,
        reports,
    )
    .with_current_year(2026);

    EtlEngine::new(pipeline).run().await.unwrap();

    let calls = calls.lock().unwrap();
    let sugar_2024: Vec<&(SearchMode, String)> = calls
        .iter()
        .filter(|(_, q)| q.starts_with("price of sugar") && q.contains("2024"))
        .collect();
    assert_eq!(sugar_2024.len(), 1);
    assert_eq!(sugar_2024[0].0, SearchMode::Structured);
    assert!(sugar_2024[0].1.ends_with("site:walmart.com"));

    // Sugar 2016 has no stub price: all four tiers run, in order.
    let sugar_2016: Vec<(SearchMode, bool)> = calls
        .iter()
        .filter(|(_, q)| q.starts_with("price of sugar") && q.contains("2016"))
        .map(|(mode, q)| (*mode, q.contains("site:")))
        .collect();
    assert_eq!(
        sugar_2016,
        vec![
            (SearchMode::Structured, true),
            (SearchMode::Structured, false),
            (SearchMode::FreeText, true),
            (SearchMode::FreeText, false),
        ]
    );
}
