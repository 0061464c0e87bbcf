use crate::core::extractor::{extract_prices, extract_prices_opt};
use crate::domain::model::{SearchMode, ShoppingPrice, ShoppingResult};
use crate::domain::ports::SearchService;

/// Turns search responses into price observations.
///
/// Every failure of the underlying service is logged here and treated as
/// "nothing found", so callers only ever see a (possibly empty) list.
pub struct PriceSource<S: SearchService> {
    service: S,
}

impl<S: SearchService> PriceSource<S> {
    pub fn new(service: S) -> Self {
        Self { service }
    }

    pub async fn observe(&self, mode: SearchMode, query: &str) -> Vec<f64> {
        match mode {
            SearchMode::Structured => self.shopping_prices(query).await,
            SearchMode::FreeText => self.web_prices(query).await,
        }
    }

    pub async fn shopping_prices(&self, query: &str) -> Vec<f64> {
        match self.service.structured_search(query).await {
            Ok(results) => {
                let prices = prices_from_shopping(&results);
                tracing::debug!(
                    "shopping: {} results, {} prices for '{}'",
                    results.len(),
                    prices.len(),
                    query
                );
                prices
            }
            Err(e) => {
                tracing::warn!("[shopping error] {}: {}", query, e);
                Vec::new()
            }
        }
    }

    pub async fn web_prices(&self, query: &str) -> Vec<f64> {
        match self.service.web_search(query).await {
            Ok(snippet) => {
                let prices = extract_prices_opt(snippet.as_deref());
                tracing::debug!("web: {} prices for '{}'", prices.len(), query);
                prices
            }
            Err(e) => {
                tracing::warn!("[web error] {}: {}", query, e);
                Vec::new()
            }
        }
    }
}

pub fn prices_from_shopping(results: &[ShoppingResult]) -> Vec<f64> {
    results
        .iter()
        .flat_map(|result| match &result.price {
            Some(ShoppingPrice::Number(value)) => vec![*value],
            Some(ShoppingPrice::Text(text)) => extract_prices(text),
            Some(ShoppingPrice::Other(_)) | None => Vec::new(),
        })
        .collect()
}
