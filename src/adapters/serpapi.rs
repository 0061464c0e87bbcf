use crate::config::price_config::SearchConfig;
use crate::domain::model::ShoppingResult;
use crate::domain::ports::SearchService;
use crate::utils::error::{EtlError, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;

const SHOPPING_ENGINE: &str = "google_shopping";
const WEB_ENGINE: &str = "google";

#[derive(Debug, Deserialize)]
struct ShoppingResponse {
    #[serde(default)]
    shopping_results: Vec<ShoppingResult>,
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WebResponse {
    #[serde(default)]
    organic_results: Vec<OrganicResult>,
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OrganicResult {
    #[serde(default)]
    snippet: Option<String>,
}

/// SerpApi client for the shopping and web search engines.
pub struct SerpApiClient {
    client: Client,
    endpoint: String,
    api_key: String,
    results_per_query: u32,
}

impl SerpApiClient {
    pub fn new(config: &SearchConfig, api_key: String) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()?;

        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
            api_key,
            results_per_query: config.results_per_query,
        })
    }

    async fn get<T: DeserializeOwned>(&self, params: &[(&str, String)]) -> Result<T> {
        tracing::debug!("SerpApi request: {:?}", params);

        let response = self
            .client
            .get(&self.endpoint)
            .query(params)
            .query(&[("api_key", self.api_key.as_str())])
            .send()
            .await
            .map_err(reqwest::Error::without_url)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(EtlError::SearchError {
                message: format!("HTTP {}: {}", status, body),
            });
        }

        let body = response.text().await.map_err(reqwest::Error::without_url)?;
        Ok(serde_json::from_str(&body)?)
    }
}

fn api_error(error: Option<String>) -> Result<()> {
    match error {
        Some(message) => Err(EtlError::SearchError { message }),
        None => Ok(()),
    }
}

#[async_trait]
impl SearchService for SerpApiClient {
    async fn structured_search(&self, query: &str) -> Result<Vec<ShoppingResult>> {
        let response: ShoppingResponse = self
            .get(&[
                ("engine", SHOPPING_ENGINE.to_string()),
                ("q", query.to_string()),
                ("num", self.results_per_query.to_string()),
            ])
            .await?;

        api_error(response.error)?;
        Ok(response.shopping_results)
    }

    async fn web_search(&self, query: &str) -> Result<Option<String>> {
        let response: WebResponse = self
            .get(&[
                ("engine", WEB_ENGINE.to_string()),
                ("q", query.to_string()),
            ])
            .await?;

        api_error(response.error)?;
        Ok(response
            .organic_results
            .into_iter()
            .next()
            .and_then(|first| first.snippet))
    }
}
