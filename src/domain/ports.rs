use crate::domain::model::{RenderedReport, ResultTable, ShoppingResult};
use crate::utils::error::Result;
use async_trait::async_trait;

pub trait Storage: Send + Sync {
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}

/// The two search operations prices are mined from.
#[async_trait]
pub trait SearchService: Send + Sync {
    /// Product search; one entry per shopping result.
    async fn structured_search(&self, query: &str) -> Result<Vec<ShoppingResult>>;

    /// General web search; the snippet of the first organic result, if any.
    async fn web_search(&self, query: &str) -> Result<Option<String>>;
}

#[async_trait]
pub trait Pipeline: Send + Sync {
    async fn extract(&self) -> Result<Vec<ResultTable>>;
    async fn transform(&self, tables: Vec<ResultTable>) -> Result<Vec<RenderedReport>>;
    async fn load(&self, reports: Vec<RenderedReport>) -> Result<String>;
}
