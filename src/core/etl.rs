use crate::core::Pipeline;
use crate::utils::error::Result;
use std::time::Instant;

pub struct EtlEngine<P: Pipeline> {
    pipeline: P,
}

impl<P: Pipeline> EtlEngine<P> {
    pub fn new(pipeline: P) -> Self {
        Self { pipeline }
    }

    pub async fn run(&self) -> Result<String> {
        let started = Instant::now();
        tracing::info!("Starting price collection...");

        // Extract
        let tables = self.pipeline.extract().await?;
        let rows: usize = tables.iter().map(|t| t.rows.len()).sum();
        tracing::info!("Built {} tables ({} rows) in {:?}", tables.len(), rows, started.elapsed());

        // Transform
        let reports = self.pipeline.transform(tables).await?;
        let charts: usize = reports.iter().map(|r| r.charts.len()).sum();
        tracing::info!("Rendered {} reports with {} charts", reports.len(), charts);

        // Load
        let output_path = self.pipeline.load(reports).await?;
        tracing::info!("Output saved to: {} (total {:?})", output_path, started.elapsed());

        Ok(output_path)
    }
}
