//! Turns finished result tables into files and console output.

pub mod charts;
pub mod csv_report;
pub mod summary;

use crate::domain::model::{ChartKind, RenderedReport, ResultTable};
use crate::utils::error::Result;

pub fn render_report(table: ResultTable, chart_kinds: &[ChartKind]) -> Result<RenderedReport> {
    let csv_output = csv_report::render_csv(&table)?;
    let charts = charts::render_charts(&table, chart_kinds)?;
    let summary = summary::summary_lines(&table);

    Ok(RenderedReport {
        table,
        csv_output,
        charts,
        summary,
    })
}
