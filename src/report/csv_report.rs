use crate::domain::model::ResultTable;
use crate::utils::error::{EtlError, Result};

pub fn price_header(year: i32) -> String {
    format!("{} Price ($)", year)
}

pub fn headers(table: &ResultTable) -> Vec<String> {
    let mut headers = vec!["Item".to_string()];
    headers.extend(table.years.iter().map(|year| price_header(*year)));
    if let Some((from, to)) = table.change_years() {
        headers.push(format!("Change ({} → {}) ($)", from, to));
        headers.push(format!("Change ({} → {}) (%)", from, to));
    }
    headers
}

/// Fixed-precision number, or an empty field for "no data".
fn field(value: Option<f64>, places: usize) -> String {
    value
        .map(|v| format!("{:.*}", places, v))
        .unwrap_or_default()
}

pub fn render_csv(table: &ResultTable) -> Result<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(headers(table))?;

    for row in &table.rows {
        let mut record = Vec::with_capacity(row.prices.len() + 3);
        record.push(row.item.clone());
        record.extend(row.prices.iter().map(|price| field(*price, 2)));
        if table.change.is_some() {
            let change = row.change.unwrap_or_default();
            record.push(field(change.absolute, 2));
            record.push(field(change.percent, 1));
        }
        writer.write_record(&record)?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| EtlError::ProcessingError {
            message: format!("Failed to flush CSV output: {}", e),
        })?;
    String::from_utf8(bytes).map_err(|e| EtlError::ProcessingError {
        message: format!("CSV output is not UTF-8: {}", e),
    })
}
