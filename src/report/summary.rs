use crate::domain::model::ResultTable;

/// One console line per item that has both reference prices, e.g.
/// `Sugar: $4.00 → $5.00 | Change: $1.00 (25.0%)`.
pub fn summary_lines(table: &ResultTable) -> Vec<String> {
    let Some(span) = table.change else {
        return Vec::new();
    };

    table
        .rows
        .iter()
        .filter_map(|row| {
            let earlier = row.prices[span.from]?;
            let later = row.prices[span.to]?;
            let change = row.change.unwrap_or_default();
            let percent = change
                .percent
                .map(|p| format!("{:.1}%", p))
                .unwrap_or_else(|| "n/a".to_string());
            Some(format!(
                "{}: ${:.2} → ${:.2} | Change: ${:.2} ({})",
                row.item,
                earlier,
                later,
                change.absolute.unwrap_or(later - earlier),
                percent
            ))
        })
        .collect()
}
