use crate::core::resolver::YearPriceResolver;
use crate::core::{pause, round_to};
use crate::domain::model::{
    ChangeSpan, Item, PriceChange, ReportSpec, ResolvedPrice, ResultRow, ResultTable, YearLabel,
};
use crate::domain::ports::SearchService;
use crate::utils::error::{EtlError, Result};

pub fn absolute_change(earlier: ResolvedPrice, later: ResolvedPrice) -> Option<f64> {
    match (earlier, later) {
        (Some(a), Some(b)) => Some(round_to(b - a, 2)),
        _ => None,
    }
}

pub fn percent_change(earlier: ResolvedPrice, later: ResolvedPrice) -> Option<f64> {
    match (earlier, later) {
        (Some(a), Some(b)) if a != 0.0 => Some(round_to((b - a) / a * 100.0, 1)),
        _ => None,
    }
}

pub fn price_change(earlier: ResolvedPrice, later: ResolvedPrice) -> PriceChange {
    PriceChange {
        absolute: absolute_change(earlier, later),
        percent: percent_change(earlier, later),
    }
}

fn column_of(report: &ReportSpec, label: YearLabel, field: &str) -> Result<usize> {
    report
        .years
        .iter()
        .position(|year| *year == label)
        .ok_or_else(|| EtlError::InvalidConfigValueError {
            field: format!("reports.{}.change.{}", report.name, field),
            value: label.to_string(),
            reason: "change year must be one of the report's years".to_string(),
        })
}

/// Builds one [`ResultTable`] by resolving every (item, year) pair in turn.
pub struct TableBuilder<'a, S: SearchService> {
    resolver: &'a YearPriceResolver<S>,
    current_year: i32,
}

impl<'a, S: SearchService> TableBuilder<'a, S> {
    pub fn new(resolver: &'a YearPriceResolver<S>, current_year: i32) -> Self {
        Self {
            resolver,
            current_year,
        }
    }

    pub async fn build(&self, items: &[Item], report: &ReportSpec) -> Result<ResultTable> {
        let span = match report.change {
            Some(change) => Some(ChangeSpan {
                from: column_of(report, change.from, "from")?,
                to: column_of(report, change.to, "to")?,
            }),
            None => None,
        };

        let years: Vec<i32> = report
            .years
            .iter()
            .map(|label| label.resolve(self.current_year))
            .collect();

        let mut rows = Vec::with_capacity(items.len());
        for item in items {
            tracing::info!("🔍 Fetching prices for: {} ({})", item.key, report.name);

            let mut prices = Vec::with_capacity(years.len());
            for &year in &years {
                prices.push(self.resolver.resolve(item, year).await);
                pause(self.resolver.throttle()).await;
            }

            let change = span.map(|s| price_change(prices[s.from], prices[s.to]));
            rows.push(ResultRow {
                item: item.key.clone(),
                prices,
                change,
            });
        }

        Ok(ResultTable {
            name: report.name.clone(),
            years,
            change: span,
            rows,
        })
    }
}
