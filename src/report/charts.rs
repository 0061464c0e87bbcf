use crate::domain::model::{ChartKind, RenderedChart, ResultTable};
use crate::utils::error::{EtlError, Result};
use plotters::prelude::*;

const CHART_SIZE: (u32, u32) = (1200, 600);

type Series = (String, Vec<Option<f64>>);

fn chart_error<E: std::fmt::Display>(e: E) -> EtlError {
    EtlError::ChartError {
        message: e.to_string(),
    }
}

/// Percent changes per item, smallest first; items without one are left out.
pub fn percent_change_bars(table: &ResultTable) -> Vec<(String, f64)> {
    let mut bars: Vec<(String, f64)> = table
        .rows
        .iter()
        .filter_map(|row| {
            row.change
                .and_then(|c| c.percent)
                .map(|p| (row.item.clone(), p))
        })
        .collect();
    bars.sort_by(|a, b| a.1.total_cmp(&b.1));
    bars
}

/// Two-point paths between the change years, for items priced at both.
pub fn reference_path_series(table: &ResultTable) -> Vec<Series> {
    let Some(span) = table.change else {
        return Vec::new();
    };

    table
        .rows
        .iter()
        .filter(|row| row.prices[span.from].is_some() && row.prices[span.to].is_some())
        .map(|row| {
            (
                row.item.clone(),
                vec![row.prices[span.from], row.prices[span.to]],
            )
        })
        .collect()
}

/// Full paths across every column, for items priced in at least one year.
pub fn price_path_series(table: &ResultTable) -> Vec<Series> {
    table
        .rows
        .iter()
        .filter(|row| row.prices.iter().any(Option::is_some))
        .map(|row| (row.item.clone(), row.prices.clone()))
        .collect()
}

/// Axis range covering `values` and zero, with some headroom.
fn padded_range(values: impl Iterator<Item = f64>) -> (f64, f64) {
    let (lo, hi) = values.fold((0.0f64, 0.0f64), |(lo, hi), v| (lo.min(v), hi.max(v)));
    let span = hi - lo;
    if span <= f64::EPSILON {
        return (lo - 1.0, hi + 1.0);
    }
    let pad = span * 0.1;
    (if lo < 0.0 { lo - pad } else { lo }, hi + pad)
}

fn bar_chart(title: &str, bars: &[(String, f64)]) -> Result<String> {
    let (y_min, y_max) = padded_range(bars.iter().map(|(_, v)| *v));
    let count = bars.len() as i32;

    let mut svg = String::new();
    {
        let root = SVGBackend::with_string(&mut svg, CHART_SIZE).into_drawing_area();
        root.fill(&WHITE).map_err(chart_error)?;

        let mut chart = ChartBuilder::on(&root)
            .caption(title, ("sans-serif", 24))
            .margin(20)
            .x_label_area_size(50)
            .y_label_area_size(70)
            .build_cartesian_2d((0..count).into_segmented(), y_min..y_max)
            .map_err(chart_error)?;

        chart
            .configure_mesh()
            .disable_x_mesh()
            .x_labels(bars.len() + 1)
            .x_label_formatter(&|x| match x {
                SegmentValue::CenterOf(i) => usize::try_from(*i)
                    .ok()
                    .and_then(|i| bars.get(i))
                    .map(|(name, _)| name.clone())
                    .unwrap_or_default(),
                _ => String::new(),
            })
            .y_label_formatter(&|y| format!("{:.0}%", y))
            .x_desc("Item")
            .y_desc("Percent Change")
            .draw()
            .map_err(chart_error)?;

        chart
            .draw_series(bars.iter().enumerate().map(|(i, (_, value))| {
                let i = i as i32;
                Rectangle::new(
                    [(SegmentValue::Exact(i), 0.0), (SegmentValue::Exact(i + 1), *value)],
                    BLUE.mix(0.7).filled(),
                )
            }))
            .map_err(chart_error)?;

        root.present().map_err(chart_error)?;
    }
    Ok(svg)
}

fn line_chart(title: &str, columns: &[i32], series: &[Series]) -> Result<String> {
    let (_, y_max) = padded_range(series.iter().flat_map(|(_, v)| v.iter().flatten().copied()));
    let last = columns.len().saturating_sub(1) as i32;

    let mut svg = String::new();
    {
        let root = SVGBackend::with_string(&mut svg, CHART_SIZE).into_drawing_area();
        root.fill(&WHITE).map_err(chart_error)?;

        let mut chart = ChartBuilder::on(&root)
            .caption(title, ("sans-serif", 24))
            .margin(30)
            .x_label_area_size(50)
            .y_label_area_size(70)
            .build_cartesian_2d(0..last, 0.0..y_max)
            .map_err(chart_error)?;

        chart
            .configure_mesh()
            .x_labels(columns.len())
            .x_label_formatter(&|x| {
                usize::try_from(*x)
                    .ok()
                    .and_then(|i| columns.get(i))
                    .map(|year| year.to_string())
                    .unwrap_or_default()
            })
            .y_label_formatter(&|y| format!("${:.2}", y))
            .x_desc("Year")
            .y_desc("Estimated Price ($)")
            .draw()
            .map_err(chart_error)?;

        for (idx, (name, values)) in series.iter().enumerate() {
            let points: Vec<(i32, f64)> = values
                .iter()
                .enumerate()
                .filter_map(|(i, v)| v.map(|price| (i as i32, price)))
                .collect();
            let color = Palette99::pick(idx).to_rgba();

            chart
                .draw_series(LineSeries::new(points.clone(), color.stroke_width(2)))
                .map_err(chart_error)?
                .label(name.as_str())
                .legend(move |(x, y)| {
                    PathElement::new(vec![(x, y), (x + 20, y)], color.stroke_width(2))
                });
            chart
                .draw_series(points.into_iter().map(|p| Circle::new(p, 4, color.filled())))
                .map_err(chart_error)?;
        }

        chart
            .configure_series_labels()
            .position(SeriesLabelPosition::UpperLeft)
            .background_style(&WHITE.mix(0.8))
            .border_style(&BLACK)
            .draw()
            .map_err(chart_error)?;

        root.present().map_err(chart_error)?;
    }
    Ok(svg)
}

fn render_one(table: &ResultTable, kind: ChartKind) -> Result<Option<String>> {
    match kind {
        ChartKind::PercentChange => {
            let Some((from, to)) = table.change_years() else {
                return Ok(None);
            };
            let bars = percent_change_bars(table);
            if bars.is_empty() {
                return Ok(None);
            }
            let title = format!("Percent Change ({} → {}) by Item", from, to);
            bar_chart(&title, &bars).map(Some)
        }
        ChartKind::ReferencePaths => {
            let Some((from, to)) = table.change_years() else {
                return Ok(None);
            };
            let series = reference_path_series(table);
            if series.is_empty() {
                return Ok(None);
            }
            let title = format!("Price Paths ({} → {}) by Item", from, to);
            line_chart(&title, &[from, to], &series).map(Some)
        }
        ChartKind::PricePaths => {
            if table.years.len() < 2 {
                tracing::info!("Not enough year columns to plot price paths for {}", table.name);
                return Ok(None);
            }
            let series = price_path_series(table);
            if series.is_empty() {
                return Ok(None);
            }
            let first = table.years[0];
            let last = table.years[table.years.len() - 1];
            let title = format!("Price Paths by Item ({} → {})", first, last);
            line_chart(&title, &table.years, &series).map(Some)
        }
    }
}

pub fn render_charts(table: &ResultTable, kinds: &[ChartKind]) -> Result<Vec<RenderedChart>> {
    let mut charts = Vec::with_capacity(kinds.len());
    for &kind in kinds {
        match render_one(table, kind)? {
            Some(svg) => charts.push(RenderedChart {
                kind,
                file_name: format!("{}_{}.svg", table.name, kind.file_suffix()),
                svg,
            }),
            None => tracing::info!(
                "Skipping {} chart for {}: no data to plot",
                kind.file_suffix(),
                table.name
            ),
        }
    }
    Ok(charts)
}
