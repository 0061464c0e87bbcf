use crate::core::source::PriceSource;
use crate::core::{pause, round_to};
use crate::domain::model::{BoundsRule, Item, ResolvedPrice, SearchMode};
use crate::domain::ports::SearchService;
use std::time::Duration;

/// One fallback strategy. The resolver walks [`Tier::ORDER`] and stops at
/// the first tier that yields any observation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tier {
    ShoppingPerSite,
    ShoppingGeneral,
    WebPerSite,
    WebGeneral,
}

impl Tier {
    pub const ORDER: [Tier; 4] = [
        Tier::ShoppingPerSite,
        Tier::ShoppingGeneral,
        Tier::WebPerSite,
        Tier::WebGeneral,
    ];

    pub fn mode(self) -> SearchMode {
        match self {
            Tier::ShoppingPerSite | Tier::ShoppingGeneral => SearchMode::Structured,
            Tier::WebPerSite | Tier::WebGeneral => SearchMode::FreeText,
        }
    }

    pub fn is_per_site(self) -> bool {
        matches!(self, Tier::ShoppingPerSite | Tier::WebPerSite)
    }

    /// Queries this tier issues for `item` in `year`, in call order.
    pub fn queries(self, item: &Item, year: i32) -> Vec<String> {
        if self.is_per_site() {
            item.sites
                .iter()
                .map(|site| query_text(item, year, Some(site.as_str())))
                .collect()
        } else {
            vec![query_text(item, year, None)]
        }
    }
}

/// `<query> <terms> price in <year> USA [site:<site>]`, skipping empty parts.
pub fn query_text(item: &Item, year: i32, site: Option<&str>) -> String {
    let terms = item.bounds.terms_suffix();
    let year_part = format!("price in {} USA", year);
    let site_part = site.map(|s| format!("site:{}", s));

    [
        Some(item.query.trim()),
        Some(terms.as_str()),
        Some(year_part.as_str()),
        site_part.as_deref(),
    ]
    .into_iter()
    .flatten()
    .filter(|part| !part.is_empty())
    .collect::<Vec<_>>()
    .join(" ")
}

pub fn filter_bounds(observations: &[f64], bounds: &BoundsRule) -> Vec<f64> {
    observations
        .iter()
        .copied()
        .filter(|value| bounds.contains(*value))
        .collect()
}

pub fn median(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }

    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);

    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        Some((sorted[mid - 1] + sorted[mid]) / 2.0)
    } else {
        Some(sorted[mid])
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TierOutcome {
    pub tier: Tier,
    pub observations: Vec<f64>,
}

pub struct YearPriceResolver<S: SearchService> {
    source: PriceSource<S>,
    throttle: Duration,
}

impl<S: SearchService> YearPriceResolver<S> {
    pub fn new(source: PriceSource<S>, throttle: Duration) -> Self {
        Self { source, throttle }
    }

    pub fn throttle(&self) -> Duration {
        self.throttle
    }

    /// Observations from the first tier that produced any, or `None` when
    /// every tier came back empty.
    pub async fn collect(&self, item: &Item, year: i32) -> Option<TierOutcome> {
        for tier in Tier::ORDER {
            let mut observations = Vec::new();

            for query in tier.queries(item, year) {
                observations.extend(self.source.observe(tier.mode(), &query).await);
                if tier.is_per_site() {
                    pause(self.throttle).await;
                }
            }

            if !observations.is_empty() {
                tracing::debug!(
                    "{} {}: {} observations from {:?}",
                    item.key,
                    year,
                    observations.len(),
                    tier
                );
                return Some(TierOutcome { tier, observations });
            }
        }

        None
    }

    pub async fn resolve(&self, item: &Item, year: i32) -> ResolvedPrice {
        let Some(outcome) = self.collect(item, year).await else {
            tracing::info!("{} {}: no prices found in any tier", item.key, year);
            return None;
        };

        let bounded = filter_bounds(&outcome.observations, &item.bounds);
        if bounded.is_empty() {
            tracing::info!(
                "{} {}: all {} observations outside [{:.2}, {:.2}]",
                item.key,
                year,
                outcome.observations.len(),
                item.bounds.min,
                item.bounds.max
            );
            return None;
        }

        let price = median(&bounded).map(|m| round_to(m, 2));
        tracing::debug!(
            "{} {}: median of {} bounded values = {:?}",
            item.key,
            year,
            bounded.len(),
            price
        );
        price
    }
}
