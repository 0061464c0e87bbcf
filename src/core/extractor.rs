use regex::Regex;
use std::sync::LazyLock;

static PRICE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\$?\s*(\d{1,3}(?:,\d{3})*(?:\.\d{2})?)").expect("price pattern is valid")
});

/// Every currency-looking amount in `text`, in order of appearance.
///
/// Thousands separators are dropped before parsing; a match that still does
/// not parse is skipped rather than reported.
pub fn extract_prices(text: &str) -> Vec<f64> {
    if text.is_empty() {
        return Vec::new();
    }

    PRICE_PATTERN
        .captures_iter(text)
        .filter_map(|caps| caps[1].replace(',', "").parse::<f64>().ok())
        .collect()
}

/// Same as [`extract_prices`] for text that may be absent.
pub fn extract_prices_opt(text: Option<&str>) -> Vec<f64> {
    text.map(extract_prices).unwrap_or_default()
}
