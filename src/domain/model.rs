use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Plausible price range for one item, plus descriptive terms appended to
/// every query for it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoundsRule {
    pub min: f64,
    pub max: f64,
    #[serde(default)]
    pub terms: Vec<String>,
}

impl BoundsRule {
    pub fn contains(&self, value: f64) -> bool {
        self.min <= value && value <= self.max
    }

    pub fn terms_suffix(&self) -> String {
        self.terms.join(" ")
    }
}

impl Default for BoundsRule {
    fn default() -> Self {
        Self {
            min: 0.5,
            max: 100.0,
            terms: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Item {
    pub key: String,
    pub query: String,
    pub sites: Vec<String>,
    pub bounds: BoundsRule,
}

/// A year column: either fixed, or whatever year the run happens in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum YearLabel {
    Fixed(i32),
    Current,
}

impl YearLabel {
    pub fn resolve(self, current_year: i32) -> i32 {
        match self {
            YearLabel::Fixed(year) => year,
            YearLabel::Current => current_year,
        }
    }
}

impl fmt::Display for YearLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            YearLabel::Fixed(year) => write!(f, "{}", year),
            YearLabel::Current => f.write_str("current"),
        }
    }
}

impl FromStr for YearLabel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.eq_ignore_ascii_case("current") {
            return Ok(YearLabel::Current);
        }
        trimmed
            .parse::<i32>()
            .map(YearLabel::Fixed)
            .map_err(|_| format!("expected a year or \"current\", got \"{}\"", s))
    }
}

impl TryFrom<String> for YearLabel {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<YearLabel> for String {
    fn from(value: YearLabel) -> Self {
        value.to_string()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChangeYears {
    pub from: YearLabel,
    pub to: YearLabel,
}

/// One output table: which years to price and what to derive from them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportSpec {
    pub name: String,
    pub years: Vec<YearLabel>,
    #[serde(default)]
    pub change: Option<ChangeYears>,
    #[serde(default)]
    pub charts: Vec<ChartKind>,
}

/// `None` means no plausible observation survived for the pair.
pub type ResolvedPrice = Option<f64>;

/// Price change between a table's two reference columns.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct PriceChange {
    pub absolute: Option<f64>,
    pub percent: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultRow {
    pub item: String,
    /// One entry per table column, same order as `ResultTable::years`.
    pub prices: Vec<ResolvedPrice>,
    pub change: Option<PriceChange>,
}

/// Indices into `ResultTable::years` of the earlier and later reference year.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ChangeSpan {
    pub from: usize,
    pub to: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultTable {
    pub name: String,
    pub years: Vec<i32>,
    pub change: Option<ChangeSpan>,
    pub rows: Vec<ResultRow>,
}

impl ResultTable {
    /// Years of the change span, earlier first.
    pub fn change_years(&self) -> Option<(i32, i32)> {
        self.change
            .map(|span| (self.years[span.from], self.years[span.to]))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartKind {
    PercentChange,
    ReferencePaths,
    PricePaths,
}

impl ChartKind {
    pub fn file_suffix(self) -> &'static str {
        match self {
            ChartKind::PercentChange => "percent_change",
            ChartKind::ReferencePaths => "reference_paths",
            ChartKind::PricePaths => "price_paths",
        }
    }
}

#[derive(Debug, Clone)]
pub struct RenderedChart {
    pub kind: ChartKind,
    pub file_name: String,
    pub svg: String,
}

/// Everything the load step writes for one table.
#[derive(Debug, Clone)]
pub struct RenderedReport {
    pub table: ResultTable,
    pub csv_output: String,
    pub charts: Vec<RenderedChart>,
    pub summary: Vec<String>,
}

/// Price field of one shopping result as the search service returns it.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum ShoppingPrice {
    Number(f64),
    Text(String),
    Other(serde_json::Value),
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct ShoppingResult {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub price: Option<ShoppingPrice>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchMode {
    Structured,
    FreeText,
}

impl fmt::Display for SearchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SearchMode::Structured => f.write_str("shopping"),
            SearchMode::FreeText => f.write_str("web"),
        }
    }
}
