use crate::domain::model::{BoundsRule, ChangeYears, ChartKind, Item, ReportSpec, YearLabel};
use crate::utils::error::{EtlError, Result};
use crate::utils::validation::{
    validate_bounds, validate_non_empty_string, validate_path, validate_positive_number,
    validate_unique, validate_url, Validate,
};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::LazyLock;
use std::time::Duration;

pub const DEFAULT_ENDPOINT: &str = "https://serpapi.com/search.json";

/// Environment variables checked, in order, when no key is configured.
pub const API_KEY_VARS: [&str; 2] = ["SERPAPI_KEY", "API_KEY"];

static ENV_VAR_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$\{([^}]+)\}").expect("env var pattern is valid"));

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceConfig {
    #[serde(default)]
    pub search: SearchConfig,
    #[serde(default)]
    pub run: RunConfig,
    #[serde(default = "default_sites")]
    pub default_sites: Vec<String>,
    #[serde(default = "default_items")]
    pub items: Vec<ItemConfig>,
    #[serde(default = "default_reports")]
    pub reports: Vec<ReportSpec>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    pub api_key: Option<String>,
    #[serde(default = "default_results_per_query")]
    pub results_per_query: u32,
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunConfig {
    #[serde(default = "default_throttle_ms")]
    pub throttle_ms: u64,
    #[serde(default = "default_output_path")]
    pub output_path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemConfig {
    pub key: String,
    pub query: String,
    pub sites: Option<Vec<String>>,
    pub bounds: Option<BoundsRule>,
}

fn default_endpoint() -> String {
    DEFAULT_ENDPOINT.to_string()
}

fn default_results_per_query() -> u32 {
    10
}

fn default_timeout_seconds() -> u64 {
    30
}

fn default_throttle_ms() -> u64 {
    1000
}

fn default_output_path() -> String {
    "./output".to_string()
}

fn default_sites() -> Vec<String> {
    ["walmart.com", "target.com", "amazon.com", "instacart.com"]
        .into_iter()
        .map(String::from)
        .collect()
}

fn bounds(min: f64, max: f64, terms: &[&str]) -> Option<BoundsRule> {
    Some(BoundsRule {
        min,
        max,
        terms: terms.iter().map(|t| t.to_string()).collect(),
    })
}

fn default_items() -> Vec<ItemConfig> {
    vec![
        ItemConfig {
            key: "Sugar".to_string(),
            query: "price of Sugar, white, per lb".to_string(),
            sites: None,
            bounds: bounds(1.0, 10.0, &["Lb", "Pound"]),
        },
        ItemConfig {
            key: "Ground_Beef".to_string(),
            query: "price of ground beef per pound".to_string(),
            sites: None,
            bounds: bounds(5.0, 50.0, &["Lb", "Pound"]),
        },
        ItemConfig {
            key: "Eye_Drops".to_string(),
            query: "price of Pataday eye drops".to_string(),
            sites: None,
            bounds: bounds(3.0, 50.0, &[]),
        },
    ]
}

fn default_reports() -> Vec<ReportSpec> {
    vec![
        ReportSpec {
            name: "price_changes_2024_to_current".to_string(),
            years: vec![
                YearLabel::Fixed(2016),
                YearLabel::Fixed(2024),
                YearLabel::Current,
            ],
            change: Some(ChangeYears {
                from: YearLabel::Fixed(2024),
                to: YearLabel::Current,
            }),
            charts: vec![ChartKind::PercentChange, ChartKind::ReferencePaths],
        },
        ReportSpec {
            name: "price_paths_since_2016".to_string(),
            years: vec![
                YearLabel::Fixed(2016),
                YearLabel::Fixed(2020),
                YearLabel::Fixed(2024),
                YearLabel::Current,
            ],
            change: None,
            charts: vec![ChartKind::PricePaths],
        },
    ]
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            api_key: None,
            results_per_query: default_results_per_query(),
            timeout_seconds: default_timeout_seconds(),
        }
    }
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            throttle_ms: default_throttle_ms(),
            output_path: default_output_path(),
        }
    }
}

impl Default for PriceConfig {
    fn default() -> Self {
        Self {
            search: SearchConfig::default(),
            run: RunConfig::default(),
            default_sites: default_sites(),
            items: default_items(),
            reports: default_reports(),
        }
    }
}

impl PriceConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(EtlError::IoError)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content);

        toml::from_str(&processed_content).map_err(|e| EtlError::ConfigError {
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// Replaces `${VAR}` with the variable's value; unknown variables are
    /// left in place.
    fn substitute_env_vars(content: &str) -> String {
        ENV_VAR_PATTERN
            .replace_all(content, |caps: &regex::Captures| {
                let var_name = &caps[1];
                std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
            })
            .into_owned()
    }

    /// Items with site lists and bounds filled in from the defaults.
    pub fn items(&self) -> Vec<Item> {
        self.items
            .iter()
            .map(|item| Item {
                key: item.key.clone(),
                query: item.query.clone(),
                sites: item
                    .sites
                    .clone()
                    .unwrap_or_else(|| self.default_sites.clone()),
                bounds: item.bounds.clone().unwrap_or_default(),
            })
            .collect()
    }

    pub fn throttle(&self) -> Duration {
        Duration::from_millis(self.run.throttle_ms)
    }

    pub fn output_path(&self) -> &str {
        &self.run.output_path
    }

    /// Reports named in `names`, in config order; all reports when empty.
    pub fn selected_reports(&self, names: &[String]) -> Result<Vec<ReportSpec>> {
        if let Some(unknown) = names
            .iter()
            .find(|name| !self.reports.iter().any(|r| &r.name == *name))
        {
            return Err(EtlError::InvalidConfigValueError {
                field: "report".to_string(),
                value: unknown.clone(),
                reason: format!(
                    "Unknown report. Configured reports: {}",
                    self.reports
                        .iter()
                        .map(|r| r.name.as_str())
                        .collect::<Vec<_>>()
                        .join(", ")
                ),
            });
        }

        Ok(self
            .reports
            .iter()
            .filter(|r| names.is_empty() || names.contains(&r.name))
            .cloned()
            .collect())
    }

    pub fn resolve_api_key(&self) -> Result<String> {
        self.resolve_api_key_with(|name| std::env::var(name).ok())
    }

    /// The configured key if it is set and fully substituted, otherwise the
    /// first non-empty variable from [`API_KEY_VARS`].
    pub fn resolve_api_key_with<F>(&self, lookup: F) -> Result<String>
    where
        F: Fn(&str) -> Option<String>,
    {
        let configured = self
            .search
            .api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty() && !ENV_VAR_PATTERN.is_match(key));
        if let Some(key) = configured {
            return Ok(key.to_string());
        }

        API_KEY_VARS
            .iter()
            .filter_map(|name| lookup(*name))
            .map(|key| key.trim().to_string())
            .find(|key| !key.is_empty())
            .ok_or_else(|| EtlError::MissingConfigError {
                field: API_KEY_VARS.join(" (or ") + ")",
            })
    }

    pub fn validate_config(&self) -> Result<()> {
        validate_url("search.endpoint", &self.search.endpoint)?;
        validate_positive_number("search.results_per_query", self.search.results_per_query, 1)?;
        validate_path("run.output_path", &self.run.output_path)?;

        if self.items.is_empty() {
            return Err(EtlError::MissingConfigError {
                field: "items".to_string(),
            });
        }
        for item in &self.items {
            validate_non_empty_string("items.key", &item.key)?;
            validate_non_empty_string(&format!("items.{}.query", item.key), &item.query)?;
            if let Some(rule) = &item.bounds {
                validate_bounds(&format!("items.{}.bounds", item.key), rule.min, rule.max)?;
            }
            for site in item.sites.as_deref().unwrap_or(&self.default_sites) {
                validate_non_empty_string(&format!("items.{}.sites", item.key), site)?;
            }
        }
        validate_unique("items.key", self.items.iter().map(|i| i.key.as_str()))?;

        for report in &self.reports {
            validate_non_empty_string("reports.name", &report.name)?;
            if report.years.is_empty() {
                return Err(EtlError::MissingConfigError {
                    field: format!("reports.{}.years", report.name),
                });
            }
            if let Some(change) = report.change {
                for (field, label) in [("from", change.from), ("to", change.to)] {
                    if !report.years.contains(&label) {
                        return Err(EtlError::InvalidConfigValueError {
                            field: format!("reports.{}.change.{}", report.name, field),
                            value: label.to_string(),
                            reason: "change year must be one of the report's years".to_string(),
                        });
                    }
                }
            }
            let needs_change = report
                .charts
                .iter()
                .any(|c| matches!(c, ChartKind::PercentChange | ChartKind::ReferencePaths));
            if needs_change && report.change.is_none() {
                return Err(EtlError::InvalidConfigValueError {
                    field: format!("reports.{}.charts", report.name),
                    value: format!("{:?}", report.charts),
                    reason: "percent_change and reference_paths need a change span".to_string(),
                });
            }
        }
        validate_unique("reports.name", self.reports.iter().map(|r| r.name.as_str()))?;

        Ok(())
    }
}

impl Validate for PriceConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}
