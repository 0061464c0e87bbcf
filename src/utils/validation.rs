use crate::utils::error::{EtlError, Result};
use std::collections::HashSet;
use url::Url;

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

fn invalid(field_name: &str, value: impl ToString, reason: impl Into<String>) -> EtlError {
    EtlError::InvalidConfigValueError {
        field: field_name.to_string(),
        value: value.to_string(),
        reason: reason.into(),
    }
}

pub fn validate_url(field_name: &str, url_str: &str) -> Result<()> {
    if url_str.is_empty() {
        return Err(invalid(field_name, url_str, "URL cannot be empty"));
    }

    match Url::parse(url_str) {
        Ok(url) => match url.scheme() {
            "http" | "https" => Ok(()),
            scheme => Err(invalid(
                field_name,
                url_str,
                format!("Unsupported URL scheme: {}", scheme),
            )),
        },
        Err(e) => Err(invalid(
            field_name,
            url_str,
            format!("Invalid URL format: {}", e),
        )),
    }
}

pub fn validate_path(field_name: &str, path: &str) -> Result<()> {
    if path.is_empty() {
        return Err(invalid(field_name, path, "Path cannot be empty"));
    }

    if path.contains('\0') {
        return Err(invalid(field_name, path, "Path contains null bytes"));
    }

    Ok(())
}

pub fn validate_positive_number(field_name: &str, value: u32, min_value: u32) -> Result<()> {
    if value < min_value {
        return Err(invalid(
            field_name,
            value,
            format!("Value must be at least {}", min_value),
        ));
    }
    Ok(())
}

pub fn validate_non_empty_string(field_name: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(invalid(
            field_name,
            value,
            "Value cannot be empty or whitespace-only",
        ));
    }
    Ok(())
}

/// Price bounds must be finite, non-negative and ordered.
pub fn validate_bounds(field_name: &str, min: f64, max: f64) -> Result<()> {
    let shown = format!("[{}, {}]", min, max);
    if !min.is_finite() || !max.is_finite() {
        return Err(invalid(field_name, shown, "Bounds must be finite numbers"));
    }
    if min < 0.0 {
        return Err(invalid(field_name, shown, "Minimum price cannot be negative"));
    }
    if min > max {
        return Err(invalid(
            field_name,
            shown,
            "Minimum price must not exceed maximum price",
        ));
    }
    Ok(())
}

pub fn validate_unique<'a, I>(field_name: &str, values: I) -> Result<()>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut seen = HashSet::new();
    for value in values {
        if !seen.insert(value) {
            return Err(invalid(field_name, value, "Duplicate entry"));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_url() {
        assert!(validate_url("search.endpoint", "https://serpapi.com/search.json").is_ok());
        assert!(validate_url("search.endpoint", "http://127.0.0.1:8080/search").is_ok());
        assert!(validate_url("search.endpoint", "").is_err());
        assert!(validate_url("search.endpoint", "invalid-url").is_err());
        assert!(validate_url("search.endpoint", "ftp://example.com").is_err());
    }

    #[test]
    fn test_validate_positive_number() {
        assert!(validate_positive_number("search.results_per_query", 10, 1).is_ok());
        assert!(validate_positive_number("search.results_per_query", 0, 1).is_err());
    }

    #[test]
    fn test_validate_bounds() {
        assert!(validate_bounds("items.bounds", 1.0, 10.0).is_ok());
        assert!(validate_bounds("items.bounds", 3.0, 3.0).is_ok());
        assert!(validate_bounds("items.bounds", 10.0, 1.0).is_err());
        assert!(validate_bounds("items.bounds", -1.0, 1.0).is_err());
        assert!(validate_bounds("items.bounds", 0.0, f64::NAN).is_err());
    }

    #[test]
    fn test_validate_unique() {
        assert!(validate_unique("items.key", ["Sugar", "Eye_Drops"]).is_ok());
        let err = validate_unique("items.key", ["Sugar", "Sugar"]).unwrap_err();
        assert!(err.to_string().contains("Duplicate"));
    }
}
