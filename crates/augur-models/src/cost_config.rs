//! Service price configuration.
//!
//! The config endpoint returns flat `{key, value}` rows. Price rows follow the
//! `<service>_cost_using_<tier>_credit` naming; every other row is kept as-is
//! and ignored by cost resolution.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One row of the config endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigRow {
    pub key: String,
    /// Numeric-string in practice; JSON numbers are tolerated.
    #[serde(default)]
    pub value: Value,
}

impl ConfigRow {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: Value::String(value.into()),
        }
    }

    fn value_as_string(&self) -> Option<String> {
        match &self.value {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }
}

/// Key/value snapshot of the service price configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ServiceCostConfig {
    entries: HashMap<String, String>,
}

impl ServiceCostConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from config rows; later duplicates win, non-scalar values are skipped.
    pub fn from_rows(rows: impl IntoIterator<Item = ConfigRow>) -> Self {
        let entries = rows
            .into_iter()
            .filter_map(|row| row.value_as_string().map(|value| (row.key, value)))
            .collect();
        Self { entries }
    }

    /// Builder-style insert.
    pub fn with_entry(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.entries.insert(key.into(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    /// Price stored under `key`; missing or unusable values are 0.
    ///
    /// Decimal values are truncated toward zero. Negative, non-finite and
    /// non-numeric values resolve to 0.
    pub fn price(&self, key: &str) -> u64 {
        self.get(key).map(parse_price).unwrap_or(0)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn parse_price(raw: &str) -> u64 {
    let raw = raw.trim();
    if let Ok(value) = raw.parse::<u64>() {
        return value;
    }
    match raw.parse::<f64>() {
        Ok(value) if value.is_finite() && value > 0.0 => value.trunc() as u64,
        _ => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_price_parsing() {
        let config = ServiceCostConfig::new()
            .with_entry("a", "5")
            .with_entry("b", " 12 ")
            .with_entry("c", "7.9")
            .with_entry("d", "-3")
            .with_entry("e", "free")
            .with_entry("f", "NaN");

        assert_eq!(config.price("a"), 5);
        assert_eq!(config.price("b"), 12);
        assert_eq!(config.price("c"), 7);
        assert_eq!(config.price("d"), 0);
        assert_eq!(config.price("e"), 0);
        assert_eq!(config.price("f"), 0);
        assert_eq!(config.price("missing"), 0);
    }

    #[test]
    fn test_from_rows_accepts_strings_and_numbers() {
        let rows: Vec<ConfigRow> = serde_json::from_str(
            r#"[
                {"key": "transit_report_cost_using_silver_credit", "value": "0"},
                {"key": "transit_report_cost_using_gold_credit", "value": 20},
                {"key": "maintenance_banner", "value": null}
            ]"#,
        )
        .unwrap();

        let config = ServiceCostConfig::from_rows(rows);
        assert_eq!(config.len(), 2);
        assert_eq!(config.get("transit_report_cost_using_silver_credit"), Some("0"));
        assert_eq!(config.price("transit_report_cost_using_gold_credit"), 20);
        assert!(config.get("maintenance_banner").is_none());
    }

    #[test]
    fn test_duplicate_rows_last_wins() {
        let config = ServiceCostConfig::from_rows(vec![
            ConfigRow::new("x_cost_using_silver_credit", "4"),
            ConfigRow::new("x_cost_using_silver_credit", "6"),
        ]);
        assert_eq!(config.price("x_cost_using_silver_credit"), 6);
    }
}
