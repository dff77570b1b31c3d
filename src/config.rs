//! Loader configuration
//!
//! Describes where the survey comes from and how it is cleaned. Every field has
//! a default matching the GSS 2018 extract, so a JSON config file only needs to
//! name what it overrides:
//!
//! ```json
//! { "source": "data/gss2018.csv", "encoding": "utf8" }
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::field::Field;
use crate::{DashError, Result};

/// Default remote location of the GSS 2018 extract
pub const DEFAULT_SOURCE: &str =
    "https://github.com/jkropko/DS-6001/raw/master/localdata/gss2018.csv";

/// Character encoding of the raw file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Encoding {
    Utf8,
    /// Windows code page 1252, which the GSS extract is written in
    #[default]
    Windows1252,
}

/// Configuration for [`crate::reader::load`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoaderConfig {
    /// URL (`http://`, `https://`) or local file path
    #[serde(default = "default_source")]
    pub source: String,

    #[serde(default)]
    pub encoding: Encoding,

    /// Raw columns to keep, in output order
    #[serde(default = "default_columns")]
    pub columns: Vec<String>,

    /// Raw column name -> canonical column name
    #[serde(default = "default_rename")]
    pub rename: BTreeMap<String, String>,

    /// Cell values that mean "missing"
    #[serde(default = "default_null_values")]
    pub null_values: Vec<String>,

    /// Canonical columns coerced to `f64`
    #[serde(default = "default_numeric_columns")]
    pub numeric_columns: Vec<String>,

    /// Non-numeric tokens with a numeric meaning, per canonical column
    #[serde(default = "default_numeric_aliases")]
    pub numeric_aliases: BTreeMap<String, BTreeMap<String, f64>>,
}

fn default_source() -> String {
    DEFAULT_SOURCE.to_string()
}

fn default_columns() -> Vec<String> {
    Field::ALL.iter().map(|f| f.raw_name().to_string()).collect()
}

fn default_rename() -> BTreeMap<String, String> {
    Field::ALL
        .iter()
        .filter(|f| f.raw_name() != f.name())
        .map(|f| (f.raw_name().to_string(), f.name().to_string()))
        .collect()
}

fn default_null_values() -> Vec<String> {
    [
        "IAP",
        "IAP,DK,NA,uncodeable",
        "NOT SURE",
        "DK",
        "IAP, DK, NA, uncodeable",
        ".a",
        "CAN'T CHOOSE",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_numeric_columns() -> Vec<String> {
    Field::ALL
        .iter()
        .filter(|f| f.is_numeric())
        .map(|f| f.name().to_string())
        .collect()
}

fn default_numeric_aliases() -> BTreeMap<String, BTreeMap<String, f64>> {
    let mut age = BTreeMap::new();
    age.insert("89 or older".to_string(), 89.0);

    let mut aliases = BTreeMap::new();
    aliases.insert(Field::Age.name().to_string(), age);
    aliases
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            source: default_source(),
            encoding: Encoding::default(),
            columns: default_columns(),
            rename: default_rename(),
            null_values: default_null_values(),
            numeric_columns: default_numeric_columns(),
            numeric_aliases: default_numeric_aliases(),
        }
    }
}

impl LoaderConfig {
    /// Read a JSON config file; omitted keys take their defaults
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            DashError::LoadError(format!(
                "Failed to read config file {}: {}",
                path.display(),
                e
            ))
        })?;
        serde_json::from_str(&text).map_err(|e| {
            DashError::LoadError(format!(
                "Failed to parse config file {}: {}",
                path.display(),
                e
            ))
        })
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = source.into();
        self
    }

    pub fn with_encoding(mut self, encoding: Encoding) -> Self {
        self.encoding = encoding;
        self
    }

    /// Canonical name for a raw column
    pub fn canonical_name<'a>(&'a self, raw: &'a str) -> &'a str {
        self.rename.get(raw).map(String::as_str).unwrap_or(raw)
    }

    pub fn is_null_value(&self, cell: &str) -> bool {
        self.null_values.iter().any(|v| v == cell)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_rename_covers_survey_codes() {
        let config = LoaderConfig::default();
        assert_eq!(config.canonical_name("wtss"), "weight");
        assert_eq!(config.canonical_name("prestg10"), "job_prestige");
        assert_eq!(config.canonical_name("fefam"), "male_breadwinner");
        assert_eq!(config.canonical_name("meovrwrk"), "men_overwork");
        // Unmapped names pass through
        assert_eq!(config.canonical_name("sex"), "sex");
        // Vestigial entries are not carried
        assert!(!config.rename.contains_key("fehire"));
        assert!(!config.rename.contains_key("fejobaff"));
    }

    #[test]
    fn test_default_columns_in_survey_order() {
        let config = LoaderConfig::default();
        assert_eq!(config.columns.len(), 17);
        assert_eq!(config.columns[0], "id");
        assert_eq!(config.columns[1], "wtss");
        assert_eq!(config.columns[16], "meovrwrk");
    }

    #[test]
    fn test_null_values() {
        let config = LoaderConfig::default();
        assert!(config.is_null_value("IAP"));
        assert!(config.is_null_value("IAP, DK, NA, uncodeable"));
        assert!(config.is_null_value("CAN'T CHOOSE"));
        assert!(!config.is_null_value("iap"));
        assert!(!config.is_null_value("NA"));
    }

    #[test]
    fn test_partial_json_config_keeps_defaults() {
        let config: LoaderConfig =
            serde_json::from_str(r#"{"source": "local.csv", "encoding": "utf8"}"#).unwrap();
        assert_eq!(config.source, "local.csv");
        assert_eq!(config.encoding, Encoding::Utf8);
        assert_eq!(config.null_values.len(), 7);
        assert_eq!(config.numeric_aliases["age"]["89 or older"], 89.0);
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gssdash.json");
        std::fs::write(&path, r#"{"null_values": ["DK"]}"#).unwrap();

        let config = LoaderConfig::from_file(&path).unwrap();
        assert_eq!(config.null_values, vec!["DK".to_string()]);
        assert_eq!(config.source, DEFAULT_SOURCE);

        let missing = LoaderConfig::from_file(&dir.path().join("missing.json"));
        assert!(matches!(missing, Err(DashError::LoadError(_))));
    }
}
