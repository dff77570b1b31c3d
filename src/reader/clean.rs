//! Turning the raw survey frame into the cleaned dataset
//!
//! All cells are handled as text first: null sentinels are matched exactly,
//! then the numeric columns are parsed. The result holds real nulls, so no
//! later stage has to recognise a sentinel string.

use std::collections::BTreeMap;

use polars::prelude::*;
use tracing::debug;

use crate::config::LoaderConfig;
use crate::dataset::Dataset;
use crate::{DashError, Result};

/// Select, null-normalize, rename and type the configured columns of `raw`
///
/// `raw` is left untouched; a new frame is built.
pub fn clean(raw: &DataFrame, config: &LoaderConfig) -> Result<Dataset> {
    let no_aliases = BTreeMap::new();
    let mut columns: Vec<Column> = Vec::with_capacity(config.columns.len());

    for raw_name in &config.columns {
        let column = raw.column(raw_name).map_err(|_| {
            DashError::SchemaError(format!(
                "Expected column '{}' is missing from the source",
                raw_name
            ))
        })?;
        let name = config.canonical_name(raw_name);

        let text = column
            .as_materialized_series()
            .cast(&DataType::String)
            .map_err(|e| {
                DashError::InternalError(format!("Failed to read column '{}' as text: {}", raw_name, e))
            })?;
        let cells: Vec<Option<&str>> = text
            .str()?
            .into_iter()
            .map(|cell| cell.filter(|c| !c.is_empty() && !config.is_null_value(c)))
            .collect();

        let missing = cells.iter().filter(|c| c.is_none()).count();
        debug!("Column '{}' -> '{}': {} missing", raw_name, name, missing);

        let series = if config.numeric_columns.iter().any(|c| c == name) {
            let aliases = config.numeric_aliases.get(name).unwrap_or(&no_aliases);
            Series::new(name.into(), coerce_numeric(name, &cells, aliases)?)
        } else {
            Series::new(name.into(), cells)
        };
        columns.push(series.into());
    }

    let frame = DataFrame::new(columns)
        .map_err(|e| DashError::SchemaError(format!("Failed to assemble dataset: {}", e)))?;
    Ok(Dataset::new(frame))
}

/// Parse cells as `f64`, substituting aliases such as `"89 or older"`
pub fn coerce_numeric(
    column: &str,
    cells: &[Option<&str>],
    aliases: &BTreeMap<String, f64>,
) -> Result<Vec<Option<f64>>> {
    cells
        .iter()
        .enumerate()
        .map(|(row, cell)| match cell {
            None => Ok(None),
            Some(text) => {
                if let Some(value) = aliases.get(*text) {
                    return Ok(Some(*value));
                }
                // NaN and infinities parse as f64 but are not survey values
                match text.trim().parse::<f64>() {
                    Ok(value) if value.is_finite() => Ok(Some(value)),
                    _ => Err(DashError::TypeError(format!(
                        "Column '{}' row {}: cannot convert '{}' to a number",
                        column, row, text
                    ))),
                }
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LoaderConfig;

    fn config_for(columns: &[&str], numeric: &[&str]) -> LoaderConfig {
        LoaderConfig {
            columns: columns.iter().map(|s| s.to_string()).collect(),
            numeric_columns: numeric.iter().map(|s| s.to_string()).collect(),
            ..LoaderConfig::default()
        }
    }

    fn age_aliases() -> BTreeMap<String, f64> {
        LoaderConfig::default().numeric_aliases["age"].clone()
    }

    #[test]
    fn test_every_sentinel_becomes_null() {
        let config = config_for(&["fefam"], &[]);
        let mut values: Vec<&str> = config.null_values.iter().map(String::as_str).collect();
        values.push("agree");
        values.push("NA");
        values.push("iap");

        let raw = df! { "fefam" => values.clone() }.unwrap();
        let dataset = clean(&raw, &config).unwrap();
        let column = dataset.frame().column("male_breadwinner").unwrap();
        let cleaned: Vec<Option<&str>> = column.str().unwrap().into_iter().collect();

        let sentinel_count = config.null_values.len();
        assert!(cleaned[..sentinel_count].iter().all(|c| c.is_none()));
        // Tokens outside the set are preserved verbatim
        assert_eq!(
            &cleaned[sentinel_count..],
            &[Some("agree"), Some("NA"), Some("iap")]
        );
    }

    #[test]
    fn test_rename_and_select() {
        let config = config_for(&["sex", "prestg10"], &["job_prestige"]);
        let raw = df! {
            "year" => &["2018", "2018"],
            "prestg10" => &["47", "IAP"],
            "sex" => &["male", "female"],
        }
        .unwrap();

        let dataset = clean(&raw, &config).unwrap();
        assert_eq!(dataset.column_names(), vec!["sex", "job_prestige"]);
        let prestige: Vec<Option<f64>> = dataset
            .frame()
            .column("job_prestige")
            .unwrap()
            .f64()
            .unwrap()
            .into_iter()
            .collect();
        assert_eq!(prestige, vec![Some(47.0), None]);
        // The raw frame is untouched
        assert_eq!(raw.width(), 3);
        assert!(raw.column("prestg10").is_ok());
    }

    #[test]
    fn test_missing_column_is_schema_error() {
        let config = config_for(&["sex", "coninc"], &[]);
        let raw = df! { "sex" => &["male"] }.unwrap();
        let err = clean(&raw, &config).unwrap_err();
        assert!(matches!(err, DashError::SchemaError(_)));
        assert!(err.to_string().contains("coninc"));
    }

    #[test]
    fn test_age_sentinel_and_coercion() {
        let cells = [Some("89 or older"), Some("34"), Some(" 61 "), None];
        let ages = coerce_numeric("age", &cells, &age_aliases()).unwrap();
        assert_eq!(ages, vec![Some(89.0), Some(34.0), Some(61.0), None]);
    }

    #[test]
    fn test_unparseable_age_is_type_error() {
        let cells = [Some("34"), Some("eighty")];
        let err = coerce_numeric("age", &cells, &age_aliases()).unwrap_err();
        assert!(matches!(err, DashError::TypeError(_)));
        assert!(err.to_string().contains("eighty"));
        assert!(err.to_string().contains("row 1"));
    }

    #[test]
    fn test_non_finite_number_is_type_error() {
        for text in ["NaN", "inf", "-infinity"] {
            let cells = [Some("40"), Some(text)];
            let err = coerce_numeric("age", &cells, &age_aliases()).unwrap_err();
            assert!(matches!(err, DashError::TypeError(_)), "{} accepted", text);
            assert!(err.to_string().contains(text));
        }
    }

    #[test]
    fn test_type_error_through_clean() {
        let config = config_for(&["age"], &["age"]);
        let raw = df! { "age" => &["89 or older", "DK", "unknown"] }.unwrap();
        let err = clean(&raw, &config).unwrap_err();
        assert!(matches!(err, DashError::TypeError(_)));
    }

    #[test]
    fn test_sentinel_applies_before_numeric_coercion() {
        let config = config_for(&["age"], &["age"]);
        let raw = df! { "age" => &["89 or older", "DK", ".a", "40"] }.unwrap();
        let dataset = clean(&raw, &config).unwrap();
        let ages: Vec<Option<f64>> = dataset
            .frame()
            .column("age")
            .unwrap()
            .f64()
            .unwrap()
            .into_iter()
            .collect();
        assert_eq!(ages, vec![Some(89.0), None, None, Some(40.0)]);
    }
}
