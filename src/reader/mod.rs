//! Dataset loading for gssdash
//!
//! The reader fetches the raw survey file once at startup and produces the
//! immutable [`Dataset`] every other component reads from.
//!
//! # Pipeline
//!
//! ```text
//! Source::fetch ─► decode (cp1252/utf8) ─► parse_csv (all text) ─► clean
//! ```
//!
//! - unreachable or malformed sources fail with `DashError::LoadError`
//! - a missing allow-listed column fails with `DashError::SchemaError`
//! - a non-numeric value in a numeric column fails with `DashError::TypeError`
//!
//! # Example
//!
//! ```rust,ignore
//! use gssdash::{reader, LoaderConfig};
//!
//! let dataset = reader::load(&LoaderConfig::default().with_source("data/gss2018.csv"))?;
//! println!("{} respondents", dataset.height());
//! ```

use std::io::Cursor;

use polars::prelude::*;
use tracing::info;

use crate::config::LoaderConfig;
use crate::dataset::Dataset;
use crate::{DashError, Result};

mod clean;
pub mod data;
mod source;

pub use clean::{clean, coerce_numeric};
pub use data::{load_sample, GSS_SAMPLE};
pub use source::{decode, Source};

/// Fetch, decode, parse and clean the configured source
pub fn load(config: &LoaderConfig) -> Result<Dataset> {
    let source = Source::parse(&config.source);
    let bytes = source.fetch()?;
    info!("Fetched {} bytes from {}", bytes.len(), source);

    let text = decode(bytes, config.encoding)?;
    let raw = parse_csv(text.into_bytes())?;
    info!(
        "Parsed {} rows x {} columns",
        raw.height(),
        raw.width()
    );

    let dataset = clean(&raw, config)?;
    info!(
        "Cleaned dataset: {} respondents, columns {:?}",
        dataset.height(),
        dataset.column_names()
    );
    Ok(dataset)
}

/// Parse UTF-8 CSV bytes with a header row, reading every column as text
pub fn parse_csv(bytes: Vec<u8>) -> Result<DataFrame> {
    CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(0))
        .into_reader_with_file_handle(Cursor::new(bytes))
        .finish()
        .map_err(|e| DashError::LoadError(format!("Failed to parse CSV: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Encoding;
    use crate::field::Field;

    fn sample() -> Dataset {
        load_sample(&LoaderConfig::default()).unwrap()
    }

    fn f64_at(dataset: &Dataset, field: Field, row: usize) -> Option<f64> {
        dataset.column(field).unwrap().f64().unwrap().get(row)
    }

    #[test]
    fn test_sample_shape() {
        let dataset = sample();
        assert_eq!(dataset.height(), 48);
        let expected: Vec<String> = Field::ALL.iter().map(|f| f.name().to_string()).collect();
        assert_eq!(dataset.column_names(), expected);
    }

    #[test]
    fn test_sample_types() {
        let dataset = sample();
        for field in Field::ALL {
            let dtype = dataset.column(field).unwrap().dtype().clone();
            if field.is_numeric() {
                assert_eq!(dtype, DataType::Float64, "{}", field);
            } else {
                assert_eq!(dtype, DataType::String, "{}", field);
            }
        }
    }

    #[test]
    fn test_sample_values() {
        let dataset = sample();
        // Respondent 5 is "89 or older"
        assert_eq!(f64_at(&dataset, Field::Age, 4), Some(89.0));
        // Respondent 11 has coninc = IAP
        assert_eq!(f64_at(&dataset, Field::Income, 10), None);
        // Respondent 17 has educ = DK
        assert_eq!(f64_at(&dataset, Field::Education, 16), None);
        assert_eq!(f64_at(&dataset, Field::Id, 47), Some(48.0));

        let relationship = dataset.column(Field::Relationship).unwrap().str().unwrap();
        // Respondent 9 has the spaced "IAP, DK, NA, uncodeable" token
        assert_eq!(relationship.get(8), None);
    }

    #[test]
    fn test_parse_csv_quoted_sentinel() {
        let raw = parse_csv(b"a,b\n\"IAP,DK,NA,uncodeable\",1\n".to_vec()).unwrap();
        assert_eq!(raw.shape(), (1, 2));
        let cell = raw.column("a").unwrap().str().unwrap().get(0);
        assert_eq!(cell, Some("IAP,DK,NA,uncodeable"));
        // Every column is read as text
        assert_eq!(raw.column("b").unwrap().dtype(), &DataType::String);
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gss.csv");
        std::fs::write(&path, GSS_SAMPLE).unwrap();

        let config = LoaderConfig::default()
            .with_source(path.to_string_lossy())
            .with_encoding(Encoding::Utf8);
        let dataset = load(&config).unwrap();
        assert_eq!(dataset.height(), 48);
    }

    #[test]
    fn test_load_missing_source() {
        let config = LoaderConfig::default().with_source("/no/such/gss.csv");
        assert!(matches!(load(&config), Err(DashError::LoadError(_))));
    }

    #[test]
    fn test_load_schema_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("partial.csv");
        std::fs::write(&path, "id,sex\n1,male\n").unwrap();

        let config = LoaderConfig::default().with_source(path.to_string_lossy());
        assert!(matches!(load(&config), Err(DashError::SchemaError(_))));
    }
}
