//! The cleaned, read-only survey table

use polars::prelude::*;

use crate::field::Field;
use crate::{DashError, Result};

/// Cleaned GSS respondents
///
/// Built once by [`crate::reader::load`] (or [`Dataset::new`] in tests) and
/// shared by reference afterwards. There is no mutable access to the frame.
#[derive(Debug, Clone)]
pub struct Dataset {
    frame: DataFrame,
}

impl Dataset {
    pub fn new(frame: DataFrame) -> Self {
        Self { frame }
    }

    pub fn frame(&self) -> &DataFrame {
        &self.frame
    }

    /// Number of respondents
    pub fn height(&self) -> usize {
        self.frame.height()
    }

    pub fn column_names(&self) -> Vec<String> {
        self.frame
            .get_column_names()
            .iter()
            .map(|s| s.to_string())
            .collect()
    }

    pub fn has_field(&self, field: Field) -> bool {
        self.frame.column(field.name()).is_ok()
    }

    /// Column for a field, or `InvalidFieldError` if the load config dropped it
    pub fn column(&self, field: Field) -> Result<&Column> {
        self.frame.column(field.name()).map_err(|_| {
            DashError::InvalidFieldError(format!(
                "Column '{}' does not exist in the dataset",
                field
            ))
        })
    }

    /// Number of rows where every given field is non-null
    pub fn complete_rows(&self, fields: &[Field]) -> Result<usize> {
        let mut mask: Option<BooleanChunked> = None;
        for field in fields {
            let not_null = self.column(*field)?.is_not_null();
            mask = Some(match mask {
                Some(m) => &m & &not_null,
                None => not_null,
            });
        }
        Ok(match mask {
            Some(m) => m.into_iter().filter(|v| *v == Some(true)).count(),
            None => self.height(),
        })
    }
}
