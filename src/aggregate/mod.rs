//! Grouped counts and means over the cleaned dataset
//!
//! Both operations are pure: they read the [`Dataset`] and return a new
//! polars `DataFrame`. Missing values are dropped listwise on exactly the
//! columns involved, so a respondent missing `income` still counts towards a
//! `satjob` x `sex` breakdown.

use polars::prelude::*;
use tracing::debug;

use crate::dataset::Dataset;
use crate::field::{AttitudeField, Field, GroupField};
use crate::{DashError, Result};

pub mod stat;

/// Name of the count column in [`count_by`] results
pub const COUNT_COLUMN: &str = "count";

/// Decimal places kept by [`mean_by`]
pub const MEAN_PRECISION: u32 = 2;

/// Count respondents per (`primary`, `group`) value pair, by raw field names
///
/// Both names must be in the allow-lists of [`AttitudeField`] and
/// [`GroupField`]; anything else is an `InvalidFieldError`.
pub fn aggregate(dataset: &Dataset, primary: &str, group: &str) -> Result<DataFrame> {
    let primary: AttitudeField = primary.parse()?;
    let group: GroupField = group.parse()?;
    count_by(dataset, primary, group)
}

/// Count respondents per (`primary`, `group`) value pair
///
/// Returns columns `<primary>`, `<group>`, `count`. Pairs appear in the order
/// they are first seen. Rows missing either value are skipped; if none are
/// left the result is empty.
pub fn count_by(dataset: &Dataset, primary: AttitudeField, group: GroupField) -> Result<DataFrame> {
    count_pairs(dataset, primary.field(), group.field())
}

pub(crate) fn count_pairs(dataset: &Dataset, primary: Field, group: Field) -> Result<DataFrame> {
    dataset.column(primary)?;
    dataset.column(group)?;

    let counts = dataset
        .frame()
        .clone()
        .lazy()
        .select([col(primary.name()), col(group.name())])
        .filter(col(primary.name()).is_not_null().and(col(group.name()).is_not_null()))
        .group_by_stable([col(primary.name()), col(group.name())])
        .agg([len().alias(COUNT_COLUMN)])
        .collect()?;

    debug!(
        "Counted {} x {}: {} groups",
        primary,
        group,
        counts.height()
    );
    Ok(counts)
}

/// Mean of each numeric field per value of `group`, rounded to 2 decimals
///
/// Returns the group column followed by one column per field. A null in one
/// field only removes that cell from that field's mean. Rows with a null
/// group value are dropped.
pub fn mean_by(dataset: &Dataset, fields: &[Field], group: Field) -> Result<DataFrame> {
    dataset.column(group)?;
    for field in fields {
        if !field.is_numeric() {
            return Err(DashError::InvalidFieldError(format!(
                "Cannot average non-numeric column '{}'",
                field
            )));
        }
        dataset.column(*field)?;
    }

    let means: Vec<Expr> = fields.iter().map(|f| col(f.name()).mean()).collect();
    let grouped = dataset
        .frame()
        .clone()
        .lazy()
        .filter(col(group.name()).is_not_null())
        .group_by_stable([col(group.name())])
        .agg(means)
        .collect()?;

    let mut columns: Vec<Column> = Vec::with_capacity(fields.len() + 1);
    columns.push(grouped.column(group.name())?.clone());
    for field in fields {
        let rounded: Vec<Option<f64>> = grouped
            .column(field.name())?
            .f64()?
            .into_iter()
            .map(|v| v.map(|v| round_to(v, MEAN_PRECISION)))
            .collect();
        columns.push(Series::new(field.name().into(), rounded).into());
    }

    Ok(DataFrame::new(columns)?)
}

/// Round to `decimals` places, ties to the even digit
pub fn round_to(value: f64, decimals: u32) -> f64 {
    let factor = 10f64.powi(decimals as i32);
    (value * factor).round_ties_even() / factor
}
