//! Box plots, optionally faceted on buckets of a continuous column
//!
//! The stat step reduces each (facet, x, color) group to a
//! [`FiveNumberSummary`]. The figure is then drawn from five layers: two
//! whisker rules, the q1..q3 box, a median tick and the outlier points.

use polars::prelude::*;
use tracing::debug;

use super::{
    numeric_values, role_column, text_values, Channel, ChannelEncoding, DisplayConfig, Facet,
    Figure, FieldType, FigureKind, FigureTrait, Layer, Mark, OrderedGroups,
};
use crate::aggregate::stat::{EqualWidthBins, FiveNumberSummary};
use crate::{DashError, Result};

pub const LOWER: &str = "lower";
pub const Q1: &str = "q1";
pub const MEDIAN: &str = "median";
pub const Q3: &str = "q3";
pub const UPPER: &str = "upper";

/// Distribution of `y` per category of `x`
#[derive(Debug, Clone, Copy)]
pub struct BoxPlot;

/// [`BoxPlot`] repeated per equal-width bucket of a continuous column
#[derive(Debug, Clone, Copy)]
pub struct FacetedBox;

impl FigureTrait for BoxPlot {
    fn kind(&self) -> FigureKind {
        FigureKind::Box
    }

    fn required_columns<'a>(&self, config: &'a DisplayConfig) -> Vec<(&'static str, Option<&'a str>)> {
        let mut required = vec![("x", config.x.as_deref()), ("y", config.y.as_deref())];
        if let Some(color) = config.color.as_deref() {
            required.push(("color", Some(color)));
        }
        required
    }

    fn build(&self, data: &DataFrame, config: &DisplayConfig) -> Result<Figure> {
        let layers = box_layers(data, config, None, self.kind())?;
        Ok(Figure::new(self.kind(), layers, config))
    }
}

impl FigureTrait for FacetedBox {
    fn kind(&self) -> FigureKind {
        FigureKind::FacetedBox
    }

    fn required_columns<'a>(&self, config: &'a DisplayConfig) -> Vec<(&'static str, Option<&'a str>)> {
        let mut required = BoxPlot.required_columns(config);
        required.push(("facet", config.facet.as_ref().map(|f| f.field.as_str())));
        required
    }

    fn build(&self, data: &DataFrame, config: &DisplayConfig) -> Result<Figure> {
        let facet = config.facet.as_ref().ok_or_else(|| {
            DashError::RenderError(format!("A {} figure requires a facet", self.kind()))
        })?;
        if facet.bins == 0 || facet.columns == 0 {
            return Err(DashError::RenderError(format!(
                "Facet on '{}' needs at least one bin and one column",
                facet.field
            )));
        }

        // Buckets span the whole column, before any row is dropped
        let values = numeric_values(data, &facet.field)?;
        let finite: Vec<f64> = values.iter().flatten().copied().collect();
        let bins = EqualWidthBins::new(&finite, facet.bins);
        let buckets: Vec<Option<String>> = match &bins {
            Some(bins) => values
                .iter()
                .map(|v| v.and_then(|v| bins.label_of(v)))
                .collect(),
            None => vec![None; values.len()],
        };

        let bucket_column = facet.bucket_column();
        let layers = box_layers(
            data,
            config,
            Some((bucket_column.as_str(), buckets.as_slice())),
            self.kind(),
        )?;

        // Panel order follows the buckets, skipping empty ones
        let present = text_values(&layers[0].data, &bucket_column)?;
        let order = bins
            .map(|bins| bins.labels())
            .unwrap_or_default()
            .into_iter()
            .filter(|label| present.iter().flatten().any(|p| p == label))
            .collect();

        Ok(Figure::new(self.kind(), layers, config).with_facet(Facet {
            field: bucket_column,
            columns: facet.columns,
            order,
        }))
    }
}

type GroupKey = (Option<String>, String, Option<String>);

fn box_layers(
    data: &DataFrame,
    config: &DisplayConfig,
    facet: Option<(&str, &[Option<String>])>,
    kind: FigureKind,
) -> Result<Vec<Layer>> {
    let x = role_column(config.x.as_deref(), "x", kind)?;
    let y = role_column(config.y.as_deref(), "y", kind)?;
    // A separate color column only when it differs from x
    let color = config.color.as_deref().filter(|c| *c != x);

    let categories = text_values(data, x)?;
    let values = numeric_values(data, y)?;
    let colors = match color {
        Some(color) => Some(text_values(data, color)?),
        None => None,
    };

    let mut groups: OrderedGroups<GroupKey, f64> = OrderedGroups::new();
    for row in 0..data.height() {
        let bucket = match facet {
            Some((_, buckets)) => match &buckets[row] {
                Some(bucket) => Some(bucket.clone()),
                None => continue,
            },
            None => None,
        };
        let group_color = match &colors {
            Some(colors) => match &colors[row] {
                Some(c) => Some(c.clone()),
                None => continue,
            },
            None => None,
        };
        if let (Some(category), Some(value)) = (&categories[row], values[row]) {
            groups.push((bucket, category.clone(), group_color), value);
        }
    }

    let mut summary = SummaryColumns::default();
    let mut outliers = SummaryColumns::default();
    for ((bucket, category, group_color), group_values) in groups.into_groups() {
        let Some(stats) = FiveNumberSummary::from_values(&group_values, config.whisker_coef)
        else {
            continue;
        };
        debug!(
            "Box for {} = '{}': median {}, {} outliers",
            x,
            category,
            stats.median,
            stats.outliers.len()
        );
        for outlier in &stats.outliers {
            outliers.push_key(&bucket, &category, &group_color);
            outliers.values[0].push(*outlier);
        }
        summary.push_key(&bucket, &category, &group_color);
        for (slot, value) in [stats.lower, stats.q1, stats.median, stats.q3, stats.upper]
            .into_iter()
            .enumerate()
        {
            summary.values[slot].push(value);
        }
    }

    let facet_column = facet.map(|(name, _)| name);
    let summary = summary.into_frame(x, color, facet_column, &[LOWER, Q1, MEDIAN, Q3, UPPER])?;
    let outliers = outliers.into_frame(x, color, facet_column, &[y])?;

    let y_title = config.label_for(y);
    let color_field = color.unwrap_or(x);
    let x_enc = || ChannelEncoding::new(Channel::X, x).with_type(FieldType::Nominal);
    let color_enc = || ChannelEncoding::new(Channel::Color, color_field).with_type(FieldType::Nominal);
    let y_enc = |field: &str| {
        ChannelEncoding::new(Channel::Y, field)
            .with_type(FieldType::Quantitative)
            .with_title(y_title.clone())
    };

    let lower_whisker = Layer::new(Mark::Rule, summary.clone())
        .encode(x_enc())
        .encode(y_enc(LOWER))
        .encode(ChannelEncoding::new(Channel::Y2, Q1))
        .encode(color_enc());
    let upper_whisker = Layer::new(Mark::Rule, summary.clone())
        .encode(x_enc())
        .encode(y_enc(Q3))
        .encode(ChannelEncoding::new(Channel::Y2, UPPER))
        .encode(color_enc());
    let mut body = Layer::new(Mark::Bar, summary.clone())
        .encode(x_enc())
        .encode(y_enc(Q1))
        .encode(ChannelEncoding::new(Channel::Y2, Q3))
        .encode(color_enc());
    for field in [UPPER, Q3, MEDIAN, Q1, LOWER] {
        body = body.encode(ChannelEncoding::new(Channel::Tooltip, field));
    }
    let median = Layer::new(Mark::Tick, summary)
        .encode(x_enc())
        .encode(y_enc(MEDIAN));
    let outlier_points = Layer::new(Mark::Point, outliers)
        .encode(x_enc())
        .encode(y_enc(y))
        .encode(color_enc());

    Ok(vec![lower_whisker, upper_whisker, body, median, outlier_points])
}

/// Column buffers for the summary and outlier tables
#[derive(Default)]
struct SummaryColumns {
    buckets: Vec<String>,
    categories: Vec<String>,
    colors: Vec<String>,
    values: [Vec<f64>; 5],
}

impl SummaryColumns {
    fn push_key(&mut self, bucket: &Option<String>, category: &str, color: &Option<String>) {
        if let Some(bucket) = bucket {
            self.buckets.push(bucket.clone());
        }
        self.categories.push(category.to_string());
        if let Some(color) = color {
            self.colors.push(color.clone());
        }
    }

    fn into_frame(
        self,
        x: &str,
        color: Option<&str>,
        facet: Option<&str>,
        value_names: &[&str],
    ) -> Result<DataFrame> {
        let mut columns: Vec<Column> = vec![Series::new(x.into(), self.categories).into()];
        if let Some(color) = color {
            columns.push(Series::new(color.into(), self.colors).into());
        }
        if let Some(facet) = facet {
            columns.push(Series::new(facet.into(), self.buckets).into());
        }
        for (name, values) in value_names.iter().zip(self.values) {
            columns.push(Series::new((*name).into(), values).into());
        }
        Ok(DataFrame::new(columns)?)
    }
}
