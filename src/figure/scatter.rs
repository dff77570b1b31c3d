//! Scatter plot with one least-squares trend line per color group

use polars::prelude::*;
use tracing::debug;

use super::{
    numeric_values, role_column, text_values, Channel, ChannelEncoding, DisplayConfig, Figure,
    FieldType, FigureKind, FigureTrait, Layer, Mark, OrderedGroups,
};
use crate::aggregate::stat::LinearFit;
use crate::Result;

#[derive(Debug, Clone, Copy)]
pub struct ScatterWithTrend;

impl FigureTrait for ScatterWithTrend {
    fn kind(&self) -> FigureKind {
        FigureKind::ScatterWithTrend
    }

    fn required_columns<'a>(&self, config: &'a DisplayConfig) -> Vec<(&'static str, Option<&'a str>)> {
        vec![
            ("x", config.x.as_deref()),
            ("y", config.y.as_deref()),
            ("color", config.color.as_deref()),
        ]
    }

    fn build(&self, data: &DataFrame, config: &DisplayConfig) -> Result<Figure> {
        let x = role_column(config.x.as_deref(), "x", self.kind())?;
        let y = role_column(config.y.as_deref(), "y", self.kind())?;
        let color = role_column(config.color.as_deref(), "color", self.kind())?;

        let mut columns: Vec<&str> = vec![x, y, color];
        for extra in &config.tooltip {
            if !columns.contains(&extra.as_str()) {
                columns.push(extra.as_str());
            }
        }

        let points = data
            .clone()
            .lazy()
            .select(columns.iter().map(|c| col(*c)).collect::<Vec<_>>())
            .filter(
                col(x)
                    .is_not_null()
                    .and(col(y).is_not_null())
                    .and(col(color).is_not_null()),
            )
            .collect()?;

        let trend = trend_lines(&points, x, y, color)?;

        let mut point_layer = Layer::new(Mark::Point, points)
            .encode(ChannelEncoding::new(Channel::X, x).with_type(FieldType::Quantitative))
            .encode(ChannelEncoding::new(Channel::Y, y).with_type(FieldType::Quantitative))
            .encode(ChannelEncoding::new(Channel::Color, color).with_type(FieldType::Nominal));
        for column in &columns {
            point_layer = point_layer.encode(ChannelEncoding::new(Channel::Tooltip, *column));
        }

        let line_layer = Layer::new(Mark::Line, trend)
            .encode(ChannelEncoding::new(Channel::X, x).with_type(FieldType::Quantitative))
            .encode(ChannelEncoding::new(Channel::Y, y).with_type(FieldType::Quantitative))
            .encode(ChannelEncoding::new(Channel::Color, color).with_type(FieldType::Nominal));

        Ok(Figure::new(self.kind(), vec![point_layer, line_layer], config))
    }
}

/// Fitted endpoints per color group, at the group's smallest and largest x
///
/// Groups with fewer than two distinct x values get no line.
fn trend_lines(points: &DataFrame, x: &str, y: &str, color: &str) -> Result<DataFrame> {
    let xs = numeric_values(points, x)?;
    let ys = numeric_values(points, y)?;
    let groups = text_values(points, color)?;

    let mut by_group = OrderedGroups::new();
    for ((gx, gy), group) in xs.into_iter().zip(ys).zip(groups) {
        if let (Some(gx), Some(gy), Some(group)) = (gx, gy, group) {
            by_group.push(group, (gx, gy));
        }
    }

    let mut line_color: Vec<String> = Vec::new();
    let mut line_x: Vec<f64> = Vec::new();
    let mut line_y: Vec<f64> = Vec::new();
    for (group, group_points) in by_group.into_groups() {
        let Some(fit) = LinearFit::ordinary_least_squares(&group_points) else {
            debug!("No trend line for '{}': degenerate group", group);
            continue;
        };
        debug!(
            "Trend for '{}': slope {:.4}, intercept {:.4}, r2 {:.3}, n {}",
            group, fit.slope, fit.intercept, fit.r_squared, fit.n
        );
        let (lo, hi) = group_points
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), (px, _)| {
                (lo.min(*px), hi.max(*px))
            });
        for end in [lo, hi] {
            line_color.push(group.clone());
            line_x.push(end);
            line_y.push(fit.predict(end));
        }
    }

    Ok(DataFrame::new(vec![
        Series::new(color.into(), line_color).into(),
        Series::new(x.into(), line_x).into(),
        Series::new(y.into(), line_y).into(),
    ])?)
}
