//! Grouped or stacked bars of pre-computed counts

use polars::prelude::*;

use super::{
    role_column, BarMode, Channel, ChannelEncoding, DisplayConfig, Figure, FieldType, FigureKind,
    FigureTrait, Layer, Mark,
};
use crate::Result;

/// Bars at `x` with height `y`, one color per `color` value
#[derive(Debug, Clone, Copy)]
pub struct GroupedBar;

impl FigureTrait for GroupedBar {
    fn kind(&self) -> FigureKind {
        FigureKind::GroupedBar
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

        let bars = data.select([x, y, color])?;

        // Categories even when the column holds numbers (education years)
        let mut layer = Layer::new(Mark::Bar, bars)
            .encode(ChannelEncoding::new(Channel::X, x).with_type(FieldType::Nominal))
            .encode(ChannelEncoding::new(Channel::Y, y).with_type(FieldType::Quantitative))
            .encode(ChannelEncoding::new(Channel::Color, color).with_type(FieldType::Nominal));
        if config.bar_mode == BarMode::Group {
            layer = layer
                .encode(ChannelEncoding::new(Channel::XOffset, color).with_type(FieldType::Nominal));
        }

        Ok(Figure::new(self.kind(), vec![layer], config))
    }
}
