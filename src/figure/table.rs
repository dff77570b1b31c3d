//! Plain table of an already aggregated frame

use polars::prelude::*;

use super::{DisplayConfig, Figure, FigureKind, FigureTrait, Layer, Mark};
use crate::{DashError, Result};

#[derive(Debug, Clone, Copy)]
pub struct SummaryTable;

impl FigureTrait for SummaryTable {
    fn kind(&self) -> FigureKind {
        FigureKind::SummaryTable
    }

    fn required_columns<'a>(&self, _config: &'a DisplayConfig) -> Vec<(&'static str, Option<&'a str>)> {
        Vec::new()
    }

    fn build(&self, data: &DataFrame, config: &DisplayConfig) -> Result<Figure> {
        if data.width() == 0 {
            return Err(DashError::RenderError(
                "A summary table needs at least one column".to_string(),
            ));
        }
        let layer = Layer::new(Mark::Table, data.clone());
        Ok(Figure::new(self.kind(), vec![layer], config))
    }
}
