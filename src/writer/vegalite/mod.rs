//! Vega-Lite JSON writer implementation
//!
//! Converts built [`Figure`]s into Vega-Lite v6 specifications that the
//! dashboard page renders with vega-embed.
//!
//! # Mapping Strategy
//!
//! - figure layers -> Vega-Lite layer composition
//! - [`Mark`] -> Vega-Lite mark type
//! - channel encodings -> Vega-Lite encoding channels
//! - layer DataFrames -> one inline dataset, filtered per layer
//! - facet -> wrapped `facet` with `columns`
//!
//! Summary tables are not charts; they are written as
//! `{"kind": "table", "columns": [...], "rows": [[...]]}`.
//!
//! # Example
//!
//! ```rust,ignore
//! use gssdash::writer::{VegaLiteWriter, Writer};
//!
//! let writer = VegaLiteWriter::new();
//! let vega_json = writer.write(&figure)?;
//! ```

mod data;
mod encoding;

use serde_json::{json, Value};

use crate::figure::{FigureKind, Layer, Mark};
use crate::writer::Writer;
use crate::{DashError, Figure, Result};

pub use data::{layer_key, SOURCE_COLUMN};
use data::{dataframe_to_rows, dataframe_to_values, unify_datasets};
use encoding::{build_layer_encoding, infer_field_type};

/// Chart height when the figure does not set one
pub const DEFAULT_HEIGHT: u32 = 400;

/// Size of each panel in a faceted chart
const FACET_PANEL_WIDTH: u32 = 280;
const FACET_PANEL_HEIGHT: u32 = 220;

/// Vega-Lite JSON writer
///
/// Generates Vega-Lite v6 specifications from built figures.
pub struct VegaLiteWriter {
    /// Vega-Lite schema version
    schema: String,
}

impl VegaLiteWriter {
    /// Create a new Vega-Lite writer with default settings
    pub fn new() -> Self {
        Self {
            schema: "https://vega.github.io/schema/vega-lite/v6.json".to_string(),
        }
    }

    /// Render the figure as a JSON value
    pub fn render(&self, figure: &Figure) -> Result<Value> {
        self.validate(figure)?;

        if figure.kind() == FigureKind::SummaryTable {
            return Ok(table_spec(figure));
        }

        let mut vl_spec = json!({
            "$schema": self.schema
        });

        if let Some(title) = figure.title() {
            vl_spec["title"] = json!(title);
        }

        // Unify all layer datasets into a single one with source identification
        let datasets: Vec<(String, Vec<Value>)> = figure
            .layers()
            .iter()
            .enumerate()
            .map(|(idx, layer)| (layer_key(idx), dataframe_to_values(&layer.data)))
            .collect();
        vl_spec["data"] = json!({"values": unify_datasets(&datasets)});

        // Each layer gets a filter transform to select its rows
        let layers: Vec<Value> = figure
            .layers()
            .iter()
            .enumerate()
            .map(|(idx, layer)| {
                json!({
                    "mark": mark_spec(layer.mark),
                    "transform": [{
                        "filter": {"field": SOURCE_COLUMN, "equal": layer_key(idx)}
                    }],
                    "encoding": build_layer_encoding(layer, figure),
                })
            })
            .collect();

        match figure.facet() {
            Some(facet) => {
                let field_type = infer_field_type(&figure.layers()[0].data, &facet.field);
                let title = figure
                    .labels()
                    .get(&facet.field)
                    .cloned()
                    .unwrap_or_else(|| facet.field.clone());
                let mut facet_spec = json!({
                    "field": facet.field,
                    "type": encoding::field_type_name(field_type),
                    "title": title,
                });
                if !facet.order.is_empty() {
                    facet_spec["sort"] = json!(facet.order);
                }
                vl_spec["facet"] = facet_spec;
                vl_spec["columns"] = json!(facet.columns);
                vl_spec["spec"] = json!({
                    "width": FACET_PANEL_WIDTH,
                    "height": FACET_PANEL_HEIGHT,
                    "layer": layers,
                });
                // Panels share the y scale
                vl_spec["resolve"] = json!({"scale": {"y": "shared"}});
            }
            None => {
                vl_spec["width"] = json!("container");
                vl_spec["height"] = json!(figure.layout().height.unwrap_or(DEFAULT_HEIGHT));
                vl_spec["layer"] = json!(layers);
            }
        }

        Ok(vl_spec)
    }
}

impl Default for VegaLiteWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl Writer for VegaLiteWriter {
    type Output = String;

    fn write(&self, figure: &Figure) -> Result<String> {
        let spec = self.render(figure)?;
        serde_json::to_string_pretty(&spec).map_err(|e| {
            DashError::RenderError(format!("Failed to serialize Vega-Lite JSON: {}", e))
        })
    }

    fn validate(&self, figure: &Figure) -> Result<()> {
        if figure.layers().is_empty() {
            return Err(DashError::RenderError(
                "VegaLiteWriter requires at least one layer".to_string(),
            ));
        }
        for (idx, layer) in figure.layers().iter().enumerate() {
            if layer.mark == Mark::Table && figure.kind() != FigureKind::SummaryTable {
                return Err(DashError::RenderError(format!(
                    "Layer {} is a table inside a {} chart",
                    idx + 1,
                    figure.kind()
                )));
            }
            validate_layer_columns(layer, idx)?;
        }
        if let Some(facet) = figure.facet() {
            for (idx, layer) in figure.layers().iter().enumerate() {
                if layer.data.column(&facet.field).is_err() {
                    return Err(DashError::RenderError(format!(
                        "Facet column '{}' does not exist in layer {}",
                        facet.field,
                        idx + 1
                    )));
                }
            }
        }
        Ok(())
    }
}

/// Every encoded column must be present in the layer's data
fn validate_layer_columns(layer: &Layer, idx: usize) -> Result<()> {
    for channel_encoding in &layer.encoding {
        if layer.data.column(&channel_encoding.field).is_err() {
            return Err(DashError::RenderError(format!(
                "Column '{}' referenced by layer {} does not exist. Available columns: {}",
                channel_encoding.field,
                idx + 1,
                layer.data.get_column_names_str().join(", ")
            )));
        }
    }
    Ok(())
}

/// Map a figure mark to a Vega-Lite mark definition
fn mark_spec(mark: Mark) -> Value {
    match mark {
        Mark::Bar => json!({"type": "bar"}),
        Mark::Point => json!({"type": "point", "filled": true, "opacity": 0.7}),
        Mark::Line => json!({"type": "line", "strokeWidth": 2}),
        Mark::Rule => json!({"type": "rule"}),
        Mark::Tick => json!({"type": "tick", "color": "black", "thickness": 2}),
        // Tables never reach the chart path
        Mark::Table => json!({"type": "text"}),
    }
}

fn table_spec(figure: &Figure) -> Value {
    let data = &figure.layers()[0].data;
    let mut spec = json!({
        "kind": "table",
        "columns": data.get_column_names_str(),
        "rows": dataframe_to_rows(data),
    });
    if let Some(title) = figure.title() {
        spec["title"] = json!(title);
    }
    spec
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::figure::{build_figure, BarMode, DisplayConfig, FacetConfig};
    use polars::prelude::*;

    fn counts() -> DataFrame {
        df! {
            "satjob" => &["very satisfied", "very satisfied", "mod. satisfied"],
            "sex" => &["male", "female", "male"],
            "count" => &[2u32, 1, 4],
        }
        .unwrap()
    }

    fn bar_config() -> DisplayConfig {
        DisplayConfig::new()
            .x("satjob")
            .y("count")
            .color("sex")
            .label("satjob", "level of satisfaction")
            .label("count", "number of respondents")
            .title("Job satisfaction by sex")
    }

    fn render(figure: &Figure) -> Value {
        let json = VegaLiteWriter::new().write(figure).unwrap();
        serde_json::from_str(&json).unwrap()
    }

    #[test]
    fn test_grouped_bar_spec() {
        let figure = build_figure(&counts(), FigureKind::GroupedBar, &bar_config()).unwrap();
        let spec = render(&figure);

        assert_eq!(spec["$schema"], "https://vega.github.io/schema/vega-lite/v6.json");
        assert_eq!(spec["title"], "Job satisfaction by sex");
        assert_eq!(spec["height"], DEFAULT_HEIGHT);
        assert_eq!(spec["data"]["values"].as_array().unwrap().len(), 3);

        let layer = &spec["layer"][0];
        assert_eq!(layer["mark"]["type"], "bar");
        assert_eq!(layer["transform"][0]["filter"]["equal"], "__gssdash_layer_0__");
        assert_eq!(layer["encoding"]["x"]["field"], "satjob");
        assert_eq!(layer["encoding"]["x"]["type"], "nominal");
        assert_eq!(layer["encoding"]["x"]["title"], "level of satisfaction");
        assert_eq!(layer["encoding"]["y"]["title"], "number of respondents");
        assert_eq!(layer["encoding"]["color"]["title"], "sex");
        assert_eq!(layer["encoding"]["xOffset"]["field"], "sex");
    }

    #[test]
    fn test_stacked_bar_and_hidden_legend() {
        let config = bar_config().bar_mode(BarMode::Stack).show_legend(false);
        let mut figure = build_figure(&counts(), FigureKind::GroupedBar, &config).unwrap();
        figure.set_height(600);
        let spec = render(&figure);

        let encoding = &spec["layer"][0]["encoding"];
        assert!(encoding.get("xOffset").is_none());
        assert!(encoding["color"]["legend"].is_null());
        assert!(encoding["color"].get("legend").is_some());
        assert_eq!(spec["height"], 600);
    }

    #[test]
    fn test_scatter_layers_share_dataset() {
        let data = df! {
            "job_prestige" => &[20.0, 40.0, 30.0, 50.0],
            "income" => &[10.0, 20.0, 5.0, 6.0],
            "sex" => &["male", "male", "female", "female"],
            "education" => &[12.0, 14.0, 16.0, 18.0],
        }
        .unwrap();
        let config = DisplayConfig::new()
            .x("job_prestige")
            .y("income")
            .color("sex")
            .tooltip("education");
        let figure = build_figure(&data, FigureKind::ScatterWithTrend, &config).unwrap();
        let spec = render(&figure);

        let values = spec["data"]["values"].as_array().unwrap();
        // 4 points + 2 endpoints per trend line
        assert_eq!(values.len(), 8);
        let trend_rows = values
            .iter()
            .filter(|v| v[SOURCE_COLUMN] == "__gssdash_layer_1__")
            .count();
        assert_eq!(trend_rows, 4);

        assert_eq!(spec["layer"][1]["mark"]["type"], "line");
        let tooltip = spec["layer"][0]["encoding"]["tooltip"].as_array().unwrap();
        assert_eq!(tooltip.len(), 4);
        assert_eq!(tooltip[3]["field"], "education");
    }

    #[test]
    fn test_box_spec_uses_y2_without_title() {
        let data = df! {
            "sex" => &["male", "male", "female"],
            "income" => &[1.0, 2.0, 3.0],
        }
        .unwrap();
        let config = DisplayConfig::new().x("sex").y("income").color("sex");
        let figure = build_figure(&data, FigureKind::Box, &config).unwrap();
        let spec = render(&figure);

        let layers = spec["layer"].as_array().unwrap();
        assert_eq!(layers.len(), 5);
        assert_eq!(layers[0]["mark"]["type"], "rule");
        assert_eq!(layers[2]["encoding"]["y"]["field"], "q1");
        assert_eq!(layers[2]["encoding"]["y"]["title"], "income");
        assert_eq!(layers[2]["encoding"]["y2"], json!({"field": "q3"}));
        assert_eq!(layers[3]["mark"]["type"], "tick");
    }

    #[test]
    fn test_faceted_spec() {
        let data = df! {
            "sex" => &["male", "female", "male", "female"],
            "income" => &[1.0, 2.0, 3.0, 4.0],
            "job_prestige" => &[10.0, 20.0, 30.0, 40.0],
        }
        .unwrap();
        let config = DisplayConfig::new()
            .x("sex")
            .y("income")
            .facet(FacetConfig::new("job_prestige"))
            .label("job_prestige_cat", "job prestige");
        let figure = build_figure(&data, FigureKind::FacetedBox, &config).unwrap();
        let spec = render(&figure);

        assert_eq!(spec["facet"]["field"], "job_prestige_cat");
        assert_eq!(spec["facet"]["title"], "job prestige");
        assert_eq!(spec["facet"]["sort"].as_array().unwrap().len(), 4);
        assert_eq!(spec["columns"], 2);
        assert_eq!(spec["spec"]["layer"].as_array().unwrap().len(), 5);
        assert!(spec.get("layer").is_none());
    }

    #[test]
    fn test_table_spec() {
        let data = df! {
            "sex" => &["male", "female"],
            "income" => &[52000.12, 47000.5],
        }
        .unwrap();
        let config = DisplayConfig::new().title("Means by sex");
        let figure = build_figure(&data, FigureKind::SummaryTable, &config).unwrap();
        let spec = VegaLiteWriter::new().render(&figure).unwrap();

        assert_eq!(
            spec,
            json!({
                "kind": "table",
                "title": "Means by sex",
                "columns": ["sex", "income"],
                "rows": [["male", 52000.12], ["female", 47000.5]],
            })
        );
    }

    #[test]
    fn test_missing_column_error() {
        let mut figure = build_figure(&counts(), FigureKind::GroupedBar, &bar_config()).unwrap();
        // Swap in data that lacks the encoded columns
        let stripped = counts().select(["count"]).unwrap();
        figure = with_layer_data(figure, stripped);
        let err = VegaLiteWriter::new().write(&figure).unwrap_err();
        assert!(matches!(err, DashError::RenderError(_)));
        assert!(err.to_string().contains("does not exist"));
    }

    fn with_layer_data(figure: Figure, data: DataFrame) -> Figure {
        let mut layers = figure.layers().to_vec();
        layers[0].data = data;
        Figure::new(figure.kind(), layers, &bar_config())
    }
}
