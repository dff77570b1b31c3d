//! Encoding channel construction for the Vega-Lite writer

use polars::prelude::*;
use serde_json::{json, Map, Value};

use crate::figure::{Channel, ChannelEncoding, FieldType, Figure, Layer};

/// Check if a string column contains numeric values
pub(super) fn is_numeric_string_column(series: &Series) -> bool {
    if let Ok(ca) = series.str() {
        let mut seen = false;
        for val in ca.into_iter().flatten().take(5) {
            if val.parse::<f64>().is_err() {
                return false;
            }
            seen = true;
        }
        seen
    } else {
        false
    }
}

/// Infer the measurement level of a DataFrame column
pub(super) fn infer_field_type(df: &DataFrame, field: &str) -> FieldType {
    if let Ok(column) = df.column(field) {
        use DataType::*;
        match column.dtype() {
            Int8 | Int16 | Int32 | Int64 | UInt8 | UInt16 | UInt32 | UInt64 | Float32 | Float64 => {
                FieldType::Quantitative
            }
            String => {
                if is_numeric_string_column(column.as_materialized_series()) {
                    FieldType::Quantitative
                } else {
                    FieldType::Nominal
                }
            }
            _ => FieldType::Nominal,
        }
    } else {
        FieldType::Nominal
    }
}

pub(super) fn field_type_name(field_type: FieldType) -> &'static str {
    match field_type {
        FieldType::Nominal => "nominal",
        FieldType::Ordinal => "ordinal",
        FieldType::Quantitative => "quantitative",
    }
}

/// Vega-Lite channel name
pub(super) fn map_channel_name(channel: Channel) -> &'static str {
    match channel {
        Channel::X => "x",
        Channel::Y => "y",
        Channel::Y2 => "y2",
        Channel::Color => "color",
        Channel::XOffset => "xOffset",
        Channel::Tooltip => "tooltip",
    }
}

/// Axis/legend title: explicit override, then the figure's labels, then the column
pub(super) fn channel_title(encoding: &ChannelEncoding, figure: &Figure) -> String {
    encoding
        .title
        .clone()
        .or_else(|| figure.labels().get(&encoding.field).cloned())
        .unwrap_or_else(|| encoding.field.clone())
}

fn field_definition(encoding: &ChannelEncoding, layer: &Layer, figure: &Figure) -> Value {
    let field_type = encoding
        .field_type
        .unwrap_or_else(|| infer_field_type(&layer.data, &encoding.field));
    json!({
        "field": encoding.field,
        "type": field_type_name(field_type),
        "title": channel_title(encoding, figure),
    })
}

/// Build the encoding object of one layer
pub(super) fn build_layer_encoding(layer: &Layer, figure: &Figure) -> Map<String, Value> {
    let mut encoding = Map::new();
    let mut tooltips = Vec::new();

    for channel_encoding in &layer.encoding {
        let value = match channel_encoding.channel {
            // Range ends share the scale and title of y
            Channel::Y2 => json!({"field": channel_encoding.field}),
            Channel::XOffset => {
                let mut offset = field_definition(channel_encoding, layer, figure);
                if let Some(object) = offset.as_object_mut() {
                    object.remove("title");
                }
                offset
            }
            Channel::Tooltip => {
                tooltips.push(field_definition(channel_encoding, layer, figure));
                continue;
            }
            Channel::Color => {
                let mut color = field_definition(channel_encoding, layer, figure);
                if !figure.layout().show_legend {
                    color["legend"] = Value::Null;
                }
                color
            }
            Channel::X | Channel::Y => field_definition(channel_encoding, layer, figure),
        };
        encoding.insert(
            map_channel_name(channel_encoding.channel).to_string(),
            value,
        );
    }

    if !tooltips.is_empty() {
        encoding.insert("tooltip".to_string(), Value::Array(tooltips));
    }
    encoding
}
