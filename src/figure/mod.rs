//! Renderer-neutral figures
//!
//! [`build_figure`] turns a table plus a [`DisplayConfig`] into a [`Figure`]:
//! a list of layers (mark, data, encoding channels), an optional facet, axis
//! labels and a small layout block. Writers in [`crate::writer`] render
//! figures to a concrete chart format.
//!
//! Each [`FigureKind`] has an implementation of [`FigureTrait`] that names
//! the columns it needs and runs its stat step (counts are computed upstream,
//! five-number summaries and trend lines here).

use std::collections::{BTreeMap, HashMap};
use std::fmt;

use polars::prelude::*;
use serde::{Deserialize, Serialize};

use crate::{DashError, Result};

mod bar;
mod boxplot;
mod scatter;
mod table;

pub use bar::GroupedBar;
pub use boxplot::{BoxPlot, FacetedBox};
pub use scatter::ScatterWithTrend;
pub use table::SummaryTable;

/// The chart views the dashboard can build
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FigureKind {
    GroupedBar,
    ScatterWithTrend,
    Box,
    FacetedBox,
    SummaryTable,
}

impl FigureKind {
    fn implementation(&self) -> Box<dyn FigureTrait> {
        match self {
            FigureKind::GroupedBar => Box::new(GroupedBar),
            FigureKind::ScatterWithTrend => Box::new(ScatterWithTrend),
            FigureKind::Box => Box::new(BoxPlot),
            FigureKind::FacetedBox => Box::new(FacetedBox),
            FigureKind::SummaryTable => Box::new(SummaryTable),
        }
    }
}

impl fmt::Display for FigureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FigureKind::GroupedBar => "grouped-bar",
            FigureKind::ScatterWithTrend => "scatter-with-trend",
            FigureKind::Box => "box",
            FigureKind::FacetedBox => "faceted-box",
            FigureKind::SummaryTable => "summary-table",
        };
        write!(f, "{}", name)
    }
}

/// How bars sharing an x value are arranged
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BarMode {
    /// Side by side
    #[default]
    Group,
    Stack,
}

/// Faceting of a box plot on a continuous column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FacetConfig {
    /// Continuous column discretized into panels
    pub field: String,
    /// Number of equal-width buckets
    pub bins: usize,
    /// Panels per row
    pub columns: usize,
}

impl FacetConfig {
    pub fn new(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            bins: 6,
            columns: 2,
        }
    }

    /// Name of the derived bucket column
    pub fn bucket_column(&self) -> String {
        format!("{}_cat", self.field)
    }
}

/// Column roles and display metadata for [`build_figure`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DisplayConfig {
    pub x: Option<String>,
    pub y: Option<String>,
    pub color: Option<String>,
    /// Extra columns shown on hover
    pub tooltip: Vec<String>,
    pub facet: Option<FacetConfig>,
    /// Column name -> axis/legend title
    pub labels: BTreeMap<String, String>,
    pub title: Option<String>,
    pub height: Option<u32>,
    pub show_legend: bool,
    pub bar_mode: BarMode,
    /// Box plot whisker length in IQRs
    pub whisker_coef: f64,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            x: None,
            y: None,
            color: None,
            tooltip: Vec::new(),
            facet: None,
            labels: BTreeMap::new(),
            title: None,
            height: None,
            show_legend: true,
            bar_mode: BarMode::default(),
            whisker_coef: crate::aggregate::stat::DEFAULT_WHISKER_COEF,
        }
    }
}

impl DisplayConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn x(mut self, column: impl Into<String>) -> Self {
        self.x = Some(column.into());
        self
    }

    pub fn y(mut self, column: impl Into<String>) -> Self {
        self.y = Some(column.into());
        self
    }

    pub fn color(mut self, column: impl Into<String>) -> Self {
        self.color = Some(column.into());
        self
    }

    pub fn tooltip(mut self, column: impl Into<String>) -> Self {
        self.tooltip.push(column.into());
        self
    }

    pub fn facet(mut self, facet: FacetConfig) -> Self {
        self.facet = Some(facet);
        self
    }

    pub fn label(mut self, column: impl Into<String>, title: impl Into<String>) -> Self {
        self.labels.insert(column.into(), title.into());
        self
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn height(mut self, height: u32) -> Self {
        self.height = Some(height);
        self
    }

    pub fn show_legend(mut self, show: bool) -> Self {
        self.show_legend = show;
        self
    }

    pub fn bar_mode(mut self, mode: BarMode) -> Self {
        self.bar_mode = mode;
        self
    }

    /// Title for a column: its label, or the column name itself
    pub fn label_for(&self, column: &str) -> String {
        self.labels
            .get(column)
            .cloned()
            .unwrap_or_else(|| column.to_string())
    }
}

/// Mark drawn by a layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mark {
    Bar,
    Point,
    Line,
    Rule,
    Tick,
    Table,
}

/// Visual channel a column is mapped to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Channel {
    X,
    Y,
    /// End of a ranged y mark (whiskers, box body)
    Y2,
    Color,
    /// Offset within a band, for side-by-side bars
    XOffset,
    Tooltip,
}

/// Measurement level of an encoded column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    Nominal,
    Ordinal,
    Quantitative,
}

/// One column-to-channel mapping
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelEncoding {
    pub channel: Channel,
    pub field: String,
    /// Overrides the type inferred from the column dtype
    pub field_type: Option<FieldType>,
    /// Overrides the figure's label for `field`
    pub title: Option<String>,
}

impl ChannelEncoding {
    pub fn new(channel: Channel, field: impl Into<String>) -> Self {
        Self {
            channel,
            field: field.into(),
            field_type: None,
            title: None,
        }
    }

    pub fn with_type(mut self, field_type: FieldType) -> Self {
        self.field_type = Some(field_type);
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }
}

/// A mark drawn from its own table
#[derive(Debug, Clone)]
pub struct Layer {
    pub mark: Mark,
    pub data: DataFrame,
    pub encoding: Vec<ChannelEncoding>,
}

impl Layer {
    pub fn new(mark: Mark, data: DataFrame) -> Self {
        Self {
            mark,
            data,
            encoding: Vec::new(),
        }
    }

    pub fn encode(mut self, encoding: ChannelEncoding) -> Self {
        self.encoding.push(encoding);
        self
    }

    /// Fields encoded on `channel`
    pub fn fields(&self, channel: Channel) -> Vec<&str> {
        self.encoding
            .iter()
            .filter(|e| e.channel == channel)
            .map(|e| e.field.as_str())
            .collect()
    }
}

/// Panels split by a categorical column
#[derive(Debug, Clone, PartialEq)]
pub struct Facet {
    pub field: String,
    pub columns: usize,
    /// Panel order
    pub order: Vec<String>,
}

/// Layout settings that may be overridden after construction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Layout {
    pub height: Option<u32>,
    pub show_legend: bool,
    pub bar_mode: BarMode,
}

/// A built chart, ready for a writer
#[derive(Debug, Clone)]
pub struct Figure {
    kind: FigureKind,
    title: Option<String>,
    layers: Vec<Layer>,
    facet: Option<Facet>,
    labels: BTreeMap<String, String>,
    layout: Layout,
}

impl Figure {
    pub(crate) fn new(kind: FigureKind, layers: Vec<Layer>, config: &DisplayConfig) -> Self {
        Self {
            kind,
            title: config.title.clone(),
            layers,
            facet: None,
            labels: config.labels.clone(),
            layout: Layout {
                height: config.height,
                show_legend: config.show_legend,
                bar_mode: config.bar_mode,
            },
        }
    }

    pub(crate) fn with_facet(mut self, facet: Facet) -> Self {
        self.facet = Some(facet);
        self
    }

    pub fn kind(&self) -> FigureKind {
        self.kind
    }

    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    pub fn facet(&self) -> Option<&Facet> {
        self.facet.as_ref()
    }

    pub fn labels(&self) -> &BTreeMap<String, String> {
        &self.labels
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    pub fn set_show_legend(&mut self, show: bool) {
        self.layout.show_legend = show;
    }

    pub fn set_height(&mut self, height: u32) {
        self.layout.height = Some(height);
    }
}

/// Behaviour shared by every figure kind
pub trait FigureTrait {
    fn kind(&self) -> FigureKind;

    /// Column roles this kind needs, paired with the configured column
    fn required_columns<'a>(&self, config: &'a DisplayConfig) -> Vec<(&'static str, Option<&'a str>)>;

    /// Build the figure from validated input
    fn build(&self, data: &DataFrame, config: &DisplayConfig) -> Result<Figure>;
}

/// Build a figure of `kind` from `data`
///
/// Fails with `RenderError` when a column the kind needs is not configured
/// or not present in `data`.
pub fn build_figure(data: &DataFrame, kind: FigureKind, config: &DisplayConfig) -> Result<Figure> {
    let implementation = kind.implementation();
    for (role, column) in implementation.required_columns(config) {
        require_column(data, role_column(column, role, kind)?, kind)?;
    }
    for column in &config.tooltip {
        require_column(data, column, kind)?;
    }
    implementation.build(data, config)
}

/// The column configured for `role`
pub(crate) fn role_column<'a>(column: Option<&'a str>, role: &str, kind: FigureKind) -> Result<&'a str> {
    column.ok_or_else(|| {
        DashError::RenderError(format!("A {} figure requires a '{}' column", kind, role))
    })
}

fn require_column(data: &DataFrame, column: &str, kind: FigureKind) -> Result<()> {
    data.column(column).map(|_| ()).map_err(|_| {
        DashError::RenderError(format!(
            "Column '{}' required by the {} figure does not exist",
            column, kind
        ))
    })
}

/// Cells of a column as owned strings (numbers are formatted)
pub(crate) fn text_values(data: &DataFrame, column: &str) -> Result<Vec<Option<String>>> {
    let series = data
        .column(column)?
        .as_materialized_series()
        .cast(&DataType::String)?;
    Ok(series
        .str()?
        .into_iter()
        .map(|v| v.map(|s| s.to_string()))
        .collect())
}

/// Cells of a column as `f64`
pub(crate) fn numeric_values(data: &DataFrame, column: &str) -> Result<Vec<Option<f64>>> {
    let series = data
        .column(column)?
        .as_materialized_series()
        .cast(&DataType::Float64)
        .map_err(|e| {
            DashError::RenderError(format!("Column '{}' is not numeric: {}", column, e))
        })?;
    Ok(series.f64()?.into_iter().collect())
}

/// Values grouped by key, keys in order of first appearance
pub(crate) struct OrderedGroups<K, V> {
    keys: Vec<K>,
    index: HashMap<K, usize>,
    values: Vec<Vec<V>>,
}

impl<K: Clone + Eq + std::hash::Hash, V> OrderedGroups<K, V> {
    pub(crate) fn new() -> Self {
        Self {
            keys: Vec::new(),
            index: HashMap::new(),
            values: Vec::new(),
        }
    }

    pub(crate) fn push(&mut self, key: K, value: V) {
        let slot = match self.index.get(&key) {
            Some(slot) => *slot,
            None => {
                self.keys.push(key.clone());
                self.values.push(Vec::new());
                self.index.insert(key, self.keys.len() - 1);
                self.keys.len() - 1
            }
        };
        self.values[slot].push(value);
    }

    pub(crate) fn into_groups(self) -> impl Iterator<Item = (K, Vec<V>)> {
        self.keys.into_iter().zip(self.values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_role_is_render_error() {
        let df = df! { "satjob" => &["agree"], "count" => &[1u32] }.unwrap();
        let config = DisplayConfig::new().x("satjob").y("count");
        let err = build_figure(&df, FigureKind::GroupedBar, &config).unwrap_err();
        assert!(matches!(err, DashError::RenderError(_)));
        assert!(err.to_string().contains("'color'"));
    }

    #[test]
    fn test_missing_column_is_render_error() {
        let df = df! { "satjob" => &["agree"], "count" => &[1u32] }.unwrap();
        let config = DisplayConfig::new().x("satjob").y("count").color("sex");
        let err = build_figure(&df, FigureKind::GroupedBar, &config).unwrap_err();
        assert!(matches!(err, DashError::RenderError(_)));
        assert!(err.to_string().contains("'sex'"));
        assert!(err.to_string().contains("grouped-bar"));
    }

    #[test]
    fn test_missing_tooltip_column_is_render_error() {
        let df = df! {
            "x" => &[1.0, 2.0],
            "y" => &[1.0, 2.0],
            "sex" => &["male", "female"],
        }
        .unwrap();
        let config = DisplayConfig::new().x("x").y("y").color("sex").tooltip("education");
        let err = build_figure(&df, FigureKind::ScatterWithTrend, &config).unwrap_err();
        assert!(matches!(err, DashError::RenderError(_)));
    }

    #[test]
    fn test_layout_overrides() {
        let df = df! { "sex" => &["male"], "income" => &[1.0] }.unwrap();
        let mut figure = build_figure(&df, FigureKind::SummaryTable, &DisplayConfig::new()).unwrap();
        assert!(figure.layout().show_legend);
        figure.set_show_legend(false);
        figure.set_height(600);
        assert!(!figure.layout().show_legend);
        assert_eq!(figure.layout().height, Some(600));
    }

    #[test]
    fn test_ordered_groups_keep_discovery_order() {
        let mut groups = OrderedGroups::new();
        groups.push("b", 1);
        groups.push("a", 2);
        groups.push("b", 3);
        let collected: Vec<_> = groups.into_groups().collect();
        assert_eq!(collected, vec![("b", vec![1, 3]), ("a", vec![2])]);
    }

    #[test]
    fn test_kind_display() {
        assert_eq!(FigureKind::ScatterWithTrend.to_string(), "scatter-with-trend");
        assert_eq!(
            serde_json::to_string(&FigureKind::FacetedBox).unwrap(),
            "\"faceted-box\""
        );
    }
}
