/*!
# gssdash

Data preparation, aggregation and chart assembly for an interactive
dashboard over the General Social Survey (GSS) 2018 extract.

## Architecture

```text
reader::load ──► Dataset ──► aggregate::{count_by, mean_by}
                    │                    │
                    └──────► figure::build_figure ──► writer::VegaLiteWriter
                                         ▲
                              dashboard::Dashboard
```

- [`reader`] fetches and cleans the survey (null sentinels, rename, numeric coercion)
- [`aggregate`] produces grouped counts and rounded grouped means
- [`figure`] turns tables into renderer-neutral [`Figure`]s
- [`writer`] renders figures to Vega-Lite JSON
- [`dashboard`] owns the static figures and the interactive breakdown

## Example

```rust,ignore
use std::sync::Arc;
use gssdash::{dashboard::Dashboard, reader, BreakdownRequest, LoaderConfig};
use gssdash::writer::{VegaLiteWriter, Writer};

let dataset = Arc::new(reader::load(&LoaderConfig::default())?);
let dashboard = Dashboard::new(dataset)?;
let figure = dashboard.breakdown(BreakdownRequest::parse("satjob", "region")?)?;
let json = VegaLiteWriter::new().write(&figure)?;
```
*/

pub mod aggregate;
pub mod config;
pub mod dashboard;
pub mod dataset;
pub mod field;
pub mod figure;
pub mod reader;
pub mod writer;

pub use aggregate::{aggregate, count_by, mean_by, COUNT_COLUMN};
pub use config::{Encoding, LoaderConfig};
pub use dataset::Dataset;
pub use field::{AttitudeField, BreakdownRequest, Field, GroupField};
pub use figure::{build_figure, DisplayConfig, Figure, FigureKind};

// Re-export polars DataFrame for convenience
pub use polars::prelude::DataFrame;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Main error type for gssdash operations
#[derive(Debug, thiserror::Error)]
pub enum DashError {
    #[error("Load error: {0}")]
    LoadError(String),

    #[error("Schema error: {0}")]
    SchemaError(String),

    #[error("Type error: {0}")]
    TypeError(String),

    #[error("Invalid field: {0}")]
    InvalidFieldError(String),

    #[error("Render error: {0}")]
    RenderError(String),

    #[error("Internal error: {0}")]
    InternalError(String),
}

impl From<polars::prelude::PolarsError> for DashError {
    fn from(err: polars::prelude::PolarsError) -> Self {
        DashError::InternalError(format!("Polars error: {}", err))
    }
}

pub type Result<T> = std::result::Result<T, DashError>;
