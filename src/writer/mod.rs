//! Output writers for built figures

use crate::figure::Figure;
use crate::Result;

pub mod vegalite;

pub use vegalite::VegaLiteWriter;

/// Renders a [`Figure`] to a concrete chart format
pub trait Writer {
    type Output;

    /// Render the figure
    fn write(&self, figure: &Figure) -> Result<Self::Output>;

    /// Check the figure can be rendered by this writer
    fn validate(&self, figure: &Figure) -> Result<()>;
}
