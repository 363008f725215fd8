//! Render output port trait.

use crate::domain::compose::RenderSpec;
use crate::domain::error::ChartError;

/// Port for writing a composed chart to some output format.
pub trait RenderPort {
    fn write(&self, spec: &RenderSpec, output_path: &str) -> Result<(), ChartError>;

    /// Conventional file extension for this format.
    fn extension(&self) -> &'static str;
}
