//! JSON output of the composed chart, for a front-end charting library.

use crate::domain::compose::RenderSpec;
use crate::domain::error::ChartError;
use crate::ports::render_port::RenderPort;
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Copy, Default)]
pub struct JsonRenderAdapter {
    pub compact: bool,
}

impl JsonRenderAdapter {
    pub fn render(&self, spec: &RenderSpec) -> Result<String, ChartError> {
        let result = if self.compact {
            serde_json::to_string(spec)
        } else {
            serde_json::to_string_pretty(spec)
        };
        result.map_err(|e| ChartError::Render {
            reason: e.to_string(),
        })
    }
}

impl RenderPort for JsonRenderAdapter {
    fn write(&self, spec: &RenderSpec, output_path: &str) -> Result<(), ChartError> {
        let json = self.render(spec)?;
        let path = Path::new(output_path);
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, json)?;
        Ok(())
    }

    fn extension(&self) -> &'static str {
        "json"
    }
}
