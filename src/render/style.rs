use std::path::Path;

use crate::foundation::core::Rgba8;
use crate::foundation::error::{AnnotateError, AnnotateResult};

/// Cosmetic overlay parameters. Loaded from JSON; every field is optional.
///
/// ```json
/// { "stride": { "r": 0, "g": 128, "b": 255, "a": 255 }, "marker_radius": 6.0 }
/// ```
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OverlayStyle {
    /// Scale line and markers.
    pub scale: Rgba8,
    /// Stride markers.
    pub stride: Rgba8,
    /// Takeoff/landing line and markers.
    pub jump: Rgba8,
    /// Angle lines and markers.
    pub angle: Rgba8,
    /// Filled marker radius in pixels.
    pub marker_radius: f64,
    /// Guide line thickness in pixels.
    pub line_thickness: f64,
}

impl Default for OverlayStyle {
    fn default() -> Self {
        Self {
            scale: Rgba8::rgb(0, 0, 0),
            stride: Rgba8::rgb(0, 0, 255),
            jump: Rgba8::rgb(255, 0, 0),
            angle: Rgba8::rgb(0, 255, 255),
            marker_radius: 5.0,
            line_thickness: 2.0,
        }
    }
}

impl OverlayStyle {
    /// Parse a style from JSON text.
    pub fn from_json_str(s: &str) -> AnnotateResult<Self> {
        let style: Self = serde_json::from_str(s)
            .map_err(|e| AnnotateError::validation(format!("invalid overlay style json: {e}")))?;
        style.validate()?;
        Ok(style)
    }

    /// Read and parse a style JSON file.
    pub fn from_path(path: &Path) -> AnnotateResult<Self> {
        use anyhow::Context as _;
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read overlay style '{}'", path.display()))?;
        Self::from_json_str(&text)
    }

    /// Reject non-finite or non-positive sizes.
    pub fn validate(&self) -> AnnotateResult<()> {
        if !self.marker_radius.is_finite() || self.marker_radius <= 0.0 {
            return Err(AnnotateError::validation(
                "marker_radius must be a positive number",
            ));
        }
        if !self.line_thickness.is_finite() || self.line_thickness <= 0.0 {
            return Err(AnnotateError::validation(
                "line_thickness must be a positive number",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/style.rs"]
mod tests;
