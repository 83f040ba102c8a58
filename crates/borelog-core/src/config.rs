use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::BorelogError;
use crate::layers::DEFAULT_MIN_THICKNESS_FT;
use crate::lines::LineDetectorConfig;

/// Inputs that tune one extraction run.
///
/// Every field except `total_depth_ft` has a default; the total depth is
/// declared by the operator for each log and must be positive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Depth in feet at the bottom edge of the description ROI.
    pub total_depth_ft: f64,
    /// Language code passed through to the OCR engine.
    pub language: String,
    pub line_detector: LineDetectorConfig,
    /// Layers thinner than this are folded into their neighbours.
    pub min_layer_thickness_ft: f64,
    /// Magnification used when rasterizing PDF pages (72 dpi = 1.0).
    pub render_scale: f64,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        ExtractionConfig {
            total_depth_ft: 0.0,
            language: "eng".into(),
            line_detector: LineDetectorConfig::default(),
            min_layer_thickness_ft: DEFAULT_MIN_THICKNESS_FT,
            render_scale: 2.2,
        }
    }
}

impl ExtractionConfig {
    pub fn with_total_depth(total_depth_ft: f64) -> Self {
        ExtractionConfig {
            total_depth_ft,
            ..ExtractionConfig::default()
        }
    }
}

/// Load a configuration from a JSON file. Validation is left to the caller,
/// which may still override fields (typically the total depth).
pub fn load_config(path: &Path) -> Result<ExtractionConfig, BorelogError> {
    let content = std::fs::read_to_string(path).map_err(|e| BorelogError::ConfigLoad {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    parse_config(&content, path)
}

/// Parse a configuration from a JSON string.
pub fn parse_config(json: &str, source: &Path) -> Result<ExtractionConfig, BorelogError> {
    serde_json::from_str(json).map_err(|e| BorelogError::ConfigLoad {
        path: source.to_path_buf(),
        reason: e.to_string(),
    })
}

/// Validate that a configuration can drive an extraction.
pub fn validate_config(config: &ExtractionConfig) -> Result<(), BorelogError> {
    if !(config.total_depth_ft.is_finite() && config.total_depth_ft > 0.0) {
        return Err(BorelogError::InvalidConfig(format!(
            "total_depth_ft must be a positive number of feet (got {})",
            config.total_depth_ft
        )));
    }

    if config.language.trim().is_empty() {
        return Err(BorelogError::InvalidConfig(
            "language must not be empty".into(),
        ));
    }

    let ratio = config.line_detector.row_ink_ratio;
    if !(ratio > 0.0 && ratio <= 1.0) {
        return Err(BorelogError::InvalidConfig(format!(
            "line_detector.row_ink_ratio must be in (0, 1] (got {ratio})"
        )));
    }

    if !(config.line_detector.min_gap_px >= 0.0) {
        return Err(BorelogError::InvalidConfig(format!(
            "line_detector.min_gap_px must not be negative (got {})",
            config.line_detector.min_gap_px
        )));
    }

    if !(config.min_layer_thickness_ft >= 0.0) {
        return Err(BorelogError::InvalidConfig(format!(
            "min_layer_thickness_ft must not be negative (got {})",
            config.min_layer_thickness_ft
        )));
    }

    if !(config.render_scale.is_finite() && config.render_scale > 0.0) {
        return Err(BorelogError::InvalidConfig(format!(
            "render_scale must be positive (got {})",
            config.render_scale
        )));
    }

    Ok(())
}
