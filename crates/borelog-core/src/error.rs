use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::model::RoiKind;

/// Pipeline stage responsible for a failure or warning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Component {
    Rasterizer,
    TextLayer,
    LineDetector,
    DescriptionOcr,
    SptExtractor,
}

impl fmt::Display for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Component::Rasterizer => "rasterizer",
            Component::TextLayer => "text layer",
            Component::LineDetector => "line detector",
            Component::DescriptionOcr => "description OCR",
            Component::SptExtractor => "SPT extractor",
        };
        f.write_str(name)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum BorelogError {
    #[error("extraction needs a {0} ROI on this page")]
    MissingRoi(RoiKind),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("failed to load configuration from {path}: {reason}")]
    ConfigLoad { path: PathBuf, reason: String },

    #[error("invalid ROI: {0}")]
    InvalidRoi(String),

    #[error("{component}: {roi} crop{} lies outside the {width}x{height} page bitmap", layer_suffix(.layer))]
    CropOutOfBounds {
        component: Component,
        roi: RoiKind,
        layer: Option<usize>,
        width: u32,
        height: u32,
    },

    #[error("OCR failed: {0}")]
    Recognition(String),

    #[error("{component}: OCR engine unavailable{}: {reason}", layer_suffix(.layer))]
    OcrUnavailable {
        component: Component,
        layer: Option<usize>,
        reason: String,
    },

    #[error("{tool} not found. Install it (tesseract: apt install tesseract-ocr; pdftoppm/pdftotext: apt install poppler-utils)")]
    ToolNotFound { tool: &'static str },

    #[error("{tool} failed with exit code {code}: {stderr}")]
    ToolFailed {
        tool: &'static str,
        code: i32,
        stderr: String,
    },

    #[error("{component} failed: {reason}")]
    Collaborator { component: Component, reason: String },

    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl BorelogError {
    /// True when the OCR backend itself cannot run, as opposed to failing on
    /// one particular crop.
    pub fn is_engine_unavailable(&self) -> bool {
        matches!(
            self,
            BorelogError::ToolNotFound { .. } | BorelogError::OcrUnavailable { .. }
        )
    }
}

fn layer_suffix(layer: &Option<usize>) -> String {
    match layer {
        Some(idx) => format!(" (layer {idx})"),
        None => String::new(),
    }
}
