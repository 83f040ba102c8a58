pub mod tesseract;

use image::RgbaImage;
use serde::{Deserialize, Serialize};

use crate::error::BorelogError;

/// Word bounding box in pixels of the image handed to the engine.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WordBox {
    pub x0: f64,
    pub y0: f64,
    pub x1: f64,
    pub y1: f64,
}

impl WordBox {
    pub fn mid_y(&self) -> f64 {
        (self.y0 + self.y1) / 2.0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OcrWord {
    pub text: String,
    pub bbox: WordBox,
    pub confidence: f32,
}

/// Everything an engine recognized in one image.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OcrOutput {
    pub text: String,
    pub words: Vec<OcrWord>,
}

/// Trait for OCR backends.
///
/// Implementations may block for a long time per call. The pipeline never
/// calls one engine concurrently, so backends need not be reentrant.
pub trait OcrEngine: Send + Sync {
    /// Recognize the text of `image` using the engine's `language` code.
    fn recognize(&self, image: &RgbaImage, language: &str) -> Result<OcrOutput, BorelogError>;

    /// Name of this OCR backend (for diagnostics).
    fn backend_name(&self) -> &str;
}
