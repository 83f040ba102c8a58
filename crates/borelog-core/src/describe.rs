use image::RgbaImage;
use lazy_static::lazy_static;
use regex::Regex;

use crate::error::{BorelogError, Component};
use crate::geometry::{crop, y_at, Rect};
use crate::model::{ExtractionWarning, Layer, LayerInterval, RoiKind};
use crate::ocr::OcrEngine;
use crate::progress::{Phase, RunContext};

/// Minimum crop height handed to the OCR engine, in pixels.
const MIN_CROP_HEIGHT_PX: f64 = 2.0;

lazy_static! {
    static ref RE_SPACE_BEFORE_NEWLINE: Regex = Regex::new(r"[ \t]+\n").unwrap();
}

/// Layers with their OCR'd descriptions, plus what went wrong along the way.
#[derive(Debug, Clone, Default)]
pub struct DescribedLayers {
    pub layers: Vec<Layer>,
    pub warnings: Vec<ExtractionWarning>,
    /// Set when the run was cancelled before every layer was recognized;
    /// layers after that point carry empty descriptions.
    pub cancelled: bool,
}

/// Page rectangle of the description ROI that covers `interval`.
pub fn layer_crop_rect(roi: &Rect, interval: &LayerInterval, total_depth_ft: f64) -> Rect {
    let top = y_at(interval.from_ft, roi, total_depth_ft);
    let bottom = y_at(interval.to_ft, roi, total_depth_ft);
    Rect::new(roi.x, top, roi.w, (bottom - top).max(MIN_CROP_HEIGHT_PX))
}

/// OCR each layer's slice of the description ROI, in order.
///
/// A recognition failure on one slice leaves that layer's description empty
/// and records a warning; only an unusable engine or a slice outside the
/// bitmap aborts the whole pass.
pub fn describe_layers(
    bitmap: &RgbaImage,
    roi: &Rect,
    intervals: &[LayerInterval],
    total_depth_ft: f64,
    engine: &dyn OcrEngine,
    language: &str,
    ctx: &RunContext<'_>,
) -> Result<DescribedLayers, BorelogError> {
    let mut out = DescribedLayers::default();
    let total = intervals.len();

    for (idx, interval) in intervals.iter().enumerate() {
        if !out.cancelled && ctx.is_cancelled() {
            log::info!("description OCR cancelled after {idx} of {total} layers");
            out.cancelled = true;
        }
        if out.cancelled {
            out.layers.push(Layer::new(*interval, String::new()));
            continue;
        }

        let rect = layer_crop_rect(roi, interval, total_depth_ft)
            .clamp_to(bitmap.width(), bitmap.height());
        let bounds = rect
            .pixel_bounds(bitmap.width(), bitmap.height())
            .ok_or(BorelogError::CropOutOfBounds {
                component: Component::DescriptionOcr,
                roi: RoiKind::Description,
                layer: Some(idx),
                width: bitmap.width(),
                height: bitmap.height(),
            })?;

        let description = match engine.recognize(&crop(bitmap, bounds), language) {
            Ok(output) => clean_description(&output.text),
            Err(e) if e.is_engine_unavailable() => {
                return Err(BorelogError::OcrUnavailable {
                    component: Component::DescriptionOcr,
                    layer: Some(idx),
                    reason: e.to_string(),
                });
            }
            Err(e) => {
                log::warn!("description OCR failed for layer {idx}: {e}");
                out.warnings.push(ExtractionWarning {
                    component: Component::DescriptionOcr,
                    layer: Some(idx),
                    roi: Some(RoiKind::Description),
                    message: e.to_string(),
                });
                String::new()
            }
        };

        out.layers.push(Layer::new(*interval, description));
        ctx.report(Phase::Description, idx + 1, total);
    }

    Ok(out)
}

/// Trim OCR text and drop the stray whitespace engines leave before line breaks.
pub fn clean_description(text: &str) -> String {
    RE_SPACE_BEFORE_NEWLINE
        .replace_all(text, "\n")
        .trim()
        .to_string()
}
