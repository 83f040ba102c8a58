use image::RgbaImage;
use std::collections::HashSet;

use crate::error::{BorelogError, Component};
use crate::geometry::{crop, depth_at, Rect};
use crate::model::{round2, RoiKind, SptReading};
use crate::ocr::{OcrEngine, OcrWord};

/// OCR the SPT column once and turn its integer words into blow counts.
///
/// Depths are read against the description ROI's calibration: the SPT column
/// shares the description column's depth axis, so its own height is not used.
pub fn extract_spt(
    bitmap: &RgbaImage,
    spt_roi: &Rect,
    description_roi: &Rect,
    total_depth_ft: f64,
    engine: &dyn OcrEngine,
    language: &str,
) -> Result<Vec<SptReading>, BorelogError> {
    let bounds = spt_roi
        .clamp_to(bitmap.width(), bitmap.height())
        .pixel_bounds(bitmap.width(), bitmap.height())
        .ok_or(BorelogError::CropOutOfBounds {
            component: Component::SptExtractor,
            roi: RoiKind::Spt,
            layer: None,
            width: bitmap.width(),
            height: bitmap.height(),
        })?;

    let output = engine.recognize(&crop(bitmap, bounds), language)?;
    let readings = readings_from_words(
        &output.words,
        f64::from(bounds.y),
        description_roi,
        total_depth_ft,
    );
    log::debug!(
        "SPT extractor: {} of {} words kept as blow counts",
        readings.len(),
        output.words.len()
    );
    Ok(readings)
}

/// Map recognized words to depth-sorted, de-duplicated SPT readings.
///
/// `crop_top` is the page row of the crop's first pixel row, since word
/// boxes are relative to the crop.
pub fn readings_from_words(
    words: &[OcrWord],
    crop_top: f64,
    description_roi: &Rect,
    total_depth_ft: f64,
) -> Vec<SptReading> {
    let mut readings: Vec<SptReading> = words
        .iter()
        .filter_map(|word| {
            let n = blow_count(&word.text)?;
            let y = crop_top + word.bbox.mid_y();
            Some(SptReading {
                depth_ft: round2(depth_at(y, description_roi, total_depth_ft)),
                n,
            })
        })
        .collect();

    readings.sort_by(|a, b| a.depth_ft.cmp(&b.depth_ft));
    let mut seen = HashSet::with_capacity(readings.len());
    readings.retain(|r| seen.insert((r.depth_ft, r.n)));
    readings
}

/// Digits of an OCR word as a blow count; `None` if it has no digits.
fn blow_count(text: &str) -> Option<u32> {
    let digits: String = text.chars().filter(char::is_ascii_digit).collect();
    if digits.is_empty() {
        return None;
    }
    match digits.parse() {
        Ok(n) => Some(n),
        Err(e) => {
            log::debug!("SPT extractor: dropped blow count {text:?}: {e}");
            None
        }
    }
}
