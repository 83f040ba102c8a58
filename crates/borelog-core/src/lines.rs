use image::{GenericImageView, Rgba, RgbaImage};
use serde::{Deserialize, Serialize};

use crate::error::{BorelogError, Component};
use crate::geometry::Rect;
use crate::model::RoiKind;

/// Pixels more transparent than this never count as ink.
const ALPHA_NEGLIGIBLE: u8 = 8;

/// Tuning knobs for horizontal divider detection.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LineDetectorConfig {
    /// Luminance (0-255) below which a pixel counts as ink.
    pub ink_threshold: u8,
    /// Fraction of a row that must be ink for the row to be a divider candidate.
    pub row_ink_ratio: f64,
    /// Lines closer than this to the previously kept line are dropped.
    pub min_gap_px: f64,
}

impl Default for LineDetectorConfig {
    fn default() -> Self {
        LineDetectorConfig {
            ink_threshold: 170,
            row_ink_ratio: 0.45,
            min_gap_px: 10.0,
        }
    }
}

/// Detect horizontal dividers inside `roi` of the page `bitmap`.
///
/// Returns page-pixel rows, strictly ascending, at least `min_gap_px` apart.
/// An ROI without any divider-strength row yields an empty list.
pub fn detect_dividers(
    bitmap: &RgbaImage,
    roi: &Rect,
    config: &LineDetectorConfig,
) -> Result<Vec<f64>, BorelogError> {
    let bounds = roi
        .pixel_bounds(bitmap.width(), bitmap.height())
        .ok_or(BorelogError::CropOutOfBounds {
            component: Component::LineDetector,
            roi: RoiKind::Description,
            layer: None,
            width: bitmap.width(),
            height: bitmap.height(),
        })?;

    let view = bitmap.view(bounds.x, bounds.y, bounds.w, bounds.h);
    let candidates: Vec<bool> = (0..bounds.h)
        .map(|row| {
            let ink = (0..bounds.w)
                .filter(|&col| is_ink(&view.get_pixel(col, row), config.ink_threshold))
                .count();
            ink as f64 / f64::from(bounds.w) >= config.row_ink_ratio
        })
        .collect();

    let merged = merge_runs(&candidates);
    let lines: Vec<f64> = enforce_min_gap(&merged, config.min_gap_px)
        .into_iter()
        .map(|row| row + f64::from(bounds.y))
        .collect();

    log::debug!(
        "line detector: {} candidate rows, {} runs, {} lines in {}x{} crop at y={}",
        candidates.iter().filter(|c| **c).count(),
        merged.len(),
        lines.len(),
        bounds.w,
        bounds.h,
        bounds.y
    );

    Ok(lines)
}

/// Rec. 709 relative luminance on the 0-255 scale.
pub fn luminance(px: &Rgba<u8>) -> f64 {
    let [r, g, b, _] = px.0;
    0.2126 * f64::from(r) + 0.7152 * f64::from(g) + 0.0722 * f64::from(b)
}

fn is_ink(px: &Rgba<u8>, ink_threshold: u8) -> bool {
    px.0[3] >= ALPHA_NEGLIGIBLE && luminance(px) < f64::from(ink_threshold)
}

/// Collapse each run of consecutive candidate rows to its midpoint.
fn merge_runs(candidates: &[bool]) -> Vec<f64> {
    let mut lines = Vec::new();
    let mut run_start: Option<usize> = None;

    for (row, &is_candidate) in candidates.iter().enumerate() {
        match (is_candidate, run_start) {
            (true, None) => run_start = Some(row),
            (false, Some(start)) => {
                lines.push((start + row - 1) as f64 / 2.0);
                run_start = None;
            }
            _ => {}
        }
    }
    if let Some(start) = run_start {
        lines.push((start + candidates.len() - 1) as f64 / 2.0);
    }

    lines
}

/// Keep the first line of every cluster whose members sit closer than `min_gap`.
fn enforce_min_gap(lines: &[f64], min_gap: f64) -> Vec<f64> {
    let mut kept: Vec<f64> = Vec::with_capacity(lines.len());
    for &line in lines {
        match kept.last() {
            Some(&last) if line - last < min_gap => {}
            _ => kept.push(line),
        }
    }
    kept
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const WHITE: Rgba<u8> = Rgba([255, 255, 255, 255]);
    const BLACK: Rgba<u8> = Rgba([0, 0, 0, 255]);

    fn page_with_rows(width: u32, height: u32, dark_rows: &[u32]) -> RgbaImage {
        let mut img = RgbaImage::from_pixel(width, height, WHITE);
        for &row in dark_rows {
            for x in 0..width {
                img.put_pixel(x, row, BLACK);
            }
        }
        img
    }

    #[test]
    fn test_adjacent_rows_merge_to_midpoint() {
        let img = page_with_rows(50, 800, &[100, 101, 102, 103, 400]);
        let roi = Rect::new(0.0, 0.0, 50.0, 800.0);
        let lines = detect_dividers(&img, &roi, &LineDetectorConfig::default()).unwrap();
        assert_eq!(lines, vec![101.5, 400.0]);
    }

    #[test]
    fn test_positions_are_page_rows() {
        let img = page_with_rows(100, 300, &[150]);
        let roi = Rect::new(20.0, 100.0, 60.0, 150.0);
        let lines = detect_dividers(&img, &roi, &LineDetectorConfig::default()).unwrap();
        assert_eq!(lines, vec![150.0]);
    }

    #[test]
    fn test_close_lines_collapse_to_first() {
        let img = page_with_rows(40, 200, &[50, 55, 58, 70]);
        let roi = Rect::new(0.0, 0.0, 40.0, 200.0);
        let lines = detect_dividers(&img, &roi, &LineDetectorConfig::default()).unwrap();
        assert_eq!(lines, vec![50.0, 70.0]);
        for pair in lines.windows(2) {
            assert!(pair[1] - pair[0] >= 10.0);
        }
    }

    #[test]
    fn test_partial_rows_below_ratio_ignored() {
        let mut img = RgbaImage::from_pixel(100, 100, WHITE);
        // 40% coverage: text, not a divider
        for x in 0..40 {
            img.put_pixel(x, 30, BLACK);
        }
        // 50% coverage: divider
        for x in 0..50 {
            img.put_pixel(x, 60, BLACK);
        }
        let roi = Rect::new(0.0, 0.0, 100.0, 100.0);
        let lines = detect_dividers(&img, &roi, &LineDetectorConfig::default()).unwrap();
        assert_eq!(lines, vec![60.0]);
    }

    #[test]
    fn test_transparent_pixels_are_not_ink() {
        let mut img = RgbaImage::from_pixel(20, 20, WHITE);
        for x in 0..20 {
            img.put_pixel(x, 10, Rgba([0, 0, 0, 0]));
        }
        let roi = Rect::new(0.0, 0.0, 20.0, 20.0);
        let lines = detect_dividers(&img, &roi, &LineDetectorConfig::default()).unwrap();
        assert!(lines.is_empty());
    }

    #[test]
    fn test_gray_threshold() {
        let mut img = RgbaImage::from_pixel(10, 10, WHITE);
        for x in 0..10 {
            img.put_pixel(x, 3, Rgba([160, 160, 160, 255]));
            img.put_pixel(x, 7, Rgba([180, 180, 180, 255]));
        }
        let roi = Rect::new(0.0, 0.0, 10.0, 10.0);
        let config = LineDetectorConfig {
            min_gap_px: 1.0,
            ..LineDetectorConfig::default()
        };
        assert_eq!(detect_dividers(&img, &roi, &config).unwrap(), vec![3.0]);
    }

    #[test]
    fn test_blank_roi_yields_no_lines() {
        let img = page_with_rows(30, 30, &[]);
        let roi = Rect::new(0.0, 0.0, 30.0, 30.0);
        assert!(detect_dividers(&img, &roi, &LineDetectorConfig::default())
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_single_row_strip_is_all_or_nothing() {
        let img = page_with_rows(30, 30, &[12]);
        let on = Rect::new(0.0, 12.0, 30.0, 1.0);
        let off = Rect::new(0.0, 13.0, 30.0, 1.0);
        let config = LineDetectorConfig::default();
        assert_eq!(detect_dividers(&img, &on, &config).unwrap(), vec![12.0]);
        assert!(detect_dividers(&img, &off, &config).unwrap().is_empty());
    }

    #[test]
    fn test_roi_outside_bitmap_is_error() {
        let img = page_with_rows(30, 30, &[]);
        let roi = Rect::new(100.0, 100.0, 10.0, 10.0);
        assert!(matches!(
            detect_dividers(&img, &roi, &LineDetectorConfig::default()),
            Err(BorelogError::CropOutOfBounds {
                component: Component::LineDetector,
                ..
            })
        ));
    }

    #[test]
    fn test_run_touching_bottom_edge() {
        assert_eq!(merge_runs(&[false, true, true]), vec![1.5]);
        assert_eq!(merge_runs(&[true]), vec![0.0]);
    }

    proptest! {
        #[test]
        fn prop_min_gap_keeps_spaced_subset(
            rows in prop::collection::btree_set(0u32..4000, 0..60),
            min_gap in 0.0f64..50.0,
        ) {
            let lines: Vec<f64> = rows.iter().map(|&r| f64::from(r) / 2.0).collect();
            let kept = enforce_min_gap(&lines, min_gap);

            prop_assert_eq!(kept.first(), lines.first());
            for pair in kept.windows(2) {
                prop_assert!(pair[1] > pair[0]);
                prop_assert!(pair[1] - pair[0] >= min_gap);
            }
            for line in &lines {
                if !kept.contains(line) {
                    prop_assert!(kept.iter().any(|k| k < line && line - k < min_gap));
                }
            }
        }

        #[test]
        fn prop_detected_dividers_spaced_inside_roi(
            height in 1u32..300,
            dark in prop::collection::vec(0u32..300, 0..40),
            min_gap in 0.0f64..30.0,
        ) {
            let dark: Vec<u32> = dark.into_iter().filter(|&r| r < height).collect();
            let img = page_with_rows(16, height, &dark);
            let roi = Rect::new(0.0, 0.0, 16.0, f64::from(height));
            let config = LineDetectorConfig {
                min_gap_px: min_gap,
                ..LineDetectorConfig::default()
            };
            let lines = detect_dividers(&img, &roi, &config).unwrap();

            prop_assert_eq!(lines.is_empty(), dark.is_empty());
            for pair in lines.windows(2) {
                prop_assert!(pair[1] > pair[0]);
                prop_assert!(pair[1] - pair[0] >= min_gap);
            }
            for y in &lines {
                prop_assert!(*y >= 0.0 && *y < f64::from(height));
            }
        }
    }
}
