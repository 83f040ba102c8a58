//! Coordinate mapping between page pixels, physical depth and document space.
//!
//! Page-pixel space is the coordinate system of the rendered bitmap: origin at
//! the top-left corner, y growing downwards, one unit per bitmap pixel at the
//! render scale the page was rasterized with. Every ROI and every detected
//! divider is expressed in this space.

use image::{imageops, RgbaImage};
use serde::{Deserialize, Serialize};

/// Axis-aligned rectangle in page-pixel space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
}

/// Integer crop window inside a bitmap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelRect {
    pub x: u32,
    pub y: u32,
    pub w: u32,
    pub h: u32,
}

impl Rect {
    pub fn new(x: f64, y: f64, w: f64, h: f64) -> Self {
        Rect { x, y, w, h }
    }

    /// Rectangle spanned by two opposite corners, in any order.
    pub fn from_corners(a: (f64, f64), b: (f64, f64)) -> Self {
        Rect {
            x: a.0.min(b.0),
            y: a.1.min(b.1),
            w: (a.0 - b.0).abs(),
            h: (a.1 - b.1).abs(),
        }
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.h
    }

    pub fn right(&self) -> f64 {
        self.x + self.w
    }

    /// Inclusive point containment.
    pub fn contains(&self, x: f64, y: f64) -> bool {
        x >= self.x && x <= self.right() && y >= self.y && y <= self.bottom()
    }

    /// Clamp into a `width` x `height` page, keeping at least one pixel on
    /// each axis.
    pub fn clamp_to(&self, width: u32, height: u32) -> Rect {
        let (pw, ph) = (f64::from(width), f64::from(height));
        let x = self.x.clamp(0.0, pw);
        let y = self.y.clamp(0.0, ph);
        Rect {
            x,
            y,
            w: self.w.min(pw - x).max(1.0),
            h: self.h.min(ph - y).max(1.0),
        }
    }

    /// Integer crop window covering this rect inside a `width` x `height`
    /// bitmap, or `None` when the two do not overlap.
    pub fn pixel_bounds(&self, width: u32, height: u32) -> Option<PixelRect> {
        if !(self.w > 0.0 && self.h > 0.0) {
            return None;
        }
        let x0 = self.x.floor().max(0.0);
        let y0 = self.y.floor().max(0.0);
        let x1 = self.right().ceil().min(f64::from(width));
        let y1 = self.bottom().ceil().min(f64::from(height));
        if x1 <= x0 || y1 <= y0 {
            return None;
        }
        Some(PixelRect {
            x: x0 as u32,
            y: y0 as u32,
            w: (x1 - x0) as u32,
            h: (y1 - y0) as u32,
        })
    }
}

/// Copy the `bounds` window out of `bitmap`.
pub fn crop(bitmap: &RgbaImage, bounds: PixelRect) -> RgbaImage {
    imageops::crop_imm(bitmap, bounds.x, bounds.y, bounds.w, bounds.h).to_image()
}

pub fn clamp01(v: f64) -> f64 {
    if v.is_nan() {
        0.0
    } else {
        v.clamp(0.0, 1.0)
    }
}

/// Depth in feet of page row `y`, using `roi` as the depth calibration:
/// its top edge is depth 0 and its bottom edge is `total_depth_ft`.
pub fn depth_at(y: f64, roi: &Rect, total_depth_ft: f64) -> f64 {
    clamp01((y - roi.y) / roi.h) * total_depth_ft
}

/// Page row of `depth_ft` under the same calibration as [`depth_at`].
pub fn y_at(depth_ft: f64, roi: &Rect, total_depth_ft: f64) -> f64 {
    roi.y + clamp01(depth_ft / total_depth_ft) * roi.h
}

/// Affine map from document space to page-pixel space, stored in the usual
/// `[a, b, c, d, e, f]` form: `x' = a*x + c*y + e`, `y' = b*x + d*y + f`.
///
/// This must be the exact transform the rasterizer used for the bitmap the
/// ROIs were drawn on.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewportTransform(pub [f64; 6]);

impl ViewportTransform {
    /// Uniform scale, for document spaces whose origin is already top-left.
    pub fn scale(scale: f64) -> Self {
        ViewportTransform([scale, 0.0, 0.0, scale, 0.0, 0.0])
    }

    /// Scale plus a y-flip, for PDF user space (origin bottom-left) on a page
    /// `page_height_pt` points tall.
    pub fn pdf_user_space(scale: f64, page_height_pt: f64) -> Self {
        ViewportTransform([scale, 0.0, 0.0, -scale, 0.0, page_height_pt * scale])
    }

    pub fn apply(&self, x: f64, y: f64) -> (f64, f64) {
        let [a, b, c, d, e, f] = self.0;
        (a * x + c * y + e, b * x + d * y + f)
    }
}

impl Default for ViewportTransform {
    fn default() -> Self {
        ViewportTransform::scale(1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_depth_at_edges() {
        let roi = Rect::new(40.0, 200.0, 300.0, 800.0);
        assert_eq!(depth_at(200.0, &roi, 36.0), 0.0);
        assert_eq!(depth_at(1000.0, &roi, 36.0), 36.0);
        assert_eq!(depth_at(600.0, &roi, 36.0), 18.0);
    }

    #[test]
    fn test_depth_at_clamps_outside_roi() {
        let roi = Rect::new(0.0, 100.0, 10.0, 100.0);
        assert_eq!(depth_at(50.0, &roi, 20.0), 0.0);
        assert_eq!(depth_at(500.0, &roi, 20.0), 20.0);
    }

    #[test]
    fn test_depth_round_trip() {
        let roi = Rect::new(12.5, 333.3, 90.0, 777.7);
        let total = 41.5;
        let mut y = roi.y;
        while y <= roi.bottom() {
            let back = y_at(depth_at(y, &roi, total), &roi, total);
            assert!((back - y).abs() < 1e-9, "{y} -> {back}");
            y += 13.7;
        }
    }

    #[test]
    fn test_from_corners_normalizes() {
        let r = Rect::from_corners((50.0, 80.0), (10.0, 20.0));
        assert_eq!(r, Rect::new(10.0, 20.0, 40.0, 60.0));
    }

    #[test]
    fn test_clamp_to_page() {
        let r = Rect::new(-10.0, 90.0, 50.0, 50.0).clamp_to(100, 100);
        assert_eq!(r, Rect::new(0.0, 90.0, 50.0, 10.0));

        let r = Rect::new(120.0, 10.0, 5.0, 5.0).clamp_to(100, 100);
        assert_eq!(r.x, 100.0);
        assert_eq!(r.w, 1.0);
    }

    #[test]
    fn test_contains_is_inclusive() {
        let r = Rect::new(10.0, 10.0, 20.0, 20.0);
        assert!(r.contains(10.0, 10.0));
        assert!(r.contains(30.0, 30.0));
        assert!(!r.contains(30.1, 15.0));
    }

    #[test]
    fn test_pixel_bounds() {
        let r = Rect::new(10.4, 20.6, 30.2, 10.0);
        assert_eq!(
            r.pixel_bounds(100, 100),
            Some(PixelRect {
                x: 10,
                y: 20,
                w: 31,
                h: 11
            })
        );
        assert_eq!(Rect::new(200.0, 0.0, 10.0, 10.0).pixel_bounds(100, 100), None);
        assert_eq!(
            Rect::new(95.0, 95.0, 10.0, 10.0).pixel_bounds(100, 100),
            Some(PixelRect {
                x: 95,
                y: 95,
                w: 5,
                h: 5
            })
        );
    }

    #[test]
    fn test_pdf_user_space_flips_y() {
        let t = ViewportTransform::pdf_user_space(2.0, 792.0);
        assert_eq!(t.apply(0.0, 792.0), (0.0, 0.0));
        assert_eq!(t.apply(100.0, 0.0), (200.0, 1584.0));
    }

    proptest! {
        #[test]
        fn prop_y_depth_round_trip(
            roi_y in 0.0f64..2000.0,
            roi_h in 1.0f64..3000.0,
            total in 0.5f64..300.0,
            t in 0.0f64..=1.0,
        ) {
            let roi = Rect::new(0.0, roi_y, 10.0, roi_h);
            let y = roi_y + t * roi_h;
            let back = y_at(depth_at(y, &roi, total), &roi, total);
            prop_assert!((back - y).abs() < 1e-6);
        }
    }
}
