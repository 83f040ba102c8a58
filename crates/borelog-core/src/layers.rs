use crate::geometry::{depth_at, Rect};
use crate::model::LayerInterval;

/// Thinnest layer kept by default, in feet.
pub const DEFAULT_MIN_THICKNESS_FT: f64 = 0.10;

/// Turn divider rows inside the description ROI into contiguous depth layers.
///
/// Dividers that would produce a layer thinner than `min_thickness_ft` are
/// skipped, which absorbs near-duplicate detections. The trailing interval
/// down to `total_depth_ft` follows the same rule, so a final sliver thinner
/// than the minimum is dropped and the last layer then ends above the total
/// depth.
pub fn build_layers(
    dividers: &[f64],
    roi: &Rect,
    total_depth_ft: f64,
    min_thickness_ft: f64,
) -> Vec<LayerInterval> {
    let mut depths: Vec<f64> = dividers
        .iter()
        .map(|&y| depth_at(y, roi, total_depth_ft))
        .collect();
    depths.sort_by(f64::total_cmp);

    let mut layers = Vec::with_capacity(depths.len() + 1);
    let mut from = 0.0;
    for to in depths.into_iter().chain(std::iter::once(total_depth_ft)) {
        if to - from >= min_thickness_ft && to > from {
            layers.push(LayerInterval { from_ft: from, to_ft: to });
            from = to;
        }
    }

    if let Some(last) = layers.last() {
        if last.to_ft < total_depth_ft {
            log::debug!(
                "layer builder: dropped {:.3} ft sliver below {:.3} ft",
                total_depth_ft - last.to_ft,
                last.to_ft
            );
        }
    }

    layers
}
