use borelog_core::error::BorelogError;
use borelog_core::layers::build_layers;
use borelog_core::lines::detect_dividers;
use borelog_core::model::{round2, RoiKind};
use borelog_core::session::Session;

use crate::commands::{load_bitmap, resolve_config};
use crate::PageArgs;

/// Print divider rows and the layer intervals they produce, without OCR.
pub fn run(args: &PageArgs) -> Result<(), BorelogError> {
    let config = resolve_config(args)?;
    let session = Session::load_or_default(&args.rois)?;
    let rois = session.rois(args.page).cloned().unwrap_or_default();
    let desc = rois.require(RoiKind::Description)?;

    let bitmap = load_bitmap(args, &config)?;
    let roi = desc.rect.clamp_to(bitmap.width(), bitmap.height());
    let dividers = detect_dividers(&bitmap, &roi, &config.line_detector)?;
    let layers = build_layers(
        &dividers,
        &roi,
        config.total_depth_ft,
        config.min_layer_thickness_ft,
    );

    println!("Dividers ({}):", dividers.len());
    for y in &dividers {
        println!("  y = {y:.1} px");
    }
    println!();

    println!("Layers ({}):", layers.len());
    for (i, layer) in layers.iter().enumerate() {
        println!(
            "  {:>2}  {:>7} - {:<7} ft",
            i + 1,
            round2(layer.from_ft),
            round2(layer.to_ft)
        );
    }

    Ok(())
}
