pub mod config;
pub mod extract;
pub mod lines;
pub mod roi;

use borelog_core::config::{load_config, validate_config, ExtractionConfig};
use borelog_core::error::BorelogError;
use borelog_core::geometry::ViewportTransform;
use borelog_core::render::{load_page_image, PdftoppmRasterizer, Rasterizer};
use borelog_core::text_layer::{
    load_text_runs, PdftotextTextLayer, SavedTextLayer, TextLayerSource, TextRun,
};
use image::RgbaImage;
use std::path::Path;

use crate::PageArgs;

/// A page ready for the pipeline.
pub struct LoadedPage {
    pub bitmap: RgbaImage,
    pub transform: ViewportTransform,
    pub text_runs: Vec<TextRun>,
}

/// Build the run configuration: file (if any), then command-line overrides.
pub fn resolve_config(args: &PageArgs) -> Result<ExtractionConfig, BorelogError> {
    let mut config = match &args.config {
        Some(path) => load_config(path)?,
        None => ExtractionConfig::default(),
    };

    if let Some(depth) = args.total_depth {
        config.total_depth_ft = depth;
    }
    if let Some(v) = args.ink_threshold {
        config.line_detector.ink_threshold = v;
    }
    if let Some(v) = args.row_ink_ratio {
        config.line_detector.row_ink_ratio = v;
    }
    if let Some(v) = args.min_gap {
        config.line_detector.min_gap_px = v;
    }
    if let Some(v) = args.min_thickness {
        config.min_layer_thickness_ft = v;
    }
    if is_pdf(&args.input_file) {
        if let Some(scale) = args.scale {
            config.render_scale = scale;
        }
    }

    validate_config(&config)?;
    Ok(config)
}

/// Load a pre-rendered page image and its text runs.
pub fn load_image_page(args: &PageArgs) -> Result<LoadedPage, BorelogError> {
    let bitmap = load_page_image(&args.input_file)?;
    let text_runs = match &args.text_runs {
        Some(path) => load_text_runs(path)?,
        None => {
            log::warn!(
                "no text runs for {}; header fields will be empty",
                args.input_file.display()
            );
            Vec::new()
        }
    };
    Ok(LoadedPage {
        bitmap,
        transform: ViewportTransform::scale(args.scale.unwrap_or(1.0)),
        text_runs,
    })
}

/// Text layer for a PDF: a saved runs file when given, else `pdftotext`.
pub fn pdf_text_layer(args: &PageArgs) -> Box<dyn TextLayerSource> {
    match &args.text_runs {
        Some(path) => Box::new(SavedTextLayer::new(path)),
        None => Box::new(PdftotextTextLayer::new()),
    }
}

/// The page bitmap alone, for commands that do not need the text layer.
pub fn load_bitmap(args: &PageArgs, config: &ExtractionConfig) -> Result<RgbaImage, BorelogError> {
    if is_pdf(&args.input_file) {
        let pdf_bytes = std::fs::read(&args.input_file)?;
        let rendered =
            PdftoppmRasterizer::new().render(&pdf_bytes, args.page, config.render_scale)?;
        return Ok(rendered.bitmap);
    }
    load_page_image(&args.input_file)
}

pub fn is_pdf(path: &Path) -> bool {
    path.extension()
        .map(|ext| ext.eq_ignore_ascii_case("pdf"))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_pdf() {
        assert!(is_pdf(Path::new("logs/B-12.PDF")));
        assert!(!is_pdf(Path::new("page-1.png")));
        assert!(!is_pdf(Path::new("README")));
    }
}
