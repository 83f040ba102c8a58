pub mod config;
pub mod describe;
pub mod error;
pub mod geometry;
pub mod header;
pub mod layers;
pub mod lines;
pub mod model;
pub mod ocr;
pub mod progress;
pub mod render;
pub mod session;
pub mod spt;
pub mod text_layer;

use image::RgbaImage;

use config::{validate_config, ExtractionConfig};
use error::{BorelogError, Component};
use geometry::ViewportTransform;
use model::{ExtractionResult, ExtractionWarning, PageId, RoiKind, RoiSet};
use ocr::OcrEngine;
use progress::{Phase, RunContext};
use render::Rasterizer;
use text_layer::{TextLayerSource, TextRun};

/// Everything the pipeline reads for one page.
#[derive(Debug, Clone, Copy)]
pub struct PageInput<'a> {
    pub page: PageId,
    pub bitmap: &'a RgbaImage,
    /// Document-to-bitmap transform the page was rasterized with.
    pub transform: ViewportTransform,
    pub text_runs: &'a [TextRun],
    pub rois: &'a RoiSet,
}

/// The result of one run plus the diagnostics that are not part of the
/// exported record.
#[derive(Debug, Clone)]
pub struct ExtractionOutcome {
    pub result: ExtractionResult,
    pub warnings: Vec<ExtractionWarning>,
    /// Divider rows found in the description ROI, in page pixels.
    pub dividers: Vec<f64>,
    /// True when a cancellation cut the OCR passes short.
    pub cancelled: bool,
}

/// Main API entry point: extract the borehole record of one rendered page.
///
/// Fails up front if any of the three ROIs is missing. OCR failures on a
/// single layer or on the SPT column become warnings; an OCR engine that
/// cannot run at all, or an ROI lying outside the bitmap, aborts the run.
pub fn extract_page(
    input: &PageInput<'_>,
    config: &ExtractionConfig,
    engine: &dyn OcrEngine,
    ctx: &RunContext<'_>,
) -> Result<ExtractionOutcome, BorelogError> {
    validate_config(config)?;
    input.rois.require_all()?;

    let (width, height) = input.bitmap.dimensions();
    let header_roi = input.rois.require(RoiKind::Header)?.rect.clamp_to(width, height);
    let desc_roi = input
        .rois
        .require(RoiKind::Description)?
        .rect
        .clamp_to(width, height);
    let spt_roi = input.rois.require(RoiKind::Spt)?.rect.clamp_to(width, height);
    let total_depth_ft = config.total_depth_ft;

    log::info!(
        "extracting page {} ({}x{} px, total depth {} ft) with {}",
        input.page,
        width,
        height,
        total_depth_ft,
        engine.backend_name()
    );

    // Header matching and divider scanning share no data.
    let (boring, dividers) = std::thread::scope(|s| {
        let header = s.spawn(|| {
            header::extract_header(input.text_runs, &header_roi, &input.transform)
        });
        let dividers = lines::detect_dividers(input.bitmap, &desc_roi, &config.line_detector);
        let boring = header
            .join()
            .unwrap_or_else(|panic| std::panic::resume_unwind(panic));
        (boring, dividers)
    });
    let dividers = dividers?;
    ctx.report(Phase::Header, 1, 1);
    ctx.report(Phase::Lines, 1, 1);

    let intervals = layers::build_layers(
        &dividers,
        &desc_roi,
        total_depth_ft,
        config.min_layer_thickness_ft,
    );
    ctx.report(Phase::Layers, 1, 1);
    log::info!(
        "page {}: {} dividers -> {} layers",
        input.page,
        dividers.len(),
        intervals.len()
    );

    let described = describe::describe_layers(
        input.bitmap,
        &desc_roi,
        &intervals,
        total_depth_ft,
        engine,
        &config.language,
        ctx,
    )?;
    let mut warnings = described.warnings;
    let cancelled = described.cancelled || ctx.is_cancelled();

    let spt = if cancelled {
        log::info!("page {}: SPT pass skipped after cancellation", input.page);
        Vec::new()
    } else {
        match spt::extract_spt(
            input.bitmap,
            &spt_roi,
            &desc_roi,
            total_depth_ft,
            engine,
            &config.language,
        ) {
            Ok(readings) => readings,
            Err(e) if e.is_engine_unavailable() => {
                return Err(BorelogError::OcrUnavailable {
                    component: Component::SptExtractor,
                    layer: None,
                    reason: e.to_string(),
                });
            }
            Err(e @ BorelogError::CropOutOfBounds { .. }) => return Err(e),
            Err(e) => {
                log::warn!("SPT OCR failed on page {}: {e}", input.page);
                warnings.push(ExtractionWarning {
                    component: Component::SptExtractor,
                    layer: None,
                    roi: Some(RoiKind::Spt),
                    message: e.to_string(),
                });
                Vec::new()
            }
        }
    };
    ctx.report(Phase::Spt, 1, 1);

    let result = ExtractionResult {
        page: input.page,
        boring,
        total_depth_ft: model::round2(total_depth_ft),
        layers: described.layers,
        spt,
    };
    ctx.report(Phase::Done, 1, 1);

    Ok(ExtractionOutcome {
        result,
        warnings,
        dividers,
        cancelled,
    })
}

/// Rasterize `page` of a PDF, read its text layer and run [`extract_page`].
#[allow(clippy::too_many_arguments)]
pub fn extract_pdf_page(
    pdf_bytes: &[u8],
    page: PageId,
    rois: &RoiSet,
    config: &ExtractionConfig,
    rasterizer: &dyn Rasterizer,
    text_layer: &dyn TextLayerSource,
    engine: &dyn OcrEngine,
    ctx: &RunContext<'_>,
) -> Result<ExtractionOutcome, BorelogError> {
    // Missing regions are reported before any expensive work.
    validate_config(config)?;
    rois.require_all()?;

    let rendered = rasterizer.render(pdf_bytes, page, config.render_scale)?;
    let text_runs = text_layer.text_runs(pdf_bytes, page)?;

    let input = PageInput {
        page,
        bitmap: &rendered.bitmap,
        transform: rendered.transform,
        text_runs: &text_runs,
        rois,
    };
    extract_page(&input, config, engine, ctx)
}
