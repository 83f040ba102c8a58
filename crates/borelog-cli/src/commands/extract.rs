use borelog_core::error::BorelogError;
use borelog_core::ocr::tesseract::TesseractEngine;
use borelog_core::progress::{ProgressEvent, ProgressSink, RunContext};
use borelog_core::render::PdftoppmRasterizer;
use borelog_core::session::Session;
use borelog_core::{extract_page, extract_pdf_page, PageInput};
use std::path::PathBuf;

use crate::commands::{is_pdf, load_image_page, pdf_text_layer, resolve_config};
use crate::output;
use crate::PageArgs;

/// Forwards pipeline progress to the log.
struct LogProgress;

impl ProgressSink for LogProgress {
    fn report(&self, event: ProgressEvent) {
        log::debug!(
            "progress: {:?} {}/{}",
            event.phase,
            event.completed,
            event.total
        );
    }
}

pub fn run(
    args: &PageArgs,
    language: Option<String>,
    psm: Option<u8>,
    output_format: &str,
    output_file: Option<PathBuf>,
    save: bool,
) -> Result<(), BorelogError> {
    let mut config = resolve_config(args)?;
    if let Some(lang) = language {
        config.language = lang;
    }

    let mut session = Session::load_or_default(&args.rois)?;
    let rois = session.rois(args.page).cloned().unwrap_or_default();

    let engine = match psm {
        Some(psm) => TesseractEngine::with_psm(psm),
        None => TesseractEngine::new(),
    };
    let progress = LogProgress;
    let ctx = RunContext::default().with_progress(&progress);

    let outcome = if is_pdf(&args.input_file) {
        let pdf_bytes = std::fs::read(&args.input_file)?;
        let text_layer = pdf_text_layer(args);
        extract_pdf_page(
            &pdf_bytes,
            args.page,
            &rois,
            &config,
            &PdftoppmRasterizer::new(),
            text_layer.as_ref(),
            &engine,
            &ctx,
        )?
    } else {
        rois.require_all()?;
        let page = load_image_page(args)?;
        let input = PageInput {
            page: args.page,
            bitmap: &page.bitmap,
            transform: page.transform,
            text_runs: &page.text_runs,
            rois: &rois,
        };
        extract_page(&input, &config, &engine, &ctx)?
    };

    for w in &outcome.warnings {
        eprintln!("  warning: {w}");
    }

    match output_file {
        Some(path) => {
            // Always write JSON when saving to file
            output::json::write(&outcome.result, &path)?;
            eprintln!(
                "Extracted {} layer(s) and {} SPT reading(s) from page {}, written to {}",
                outcome.result.layers.len(),
                outcome.result.spt.len(),
                args.page,
                path.display()
            );
        }
        None => match output_format {
            "json" => output::json::print(&outcome.result)?,
            _ => output::table::print(&outcome.result),
        },
    }

    if save {
        session.store_result(outcome.result);
        session.save(&args.rois)?;
        eprintln!("Result stored in {}", args.rois.display());
    }

    Ok(())
}
