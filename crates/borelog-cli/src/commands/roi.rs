use borelog_core::error::BorelogError;
use borelog_core::geometry::Rect;
use borelog_core::model::{RoiKind, RoiSet};
use borelog_core::render::load_page_image;
use borelog_core::session::Session;
use std::path::Path;

fn parse_kind(kind: &str) -> Result<RoiKind, BorelogError> {
    RoiKind::from_str_loose(kind).ok_or_else(|| {
        BorelogError::InvalidRoi(format!(
            "unknown ROI kind '{kind}' (expected header, description or spt)"
        ))
    })
}

pub fn set(
    session_file: &Path,
    page: u32,
    kind: &str,
    [x, y, w, h]: [f64; 4],
    page_image: Option<&Path>,
) -> Result<(), BorelogError> {
    let kind = parse_kind(kind)?;
    let page_size = match page_image {
        Some(path) => Some(load_page_image(path)?.dimensions()),
        None => None,
    };

    let mut session = Session::load_or_default(session_file)?;
    let roi = session.set_roi(page, kind, Rect::new(x, y, w, h), page_size)?;
    println!(
        "Page {page}: {} ROI {} at ({:.1}, {:.1}) {:.1}x{:.1}",
        roi.kind, roi.id, roi.rect.x, roi.rect.y, roi.rect.w, roi.rect.h
    );
    session.save(session_file)?;
    Ok(())
}

pub fn clear(session_file: &Path, page: u32, kind: Option<&str>) -> Result<(), BorelogError> {
    let kind = kind.map(parse_kind).transpose()?;
    let mut session = Session::load_or_default(session_file)?;
    session.clear_rois(page, kind);
    session.save(session_file)?;
    match kind {
        Some(kind) => println!("Page {page}: cleared {kind} ROI"),
        None => println!("Page {page}: cleared all ROIs"),
    }
    Ok(())
}

pub fn list(session_file: &Path, page: Option<u32>) -> Result<(), BorelogError> {
    let session = Session::load_or_default(session_file)?;
    if session.pages.is_empty() {
        println!("No ROIs in {}", session_file.display());
        return Ok(());
    }

    for (id, state) in &session.pages {
        if page.is_some_and(|p| p != *id) {
            continue;
        }
        let status = if state.result.is_some() {
            " (extracted)"
        } else {
            ""
        };
        println!("Page {id}{status}:");
        print_rois(&state.rois);
        println!();
    }
    Ok(())
}

fn print_rois(rois: &RoiSet) {
    for kind in RoiKind::ALL {
        match rois.get(kind) {
            Some(roi) => println!(
                "  {:<12} {:<7} x={:<8.1} y={:<8.1} w={:<8.1} h={:.1}",
                kind.to_string(),
                roi.id,
                roi.rect.x,
                roi.rect.y,
                roi.rect.w,
                roi.rect.h
            ),
            None => println!("  {:<12} (not set)", kind.to_string()),
        }
    }
}
