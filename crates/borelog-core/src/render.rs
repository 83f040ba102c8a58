use image::RgbaImage;
use std::io::Write;
use std::path::Path;
use std::process::Command;

use crate::error::{BorelogError, Component};
use crate::geometry::ViewportTransform;
use crate::model::PageId;

/// PDF points per inch; a render scale of 1.0 is 72 dpi.
const POINTS_PER_INCH: f64 = 72.0;

/// A rasterized page and the transform that produced it.
#[derive(Debug, Clone)]
pub struct RenderedPage {
    pub bitmap: RgbaImage,
    /// Maps the text layer's document space onto `bitmap` pixels.
    pub transform: ViewportTransform,
}

/// Trait for page rasterization backends.
pub trait Rasterizer: Send + Sync {
    fn render(&self, pdf_bytes: &[u8], page: PageId, scale: f64)
        -> Result<RenderedPage, BorelogError>;

    /// Name of this backend (for diagnostics).
    fn backend_name(&self) -> &str;
}

/// Load an already-rasterized page (PNG or JPEG) as RGBA.
pub fn load_page_image(path: &Path) -> Result<RgbaImage, BorelogError> {
    Ok(image::open(path)?.to_rgba8())
}

/// Rasterizer backend using `pdftoppm` (from poppler-utils).
///
/// Its output pairs with [`PdftotextTextLayer`](crate::text_layer::PdftotextTextLayer):
/// both use a top-left origin in points, so the transform is a plain scale.
pub struct PdftoppmRasterizer;

impl PdftoppmRasterizer {
    pub fn new() -> Self {
        PdftoppmRasterizer
    }
}

impl Default for PdftoppmRasterizer {
    fn default() -> Self {
        Self::new()
    }
}

impl Rasterizer for PdftoppmRasterizer {
    fn render(
        &self,
        pdf_bytes: &[u8],
        page: PageId,
        scale: f64,
    ) -> Result<RenderedPage, BorelogError> {
        let mut tmpfile = tempfile::NamedTempFile::new()?;
        tmpfile.write_all(pdf_bytes)?;
        let out_dir = tempfile::tempdir()?;
        let out_prefix = out_dir.path().join("page");

        let page_arg = page.to_string();
        let dpi = format!("{:.2}", scale * POINTS_PER_INCH);
        let output = Command::new("pdftoppm")
            .args(["-f", &page_arg, "-l", &page_arg, "-r", &dpi, "-png", "-singlefile"])
            .arg(tmpfile.path())
            .arg(&out_prefix)
            .output()
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    BorelogError::ToolNotFound { tool: "pdftoppm" }
                } else {
                    BorelogError::Collaborator {
                        component: Component::Rasterizer,
                        reason: format!("pdftoppm failed: {e}"),
                    }
                }
            })?;

        if !output.status.success() {
            let code = output.status.code().unwrap_or(-1);
            let stderr = String::from_utf8_lossy(&output.stderr).to_string();
            return Err(BorelogError::ToolFailed {
                tool: "pdftoppm",
                code,
                stderr,
            });
        }

        let png_path = out_prefix.with_extension("png");
        if !png_path.exists() {
            return Err(BorelogError::Collaborator {
                component: Component::Rasterizer,
                reason: format!("pdftoppm produced no image for page {page}"),
            });
        }

        let bitmap = load_page_image(&png_path)?;
        log::info!(
            "rendered page {} at scale {} ({}x{} px)",
            page,
            scale,
            bitmap.width(),
            bitmap.height()
        );

        Ok(RenderedPage {
            bitmap,
            transform: ViewportTransform::scale(scale),
        })
    }

    fn backend_name(&self) -> &str {
        "pdftoppm"
    }
}
