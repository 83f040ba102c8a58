use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::Command;

use crate::error::{BorelogError, Component};
use crate::model::PageId;

/// A positioned piece of page text, anchored in document space.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextRun {
    pub text: String,
    pub anchor: (f64, f64),
}

/// Source of already-positioned page text (a PDF text layer).
pub trait TextLayerSource: Send + Sync {
    /// Text runs of `page`, in document order.
    fn text_runs(&self, pdf_bytes: &[u8], page: PageId) -> Result<Vec<TextRun>, BorelogError>;

    /// Name of this backend (for diagnostics).
    fn backend_name(&self) -> &str;
}

/// Read text runs previously saved as JSON (`[{"text": .., "anchor": [x, y]}]`).
pub fn load_text_runs(path: &Path) -> Result<Vec<TextRun>, BorelogError> {
    let content = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

/// Text layer read from a saved runs file instead of the PDF itself.
///
/// The same runs are returned for every page.
pub struct SavedTextLayer {
    path: PathBuf,
}

impl SavedTextLayer {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        SavedTextLayer { path: path.into() }
    }
}

impl TextLayerSource for SavedTextLayer {
    fn text_runs(&self, _pdf_bytes: &[u8], _page: PageId) -> Result<Vec<TextRun>, BorelogError> {
        load_text_runs(&self.path)
    }

    fn backend_name(&self) -> &str {
        "saved runs"
    }
}

/// Text layer backend using `pdftotext -bbox` (from poppler-utils).
///
/// Each word becomes one run anchored at its bottom-left corner, in PDF
/// points with a top-left origin, which pairs with
/// [`ViewportTransform::scale`](crate::geometry::ViewportTransform::scale).
pub struct PdftotextTextLayer;

impl PdftotextTextLayer {
    pub fn new() -> Self {
        PdftotextTextLayer
    }
}

impl Default for PdftotextTextLayer {
    fn default() -> Self {
        Self::new()
    }
}

impl TextLayerSource for PdftotextTextLayer {
    fn text_runs(&self, pdf_bytes: &[u8], page: PageId) -> Result<Vec<TextRun>, BorelogError> {
        let mut tmpfile = tempfile::NamedTempFile::new()?;
        tmpfile.write_all(pdf_bytes)?;

        let page_arg = page.to_string();
        let output = Command::new("pdftotext")
            .args(["-bbox", "-f", &page_arg, "-l", &page_arg])
            .arg(tmpfile.path())
            .arg("-")
            .output()
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    BorelogError::ToolNotFound { tool: "pdftotext" }
                } else {
                    BorelogError::Collaborator {
                        component: Component::TextLayer,
                        reason: format!("pdftotext -bbox failed: {e}"),
                    }
                }
            })?;

        if !output.status.success() {
            let code = output.status.code().unwrap_or(-1);
            let stderr = String::from_utf8_lossy(&output.stderr).to_string();
            return Err(BorelogError::ToolFailed {
                tool: "pdftotext",
                code,
                stderr,
            });
        }

        let xml = String::from_utf8_lossy(&output.stdout);
        let runs = parse_bbox_words(&xml);
        log::debug!("pdftotext: {} text runs on page {}", runs.len(), page);
        Ok(runs)
    }

    fn backend_name(&self) -> &str {
        "pdftotext"
    }
}

fn parse_bbox_words(xml: &str) -> Vec<TextRun> {
    xml.lines()
        .map(str::trim)
        .filter(|line| line.starts_with("<word "))
        .filter_map(|line| {
            let x_min = parse_attr_f64(line, "xMin")?;
            let y_max = parse_attr_f64(line, "yMax")?;
            let text = decode_xml_entities(parse_word_text(line)?.trim());
            if text.is_empty() {
                return None;
            }
            Some(TextRun {
                text,
                anchor: (x_min, y_max),
            })
        })
        .collect()
}

fn parse_attr_f64(tag: &str, name: &str) -> Option<f64> {
    let needle = format!("{name}=\"");
    let start = tag.find(&needle)? + needle.len();
    let rest = &tag[start..];
    let end = rest.find('"')?;
    rest[..end].parse().ok()
}

fn parse_word_text(word_tag: &str) -> Option<&str> {
    let start = word_tag.find('>')? + 1;
    let end = word_tag.rfind("</word>")?;
    word_tag.get(start..end)
}

fn decode_xml_entities(s: &str) -> String {
    s.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_bbox_words() {
        let xml = r#"<!DOCTYPE html>
<html>
<body>
<doc>
  <page width="612.000000" height="792.000000">
    <word xMin="56.800000" yMin="57.208000" xMax="90.280000" yMax="69.196000">B-12-3</word>
    <word xMin="95.000000" yMin="57.208000" xMax="140.500000" yMax="69.196000">LATITUDE:</word>
    <word xMin="145.000000" yMin="57.208000" xMax="160.000000" yMax="69.196000">   </word>
    <word xMin="170.000000" yMin="80.000000" xMax="190.000000" yMax="92.000000">S&amp;G</word>
  </page>
</doc>
</body>
</html>
"#;
        let runs = parse_bbox_words(xml);
        assert_eq!(runs.len(), 3);
        assert_eq!(runs[0].text, "B-12-3");
        assert_eq!(runs[0].anchor, (56.8, 69.196));
        assert_eq!(runs[1].text, "LATITUDE:");
        assert_eq!(runs[2].text, "S&G");
    }

    #[test]
    fn test_decode_entities_amp_last() {
        assert_eq!(decode_xml_entities("&amp;lt;"), "&lt;");
    }

    #[test]
    fn test_load_text_runs() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"[{{"text": "ELEVATION:", "anchor": [10.0, 20.0]}}, {{"text": "12", "anchor": [60.5, 20.0]}}]"#
        )
        .unwrap();
        let runs = load_text_runs(file.path()).unwrap();
        assert_eq!(runs.len(), 2);
        assert_eq!(runs[1].anchor, (60.5, 20.0));

        let saved = SavedTextLayer::new(file.path());
        assert_eq!(saved.text_runs(b"%PDF-1.4", 3).unwrap(), runs);
    }
}
