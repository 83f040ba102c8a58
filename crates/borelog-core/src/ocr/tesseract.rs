use image::{ImageFormat, RgbaImage};
use std::process::Command;

use crate::error::BorelogError;
use crate::ocr::{OcrEngine, OcrOutput, OcrWord, WordBox};

/// Tesseract TSV row level for individual words.
const WORD_LEVEL: &str = "5";

/// OCR backend using the `tesseract` command-line tool.
///
/// Runs `tesseract <png> stdout -l <lang> tsv` and reads words, boxes and
/// confidences from the TSV report.
pub struct TesseractEngine {
    /// Page segmentation mode passed as `--psm`, if any.
    psm: Option<u8>,
}

impl TesseractEngine {
    pub fn new() -> Self {
        TesseractEngine { psm: None }
    }

    pub fn with_psm(psm: u8) -> Self {
        TesseractEngine { psm: Some(psm) }
    }

    /// Arguments after the input image path.
    fn tsv_args(&self, language: &str) -> Vec<String> {
        let mut args = vec!["stdout".to_string(), "-l".to_string(), language.to_string()];
        if let Some(psm) = self.psm {
            args.push("--psm".to_string());
            args.push(psm.to_string());
        }
        args.push("tsv".to_string());
        args
    }
}

impl Default for TesseractEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl OcrEngine for TesseractEngine {
    fn recognize(&self, image: &RgbaImage, language: &str) -> Result<OcrOutput, BorelogError> {
        let tmpfile = tempfile::Builder::new().suffix(".png").tempfile()?;
        image.save_with_format(tmpfile.path(), ImageFormat::Png)?;

        let output = Command::new("tesseract")
            .arg(tmpfile.path())
            .args(self.tsv_args(language))
            .output()
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    BorelogError::ToolNotFound { tool: "tesseract" }
                } else {
                    BorelogError::Recognition(format!("tesseract failed to start: {e}"))
                }
            })?;

        if !output.status.success() {
            let code = output.status.code().unwrap_or(-1);
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            return Err(BorelogError::ToolFailed {
                tool: "tesseract",
                code,
                stderr,
            });
        }

        let tsv = String::from_utf8_lossy(&output.stdout);
        Ok(parse_tsv(&tsv))
    }

    fn backend_name(&self) -> &str {
        "tesseract"
    }
}

/// Parse tesseract's TSV report.
///
/// Words on the same (block, paragraph, line) are joined with spaces, lines
/// with newlines, and paragraphs are separated by a blank line, matching the
/// engine's plain-text layout.
fn parse_tsv(tsv: &str) -> OcrOutput {
    let mut words = Vec::new();
    let mut text = String::new();
    let mut current_line: Option<(&str, &str, &str)> = None;
    let mut current_par: Option<(&str, &str)> = None;

    for row in tsv.lines().skip(1) {
        let cols: Vec<&str> = row.split('\t').collect();
        if cols.len() < 12 || cols[0] != WORD_LEVEL {
            continue;
        }
        let word_text = cols[11].trim();
        if word_text.is_empty() {
            continue;
        }
        let (Some(left), Some(top), Some(width), Some(height)) = (
            cols[6].parse::<f64>().ok(),
            cols[7].parse::<f64>().ok(),
            cols[8].parse::<f64>().ok(),
            cols[9].parse::<f64>().ok(),
        ) else {
            continue;
        };
        let confidence = cols[10].parse::<f32>().unwrap_or(0.0);

        let par = (cols[2], cols[3]);
        let line = (cols[2], cols[3], cols[4]);
        if current_line != Some(line) {
            if current_par.is_some() && current_par != Some(par) {
                text.push_str("\n\n");
            } else if current_line.is_some() {
                text.push('\n');
            }
            current_line = Some(line);
            current_par = Some(par);
        } else {
            text.push(' ');
        }
        text.push_str(word_text);

        words.push(OcrWord {
            text: word_text.to_string(),
            bbox: WordBox {
                x0: left,
                y0: top,
                x1: left + width,
                y1: top + height,
            },
            confidence,
        });
    }

    OcrOutput { text, words }
}
