use borelog_core::model::{ExtractionResult, HeaderRecord};
use rust_decimal::Decimal;

/// Longest description line shown before truncation.
const MAX_DESCRIPTION_WIDTH: usize = 60;

pub fn print(result: &ExtractionResult) {
    print!("{}", format_result(result));
}

pub fn format_result(result: &ExtractionResult) -> String {
    let mut out = String::new();

    out.push_str(&format!(
        "=== {} (page {}) ===\n\n",
        result.boring.name.as_deref().unwrap_or("Unnamed boring"),
        result.page
    ));
    format_header(&mut out, &result.boring);
    out.push_str(&format!("  Total depth:  {} ft\n\n", result.total_depth_ft));

    out.push_str(&format!("Layers ({}):\n", result.layers.len()));
    for (i, layer) in result.layers.iter().enumerate() {
        let mut lines = layer.description.lines().filter(|l| !l.trim().is_empty());
        let first = lines.next().unwrap_or("(no description)");
        out.push_str(&format!(
            "  {:>2}  {:>7} - {:<7}  {}\n",
            i + 1,
            layer.from_ft,
            layer.to_ft,
            truncate(first)
        ));
        for line in lines {
            out.push_str(&format!("  {:>22}  {}\n", "", truncate(line)));
        }
    }

    out.push('\n');
    if result.spt.is_empty() {
        out.push_str("SPT: none\n");
    } else {
        out.push_str(&format!("SPT ({}):\n", result.spt.len()));
        for reading in &result.spt {
            out.push_str(&format!(
                "  {:>7} ft  N = {}\n",
                reading.depth_ft, reading.n
            ));
        }
    }

    out
}

fn format_header(out: &mut String, header: &HeaderRecord) {
    out.push_str(&format!("  Latitude:     {}\n", opt(header.latitude, "")));
    out.push_str(&format!("  Longitude:    {}\n", opt(header.longitude, "")));
    out.push_str(&format!(
        "  Elevation:    {}\n",
        opt(header.elevation_ft, " ft")
    ));
    out.push_str(&format!(
        "  Water:        initial {}, after 24h {}\n",
        opt(header.water_table.initial_ft, " ft"),
        opt(header.water_table.after_24h_ft, " ft")
    ));
}

fn opt(value: Option<Decimal>, unit: &str) -> String {
    match value {
        Some(v) => format!("{v}{unit}"),
        None => "-".to_string(),
    }
}

fn truncate(line: &str) -> String {
    let line = line.trim();
    if line.chars().count() <= MAX_DESCRIPTION_WIDTH {
        line.to_string()
    } else {
        let cut: String = line.chars().take(MAX_DESCRIPTION_WIDTH - 3).collect();
        format!("{cut}...")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use borelog_core::model::{Layer, SptReading};

    fn sample() -> ExtractionResult {
        ExtractionResult {
            page: 2,
            boring: HeaderRecord {
                name: Some("B-12-3".into()),
                latitude: Some(Decimal::new(401, 1)),
                ..HeaderRecord::default()
            },
            total_depth_ft: Decimal::from(36),
            layers: vec![
                Layer {
                    from_ft: Decimal::ZERO,
                    to_ft: Decimal::new(457, 2),
                    description: "TOPSOIL\nwith roots".into(),
                },
                Layer {
                    from_ft: Decimal::new(457, 2),
                    to_ft: Decimal::from(36),
                    description: String::new(),
                },
            ],
            spt: vec![SptReading {
                depth_ft: Decimal::new(1125, 2),
                n: 12,
            }],
        }
    }

    #[test]
    fn test_format_result() {
        let text = format_result(&sample());
        assert!(text.starts_with("=== B-12-3 (page 2) ==="));
        assert!(text.contains("Latitude:     40.1\n"));
        assert!(text.contains("Elevation:    -\n"));
        assert!(text.contains("TOPSOIL\n"));
        assert!(text.contains("with roots\n"));
        assert!(text.contains("(no description)"));
        assert!(text.contains("11.25 ft  N = 12"));
    }

    #[test]
    fn test_truncate_long_line() {
        let long = "x".repeat(100);
        let cut = truncate(&long);
        assert_eq!(cut.chars().count(), MAX_DESCRIPTION_WIDTH);
        assert!(cut.ends_with("..."));
    }
}
