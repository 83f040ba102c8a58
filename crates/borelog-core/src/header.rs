use lazy_static::lazy_static;
use regex::Regex;
use rust_decimal::{Decimal, RoundingStrategy};
use std::str::FromStr;

use crate::geometry::{Rect, ViewportTransform};
use crate::model::{HeaderRecord, WaterTable};
use crate::text_layer::TextRun;

lazy_static! {
    /// Borehole identifiers such as "B12-3" or "B-12-3".
    static ref RE_BORING_ID: Regex = Regex::new(r"\bB-?\d+-\d+\b").unwrap();

    static ref RE_LATITUDE: Regex =
        Regex::new(r"(?i)LATITUDE\s*:\s*([-+]?\d+(?:\.\d+)?)").unwrap();

    static ref RE_LONGITUDE: Regex =
        Regex::new(r"(?i)LONGITUDE\s*:\s*([-+]?\d+(?:\.\d+)?)").unwrap();

    static ref RE_ELEVATION: Regex =
        Regex::new(r"(?i)ELEVATION\s*:\s*([-+]?\d+(?:\.\d+)?)\s*(?:feet|ft)\b").unwrap();

    /// First number after "INITIAL" within the "DEPTH TO - WATER" block.
    static ref RE_WATER_INITIAL: Regex =
        Regex::new(r"(?is)DEPTH\s+TO\s*-?\s*WATER.*?INITIAL\D*?(\d+(?:\.\d+)?)").unwrap();

    static ref RE_WATER_AFTER_24H: Regex = Regex::new(
        r"(?is)DEPTH\s+TO\s*-?\s*WATER.*?AFTER\s*24\s*(?:HOURS?|HRS?)\.?\D*?(\d+(?:\.\d+)?)"
    )
    .unwrap();
}

/// Pull the header fields out of the text runs that fall inside `roi`.
pub fn extract_header(
    runs: &[TextRun],
    roi: &Rect,
    transform: &ViewportTransform,
) -> HeaderRecord {
    let text = select_header_text(runs, roi, transform);
    log::debug!("header extractor: {} chars inside header ROI", text.len());
    parse_header(&text)
}

/// Join, in document order, the runs whose viewport anchor lies inside `roi`.
pub fn select_header_text(runs: &[TextRun], roi: &Rect, transform: &ViewportTransform) -> String {
    runs.iter()
        .filter(|run| {
            let (x, y) = transform.apply(run.anchor.0, run.anchor.1);
            roi.contains(x, y)
        })
        .map(|run| run.text.as_str())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Match the fixed header patterns against the concatenated header text.
///
/// Layouts differ between drilling contractors, so every field is optional
/// and a miss simply leaves it unset.
pub fn parse_header(text: &str) -> HeaderRecord {
    HeaderRecord {
        name: RE_BORING_ID.find(text).map(|m| m.as_str().to_string()),
        latitude: capture_decimal(&RE_LATITUDE, text).map(round2_dec),
        longitude: capture_decimal(&RE_LONGITUDE, text).map(round2_dec),
        elevation_ft: capture_decimal(&RE_ELEVATION, text).map(round2_dec),
        water_table: WaterTable {
            initial_ft: capture_decimal(&RE_WATER_INITIAL, text).map(round2_dec),
            after_24h_ft: capture_decimal(&RE_WATER_AFTER_24H, text).map(round2_dec),
        },
    }
}

fn capture_decimal(re: &Regex, text: &str) -> Option<Decimal> {
    let raw = re.captures(text)?.get(1)?.as_str();
    Decimal::from_str(raw.trim_start_matches('+')).ok()
}

fn round2_dec(v: Decimal) -> Decimal {
    v.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn run(text: &str, x: f64, y: f64) -> TextRun {
        TextRun {
            text: text.into(),
            anchor: (x, y),
        }
    }

    #[test]
    fn test_parse_header_full() {
        let h = parse_header(
            "B-12-3 LATITUDE: 40.1 LONGITUDE: -75.2 ELEVATION: 102.5 feet \
             DEPTH TO - WATER INITIAL 8.2 ft",
        );
        assert_eq!(h.name.as_deref(), Some("B-12-3"));
        assert_eq!(h.latitude, Some(dec!(40.1)));
        assert_eq!(h.longitude, Some(dec!(-75.2)));
        assert_eq!(h.elevation_ft, Some(dec!(102.5)));
        assert_eq!(h.water_table.initial_ft, Some(dec!(8.2)));
        assert_eq!(h.water_table.after_24h_ft, None);
    }

    #[test]
    fn test_numbers_rounded_to_two_places() {
        let h = parse_header(
            "LATITUDE: 40.123456 LONGITUDE: -75.987654 ELEVATION: 102.555 feet \
             DEPTH TO - WATER INITIAL 8.125 ft",
        );
        assert_eq!(h.latitude, Some(dec!(40.12)));
        assert_eq!(h.longitude, Some(dec!(-75.99)));
        assert_eq!(h.elevation_ft, Some(dec!(102.56)));
        assert_eq!(h.water_table.initial_ft, Some(dec!(8.13)));

        let json = serde_json::to_string(&h).unwrap();
        assert!(json.contains(r#""latitude":40.12,"longitude":-75.99,"elevation_ft":102.56"#));
    }

    #[test]
    fn test_boring_id_without_hyphen_after_b() {
        let h = parse_header("LOG OF BORING B7-21 SHEET 1 OF 2");
        assert_eq!(h.name.as_deref(), Some("B7-21"));
    }

    #[test]
    fn test_boring_id_needs_word_boundary() {
        let h = parse_header("SB12-3");
        assert_eq!(h.name, None);
    }

    #[test]
    fn test_labels_are_case_insensitive() {
        let h = parse_header("latitude:+39.95 Longitude : -75.16 elevation: 12 FEET");
        assert_eq!(h.latitude, Some(dec!(39.95)));
        assert_eq!(h.longitude, Some(dec!(-75.16)));
        assert_eq!(h.elevation_ft, Some(dec!(12)));
    }

    #[test]
    fn test_elevation_requires_unit() {
        let h = parse_header("ELEVATION: 102.5 DATUM NAVD88");
        assert_eq!(h.elevation_ft, None);
    }

    #[test]
    fn test_water_table_after_24_hours() {
        let h = parse_header(
            "DEPTH TO - WATER> INITIAL: 8.2 ft AFTER 24 HOURS: 6.75 ft CAVING> 15",
        );
        assert_eq!(h.water_table.initial_ft, Some(dec!(8.2)));
        assert_eq!(h.water_table.after_24h_ft, Some(dec!(6.75)));
    }

    #[test]
    fn test_water_initial_needs_phrase() {
        let h = parse_header("INITIAL 8.2");
        assert_eq!(h.water_table.initial_ft, None);
    }

    #[test]
    fn test_partial_header() {
        let h = parse_header("PROJECT: BRIDGE 14 LONGITUDE: -80.5");
        assert_eq!(h.name, None);
        assert_eq!(h.latitude, None);
        assert_eq!(h.longitude, Some(dec!(-80.5)));
        assert_eq!(h.water_table, WaterTable::default());
    }

    #[test]
    fn test_select_header_text_filters_by_viewport_position() {
        let runs = vec![
            run("B-4-1", 10.0, 10.0),
            run("outside", 300.0, 10.0),
            run("LATITUDE:", 20.0, 30.0),
            run("41.2", 60.0, 30.0),
        ];
        // document points scaled 2x onto the bitmap
        let transform = ViewportTransform::scale(2.0);
        let roi = Rect::new(0.0, 0.0, 200.0, 60.0);
        let text = select_header_text(&runs, &roi, &transform);
        assert_eq!(text, "B-4-1 LATITUDE: 41.2");

        let h = extract_header(&runs, &roi, &transform);
        assert_eq!(h.name.as_deref(), Some("B-4-1"));
        assert_eq!(h.latitude, Some(dec!(41.2)));
    }

    #[test]
    fn test_select_header_text_bounds_inclusive() {
        let runs = vec![run("edge", 100.0, 50.0)];
        let roi = Rect::new(0.0, 0.0, 100.0, 50.0);
        let text = select_header_text(&runs, &roi, &ViewportTransform::default());
        assert_eq!(text, "edge");
    }
}
