use rust_decimal::prelude::FromPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{BorelogError, Component};
use crate::geometry::Rect;

/// 1-based page number within the source document.
pub type PageId = u32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoiKind {
    Header,
    Description,
    Spt,
}

impl RoiKind {
    pub const ALL: [RoiKind; 3] = [RoiKind::Header, RoiKind::Description, RoiKind::Spt];

    pub fn from_str_loose(s: &str) -> Option<RoiKind> {
        match s.trim().to_lowercase().as_str() {
            "header" | "head" => Some(RoiKind::Header),
            "description" | "desc" | "strata" | "stratigraphy" => Some(RoiKind::Description),
            "spt" | "blows" => Some(RoiKind::Spt),
            _ => None,
        }
    }
}

impl fmt::Display for RoiKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RoiKind::Header => write!(f, "header"),
            RoiKind::Description => write!(f, "description"),
            RoiKind::Spt => write!(f, "spt"),
        }
    }
}

/// A user-declared region of the page bitmap.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Roi {
    pub id: String,
    pub kind: RoiKind,
    pub rect: Rect,
}

/// The active ROIs of one page, at most one per kind.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RoiSet {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub header: Option<Roi>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<Roi>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spt: Option<Roi>,
}

impl RoiSet {
    fn slot_mut(&mut self, kind: RoiKind) -> &mut Option<Roi> {
        match kind {
            RoiKind::Header => &mut self.header,
            RoiKind::Description => &mut self.description,
            RoiKind::Spt => &mut self.spt,
        }
    }

    pub fn get(&self, kind: RoiKind) -> Option<&Roi> {
        match kind {
            RoiKind::Header => self.header.as_ref(),
            RoiKind::Description => self.description.as_ref(),
            RoiKind::Spt => self.spt.as_ref(),
        }
    }

    /// Install `roi` in its kind's slot, returning the ROI it replaced.
    pub fn set(&mut self, roi: Roi) -> Option<Roi> {
        self.slot_mut(roi.kind).replace(roi)
    }

    pub fn clear(&mut self, kind: RoiKind) -> Option<Roi> {
        self.slot_mut(kind).take()
    }

    pub fn clear_all(&mut self) {
        *self = RoiSet::default();
    }

    pub fn require(&self, kind: RoiKind) -> Result<&Roi, BorelogError> {
        self.get(kind).ok_or(BorelogError::MissingRoi(kind))
    }

    /// Checks that all three kinds are present, reporting the first missing one.
    pub fn require_all(&self) -> Result<(), BorelogError> {
        for kind in RoiKind::ALL {
            self.require(kind)?;
        }
        Ok(())
    }

    pub fn iter(&self) -> impl Iterator<Item = &Roi> {
        RoiKind::ALL.into_iter().filter_map(|k| self.get(k))
    }
}

/// Depth interval in feet; `from_ft < to_ft`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayerInterval {
    pub from_ft: f64,
    pub to_ft: f64,
}

impl LayerInterval {
    pub fn thickness(&self) -> f64 {
        self.to_ft - self.from_ft
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Layer {
    #[serde(with = "rust_decimal::serde::float")]
    pub from_ft: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub to_ft: Decimal,
    pub description: String,
}

impl Layer {
    pub fn new(interval: LayerInterval, description: String) -> Self {
        Layer {
            from_ft: round2(interval.from_ft),
            to_ft: round2(interval.to_ft),
            description,
        }
    }
}

/// One Standard Penetration Test blow count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SptReading {
    #[serde(with = "rust_decimal::serde::float")]
    pub depth_ft: Decimal,
    pub n: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WaterTable {
    #[serde(default, with = "rust_decimal::serde::float_option")]
    pub initial_ft: Option<Decimal>,
    #[serde(default, with = "rust_decimal::serde::float_option")]
    pub after_24h_ft: Option<Decimal>,
}

/// Fields recovered from the header region. Unmatched fields stay `None`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HeaderRecord {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, with = "rust_decimal::serde::float_option")]
    pub latitude: Option<Decimal>,
    #[serde(default, with = "rust_decimal::serde::float_option")]
    pub longitude: Option<Decimal>,
    #[serde(default, with = "rust_decimal::serde::float_option")]
    pub elevation_ft: Option<Decimal>,
    #[serde(default)]
    pub water_table: WaterTable,
}

/// The per-page artifact handed to export and UI consumers.
///
/// Field names and order are the stable JSON contract.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionResult {
    pub page: PageId,
    pub boring: HeaderRecord,
    #[serde(with = "rust_decimal::serde::float")]
    pub total_depth_ft: Decimal,
    pub layers: Vec<Layer>,
    pub spt: Vec<SptReading>,
}

/// A non-fatal problem encountered during a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionWarning {
    pub component: Component,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub layer: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub roi: Option<RoiKind>,
    pub message: String,
}

impl fmt::Display for ExtractionWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.component)?;
        if let Some(layer) = self.layer {
            write!(f, " (layer {layer})")?;
        }
        if let Some(roi) = self.roi {
            write!(f, " [{roi} ROI]")?;
        }
        write!(f, ": {}", self.message)
    }
}

/// Round to 2 decimal places, half away from zero. Non-finite input maps to zero.
pub fn round2(value: f64) -> Decimal {
    Decimal::from_f64(value)
        .unwrap_or(Decimal::ZERO)
        .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}
