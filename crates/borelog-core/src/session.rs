use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use crate::error::BorelogError;
use crate::geometry::Rect;
use crate::model::{ExtractionResult, PageId, Roi, RoiKind, RoiSet};

/// ROIs smaller than this on either axis are rejected as accidental drags.
pub const MIN_ROI_SIZE_PX: f64 = 8.0;

/// Everything remembered about one page.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PageState {
    pub rois: RoiSet,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<ExtractionResult>,
}

/// Caller-owned per-page state: ROI sets and the latest extraction results.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Session {
    #[serde(default)]
    pub pages: BTreeMap<PageId, PageState>,
    #[serde(default)]
    next_roi_id: u64,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read a session file; a missing file is an empty session.
    pub fn load_or_default(path: &Path) -> Result<Session, BorelogError> {
        match std::fs::read_to_string(path) {
            Ok(content) => Ok(serde_json::from_str(&content)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Session::default()),
            Err(e) => Err(e.into()),
        }
    }

    pub fn save(&self, path: &Path) -> Result<(), BorelogError> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    pub fn rois(&self, page: PageId) -> Option<&RoiSet> {
        self.pages.get(&page).map(|p| &p.rois)
    }

    /// Install an ROI of `kind` on `page`, replacing any previous one of the
    /// same kind. When the page size is known the rect is clamped into it.
    ///
    /// Any stored result for the page is discarded, since it was computed
    /// from the old regions.
    pub fn set_roi(
        &mut self,
        page: PageId,
        kind: RoiKind,
        rect: Rect,
        page_size: Option<(u32, u32)>,
    ) -> Result<&Roi, BorelogError> {
        if !(rect.w >= MIN_ROI_SIZE_PX && rect.h >= MIN_ROI_SIZE_PX) {
            return Err(BorelogError::InvalidRoi(format!(
                "{kind} ROI must be at least {MIN_ROI_SIZE_PX}x{MIN_ROI_SIZE_PX} px (got {}x{})",
                rect.w, rect.h
            )));
        }
        let rect = match page_size {
            Some((w, h)) => rect.clamp_to(w, h),
            None => rect,
        };

        self.next_roi_id += 1;
        let roi = Roi {
            id: format!("roi-{}", self.next_roi_id),
            kind,
            rect,
        };

        let state = self.pages.entry(page).or_default();
        state.result = None;
        if let Some(old) = state.rois.set(roi) {
            log::debug!("page {page}: replaced {kind} ROI {}", old.id);
        }
        state.rois.require(kind)
    }

    /// Remove one ROI kind, or all of them, from `page`.
    pub fn clear_rois(&mut self, page: PageId, kind: Option<RoiKind>) {
        if let Some(state) = self.pages.get_mut(&page) {
            match kind {
                Some(kind) => {
                    state.rois.clear(kind);
                }
                None => state.rois.clear_all(),
            }
            state.result = None;
        }
    }

    /// Store the latest result for its page, overwriting any earlier one.
    pub fn store_result(&mut self, result: ExtractionResult) {
        let page = result.page;
        self.pages.entry(page).or_default().result = Some(result);
    }

    pub fn result(&self, page: PageId) -> Option<&ExtractionResult> {
        self.pages.get(&page).and_then(|p| p.result.as_ref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::HeaderRecord;
    use rust_decimal::Decimal;

    fn result(page: PageId, depth: i64) -> ExtractionResult {
        ExtractionResult {
            page,
            boring: HeaderRecord::default(),
            total_depth_ft: Decimal::from(depth),
            layers: vec![],
            spt: vec![],
        }
    }

    #[test]
    fn test_set_roi_replaces_and_assigns_ids() {
        let mut session = Session::new();
        let first = session
            .set_roi(1, RoiKind::Spt, Rect::new(0.0, 0.0, 20.0, 20.0), None)
            .unwrap()
            .id
            .clone();
        let second = session
            .set_roi(1, RoiKind::Spt, Rect::new(5.0, 5.0, 30.0, 30.0), None)
            .unwrap()
            .id
            .clone();
        assert_ne!(first, second);
        let rois = session.rois(1).unwrap();
        assert_eq!(rois.iter().count(), 1);
        assert_eq!(rois.spt.as_ref().unwrap().rect.x, 5.0);
    }

    #[test]
    fn test_set_roi_rejects_tiny_rect() {
        let mut session = Session::new();
        let err = session
            .set_roi(1, RoiKind::Header, Rect::new(0.0, 0.0, 7.0, 50.0), None)
            .unwrap_err();
        assert!(matches!(err, BorelogError::InvalidRoi(_)));
        assert!(session.rois(1).is_none());
    }

    #[test]
    fn test_set_roi_clamps_to_page() {
        let mut session = Session::new();
        let roi = session
            .set_roi(
                2,
                RoiKind::Description,
                Rect::new(90.0, 10.0, 50.0, 50.0),
                Some((100, 100)),
            )
            .unwrap();
        assert_eq!(roi.rect, Rect::new(90.0, 10.0, 10.0, 50.0));
    }

    #[test]
    fn test_store_result_overwrites() {
        let mut session = Session::new();
        session.store_result(result(3, 20));
        session.store_result(result(3, 36));
        assert_eq!(session.result(3).unwrap().total_depth_ft, Decimal::from(36));
    }

    #[test]
    fn test_store_result_creates_page() {
        let mut session = Session::new();
        session.store_result(result(7, 12));
        let state = &session.pages[&7];
        assert_eq!(state.rois, RoiSet::default());
        assert_eq!(state.result.as_ref().unwrap().page, 7);
    }

    #[test]
    fn test_roi_change_discards_result() {
        let mut session = Session::new();
        session
            .set_roi(1, RoiKind::Header, Rect::new(0.0, 0.0, 20.0, 20.0), None)
            .unwrap();
        session.store_result(result(1, 10));
        session.clear_rois(1, Some(RoiKind::Header));
        assert!(session.result(1).is_none());
        assert!(session.rois(1).unwrap().header.is_none());
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        assert_eq!(Session::load_or_default(&path).unwrap(), Session::new());

        let mut session = Session::new();
        session
            .set_roi(4, RoiKind::Header, Rect::new(1.0, 2.0, 30.0, 40.0), None)
            .unwrap();
        session.save(&path).unwrap();

        let loaded = Session::load_or_default(&path).unwrap();
        assert_eq!(loaded, session);
    }
}
