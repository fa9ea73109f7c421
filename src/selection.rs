use tracing::{debug, warn};

use crate::error::MonitorError;

pub const DETAIL_PLACEHOLDER: &str = "Select a packet to view its details.";
pub const DETAIL_CLEARED: &str = "Packets cleared. Select a packet to view details.";
pub const DETAIL_FETCH_FAILED: &str = "Error fetching packet details";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DetailView {
    Placeholder(&'static str),
    Loading { index: usize },
    Ready { index: usize, text: String },
    Failed { index: usize },
}

impl DetailView {
    pub fn text(&self) -> &str {
        match self {
            DetailView::Placeholder(message) => message,
            DetailView::Loading { .. } => "Loading packet details...",
            DetailView::Ready { text, .. } => text,
            DetailView::Failed { .. } => DETAIL_FETCH_FAILED,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DetailRequest {
    pub seq: u64,
    pub index: usize,
}

/// At most one selected row, plus the detail shown for it.
///
/// Detail fetches are tagged; only the most recently issued one may write
/// the detail view, so a slow answer for an older selection is dropped.
#[derive(Debug)]
pub struct Selection {
    selected: Option<usize>,
    detail: DetailView,
    issued: u64,
    scroll: u16,
}

impl Default for Selection {
    fn default() -> Self {
        Self {
            selected: None,
            detail: DetailView::Placeholder(DETAIL_PLACEHOLDER),
            issued: 0,
            scroll: 0,
        }
    }
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn selected(&self) -> Option<usize> {
        self.selected
    }

    pub fn detail(&self) -> &DetailView {
        &self.detail
    }

    pub fn is_selected(&self, index: usize) -> bool {
        self.selected == Some(index)
    }

    /// First detail line shown in the panel.
    pub fn scroll(&self) -> u16 {
        self.scroll
    }

    /// Moves the detail panel by `delta` lines, keeping the last line
    /// reachable but never scrolling past it.
    pub fn scroll_by(&mut self, delta: isize, visible: usize) -> bool {
        let lines = self.detail.text().lines().count();
        let max = lines.saturating_sub(visible.max(1));
        let current = usize::from(self.scroll);
        let target = if delta < 0 {
            current.saturating_sub(delta.unsigned_abs())
        } else {
            current.saturating_add(delta.unsigned_abs()).min(max)
        };
        let target = u16::try_from(target).unwrap_or(u16::MAX);
        let moved = target != self.scroll;
        self.scroll = target;
        moved
    }

    /// Selecting the current row again refetches its detail.
    pub fn select(&mut self, index: usize) -> DetailRequest {
        self.selected = Some(index);
        self.issued += 1;
        self.detail = DetailView::Loading { index };
        self.scroll = 0;
        DetailRequest {
            seq: self.issued,
            index,
        }
    }

    pub fn apply(&mut self, seq: u64, index: usize, result: Result<String, MonitorError>) -> bool {
        if seq != self.issued {
            debug!(seq, latest = self.issued, index, "dropping superseded detail");
            return false;
        }
        self.detail = match result {
            Ok(text) => DetailView::Ready { index, text },
            Err(err) => {
                warn!(index, error = %err, "detail fetch failed");
                DetailView::Failed { index }
            }
        };
        true
    }

    /// Drops the selection if a rebuild left it out of range.
    pub fn retain_within(&mut self, rows: usize) {
        if self.selected.is_some_and(|index| index >= rows) {
            self.reset(DETAIL_PLACEHOLDER);
        }
    }

    /// Deselects and invalidates any in-flight detail fetch.
    pub fn reset(&mut self, message: &'static str) {
        self.selected = None;
        self.issued += 1;
        self.detail = DetailView::Placeholder(message);
        self.scroll = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn selecting_replaces_previous_row() {
        let mut selection = Selection::new();
        selection.select(2);
        selection.select(5);
        assert!(selection.is_selected(5));
        assert!(!selection.is_selected(2));
    }

    #[test]
    fn late_detail_for_older_selection_is_dropped() {
        let mut selection = Selection::new();
        let first = selection.select(1);
        let second = selection.select(4);
        // j's answer lands first, then i's slow answer.
        assert!(selection.apply(second.seq, second.index, Ok("packet 4".to_string())));
        assert!(!selection.apply(first.seq, first.index, Ok("packet 1".to_string())));
        assert_eq!(
            selection.detail(),
            &DetailView::Ready {
                index: 4,
                text: "packet 4".to_string()
            }
        );
        assert_eq!(selection.selected(), Some(4));
    }

    #[test]
    fn older_detail_arriving_first_is_also_dropped() {
        let mut selection = Selection::new();
        let first = selection.select(1);
        let second = selection.select(4);
        assert!(!selection.apply(first.seq, first.index, Ok("packet 1".to_string())));
        assert_eq!(selection.detail(), &DetailView::Loading { index: 4 });
        assert!(selection.apply(second.seq, second.index, Ok("packet 4".to_string())));
        assert_eq!(selection.detail().text(), "packet 4");
    }

    #[test]
    fn transport_failure_shows_error_text() {
        let mut selection = Selection::new();
        let req = selection.select(0);
        selection.apply(
            req.seq,
            req.index,
            Err(MonitorError::Transport("HTTP 500".to_string())),
        );
        assert_eq!(selection.detail().text(), DETAIL_FETCH_FAILED);
    }

    #[test]
    fn out_of_range_text_is_shown_verbatim() {
        let mut selection = Selection::new();
        let req = selection.select(99);
        selection.apply(req.seq, req.index, Ok("Paquete no encontrado".to_string()));
        assert_eq!(selection.detail().text(), "Paquete no encontrado");
    }

    #[test]
    fn shrinking_rebuild_clears_selection() {
        let mut selection = Selection::new();
        selection.select(6);
        selection.retain_within(7);
        assert_eq!(selection.selected(), Some(6));
        selection.retain_within(6);
        assert_eq!(selection.selected(), None);
        assert_eq!(selection.detail().text(), DETAIL_PLACEHOLDER);
    }

    fn forty_lines() -> String {
        (1..=40).map(|n| format!("line {n}")).collect::<Vec<_>>().join("\n")
    }

    #[test]
    fn detail_scroll_stops_at_last_page() {
        let mut selection = Selection::new();
        let req = selection.select(0);
        selection.apply(req.seq, req.index, Ok(forty_lines()));
        assert!(selection.scroll_by(8, 8));
        assert_eq!(selection.scroll(), 8);
        selection.scroll_by(isize::MAX, 8);
        assert_eq!(selection.scroll(), 32);
        assert!(!selection.scroll_by(1, 8));
        selection.scroll_by(-100, 8);
        assert_eq!(selection.scroll(), 0);
    }

    #[test]
    fn new_selection_rewinds_detail_scroll() {
        let mut selection = Selection::new();
        let req = selection.select(0);
        selection.apply(req.seq, req.index, Ok(forty_lines()));
        selection.scroll_by(20, 8);
        selection.select(1);
        assert_eq!(selection.scroll(), 0);
        let req = selection.select(2);
        selection.apply(req.seq, req.index, Ok(forty_lines()));
        selection.scroll_by(20, 8);
        selection.reset(DETAIL_CLEARED);
        assert_eq!(selection.scroll(), 0);
    }

    #[test]
    fn reset_discards_in_flight_detail() {
        let mut selection = Selection::new();
        let req = selection.select(3);
        selection.reset(DETAIL_CLEARED);
        assert!(!selection.apply(req.seq, req.index, Ok("late".to_string())));
        assert_eq!(selection.detail().text(), DETAIL_CLEARED);
    }
}
