//! Auto-follow arbitration for the record table.
//!
//! The table can be moved by the user (wheel, paging, selection) or by the
//! monitor itself when it follows new records. Both kinds of motion are
//! reported here as observed scroll events. A system scroll stamps its time
//! before moving, and any event observed inside the suppression window after
//! that stamp is attributed to the system.

use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FollowMode {
    Following,
    Detached,
}

#[derive(Debug, Clone)]
pub struct ScrollIntent {
    mode: FollowMode,
    last_system_scroll: Option<Instant>,
    suppress_window: Duration,
}

impl ScrollIntent {
    pub fn new(suppress_window: Duration) -> Self {
        Self {
            mode: FollowMode::Following,
            last_system_scroll: None,
            suppress_window,
        }
    }

    pub fn mode(&self) -> FollowMode {
        self.mode
    }

    pub fn is_following(&self) -> bool {
        self.mode == FollowMode::Following
    }

    /// Must be called before the viewport moves.
    pub fn stamp_system_scroll(&mut self, now: Instant) {
        self.last_system_scroll = Some(now);
    }

    pub fn is_suppressed(&self, now: Instant) -> bool {
        self.last_system_scroll
            .is_some_and(|at| now.saturating_duration_since(at) < self.suppress_window)
    }

    /// Feed one observed scroll event. Returns the new mode when it changed.
    pub fn observe(&mut self, now: Instant, at_tail: bool) -> Option<FollowMode> {
        let next = match (self.mode, at_tail) {
            (FollowMode::Following, false) if !self.is_suppressed(now) => FollowMode::Detached,
            (FollowMode::Detached, true) => FollowMode::Following,
            _ => return None,
        };
        self.mode = next;
        Some(next)
    }

    /// Manual toggle. Returns true when the caller must now scroll to the tail.
    pub fn toggle(&mut self) -> bool {
        let next = match self.mode {
            FollowMode::Following => FollowMode::Detached,
            FollowMode::Detached => FollowMode::Following,
        };
        self.force(next)
    }

    pub fn force(&mut self, mode: FollowMode) -> bool {
        self.mode = mode;
        mode == FollowMode::Following
    }
}

/// Visible window over the rendered rows, in row units.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    offset: usize,
    height: usize,
    content: usize,
    tolerance: usize,
}

impl Viewport {
    pub fn new(tolerance: usize) -> Self {
        Self {
            offset: 0,
            height: 1,
            content: 0,
            tolerance,
        }
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn height(&self) -> usize {
        self.height
    }

    fn max_offset(&self) -> usize {
        self.content.saturating_sub(self.height)
    }

    pub fn at_tail(&self) -> bool {
        self.offset + self.height + self.tolerance >= self.content
    }

    pub fn set_height(&mut self, height: usize) {
        self.height = height.max(1);
        self.offset = self.offset.min(self.max_offset());
    }

    pub fn set_content(&mut self, content: usize) {
        self.content = content;
        self.offset = self.offset.min(self.max_offset());
    }

    /// Returns true if the offset actually moved.
    pub fn scroll_by(&mut self, delta: isize) -> bool {
        let target = if delta.is_negative() {
            self.offset.saturating_sub(delta.unsigned_abs())
        } else {
            self.offset.saturating_add(delta.unsigned_abs())
        };
        self.scroll_to(target)
    }

    pub fn scroll_to(&mut self, offset: usize) -> bool {
        let clamped = offset.min(self.max_offset());
        let moved = clamped != self.offset;
        self.offset = clamped;
        moved
    }

    pub fn scroll_to_tail(&mut self) -> bool {
        self.scroll_to(self.max_offset())
    }

    /// Move just enough to bring `row` on screen.
    pub fn reveal(&mut self, row: usize) -> bool {
        if row < self.offset {
            self.scroll_to(row)
        } else if row >= self.offset + self.height {
            self.scroll_to(row + 1 - self.height)
        } else {
            false
        }
    }

    pub fn visible(&self) -> std::ops::Range<usize> {
        self.offset..(self.offset + self.height).min(self.content)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Indicator {
    pub visible: bool,
    pub label: &'static str,
    pub toggle_hint: &'static str,
}

pub fn indicator(capturing: bool, mode: FollowMode) -> Indicator {
    match (capturing, mode) {
        (false, _) => Indicator {
            visible: false,
            label: "",
            toggle_hint: "",
        },
        (true, FollowMode::Following) => Indicator {
            visible: true,
            label: "Auto-follow: ON",
            toggle_hint: "pause",
        },
        (true, FollowMode::Detached) => Indicator {
            visible: true,
            label: "Auto-follow: OFF (scroll to bottom to resume)",
            toggle_hint: "resume",
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const WINDOW: Duration = Duration::from_millis(100);

    #[test]
    fn user_scroll_away_from_tail_detaches() {
        let mut intent = ScrollIntent::new(WINDOW);
        let now = Instant::now();
        assert_eq!(intent.observe(now, false), Some(FollowMode::Detached));
        assert!(!intent.is_following());
    }

    #[test]
    fn scroll_inside_window_never_detaches() {
        let mut intent = ScrollIntent::new(WINDOW);
        let t0 = Instant::now();
        intent.stamp_system_scroll(t0);
        for ms in [0, 10, 50, 99] {
            assert_eq!(intent.observe(t0 + Duration::from_millis(ms), false), None);
        }
        assert!(intent.is_following());
        assert_eq!(
            intent.observe(t0 + Duration::from_millis(100), false),
            Some(FollowMode::Detached)
        );
    }

    #[test]
    fn returning_to_tail_reattaches_even_inside_window() {
        let mut intent = ScrollIntent::new(WINDOW);
        let t0 = Instant::now();
        intent.observe(t0, false);
        intent.stamp_system_scroll(t0);
        assert_eq!(intent.observe(t0, true), Some(FollowMode::Following));
    }

    #[test]
    fn toggle_into_following_requests_scroll() {
        let mut intent = ScrollIntent::new(WINDOW);
        assert!(!intent.toggle());
        assert_eq!(intent.mode(), FollowMode::Detached);
        assert!(intent.toggle());
        assert_eq!(intent.mode(), FollowMode::Following);
    }

    #[test]
    fn viewport_tail_tracks_content() {
        let mut viewport = Viewport::new(0);
        viewport.set_height(10);
        viewport.set_content(5);
        assert!(viewport.at_tail());
        viewport.set_content(30);
        assert!(!viewport.at_tail());
        assert!(viewport.scroll_to_tail());
        assert_eq!(viewport.offset(), 20);
        assert!(viewport.at_tail());
        assert_eq!(viewport.visible(), 20..30);
    }

    #[test]
    fn viewport_tolerance_counts_as_tail() {
        let mut viewport = Viewport::new(2);
        viewport.set_height(10);
        viewport.set_content(30);
        viewport.scroll_to(18);
        assert!(viewport.at_tail());
        viewport.scroll_to(17);
        assert!(!viewport.at_tail());
    }

    #[test]
    fn viewport_clamps_and_reveals() {
        let mut viewport = Viewport::new(0);
        viewport.set_height(4);
        viewport.set_content(10);
        assert!(!viewport.scroll_by(-3));
        assert!(viewport.scroll_by(100));
        assert_eq!(viewport.offset(), 6);
        assert!(viewport.reveal(1));
        assert_eq!(viewport.offset(), 1);
        assert!(viewport.reveal(8));
        assert_eq!(viewport.offset(), 5);
        viewport.set_content(3);
        assert_eq!(viewport.offset(), 0);
    }

    #[test]
    fn indicator_hidden_when_not_capturing() {
        assert!(!indicator(false, FollowMode::Following).visible);
        let on = indicator(true, FollowMode::Following);
        assert_eq!(on.label, "Auto-follow: ON");
        let off = indicator(true, FollowMode::Detached);
        assert_eq!(off.toggle_hint, "resume");
    }
}
