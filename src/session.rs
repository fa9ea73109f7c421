use tracing::info;

use crate::model::SessionState;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusKind {
    Idle,
    Capturing,
    Stopped,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusLine {
    pub message: String,
    pub kind: StatusKind,
}

impl StatusLine {
    pub fn new(message: impl Into<String>, kind: StatusKind) -> Self {
        Self {
            message: message.into(),
            kind,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Controls {
    pub start_enabled: bool,
    pub stop_enabled: bool,
}

/// Idle / Capturing / Stopped, and the poll timer that follows it.
///
/// The timer is armed exactly while the state is `Capturing`.
#[derive(Debug, Default)]
pub struct Lifecycle {
    state: SessionState,
    timer_armed: bool,
}

impl Lifecycle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_capturing(&self) -> bool {
        self.state == SessionState::Capturing
    }

    pub fn timer_armed(&self) -> bool {
        self.timer_armed
    }

    pub fn controls(&self) -> Controls {
        Controls {
            start_enabled: !self.is_capturing(),
            stop_enabled: self.is_capturing(),
        }
    }

    /// Returns the status to display.
    pub fn enter_capturing(&mut self, interface: &str) -> StatusLine {
        info!(interface, from = ?self.state, "capture started");
        self.state = SessionState::Capturing;
        self.timer_armed = true;
        StatusLine::new("Capturing packets...", StatusKind::Capturing)
    }

    pub fn enter_stopped(&mut self) -> StatusLine {
        info!(from = ?self.state, "capture stopped");
        self.state = SessionState::Stopped;
        self.timer_armed = false;
        StatusLine::new("Capture stopped", StatusKind::Stopped)
    }
}

pub fn idle_status() -> StatusLine {
    StatusLine::new("Ready", StatusKind::Idle)
}
