//! Single owner of the monitor's interaction state.
//!
//! `App` never performs I/O. Handlers return [`Effect`]s; remote requests
//! are executed elsewhere and come back as [`Completion`]s in whatever order
//! they finish.

use std::path::PathBuf;
use std::time::Instant;

use crossterm::event::{
    KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
};
use ratatui::layout::Rect;
use tracing::{debug, info, warn};

use crate::commands::{self, Command, KeyDisposition};
use crate::config::Config;
use crate::error::{ErrorKind, MonitorError};
use crate::model::{default_interface, Interface, Record, SessionState, StartRequest};
use crate::reconcile::{Reconciled, Reconciler};
use crate::scroll::{indicator, FollowMode, Indicator, ScrollIntent, Viewport};
use crate::selection::{DetailRequest, DetailView, Selection, DETAIL_CLEARED};
use crate::session::{idle_status, Controls, Lifecycle, StatusKind, StatusLine};

const WHEEL_STEP: isize = 3;
// Top border plus header row.
const TABLE_BODY_TOP: u16 = 2;
const TABLE_CHROME_ROWS: u16 = 3;
const DETAIL_CHROME_ROWS: u16 = 2;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    ListInterfaces,
    Start(StartRequest),
    Stop,
    FetchRecords { seq: u64 },
    /// Record fetch used only to check there is something to export.
    ExportCheck,
    FetchDetail(DetailRequest),
    Export,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    Remote(Request),
    ArmPollTimer,
    DisarmPollTimer,
    Quit,
}

#[derive(Debug)]
pub enum Completion {
    Interfaces(Result<Vec<Interface>, MonitorError>),
    Started {
        interface: String,
        result: Result<(), MonitorError>,
    },
    Stopped(Result<(), MonitorError>),
    Records {
        seq: u64,
        result: Result<Vec<Record>, MonitorError>,
    },
    ExportChecked(Result<usize, MonitorError>),
    Detail {
        request: DetailRequest,
        result: Result<String, MonitorError>,
    },
    Exported(Result<PathBuf, MonitorError>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Interfaces,
    Filter,
    Table,
    Detail,
}

impl Focus {
    fn next(self) -> Self {
        match self {
            Focus::Interfaces => Focus::Filter,
            Focus::Filter => Focus::Table,
            Focus::Table => Focus::Detail,
            Focus::Detail => Focus::Interfaces,
        }
    }

    fn prev(self) -> Self {
        match self {
            Focus::Interfaces => Focus::Detail,
            Focus::Filter => Focus::Interfaces,
            Focus::Table => Focus::Filter,
            Focus::Detail => Focus::Table,
        }
    }
}

/// Blocking notice. Input is swallowed until it is dismissed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub kind: ErrorKind,
    pub message: String,
}

impl Notice {
    pub fn title(&self) -> &'static str {
        match self.kind {
            ErrorKind::LocalPrecondition => " Notice ",
            ErrorKind::Rejected => " Rejected ",
            ErrorKind::Transport => " Connection error ",
            ErrorKind::Io => " Error ",
        }
    }
}

impl From<MonitorError> for Notice {
    fn from(err: MonitorError) -> Self {
        Self {
            kind: err.kind(),
            message: err.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InterfaceList {
    Loading,
    Loaded(Vec<Interface>),
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderedRow<'a> {
    pub index: usize,
    pub record: &'a Record,
    pub selected: bool,
}

pub struct App {
    lifecycle: Lifecycle,
    reconciler: Reconciler,
    selection: Selection,
    intent: ScrollIntent,
    viewport: Viewport,
    interfaces: InterfaceList,
    chosen_interface: Option<usize>,
    preferred_interface: Option<String>,
    filter: String,
    focus: Focus,
    status: StatusLine,
    notice: Option<Notice>,
    table_area: Rect,
    detail_area: Rect,
}

impl App {
    pub fn new(config: &Config) -> Self {
        Self {
            lifecycle: Lifecycle::new(),
            reconciler: Reconciler::new(),
            selection: Selection::new(),
            intent: ScrollIntent::new(config.suppress_window),
            viewport: Viewport::new(config.tail_tolerance),
            interfaces: InterfaceList::Loading,
            chosen_interface: None,
            preferred_interface: config.interface.clone(),
            filter: config.filter.clone(),
            focus: Focus::Table,
            status: idle_status(),
            notice: None,
            table_area: Rect::default(),
            detail_area: Rect::default(),
        }
    }

    pub fn startup(&mut self) -> Vec<Effect> {
        self.interfaces = InterfaceList::Loading;
        vec![Effect::Remote(Request::ListInterfaces)]
    }

    // Read side, used by the renderer and tests.

    pub fn session_state(&self) -> SessionState {
        self.lifecycle.state()
    }

    pub fn is_capturing(&self) -> bool {
        self.lifecycle.is_capturing()
    }

    pub fn timer_armed(&self) -> bool {
        self.lifecycle.timer_armed()
    }

    pub fn controls(&self) -> Controls {
        self.lifecycle.controls()
    }

    pub fn status(&self) -> &StatusLine {
        &self.status
    }

    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    pub fn follow_mode(&self) -> FollowMode {
        self.intent.mode()
    }

    pub fn indicator(&self) -> Indicator {
        indicator(self.is_capturing(), self.intent.mode())
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn row_count(&self) -> usize {
        self.reconciler.len()
    }

    pub fn records(&self) -> &[Record] {
        self.reconciler.rows()
    }

    pub fn selected(&self) -> Option<usize> {
        self.selection.selected()
    }

    pub fn detail(&self) -> &DetailView {
        self.selection.detail()
    }

    pub fn detail_scroll(&self) -> u16 {
        self.selection.scroll()
    }

    pub fn interfaces(&self) -> &InterfaceList {
        &self.interfaces
    }

    pub fn chosen_interface(&self) -> Option<&Interface> {
        match (&self.interfaces, self.chosen_interface) {
            (InterfaceList::Loaded(list), Some(index)) => list.get(index),
            _ => None,
        }
    }

    pub fn filter(&self) -> &str {
        &self.filter
    }

    pub fn focus(&self) -> Focus {
        self.focus
    }

    pub fn visible_rows(&self) -> Vec<RenderedRow<'_>> {
        let rows = self.reconciler.rows();
        self.viewport
            .visible()
            .filter_map(|index| {
                rows.get(index).map(|record| RenderedRow {
                    index,
                    record,
                    selected: self.selection.is_selected(index),
                })
            })
            .collect()
    }

    /// Called before every draw with the table's outer area.
    pub fn set_table_area(&mut self, area: Rect) {
        self.table_area = area;
        self.viewport
            .set_height(usize::from(area.height.saturating_sub(TABLE_CHROME_ROWS)));
    }

    pub fn set_detail_area(&mut self, area: Rect) {
        self.detail_area = area;
    }

    fn detail_height(&self) -> usize {
        usize::from(self.detail_area.height.saturating_sub(DETAIL_CHROME_ROWS))
    }

    // Input.

    pub fn on_key(&mut self, key: KeyEvent, now: Instant) -> Vec<Effect> {
        if key.kind != KeyEventKind::Press {
            return Vec::new();
        }
        if self.notice.is_some() {
            if matches!(key.code, KeyCode::Enter | KeyCode::Esc | KeyCode::Char(' ')) {
                self.notice = None;
            }
            return Vec::new();
        }
        match commands::route(key, self.is_capturing()) {
            KeyDisposition::Run(command) => self.run_command(command, now),
            KeyDisposition::Suppressed => {
                debug!(?key, "chord blocked by session state");
                Vec::new()
            }
            KeyDisposition::Passthrough => self.on_focused_key(key, now),
        }
    }

    pub fn on_mouse(&mut self, mouse: MouseEvent, now: Instant) -> Vec<Effect> {
        if self.notice.is_some() {
            return Vec::new();
        }
        if contains(self.detail_area, mouse.column, mouse.row) {
            let height = self.detail_height();
            match mouse.kind {
                MouseEventKind::ScrollUp => {
                    self.selection.scroll_by(-WHEEL_STEP, height);
                }
                MouseEventKind::ScrollDown => {
                    self.selection.scroll_by(WHEEL_STEP, height);
                }
                MouseEventKind::Down(MouseButton::Left) => self.focus = Focus::Detail,
                _ => {}
            }
            return Vec::new();
        }
        if !contains(self.table_area, mouse.column, mouse.row) {
            return Vec::new();
        }
        match mouse.kind {
            MouseEventKind::ScrollUp => {
                self.user_scroll(now, |viewport| viewport.scroll_by(-WHEEL_STEP));
                Vec::new()
            }
            MouseEventKind::ScrollDown => {
                self.user_scroll(now, |viewport| viewport.scroll_by(WHEEL_STEP));
                Vec::new()
            }
            MouseEventKind::Down(MouseButton::Left) => {
                self.focus = Focus::Table;
                let body_top = self.table_area.y + TABLE_BODY_TOP;
                if mouse.row < body_top {
                    return Vec::new();
                }
                let index = self.viewport.offset() + usize::from(mouse.row - body_top);
                if self.viewport.visible().contains(&index) {
                    self.select_row(index, now)
                } else {
                    Vec::new()
                }
            }
            _ => Vec::new(),
        }
    }

    pub fn run_command(&mut self, command: Command, now: Instant) -> Vec<Effect> {
        match command {
            Command::Start => self.start(),
            Command::Stop => vec![Effect::Remote(Request::Stop)],
            Command::Export => vec![Effect::Remote(Request::ExportCheck)],
            Command::Clear => {
                self.clear();
                Vec::new()
            }
            Command::ToggleFollow => {
                if self.intent.toggle() {
                    self.system_scroll_to_tail(now);
                }
                Vec::new()
            }
            Command::ReloadInterfaces => self.startup(),
            Command::Quit => vec![Effect::Quit],
        }
    }

    fn on_focused_key(&mut self, key: KeyEvent, now: Instant) -> Vec<Effect> {
        match key.code {
            KeyCode::Tab => {
                self.focus = self.focus.next();
                return Vec::new();
            }
            KeyCode::BackTab => {
                self.focus = self.focus.prev();
                return Vec::new();
            }
            _ => {}
        }
        match self.focus {
            Focus::Interfaces => {
                match key.code {
                    KeyCode::Up | KeyCode::Left => self.cycle_interface(-1),
                    KeyCode::Down | KeyCode::Right => self.cycle_interface(1),
                    _ => {}
                }
                Vec::new()
            }
            Focus::Filter => {
                let typed = key.modifiers.is_empty() || key.modifiers == KeyModifiers::SHIFT;
                match key.code {
                    KeyCode::Char(ch) if typed => self.filter.push(ch),
                    KeyCode::Backspace => {
                        self.filter.pop();
                    }
                    _ => {}
                }
                Vec::new()
            }
            Focus::Table => self.on_table_key(key.code, now),
            Focus::Detail => {
                self.on_detail_key(key.code);
                Vec::new()
            }
        }
    }

    fn on_detail_key(&mut self, code: KeyCode) {
        let height = self.detail_height();
        let page = height.max(1) as isize;
        let delta = match code {
            KeyCode::Up | KeyCode::Char('k') => -1,
            KeyCode::Down | KeyCode::Char('j') => 1,
            KeyCode::PageUp => -page,
            KeyCode::PageDown => page,
            KeyCode::Home => isize::MIN,
            KeyCode::End => isize::MAX,
            _ => return,
        };
        self.selection.scroll_by(delta, height);
    }

    fn on_table_key(&mut self, code: KeyCode, now: Instant) -> Vec<Effect> {
        let page = self.viewport.height() as isize;
        match code {
            KeyCode::Up | KeyCode::Char('k') => self.move_selection(-1, now),
            KeyCode::Down | KeyCode::Char('j') => self.move_selection(1, now),
            KeyCode::Enter => match self.selection.selected() {
                Some(index) => self.select_row(index, now),
                None => Vec::new(),
            },
            KeyCode::PageUp => {
                self.user_scroll(now, |viewport| viewport.scroll_by(-page));
                Vec::new()
            }
            KeyCode::PageDown => {
                self.user_scroll(now, |viewport| viewport.scroll_by(page));
                Vec::new()
            }
            KeyCode::Home => {
                self.user_scroll(now, |viewport| viewport.scroll_to(0));
                Vec::new()
            }
            KeyCode::End => {
                self.user_scroll(now, Viewport::scroll_to_tail);
                Vec::new()
            }
            _ => Vec::new(),
        }
    }

    // Lifecycle.

    fn start(&mut self) -> Vec<Effect> {
        let Some(interface) = self.chosen_interface().map(|iface| iface.name.clone()) else {
            self.notice = Some(Notice::from(MonitorError::precondition(
                "Please select a network interface",
            )));
            return Vec::new();
        };
        vec![Effect::Remote(Request::Start(StartRequest {
            interface,
            filter: self.filter.trim().to_string(),
        }))]
    }

    /// Rejected while capturing; otherwise resets rows, counter, detail and
    /// selection, and drops anything still in flight for them.
    pub fn clear(&mut self) -> bool {
        if self.is_capturing() {
            self.notice = Some(Notice::from(MonitorError::precondition(
                "Stop the capture before clearing packets",
            )));
            return false;
        }
        self.reconciler.clear();
        self.viewport.set_content(0);
        self.selection.reset(DETAIL_CLEARED);
        true
    }

    pub fn on_tick(&mut self) -> Vec<Effect> {
        if !self.is_capturing() {
            return Vec::new();
        }
        let seq = self.reconciler.begin_fetch();
        vec![Effect::Remote(Request::FetchRecords { seq })]
    }

    pub fn on_completion(&mut self, completion: Completion, now: Instant) -> Vec<Effect> {
        match completion {
            Completion::Interfaces(result) => {
                self.apply_interfaces(result);
                Vec::new()
            }
            Completion::Started { interface, result } => match result {
                Ok(()) => {
                    self.status = self.lifecycle.enter_capturing(&interface);
                    vec![Effect::ArmPollTimer]
                }
                Err(err) => {
                    warn!(interface = %interface, error = %err, "start failed");
                    self.notice = Some(Notice::from(err));
                    Vec::new()
                }
            },
            Completion::Stopped(result) => match result {
                Ok(()) => {
                    self.status = self.lifecycle.enter_stopped();
                    vec![Effect::DisarmPollTimer]
                }
                Err(err) => {
                    warn!(error = %err, "stop failed");
                    self.notice = Some(Notice::from(err));
                    Vec::new()
                }
            },
            Completion::Records { seq, result } => {
                match result {
                    Ok(records) => self.reconcile(seq, records, now),
                    Err(err) => warn!(seq, error = %err, "record poll failed"),
                }
                Vec::new()
            }
            Completion::ExportChecked(result) => match result {
                Ok(0) => {
                    self.notice = Some(Notice::from(MonitorError::precondition(
                        "No packets to save",
                    )));
                    Vec::new()
                }
                Ok(count) => {
                    info!(count, "exporting capture");
                    self.status = StatusLine::new("Downloading capture file...", self.status_kind());
                    vec![Effect::Remote(Request::Export)]
                }
                Err(err) => {
                    warn!(error = %err, "export pre-check failed");
                    self.notice = Some(Notice::from(err));
                    Vec::new()
                }
            },
            Completion::Detail { request, result } => {
                self.selection.apply(request.seq, request.index, result);
                Vec::new()
            }
            Completion::Exported(result) => {
                match result {
                    Ok(path) => {
                        info!(path = %path.display(), "capture saved");
                        self.status = StatusLine::new(
                            format!("Capture saved to {}", path.display()),
                            self.status_kind(),
                        );
                    }
                    Err(err) => {
                        warn!(error = %err, "export failed");
                        self.notice = Some(Notice::from(err));
                    }
                }
                Vec::new()
            }
        }
    }

    fn status_kind(&self) -> StatusKind {
        match self.lifecycle.state() {
            SessionState::Idle => StatusKind::Idle,
            SessionState::Capturing => StatusKind::Capturing,
            SessionState::Stopped => StatusKind::Stopped,
        }
    }

    fn apply_interfaces(&mut self, result: Result<Vec<Interface>, MonitorError>) {
        match result {
            Ok(list) => {
                let preferred = self
                    .preferred_interface
                    .as_deref()
                    .and_then(|name| list.iter().position(|iface| iface.name == name));
                self.chosen_interface = preferred.or_else(|| default_interface(&list));
                info!(
                    count = list.len(),
                    chosen = ?self.chosen_interface.and_then(|i| list.get(i)).map(|iface| &iface.name),
                    "interfaces loaded"
                );
                self.interfaces = InterfaceList::Loaded(list);
                if self.status.kind == StatusKind::Error {
                    self.status = match self.lifecycle.state() {
                        SessionState::Idle => idle_status(),
                        _ => StatusLine::new("Interfaces reloaded", self.status_kind()),
                    };
                }
            }
            Err(err) => {
                warn!(error = %err, "interface listing failed");
                self.interfaces = InterfaceList::Failed;
                self.chosen_interface = None;
                self.status = StatusLine::new("Error loading network interfaces", StatusKind::Error);
            }
        }
    }

    fn cycle_interface(&mut self, step: isize) {
        let InterfaceList::Loaded(list) = &self.interfaces else {
            return;
        };
        if list.is_empty() {
            return;
        }
        let len = list.len() as isize;
        let next = match self.chosen_interface {
            Some(current) => (current as isize + step).rem_euclid(len),
            None if step < 0 => len - 1,
            None => 0,
        };
        self.chosen_interface = Some(next as usize);
    }

    // Table.

    fn reconcile(&mut self, seq: u64, records: Vec<Record>, now: Instant) {
        let was_at_tail = self.viewport.at_tail();
        let rows = match self.reconciler.apply(seq, records) {
            Reconciled::Rebuilt { rows } => rows,
            Reconciled::Unchanged | Reconciled::Stale => return,
        };
        debug!(seq, rows, "table rebuilt");
        let offset = self.viewport.offset();
        self.viewport.set_content(rows);
        self.selection.retain_within(rows);
        if self.intent.is_following() || was_at_tail {
            self.system_scroll_to_tail(now);
        } else if self.viewport.offset() != offset {
            // Shrinking content pulled the window up.
            self.intent.observe(now, self.viewport.at_tail());
        }
    }

    fn system_scroll_to_tail(&mut self, now: Instant) {
        self.intent.stamp_system_scroll(now);
        if self.viewport.scroll_to_tail() {
            self.intent.observe(now, self.viewport.at_tail());
        }
    }

    fn user_scroll(&mut self, now: Instant, motion: impl FnOnce(&mut Viewport) -> bool) {
        if motion(&mut self.viewport) {
            if let Some(mode) = self.intent.observe(now, self.viewport.at_tail()) {
                debug!(?mode, "follow mode changed by user scroll");
            }
        }
    }

    fn move_selection(&mut self, step: isize, now: Instant) -> Vec<Effect> {
        let len = self.reconciler.len();
        if len == 0 {
            return Vec::new();
        }
        let target = match self.selection.selected() {
            Some(index) if step < 0 => index.saturating_sub(1),
            Some(index) => (index + 1).min(len - 1),
            None if step < 0 => self.viewport.visible().end.saturating_sub(1),
            None => self.viewport.offset(),
        };
        self.select_row(target, now)
    }

    pub fn select_row(&mut self, index: usize, now: Instant) -> Vec<Effect> {
        if index >= self.reconciler.len() {
            return Vec::new();
        }
        let request = self.selection.select(index);
        self.user_scroll(now, |viewport| viewport.reveal(index));
        vec![Effect::Remote(Request::FetchDetail(request))]
    }
}

fn contains(area: Rect, column: u16, row: u16) -> bool {
    column >= area.x
        && column < area.x.saturating_add(area.width)
        && row >= area.y
        && row < area.y.saturating_add(area.height)
}
