use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table, Wrap},
    Frame,
};

use crate::app::{App, Focus, InterfaceList, RenderedRow};
use crate::reconcile::counter_label;
use crate::scroll::FollowMode;
use crate::session::StatusKind;

const INFO_MAX_CHARS: usize = 50;

pub struct Areas {
    pub controls: Rect,
    pub status: Rect,
    pub table: Rect,
    pub detail: Rect,
    pub footer: Rect,
}

/// Shared by the renderer and the event loop, which needs the table area
/// to size the viewport and map mouse clicks.
pub fn layout(area: Rect) -> Areas {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(4),
            Constraint::Length(1),
            Constraint::Min(6),
            Constraint::Length(10),
            Constraint::Length(1),
        ])
        .split(area);
    Areas {
        controls: chunks[0],
        status: chunks[1],
        table: chunks[2],
        detail: chunks[3],
        footer: chunks[4],
    }
}

pub fn render(frame: &mut Frame, app: &App) {
    let areas = layout(frame.size());
    frame.render_widget(render_controls(app), areas.controls);
    frame.render_widget(render_status(app), areas.status);
    frame.render_widget(render_table(app), areas.table);
    frame.render_widget(render_detail(app), areas.detail);
    frame.render_widget(render_footer(app), areas.footer);
    if app.notice().is_some() {
        render_notice(frame, app);
    }
}

fn focus_style(app: &App, focus: Focus) -> Style {
    if app.focus() == focus {
        Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Color::Gray)
    }
}

fn control_span(key: &'static str, label: &'static str, enabled: bool) -> Vec<Span<'static>> {
    let style = if enabled {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default().fg(Color::DarkGray)
    };
    vec![Span::styled(format!("[{key}] {label}"), style), Span::raw("  ")]
}

fn render_controls(app: &App) -> Paragraph<'static> {
    let (interface, tooltip) = match app.interfaces() {
        InterfaceList::Loading => ("Loading interfaces...".to_string(), String::new()),
        InterfaceList::Failed => ("Error loading interfaces".to_string(), String::new()),
        InterfaceList::Loaded(list) if list.is_empty() => {
            ("No valid interfaces found".to_string(), String::new())
        }
        InterfaceList::Loaded(_) => match app.chosen_interface() {
            Some(iface) => (format!("< {} >", iface.label()), iface.tooltip()),
            None => ("Select a network interface...".to_string(), String::new()),
        },
    };
    let controls = app.controls();
    let mut second = vec![
        Span::styled("Filter: ", focus_style(app, Focus::Filter)),
        Span::raw(format!("[{}]", app.filter())),
        Span::raw("   "),
    ];
    second.extend(control_span("^S", "Start", controls.start_enabled));
    second.extend(control_span("^E", "Stop", controls.stop_enabled));
    second.extend(control_span("^D", "Save", true));
    second.extend(control_span("^L", "Clear", !app.is_capturing()));

    Paragraph::new(Text::from(vec![
        Line::from(vec![
            Span::styled("Interface: ", focus_style(app, Focus::Interfaces)),
            Span::raw(interface),
            Span::raw("  "),
            Span::styled(tooltip, Style::default().fg(Color::DarkGray)),
        ]),
        Line::from(second),
    ]))
    .block(Block::default().title(" Capture ").borders(Borders::ALL))
}

fn render_status(app: &App) -> Paragraph<'static> {
    let status = app.status();
    let color = match status.kind {
        StatusKind::Idle => Color::Gray,
        StatusKind::Capturing => Color::Green,
        StatusKind::Stopped => Color::Yellow,
        StatusKind::Error => Color::Red,
    };
    Paragraph::new(Line::from(Span::styled(
        format!(" Status: {}", status.message),
        Style::default().fg(color),
    )))
}

fn protocol_color(protocol: &str) -> Color {
    match protocol {
        "TCP" => Color::Magenta,
        "UDP" => Color::Blue,
        "ICMP" => Color::Yellow,
        "ARP" => Color::Green,
        "Error" => Color::Red,
        _ => Color::Gray,
    }
}

pub fn truncate_info(info: &str) -> String {
    if info.chars().count() > INFO_MAX_CHARS {
        let head: String = info.chars().take(INFO_MAX_CHARS).collect();
        format!("{head}...")
    } else {
        info.to_string()
    }
}

fn table_row(row: RenderedRow<'_>) -> Row<'static> {
    let record = row.record;
    let style = if row.selected {
        Style::default()
            .fg(Color::Black)
            .bg(Color::Yellow)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(protocol_color(&record.protocol))
    };
    Row::new(vec![
        Cell::from(record.no.to_string()),
        Cell::from(record.time.clone()),
        Cell::from(record.src.clone()),
        Cell::from(record.dst.clone()),
        Cell::from(record.protocol.clone()),
        Cell::from(record.length.to_string()),
        Cell::from(truncate_info(&record.info)),
    ])
    .style(style)
}

fn render_table(app: &App) -> Table<'static> {
    let rows: Vec<Row> = app.visible_rows().into_iter().map(table_row).collect();
    let header = Row::new(vec![
        "No.",
        "Time",
        "Source",
        "Destination",
        "Protocol",
        "Length",
        "Info",
    ])
    .style(Style::default().add_modifier(Modifier::BOLD));
    let widths = [
        Constraint::Length(7),
        Constraint::Length(13),
        Constraint::Length(18),
        Constraint::Length(18),
        Constraint::Length(9),
        Constraint::Length(7),
        Constraint::Min(20),
    ];
    Table::new(rows, widths).header(header).block(
        Block::default()
            .title(Span::styled(" Packets ", focus_style(app, Focus::Table)))
            .borders(Borders::ALL),
    )
}

fn render_detail(app: &App) -> Paragraph<'static> {
    let title = match app.selected() {
        Some(index) => format!(" Details: packet {} ", index + 1),
        None => " Details ".to_string(),
    };
    // Unwrapped so the scroll offset counts detail lines.
    Paragraph::new(app.detail().text().to_string())
        .block(
            Block::default()
                .title(Span::styled(title, focus_style(app, Focus::Detail)))
                .borders(Borders::ALL),
        )
        .scroll((app.detail_scroll(), 0))
}

fn render_footer(app: &App) -> Paragraph<'static> {
    let mut spans = vec![Span::styled(
        format!(" {}", counter_label(app.row_count())),
        Style::default().fg(Color::Cyan),
    )];
    let indicator = app.indicator();
    if indicator.visible {
        spans.push(Span::raw("   "));
        spans.push(Span::styled(
            indicator.label,
            Style::default().fg(if app.follow_mode() == FollowMode::Following {
                Color::Green
            } else {
                Color::Yellow
            }),
        ));
        spans.push(Span::styled(
            format!("  [^F] {}", indicator.toggle_hint),
            Style::default().fg(Color::DarkGray),
        ));
    }
    Paragraph::new(Line::from(spans))
}

fn render_notice(frame: &mut Frame, app: &App) {
    let Some(notice) = app.notice() else {
        return;
    };
    let area = centered_rect(60, 25, frame.size());
    frame.render_widget(Clear, area);
    frame.render_widget(
        Paragraph::new(Text::from(vec![
            Line::from(notice.message.clone()),
            Line::from(""),
            Line::from(Span::styled(
                "Enter to dismiss",
                Style::default().fg(Color::DarkGray),
            )),
        ]))
        .block(
            Block::default()
                .title(Span::styled(
                    notice.title(),
                    Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
                ))
                .borders(Borders::ALL),
        )
        .wrap(Wrap { trim: true }),
        area,
    );
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100u16.saturating_sub(percent_y)) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100u16.saturating_sub(percent_y)) / 2),
        ])
        .split(area);
    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100u16.saturating_sub(percent_x)) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100u16.saturating_sub(percent_x)) / 2),
        ])
        .split(vertical[1])[1]
}

#[cfg(test)]
mod tests {
    use std::time::Instant;

    use ratatui::{backend::TestBackend, Terminal};

    use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

    use super::*;
    use crate::app::{Completion, Effect, Request};
    use crate::config::Config;
    use crate::reconcile::tests::records;

    fn screen(app: &mut App) -> String {
        let backend = TestBackend::new(120, 40);
        let mut terminal = Terminal::new(backend).expect("terminal");
        let areas = layout(Rect::new(0, 0, 120, 40));
        app.set_table_area(areas.table);
        app.set_detail_area(areas.detail);
        terminal.draw(|frame| render(frame, app)).expect("draw");
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|cell| cell.symbol())
            .collect()
    }

    #[test]
    fn info_is_cut_at_fifty_chars() {
        let long = "x".repeat(60);
        assert_eq!(truncate_info(&long), format!("{}...", "x".repeat(50)));
        assert_eq!(truncate_info("short"), "short");
    }

    #[test]
    fn screen_shows_counter_and_indicator() {
        let now = Instant::now();
        let mut app = App::new(&Config::default());
        app.on_completion(
            Completion::Started {
                interface: "eth0".to_string(),
                result: Ok(()),
            },
            now,
        );
        let effects = app.on_tick();
        let [Effect::Remote(Request::FetchRecords { seq })] = effects.as_slice() else {
            panic!("expected fetch");
        };
        app.on_completion(
            Completion::Records {
                seq: *seq,
                result: Ok(records(3)),
            },
            now,
        );
        let text = screen(&mut app);
        assert!(text.contains("Packets captured: 3"));
        assert!(text.contains("Auto-follow: ON"));
        assert!(text.contains("Capturing packets..."));
    }

    #[test]
    fn detail_panel_reaches_last_line() {
        let now = Instant::now();
        let mut app = App::new(&Config::default());
        app.on_completion(Completion::Interfaces(Ok(Vec::new())), now);
        app.on_completion(
            Completion::Started {
                interface: "eth0".to_string(),
                result: Ok(()),
            },
            now,
        );
        let effects = app.on_tick();
        let [Effect::Remote(Request::FetchRecords { seq })] = effects.as_slice() else {
            panic!("expected fetch");
        };
        app.on_completion(
            Completion::Records {
                seq: *seq,
                result: Ok(records(3)),
            },
            now,
        );
        let effects = app.select_row(0, now);
        let [Effect::Remote(Request::FetchDetail(request))] = effects.as_slice() else {
            panic!("expected detail fetch");
        };
        let text = (1..=40)
            .map(|n| format!("###[ layer {n:02} ]###"))
            .collect::<Vec<_>>()
            .join("\n");
        app.on_completion(
            Completion::Detail {
                request: *request,
                result: Ok(text),
            },
            now,
        );
        assert!(screen(&mut app).contains("layer 08"));

        let shift_tab = KeyEvent::new(KeyCode::BackTab, KeyModifiers::SHIFT);
        let tab = KeyEvent::new(KeyCode::Tab, KeyModifiers::NONE);
        app.on_key(tab, now);
        assert_eq!(app.focus(), Focus::Detail);
        app.on_key(KeyEvent::new(KeyCode::End, KeyModifiers::NONE), now);
        let text = screen(&mut app);
        assert!(text.contains("layer 40"));
        assert!(!text.contains("layer 01"));

        app.on_key(shift_tab, now);
        assert_eq!(app.focus(), Focus::Table);
    }

    #[test]
    fn idle_screen_hides_indicator() {
        let mut app = App::new(&Config::default());
        let text = screen(&mut app);
        assert!(text.contains("Packets captured: 0"));
        assert!(!text.contains("Auto-follow"));
        assert!(text.contains("Loading interfaces..."));
    }
}
