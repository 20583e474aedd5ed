//! Single-screen layout: endpoint input, status, progress gauge, message log.

use ratatui::{
    Frame,
    layout::{Constraint, Layout},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Gauge, Paragraph, Wrap},
};

use crate::app::{App, LogEntry, MessageKind, StreamStatus};
use crate::settings::SettingsStore;

const COLOR_BORDER: Color = Color::DarkGray;
const COLOR_DIM: Color = Color::Gray;

pub fn render<S: SettingsStore>(frame: &mut Frame, app: &App<S>) {
    let [input_area, status_area, gauge_area, log_area, help_area] = Layout::vertical([
        Constraint::Length(3),
        Constraint::Length(1),
        Constraint::Length(3),
        Constraint::Min(3),
        Constraint::Length(1),
    ])
    .areas(frame.area());

    let input = Paragraph::new(app.input.as_str()).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(COLOR_BORDER))
            .title(" API endpoint "),
    );
    frame.render_widget(input, input_area);

    let status = app.controller.status();
    frame.render_widget(
        Paragraph::new(Span::styled(status.label(), status_style(status))),
        status_area,
    );

    let gauge = Gauge::default()
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(COLOR_BORDER))
                .title(" Progress "),
        )
        .gauge_style(Style::default().fg(Color::Cyan))
        .percent(u16::from(app.controller.progress()));
    frame.render_widget(gauge, gauge_area);

    render_log(frame, log_area, app.controller.log());

    let help = if status.is_active() {
        "Esc cancel · Ctrl-L clear · Ctrl-C quit"
    } else {
        "Enter start · Ctrl-L clear · Ctrl-C quit"
    };
    frame.render_widget(
        Paragraph::new(Span::styled(help, Style::default().fg(COLOR_DIM))),
        help_area,
    );
}

fn render_log(frame: &mut Frame, area: ratatui::layout::Rect, log: &[LogEntry]) {
    let lines: Vec<Line> = log.iter().map(log_line).collect();
    let paragraph = Paragraph::new(lines).wrap(Wrap { trim: false });

    // Offset in wrapped rows so the newest line stays in view.
    let inner_width = area.width.saturating_sub(2);
    let inner_height = usize::from(area.height.saturating_sub(2));
    let rows = paragraph.line_count(inner_width);
    let offset = u16::try_from(rows.saturating_sub(inner_height)).unwrap_or(u16::MAX);

    let paragraph = paragraph
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(COLOR_BORDER))
                .title(" Output "),
        )
        .scroll((offset, 0));
    frame.render_widget(paragraph, area);
}

fn log_line(entry: &LogEntry) -> Line<'static> {
    Line::from(vec![
        Span::styled(
            entry.at.format("%H:%M:%S ").to_string(),
            Style::default().fg(COLOR_DIM),
        ),
        Span::styled(entry.text.clone(), kind_style(entry.kind)),
    ])
}

fn kind_style(kind: MessageKind) -> Style {
    match kind {
        MessageKind::Info => Style::default().fg(Color::Blue),
        MessageKind::Data => Style::default(),
        MessageKind::Error => Style::default().fg(Color::Red),
        MessageKind::Success => Style::default()
            .fg(Color::Green)
            .add_modifier(Modifier::BOLD),
    }
}

fn status_style(status: &StreamStatus) -> Style {
    match status {
        StreamStatus::Idle => Style::default().fg(COLOR_DIM),
        StreamStatus::Connecting | StreamStatus::Streaming => Style::default().fg(Color::Yellow),
        StreamStatus::Complete => Style::default().fg(Color::Green),
        StreamStatus::Error(_) => Style::default().fg(Color::Red),
    }
}
