use ratatui::{
    Frame,
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Paragraph, Scrollbar, ScrollbarOrientation, ScrollbarState, Wrap},
};
use codesense_core::{Mode, Report, ScoreBand, SessionState};

use crate::app::{App, InputMode, NoticeLevel};

fn band_color(band: ScoreBand) -> Color {
    match band {
        ScoreBand::Good => Color::Green,
        ScoreBand::Warning => Color::Yellow,
        ScoreBand::Poor => Color::Red,
    }
}

pub fn render(app: &mut App, frame: &mut Frame) {
    let area = frame.area();

    // Main layout: header, path input, status, report, footer
    let [header_area, input_area, status_area, report_area, footer_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Length(3),
        Constraint::Length(4),
        Constraint::Min(0),
        Constraint::Length(1),
    ])
    .areas(area);

    render_header(frame, header_area);
    render_path_input(app, frame, input_area);
    render_status(app, frame, status_area);
    render_report(app, frame, report_area);
    render_footer(app, frame, footer_area);
}

fn render_header(frame: &mut Frame, area: Rect) {
    let title = Line::from(vec![
        Span::styled(" CodeSense ", Style::default().fg(Color::Cyan).bold()),
        Span::styled("AI code review", Style::default().fg(Color::White)),
        Span::raw(" "),
        Span::styled(
            format!("v{}", env!("CARGO_PKG_VERSION")),
            Style::default().fg(Color::DarkGray),
        ),
    ]);

    let header = Paragraph::new(title).style(Style::default().bg(Color::DarkGray));
    frame.render_widget(header, area);
}

fn render_path_input(app: &App, frame: &mut Frame, area: Rect) {
    let editing = app.input_mode == InputMode::Editing;
    let border_color = if editing { Color::Yellow } else { Color::DarkGray };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color))
        .title(" Code file (o to edit, Enter to select) ");

    // Horizontal scrolling keeps the cursor visible in long paths
    let inner_width = area.width.saturating_sub(2) as usize;
    let cursor_pos = app.path_cursor;
    let scroll_offset = if inner_width == 0 {
        0
    } else if cursor_pos >= inner_width {
        cursor_pos - inner_width + 1
    } else {
        0
    };

    let input = if app.path_input.is_empty() && !editing {
        Paragraph::new(Span::styled(
            "No file selected",
            Style::default().fg(Color::DarkGray),
        ))
    } else {
        let visible_text: String = app
            .path_input
            .chars()
            .skip(scroll_offset)
            .take(inner_width)
            .collect();
        Paragraph::new(visible_text).style(Style::default().fg(Color::Cyan))
    };

    frame.render_widget(input.block(block), area);

    if editing {
        let cursor_x = (cursor_pos - scroll_offset) as u16;
        frame.set_cursor_position((area.x + cursor_x + 1, area.y + 1));
    }
}

fn render_status(app: &App, frame: &mut Frame, area: Rect) {
    let state = app.session.state();
    let muted = Style::default().fg(Color::DarkGray);

    let status_line = match state {
        SessionState::Idle => Line::from(Span::styled(
            "Select a .py, .js, .java, .ts, .cpp or .c file to review.",
            muted,
        )),
        SessionState::Ready { file } => Line::from(vec![
            Span::styled("Selected: ", Style::default().fg(Color::White)),
            Span::styled(file.name.clone(), Style::default().fg(Color::Cyan).bold()),
            Span::styled(format!(" ({} bytes)", file.payload.len()), muted),
            Span::styled("  press a to analyze", muted),
        ]),
        SessionState::Pending { file } => {
            // Animated ellipsis: cycles through ".", "..", "..."
            let dots = ".".repeat((app.animation_frame as usize) + 1);
            Line::from(vec![
                Span::styled(
                    format!("Analyzing{}", dots),
                    Style::default().fg(Color::Yellow).add_modifier(Modifier::ITALIC),
                ),
                Span::raw(" "),
                Span::styled(file.name.clone(), Style::default().fg(Color::Cyan)),
            ])
        }
        SessionState::Succeeded { file, .. } => Line::from(vec![
            Span::styled("Review ready for ", Style::default().fg(Color::Green)),
            Span::styled(file.name.clone(), Style::default().fg(Color::Cyan).bold()),
            Span::styled("  press e to export", muted),
        ]),
        SessionState::Failed { message, .. } => Line::from(vec![
            Span::styled("Error: ", Style::default().fg(Color::Red).bold()),
            Span::styled(message.clone(), Style::default().fg(Color::Red)),
        ]),
    };

    let mut lines = vec![status_line];
    if let Some(notice) = &app.notice {
        let color = match notice.level {
            NoticeLevel::Info => Color::Green,
            NoticeLevel::Warning => Color::Yellow,
            NoticeLevel::Error => Color::Red,
        };
        lines.push(Line::from(Span::styled(notice.text.clone(), Style::default().fg(color))));
    }

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(format!(" Status: {} ", state.label()));

    let status = Paragraph::new(Text::from(lines))
        .block(block)
        .wrap(Wrap { trim: true });
    frame.render_widget(status, area);
}

/// Lines for a finished review: title, colored score, then each section.
pub fn report_lines(report: &Report) -> Vec<Line<'static>> {
    let heading = Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD);
    let mut lines = vec![
        Line::from(Span::styled(
            report.title(),
            Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
        )),
        Line::default(),
        Line::from(vec![
            Span::styled("Code Quality Score: ", heading),
            Span::styled(
                report.score_label(),
                Style::default().fg(band_color(report.band)).add_modifier(Modifier::BOLD),
            ),
        ]),
        Line::default(),
    ];

    for section in &report.sections {
        lines.push(Line::from(Span::styled(section.title, heading)));

        if section.items.is_empty() {
            let placeholder = match section.kind {
                Mode::Narrative => "Not provided.",
                Mode::EnumeratedList => "No items reported.",
            };
            lines.push(Line::from(Span::styled(
                placeholder,
                Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
            )));
        }

        for item in &section.items {
            match section.kind {
                Mode::Narrative => {
                    lines.extend(item.lines().map(|l| Line::from(l.to_string())));
                }
                Mode::EnumeratedList => lines.push(Line::from(vec![
                    Span::styled("  • ", Style::default().fg(Color::Yellow)),
                    Span::raw(item.clone()),
                ])),
            }
        }
        lines.push(Line::default());
    }

    lines
}

/// Row count of `lines` once wrapped to `width` columns.
fn wrapped_height(lines: &[Line], width: u16) -> u16 {
    if width == 0 {
        return 0;
    }
    let width = width as usize;
    let rows: usize = lines
        .iter()
        .map(|line| line.width().max(1).div_ceil(width))
        .sum();
    rows.min(u16::MAX as usize) as u16
}

fn render_report(app: &mut App, frame: &mut Frame, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(" Report ");

    // Inner size minus borders, used for scroll calculations
    app.report_height = area.height.saturating_sub(2);
    let inner_width = area.width.saturating_sub(2);

    let state = app.session.state();
    let (Some(file), Some(record)) = (state.file(), state.record()) else {
        app.total_report_lines = 0;
        let hint = Paragraph::new(Span::styled(
            "The review report appears here once an analysis succeeds.",
            Style::default().fg(Color::DarkGray),
        ))
        .block(block);
        frame.render_widget(hint, area);
        return;
    };

    let lines = report_lines(&Report::build(&file.name, record));
    app.total_report_lines = wrapped_height(&lines, inner_width);
    app.report_scroll = app
        .report_scroll
        .min(app.total_report_lines.saturating_sub(app.report_height));

    let report = Paragraph::new(Text::from(lines))
        .block(block)
        .wrap(Wrap { trim: false })
        .scroll((app.report_scroll, 0));
    frame.render_widget(report, area);

    if app.total_report_lines > app.report_height {
        let mut scrollbar_state = ScrollbarState::new(
            app.total_report_lines.saturating_sub(app.report_height) as usize,
        )
        .position(app.report_scroll as usize);
        frame.render_stateful_widget(
            Scrollbar::new(ScrollbarOrientation::VerticalRight),
            area,
            &mut scrollbar_state,
        );
    }
}

fn render_footer(app: &App, frame: &mut Frame, area: Rect) {
    let (mode_text, mode_style) = match app.input_mode {
        InputMode::Normal => (" NORMAL ", Style::default().bg(Color::Blue).fg(Color::White)),
        InputMode::Editing => (" PATH ", Style::default().bg(Color::Yellow).fg(Color::Black)),
    };

    // Key style: dark background with bright text for visibility on both light/dark terminals
    let key_style = Style::default().bg(Color::DarkGray).fg(Color::White);
    let label_style = Style::default().bg(Color::Black).fg(Color::White);

    let pairs: &[(&str, &str)] = match (app.input_mode, app.session.state()) {
        (InputMode::Editing, _) => &[(" Enter ", " select "), (" Esc ", " stop typing ")],
        (InputMode::Normal, SessionState::Idle) => &[(" o ", " open file "), (" q ", " quit ")],
        (InputMode::Normal, SessionState::Ready { .. }) => &[
            (" a ", " analyze "),
            (" o ", " change file "),
            (" x ", " reset "),
            (" q ", " quit "),
        ],
        (InputMode::Normal, SessionState::Pending { .. }) => {
            &[(" o ", " change file "), (" x ", " cancel "), (" q ", " quit ")]
        }
        (InputMode::Normal, SessionState::Succeeded { .. }) => &[
            (" j/k ", " scroll "),
            (" e ", " export "),
            (" o ", " new file "),
            (" x ", " reset "),
            (" q ", " quit "),
        ],
        (InputMode::Normal, SessionState::Failed { .. }) => &[
            (" r ", " retry "),
            (" o ", " change file "),
            (" x ", " reset "),
            (" q ", " quit "),
        ],
    };

    let mut spans = vec![Span::styled(mode_text, mode_style), Span::styled(" ", label_style)];
    for (key, label) in pairs {
        spans.push(Span::styled(*key, key_style));
        spans.push(Span::styled(*label, label_style));
    }

    let footer = Paragraph::new(Line::from(spans)).style(Style::default().bg(Color::Black));
    frame.render_widget(footer, area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use codesense_core::ReviewRecord;

    fn report(score: f64, bugs: &str) -> Report {
        let record = ReviewRecord {
            score,
            summary: "Clean.".into(),
            readability: "Excellent.".into(),
            modularity: "".into(),
            bugs: bugs.into(),
            suggestions: "* Add type hints".into(),
        };
        Report::build("main.py", &record)
    }

    fn plain(line: &Line) -> String {
        line.spans.iter().map(|s| s.content.as_ref()).collect()
    }

    #[test]
    fn test_report_lines_layout() {
        let lines = report_lines(&report(9.0, "1. None found"));
        let text: Vec<String> = lines.iter().map(plain).collect();

        assert_eq!(text[0], "Review Report for main.py");
        assert_eq!(text[2], "Code Quality Score: 9/10");
        assert!(text.contains(&"  • None found".to_string()));
        assert!(text.contains(&"  • Add type hints".to_string()));
        assert!(text.contains(&"Not provided.".to_string()));
    }

    #[test]
    fn test_score_colored_by_band() {
        for (score, color) in [(9.0, Color::Green), (6.0, Color::Yellow), (2.0, Color::Red)] {
            let lines = report_lines(&report(score, ""));
            assert_eq!(lines[2].spans[1].style.fg, Some(color));
        }
    }

    #[test]
    fn test_empty_list_placeholder() {
        let text: Vec<String> = report_lines(&report(5.0, "   "))
            .iter()
            .map(plain)
            .collect();
        assert!(text.contains(&"No items reported.".to_string()));
    }

    #[test]
    fn test_wrapped_height() {
        let lines = vec![Line::from("a".repeat(25)), Line::default(), Line::from("short")];
        assert_eq!(wrapped_height(&lines, 10), 3 + 1 + 1);
        assert_eq!(wrapped_height(&lines, 0), 0);
    }
}
