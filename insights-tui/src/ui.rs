//! UI rendering module.
//!
//! This module handles all the TUI rendering using ratatui: the tab bar,
//! the three views, the log pane, and the overlays (file prompt, add-task
//! form, toasts, help).

use chrono::{Datelike, NaiveDate};
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Gauge, List, ListItem, ListState, Paragraph, Tabs, Wrap},
    Frame,
};

use crate::app::{App, LogLevel, TaskField, TaskForm, Tab};
use crate::dates;
use crate::models::Emotion;
use crate::theme::{blend, colors, styles};
use crate::timeline::TimelineWidget;
use crate::upload::{UploadPhase, MAX_UPLOAD_MB};

const SPINNER: [char; 4] = ['◐', '◓', '◑', '◒'];

/// Render the entire UI
pub fn render(frame: &mut Frame, app: &App) {
    let area = frame.area();

    let bg_block = Block::default().style(Style::default().bg(colors::BG_DARK));
    frame.render_widget(bg_block, area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Tabs
            Constraint::Min(10),   // Main content
            Constraint::Length(6), // Log area
            Constraint::Length(1), // Status bar
        ])
        .split(area);

    render_tabs(frame, app, chunks[0]);
    match app.active_tab {
        Tab::Dashboard => render_dashboard(frame, app, chunks[1]),
        Tab::Timeline => render_timeline_view(frame, app, chunks[1]),
        Tab::Speakers => render_speakers_view(frame, app, chunks[1]),
    }
    render_logs(frame, app, chunks[2]);
    render_status(frame, app, chunks[3]);

    if let Some(input) = &app.file_input {
        render_file_prompt(frame, input, area);
    }
    if let Some(form) = &app.task_form {
        render_task_form(frame, form, app.today, area);
    }
    render_notices(frame, app, area);
    if app.show_help {
        render_help_overlay(frame, area);
    }
}

fn spinner(app: &App) -> char {
    SPINNER[(app.frame_count / 4 % SPINNER.len() as u64) as usize]
}

fn render_tabs(frame: &mut Frame, app: &App, area: Rect) {
    let titles: Vec<Line> = Tab::all()
        .iter()
        .enumerate()
        .map(|(i, tab)| {
            let style = if *tab == app.active_tab {
                styles::tab_active()
            } else {
                styles::tab_inactive()
            };
            Line::from(Span::styled(format!(" {} {} ", i + 1, tab.name()), style))
        })
        .collect();

    let selected = Tab::all()
        .iter()
        .position(|t| *t == app.active_tab)
        .unwrap_or(0);

    let tabs = Tabs::new(titles)
        .block(
            Block::default()
                .title(" Audio Insights Dashboard ")
                .title_style(styles::title())
                .borders(Borders::ALL)
                .border_style(styles::border())
                .style(Style::default().bg(colors::BG_MEDIUM)),
        )
        .select(selected)
        .style(styles::text())
        .highlight_style(styles::tab_active())
        .divider(Span::styled(" | ", styles::border_dim()));

    frame.render_widget(tabs, area);
}

// ============================================
// Dashboard
// ============================================

fn render_dashboard(frame: &mut Frame, app: &App, area: Rect) {
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(40), Constraint::Percentage(60)])
        .split(area);

    let left = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(7),    // File
            Constraint::Length(3), // Progress
            Constraint::Length(3), // Actions
        ])
        .split(columns[0]);

    render_file_panel(frame, app, left[0]);
    render_upload_progress(frame, app, left[1]);
    render_actions(frame, app, left[2]);

    let right = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(6), Constraint::Length(6)])
        .split(columns[1]);

    render_summary(frame, app, right[0]);
    render_emotions(frame, app, right[1]);
}

fn render_file_panel(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .title(" Recording ")
        .title_style(styles::title_accent())
        .borders(Borders::ALL)
        .border_style(styles::border())
        .style(Style::default().bg(colors::BG_DARK));

    let lines = match &app.upload.file {
        None => vec![
            Line::from(""),
            Line::from(vec![
                Span::styled("Press ", styles::text_dim()),
                Span::styled("o", styles::bold()),
                Span::styled(" to choose a recording", styles::text_dim()),
            ]),
            Line::from(Span::styled(
                format!("MP3, WAV, or M4A (MAX. {MAX_UPLOAD_MB}MB)"),
                styles::text_hint(),
            )),
        ],
        Some(file) => {
            let (state, style) = match app.upload.phase {
                UploadPhase::Idle | UploadPhase::Selected => ("Ready for upload", styles::info()),
                UploadPhase::Uploading { .. } => ("Uploading", styles::warning()),
                UploadPhase::Uploaded => ("Uploaded", styles::success()),
                UploadPhase::Generating => ("Generating summary", styles::warning()),
                UploadPhase::Done => ("Summary ready", styles::success()),
            };
            vec![
                Line::from(vec![
                    Span::styled("♫ ", Style::default().fg(colors::PURPLE)),
                    Span::styled(file.name.clone(), styles::title()),
                ]),
                Line::from(Span::styled(
                    format!("{} · {}", file.mime, format_size(file.size)),
                    styles::text_dim(),
                )),
                Line::from(""),
                Line::from(Span::styled(state, style)),
            ]
        }
    };

    let paragraph = Paragraph::new(lines)
        .block(block)
        .wrap(Wrap { trim: true })
        .alignment(Alignment::Center);
    frame.render_widget(paragraph, area);
}

fn format_size(bytes: u64) -> String {
    const KB: f64 = 1024.0;
    let bytes = bytes as f64;
    if bytes >= KB * KB {
        format!("{:.1} MB", bytes / (KB * KB))
    } else if bytes >= KB {
        format!("{:.1} KB", bytes / KB)
    } else {
        format!("{bytes} B")
    }
}

fn render_upload_progress(frame: &mut Frame, app: &App, area: Rect) {
    let progress = app.upload.progress();
    let ratio = progress as f64 / 100.0;
    let label = match app.upload.phase {
        UploadPhase::Uploading { progress } => format!("Uploading... {progress}%"),
        UploadPhase::Idle | UploadPhase::Selected => String::new(),
        _ => "Upload complete".to_string(),
    };

    let gauge = Gauge::default()
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(styles::border_dim()),
        )
        .gauge_style(
            Style::default()
                .fg(blend(colors::BAR_FROM, colors::BAR_TO, ratio as f32))
                .bg(colors::BG_MEDIUM),
        )
        .ratio(ratio)
        .label(Span::styled(label, styles::text()));
    frame.render_widget(gauge, area);
}

fn render_actions(frame: &mut Frame, app: &App, area: Rect) {
    let button = |key: &str, label: &str, enabled: bool| {
        let style = if enabled {
            styles::button_focused()
        } else {
            styles::button_disabled()
        };
        Span::styled(format!(" [{key}] {label} "), style)
    };

    let mut spans = vec![
        button("o", "Choose", !app.upload.is_uploading()),
        Span::raw(" "),
        button("u", "Upload", app.upload.can_upload()),
        Span::raw(" "),
        button("g", "Generate Summary", app.upload.can_generate()),
    ];
    if app.upload.is_uploading() || app.upload.phase == UploadPhase::Generating {
        spans.push(Span::styled(format!(" {}", spinner(app)), styles::warning()));
    }

    let paragraph = Paragraph::new(Line::from(spans))
        .alignment(Alignment::Center)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(styles::border_dim()),
        );
    frame.render_widget(paragraph, area);
}

fn render_summary(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .title(" Summary ")
        .title_style(styles::title_accent())
        .borders(Borders::ALL)
        .border_style(styles::border())
        .style(Style::default().bg(colors::BG_DARK));

    let mut lines = Vec::new();
    match &app.summary {
        Some(reveal) => {
            let mut spans: Vec<Span> = reveal
                .visible()
                .into_iter()
                .map(|seg| {
                    let style = if seg.bold { styles::bold() } else { styles::text() };
                    Span::styled(seg.text, style)
                })
                .collect();
            if !reveal.is_done() {
                spans.push(Span::styled("▌", Style::default().fg(colors::ACCENT)));
            }
            lines.push(Line::from(spans));
            if let Some(image) = app.images.first() {
                lines.push(Line::from(""));
                lines.push(Line::from(vec![
                    Span::styled("Image: ", styles::text_dim()),
                    Span::styled(image.clone(), styles::info()),
                ]));
            }
        }
        None if app.upload.phase == UploadPhase::Generating => {
            lines.push(Line::from(Span::styled(
                format!("{} Generating summary...", spinner(app)),
                styles::warning(),
            )));
        }
        None if app.upload.can_generate() => {
            lines.push(Line::from(vec![
                Span::styled("Press ", styles::text_dim()),
                Span::styled("g", styles::bold()),
                Span::styled(" to generate a summary", styles::text_dim()),
            ]));
        }
        None => {
            lines.push(Line::from(Span::styled(
                "Transform your meetings into actionable summaries",
                styles::text_hint(),
            )));
        }
    }

    let paragraph = Paragraph::new(lines).block(block).wrap(Wrap { trim: true });
    frame.render_widget(paragraph, area);
}

fn emotion_line(selected: Emotion) -> Line<'static> {
    let mut spans = Vec::new();
    for emotion in Emotion::all() {
        let style = if *emotion == selected {
            styles::selected()
        } else {
            styles::text_dim()
        };
        spans.push(Span::styled(format!(" {emotion} "), style));
        spans.push(Span::raw(" "));
    }
    Line::from(spans)
}

fn render_emotions(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .title(" Emotion  ◀ E / e ▶ ")
        .title_style(styles::title())
        .borders(Borders::ALL)
        .border_style(styles::border_dim());

    let mut lines = vec![emotion_line(app.emotion)];
    if app.is_in_flight(crate::requests::RequestKind::Emotion) {
        lines.push(Line::from(Span::styled(
            format!("{} Updating plots...", spinner(app)),
            styles::warning(),
        )));
    } else if app.images.len() > 1 {
        lines.push(Line::from(Span::styled(
            format!("{} plots available", app.images.len()),
            styles::text_dim(),
        )));
    }

    let paragraph = Paragraph::new(lines).block(block).wrap(Wrap { trim: true });
    frame.render_widget(paragraph, area);
}

// ============================================
// Timeline
// ============================================

fn render_timeline_view(frame: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(70), Constraint::Percentage(30)])
        .split(area);

    if app.tasks_loading && app.tasks.is_empty() {
        render_loading(frame, chunks[0]);
    } else {
        let widget = TimelineWidget::new(&app.tasks, &app.layout, &app.timeline_state);
        frame.render_widget(widget, chunks[0]);
    }

    render_task_details(frame, app, chunks[1]);
}

fn render_task_details(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .title(" Task Details ")
        .title_style(styles::title_accent())
        .borders(Borders::ALL)
        .border_style(styles::border())
        .style(Style::default().bg(colors::BG_DARK));

    let mut lines = Vec::new();
    if let Some(error) = &app.tasks_error {
        lines.push(Line::from(Span::styled(error.clone(), styles::error())));
        lines.push(Line::from(""));
    }

    match app.selected_task() {
        Some(task) => {
            lines.push(Line::from(Span::styled(task.name.clone(), styles::title())));
            lines.push(Line::from(""));
            lines.push(Line::from(Span::styled(
                task.description.clone(),
                styles::text(),
            )));
            lines.push(Line::from(""));
            lines.push(Line::from(vec![
                Span::styled("When  ", styles::text_dim()),
                Span::styled(task.range_label(), styles::info()),
            ]));
            lines.push(Line::from(vec![
                Span::styled("Days  ", styles::text_dim()),
                Span::styled(task.duration_days().to_string(), styles::text()),
            ]));
        }
        None => {
            lines.push(Line::from(Span::styled(
                "No task selected",
                styles::text_dim(),
            )));
        }
    }

    lines.push(Line::from(""));
    lines.push(Line::from(vec![
        Span::styled("Window ", styles::text_dim()),
        Span::styled(
            format!(
                "{} - {}",
                dates::format_short(app.layout.project_start),
                dates::format_long(app.layout.window_end())
            ),
            styles::text(),
        ),
    ]));
    lines.push(Line::from(Span::styled(
        format!("{} weeks · weeks start {}", app.layout.total_weeks, app.week_start),
        styles::text_hint(),
    )));
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        "a: add task  s: scale  r: reload",
        styles::text_hint(),
    )));

    let paragraph = Paragraph::new(lines).block(block).wrap(Wrap { trim: true });
    frame.render_widget(paragraph, area);
}

// ============================================
// Speakers
// ============================================

fn render_speakers_view(frame: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(24), Constraint::Min(20)])
        .split(area);

    let items: Vec<ListItem> = app
        .speakers
        .iter()
        .map(|id| ListItem::new(Line::from(Span::styled(format!(" {id}"), styles::text()))))
        .collect();
    let list = List::new(items)
        .block(
            Block::default()
                .title(" Speakers ")
                .title_style(styles::title_accent())
                .borders(Borders::ALL)
                .border_style(styles::border()),
        )
        .highlight_style(styles::selected())
        .highlight_symbol("▸");
    let mut state = ListState::default().with_selected(Some(app.selected_speaker));
    frame.render_stateful_widget(list, chunks[0], &mut state);

    let right = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Relevant
            Constraint::Length(3), // Not relevant
            Constraint::Min(4),    // Plot
        ])
        .split(chunks[1]);

    let shown = app.relevance.as_ref();
    let ratio = shown.map(|r| r.relevance.relevant_ratio()).unwrap_or(0.0);
    let title = match shown {
        Some(r) => format!(" Relevance · {} ", r.speaker_id),
        None => " Relevance · press Enter ".to_string(),
    };

    let relevant = Gauge::default()
        .block(
            Block::default()
                .title(title)
                .title_style(styles::title())
                .borders(Borders::ALL)
                .border_style(styles::border_dim()),
        )
        .gauge_style(Style::default().fg(colors::RELEVANT).bg(colors::BG_MEDIUM))
        .ratio(ratio)
        .label(format!("Relevant {:.0}%", ratio * 100.0));
    frame.render_widget(relevant, right[0]);

    let not_relevant = Gauge::default()
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(styles::border_dim()),
        )
        .gauge_style(Style::default().fg(colors::NOT_RELEVANT).bg(colors::BG_MEDIUM))
        .ratio(if shown.is_some() { 1.0 - ratio } else { 0.0 })
        .label(format!(
            "Not Relevant {:.0}%",
            if shown.is_some() { (1.0 - ratio) * 100.0 } else { 0.0 }
        ));
    frame.render_widget(not_relevant, right[1]);

    let plot = Paragraph::new(vec![
        emotion_line(app.emotion),
        Line::from(""),
        Line::from(vec![
            Span::styled("Plot: ", styles::text_dim()),
            Span::styled(
                app.plot_url(app.selected_speaker).unwrap_or_default(),
                styles::info(),
            ),
        ]),
    ])
    .block(
        Block::default()
            .title(" Emotion Plot ")
            .title_style(styles::title())
            .borders(Borders::ALL)
            .border_style(styles::border_dim()),
    )
    .wrap(Wrap { trim: true });
    frame.render_widget(plot, right[2]);
}

// ============================================
// Log, status, overlays
// ============================================

fn render_logs(frame: &mut Frame, app: &App, area: Rect) {
    let items: Vec<ListItem> = app
        .logs
        .iter()
        .rev()
        .take(area.height.saturating_sub(2) as usize)
        .map(|entry| {
            let (prefix, color) = level_marker(entry.level);
            ListItem::new(Line::from(vec![
                Span::styled(format!("[{}] ", prefix), Style::default().fg(color)),
                Span::styled(&entry.message, styles::text_dim()),
            ]))
        })
        .collect();

    let list = List::new(items).block(
        Block::default()
            .title(" Log ")
            .title_style(Style::default().fg(colors::FG_DIM))
            .borders(Borders::ALL)
            .border_style(styles::border_dim())
            .style(Style::default().bg(colors::BG_DARK)),
    );

    frame.render_widget(list, area);
}

fn level_marker(level: LogLevel) -> (&'static str, ratatui::style::Color) {
    match level {
        LogLevel::Info => ("i", colors::BLUE),
        LogLevel::Success => ("+", colors::GREEN),
        LogLevel::Warning => ("!", colors::YELLOW),
        LogLevel::Error => ("x", colors::RED),
    }
}

fn render_status(frame: &mut Frame, app: &App, area: Rect) {
    let status = Paragraph::new(app.status_text())
        .style(Style::default().fg(colors::FG_DIM).bg(colors::BG_MEDIUM));
    frame.render_widget(status, area);
}

fn render_loading(frame: &mut Frame, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(styles::border());
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let paragraph = Paragraph::new("Loading tasks...")
        .style(styles::text_dim())
        .alignment(Alignment::Center);
    let y = inner.y + inner.height / 2;
    frame.render_widget(paragraph, Rect::new(inner.x, y, inner.width, 1));
}

/// Toasts stacked in the top right corner, newest at the bottom
fn render_notices(frame: &mut Frame, app: &App, area: Rect) {
    let width = 44.min(area.width);
    let height = 4;
    let x = area.x + area.width.saturating_sub(width + 1);
    let mut y = area.y + 1;

    for notice in &app.notices {
        if y + height > area.y + area.height {
            break;
        }
        let rect = Rect::new(x, y, width, height);
        frame.render_widget(Clear, rect);

        let (_, color) = level_marker(notice.level);
        let bg = if notice.level == LogLevel::Error {
            colors::BG_ERROR
        } else {
            colors::BG_MEDIUM
        };
        let paragraph = Paragraph::new(notice.message.as_str())
            .style(styles::text())
            .wrap(Wrap { trim: true })
            .block(
                Block::default()
                    .title(format!(" {} ", notice.title))
                    .title_style(Style::default().fg(color).add_modifier(Modifier::BOLD))
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(color))
                    .style(Style::default().bg(bg)),
            );
        frame.render_widget(paragraph, rect);
        y += height;
    }
}

fn render_file_prompt(frame: &mut Frame, input: &str, area: Rect) {
    let popup_area = centered_rect(64, 7, area);
    frame.render_widget(Clear, popup_area);

    let block = Block::default()
        .title(" Choose Recording ")
        .title_style(styles::title())
        .borders(Borders::ALL)
        .border_style(styles::border_focused())
        .style(Style::default().bg(colors::BG_MEDIUM));
    let inner = block.inner(popup_area);
    frame.render_widget(block, popup_area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Length(1)])
        .margin(0)
        .split(inner);

    render_text_field(frame, "Path", input, true, chunks[0]);
    let hint = Paragraph::new("Enter to select · Esc to cancel")
        .style(styles::text_hint())
        .alignment(Alignment::Center);
    frame.render_widget(hint, chunks[1]);
}

fn render_task_form(frame: &mut Frame, form: &TaskForm, today: NaiveDate, area: Rect) {
    // 4 fields * 3 + buttons(1) + error(1) + borders(2)
    let popup_area = centered_rect(60, 18, area);
    frame.render_widget(Clear, popup_area);

    let block = Block::default()
        .title(" Add New Task ")
        .title_style(styles::title())
        .borders(Borders::ALL)
        .border_style(styles::border_focused())
        .style(Style::default().bg(colors::BG_MEDIUM));
    let inner = block.inner(popup_area);
    frame.render_widget(block, popup_area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Min(0),
        ])
        .split(inner);

    let focused = form.current_field();
    for (i, field) in TaskField::ALL.iter().filter(|f| !f.is_button()).enumerate() {
        let value = form.value(*field);
        if field.is_date_picker() {
            render_date_picker_field(frame, field.label(), value, focused == *field, chunks[i]);
        } else {
            render_text_field(frame, field.label(), value, focused == *field, chunks[i]);
        }
    }

    render_form_buttons(
        frame,
        focused == TaskField::SubmitButton,
        focused == TaskField::CancelButton,
        chunks[4],
    );

    if let Some(error) = &form.error {
        let error_text = Paragraph::new(error.as_str())
            .style(styles::error())
            .alignment(Alignment::Center);
        frame.render_widget(error_text, chunks[5]);
    }

    if focused.is_date_picker() {
        let date = dates::parse_form_date(form.value(focused)).unwrap_or(today);
        render_mini_calendar(frame, date, today, area, popup_area);
    }
}

fn render_text_field(frame: &mut Frame, label: &str, value: &str, is_focused: bool, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(14), Constraint::Min(10)])
        .split(area);

    let label_text = Paragraph::new(format!("{label}: "))
        .style(styles::form_label())
        .alignment(Alignment::Right);
    frame.render_widget(label_text, chunks[0]);

    let input_style = if is_focused {
        styles::form_input_focused()
    } else {
        styles::form_input()
    };
    let cursor = if is_focused { "█" } else { "" };
    let input = Paragraph::new(format!(" {value}{cursor}"))
        .style(input_style)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(if is_focused {
                    styles::border_focused()
                } else {
                    styles::border_dim()
                }),
        );
    frame.render_widget(input, chunks[1]);
}

fn render_date_picker_field(frame: &mut Frame, label: &str, value: &str, is_focused: bool, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(14), Constraint::Min(10)])
        .split(area);

    let label_text = Paragraph::new(format!("{label}: "))
        .style(styles::form_label())
        .alignment(Alignment::Right);
    frame.render_widget(label_text, chunks[0]);

    let input_style = if is_focused {
        styles::form_input_focused()
    } else {
        styles::form_input()
    };
    let hint = if is_focused { "  ◀-7 ▲+1 ▼-1 +7▶" } else { "" };
    let input = Paragraph::new(format!(" {value}{hint}"))
        .style(input_style)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(if is_focused {
                    styles::border_focused()
                } else {
                    styles::border_dim()
                }),
        );
    frame.render_widget(input, chunks[1]);
}

fn render_form_buttons(frame: &mut Frame, submit_focused: bool, cancel_focused: bool, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(25),
            Constraint::Length(14),
            Constraint::Length(2),
            Constraint::Length(12),
            Constraint::Percentage(25),
        ])
        .split(area);

    let submit = Paragraph::new(" [ Add Task ] ")
        .style(if submit_focused {
            styles::button_focused()
        } else {
            styles::button()
        })
        .alignment(Alignment::Center);
    frame.render_widget(submit, chunks[1]);

    let cancel = Paragraph::new(" [ Cancel ] ")
        .style(if cancel_focused {
            styles::button_focused()
        } else {
            styles::button()
        })
        .alignment(Alignment::Center);
    frame.render_widget(cancel, chunks[3]);
}

fn help_line(keys: &'static str, action: &'static str) -> Line<'static> {
    Line::from(vec![
        Span::styled(format!("  {keys:<16}"), Style::default().fg(colors::BLUE)),
        Span::raw(action),
    ])
}

fn help_section(title: &'static str) -> Line<'static> {
    Line::from(Span::styled(
        title,
        Style::default()
            .fg(colors::PURPLE)
            .add_modifier(Modifier::BOLD),
    ))
}

fn render_help_overlay(frame: &mut Frame, area: Rect) {
    let popup_area = centered_rect(60, 30, area);
    frame.render_widget(Clear, popup_area);

    let help_text = vec![
        help_section("Navigation"),
        help_line("Tab/Shift+Tab", "Switch tabs / form fields"),
        help_line("1 2 3", "Dashboard / Timeline / Speakers"),
        help_line("Esc", "Dismiss notices / close dialogs"),
        Line::from(""),
        help_section("Dashboard"),
        help_line("o", "Choose a recording"),
        help_line("u", "Upload"),
        help_line("g", "Generate summary"),
        help_line("e / E", "Next / previous emotion"),
        help_line("Space", "Show the whole summary"),
        Line::from(""),
        help_section("Timeline"),
        help_line("j/k", "Select task"),
        help_line("h/l", "Scroll weeks (Shift: 4)"),
        help_line("s", "Toggle week grid / day scale"),
        help_line("a", "Add task"),
        help_line("r", "Reload tasks"),
        Line::from(""),
        help_section("Add Task Form"),
        help_line("Up/Down", "Date: +/-1 day"),
        help_line("Left/Right", "Date: +/-7 days"),
        help_line("Enter", "Next field / Submit on button"),
        Line::from(""),
        help_section("Speakers"),
        help_line("j/k, Enter", "Select speaker, fetch relevance"),
        Line::from(""),
        help_line("q/Ctrl+C", "Quit"),
    ];

    let paragraph = Paragraph::new(help_text)
        .block(
            Block::default()
                .title(" Help ")
                .title_style(styles::title())
                .borders(Borders::ALL)
                .border_style(styles::border())
                .style(Style::default().bg(colors::BG_MEDIUM)),
        )
        .style(styles::text());

    frame.render_widget(paragraph, popup_area);
}

/// Helper to create a centered rectangle
fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let x = area.x + (area.width.saturating_sub(width)) / 2;
    let y = area.y + (area.height.saturating_sub(height)) / 2;
    Rect::new(x, y, width.min(area.width), height.min(area.height))
}

/// Month view next to the form, Monday first
fn render_mini_calendar(
    frame: &mut Frame,
    date: NaiveDate,
    today: NaiveDate,
    screen_area: Rect,
    form_area: Rect,
) {
    let cal_width = 24;
    let cal_height = 11;

    let cal_x = if form_area.x + form_area.width + cal_width + 2 < screen_area.width {
        form_area.x + form_area.width + 1
    } else if form_area.x >= cal_width + 2 {
        form_area.x - cal_width - 1
    } else {
        return;
    };
    let cal_y = (form_area.y + 2).min(screen_area.height.saturating_sub(cal_height));
    let cal_area = Rect::new(cal_x, cal_y, cal_width, cal_height);
    frame.render_widget(Clear, cal_area);

    let Some(first_of_month) = date.with_day(1) else {
        return;
    };
    let days_in_month = first_of_month
        .checked_add_months(chrono::Months::new(1))
        .and_then(|d| d.pred_opt())
        .map(|d| d.day())
        .unwrap_or(28);
    let first_weekday = first_of_month.weekday().num_days_from_monday() as usize;

    let mut lines = vec![
        Line::from(Span::styled(
            format!("{:^22}", date.format("%B %Y").to_string()),
            Style::default().fg(colors::ACCENT).add_modifier(Modifier::BOLD),
        )),
        Line::from(vec![
            Span::styled(" Mo Tu We Th Fr ", styles::text_dim()),
            Span::styled("Sa Su", Style::default().fg(colors::BLUE)),
        ]),
    ];

    let mut day = 1u32;
    for week in 0..6 {
        if day > days_in_month {
            break;
        }
        let mut spans = vec![Span::raw(" ")];
        for weekday in 0..7 {
            if (week == 0 && weekday < first_weekday) || day > days_in_month {
                spans.push(Span::raw("   "));
                continue;
            }
            let is_selected = day == date.day();
            let is_today = today.year() == date.year() && today.month() == date.month() && today.day() == day;
            let style = if is_selected {
                Style::default()
                    .fg(colors::BG_DARK)
                    .bg(colors::PURPLE)
                    .add_modifier(Modifier::BOLD)
            } else if is_today {
                Style::default().fg(colors::YELLOW).add_modifier(Modifier::BOLD)
            } else if weekday >= 5 {
                Style::default().fg(colors::BLUE)
            } else {
                styles::text()
            };
            spans.push(Span::styled(format!("{day:2} "), style));
            day += 1;
        }
        lines.push(Line::from(spans));
    }

    lines.push(Line::from(Span::styled("▲▼±1d  ◀▶±7d", styles::text_hint())));

    let calendar = Paragraph::new(lines).block(
        Block::default()
            .title(" Calendar ")
            .title_style(styles::title())
            .borders(Borders::ALL)
            .border_style(styles::border_focused())
            .style(Style::default().bg(colors::BG_MEDIUM)),
    );
    frame.render_widget(calendar, cal_area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use ratatui::{backend::TestBackend, Terminal};

    fn screen(app: &App) -> String {
        let mut terminal = Terminal::new(TestBackend::new(120, 40)).unwrap();
        terminal.draw(|frame| render(frame, app)).unwrap();
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|cell| cell.symbol())
            .collect()
    }

    fn app() -> App {
        App::new(&AppConfig::default(), NaiveDate::from_ymd_opt(2024, 11, 20).unwrap())
    }

    #[test]
    fn dashboard_prompts_for_a_file() {
        let text = screen(&app());
        assert!(text.contains("Audio Insights Dashboard"));
        assert!(text.contains("to choose a recording"));
    }

    #[test]
    fn timeline_shows_default_weeks() {
        let mut app = app();
        app.active_tab = Tab::Timeline;
        let text = screen(&app);
        assert!(text.contains("Week 1"));
        assert!(text.contains("Nov 18"));
    }

    #[test]
    fn task_form_shows_validation_error() {
        let mut app = app();
        app.open_task_form();
        if let Some(form) = &mut app.task_form {
            form.error = Some("Task name is required".into());
        }
        let text = screen(&app);
        assert!(text.contains("Add New Task"));
        assert!(text.contains("Task name is required"));
    }

    #[test]
    fn speakers_view_lists_plot_url() {
        let mut app = app();
        app.active_tab = Tab::Speakers;
        let text = screen(&app);
        assert!(text.contains("spk_0"));
        assert!(text.contains("static/plots/calmness_speaker_spk_0.png"));
    }
}
