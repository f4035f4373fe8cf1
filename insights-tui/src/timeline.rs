//! Task timeline: week-grid layout and the Gantt widget that draws it.
//!
//! `TimelineLayout::compute` is pure date arithmetic over the task list.
//! The widget only maps the resulting cells to block characters; it never
//! looks at dates itself except for the header labels.

use chrono::{Duration, NaiveDate};
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    widgets::{Block, Borders, Widget},
};

use crate::dates::{format_short, start_of_week, WeekStart};
use crate::models::Task;
use crate::theme::{blend, colors, styles};

/// Grid width used when there are no tasks
pub const DEFAULT_WEEKS: usize = 4;

/// Block characters for bar segments
const BAR_FULL: char = '█';
const CAP_LEFT: char = '▐';
const CAP_RIGHT: char = '▌';
const EMPTY_CELL: char = '·';

/// Width of the task name column, including the selection marker
const NAME_COL_WIDTH: u16 = 24;
/// Width of one week column
const WEEK_COL_WIDTH: u16 = 8;

/// One (task, week) intersection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Cell {
    pub active: bool,
    /// Task starts inside this week: round the left end
    pub is_start: bool,
    /// Task ends inside this week: round the right end
    pub is_end: bool,
}

/// How a cell is drawn
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellKind {
    Inactive,
    Start,
    Middle,
    End,
    /// Starts and ends in the same week
    Single,
}

impl Cell {
    pub fn kind(&self) -> CellKind {
        match (self.active, self.is_start, self.is_end) {
            (false, _, _) => CellKind::Inactive,
            (true, true, true) => CellKind::Single,
            (true, true, false) => CellKind::Start,
            (true, false, true) => CellKind::End,
            (true, false, false) => CellKind::Middle,
        }
    }
}

/// State of `task` in the week `[week_start, week_end]`.
pub fn cell_for(task: &Task, week_start: NaiveDate, week_end: NaiveDate) -> Cell {
    let active = task.start_date <= week_end && task.end_date >= week_start;
    let is_start = task.start_date == week_start
        || (task.start_date > week_start && task.start_date <= week_end);
    let is_end =
        task.end_date == week_end || (task.end_date < week_end && task.end_date >= week_start);
    Cell {
        active,
        is_start,
        is_end,
    }
}

/// The project window and every task's cells
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimelineLayout {
    pub project_start: NaiveDate,
    pub total_weeks: usize,
    /// One row per task, `total_weeks` cells each
    pub rows: Vec<Vec<Cell>>,
}

impl TimelineLayout {
    pub fn compute(tasks: &[Task], today: NaiveDate, week_start: WeekStart) -> Self {
        let earliest = tasks.iter().map(|t| t.start_date).min();
        let latest = tasks.iter().map(|t| t.end_date).max();

        let (project_start, total_weeks) = match (earliest, latest) {
            (Some(first), Some(last)) => {
                let start = start_of_week(first, week_start);
                let whole_weeks = (last - start).num_days().max(0) / 7;
                (start, (whole_weeks as usize + 1).max(1))
            }
            _ => (start_of_week(today, week_start), DEFAULT_WEEKS),
        };

        let rows = tasks
            .iter()
            .map(|task| {
                (0..total_weeks)
                    .map(|i| {
                        let week_start = project_start + Duration::weeks(i as i64);
                        cell_for(task, week_start, week_start + Duration::days(6))
                    })
                    .collect()
            })
            .collect();

        Self {
            project_start,
            total_weeks,
            rows,
        }
    }

    pub fn week_start(&self, index: usize) -> NaiveDate {
        self.project_start + Duration::weeks(index as i64)
    }

    pub fn week_end(&self, index: usize) -> NaiveDate {
        self.week_start(index) + Duration::days(6)
    }

    /// Header text for a week column: `("Week 3", "Jun 12")`
    pub fn week_label(&self, index: usize) -> (String, String) {
        (
            format!("Week {}", index + 1),
            format_short(self.week_start(index)),
        )
    }

    /// Last day covered by the grid
    pub fn window_end(&self) -> NaiveDate {
        self.week_end(self.total_weeks.saturating_sub(1))
    }
}

/// Proportional placement of a task on a day scale
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DaySpan {
    /// Fraction of the range before the task starts
    pub offset: f64,
    /// Fraction of the range the task covers
    pub width: f64,
}

/// Place `task` on the inclusive day range spanned by all `tasks`.
///
/// Returns `None` when `tasks` is empty.
pub fn day_span(task: &Task, tasks: &[Task]) -> Option<DaySpan> {
    let min = tasks.iter().map(|t| t.start_date).min()?;
    let max = tasks.iter().map(|t| t.end_date).max()?;
    let total_days = ((max - min).num_days() + 1).max(1) as f64;
    let offset = (task.start_date - min).num_days() as f64 / total_days;
    let width = task.duration_days() as f64 / total_days;
    Some(DaySpan {
        offset: offset.clamp(0.0, 1.0),
        width: width.clamp(0.0, 1.0 - offset.clamp(0.0, 1.0)),
    })
}

/// Grid or proportional day scale
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TimelineScale {
    #[default]
    Weeks,
    Days,
}

impl TimelineScale {
    pub fn toggle(&self) -> Self {
        match self {
            TimelineScale::Weeks => TimelineScale::Days,
            TimelineScale::Days => TimelineScale::Weeks,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            TimelineScale::Weeks => "weeks",
            TimelineScale::Days => "days",
        }
    }
}

/// Interaction state of the timeline view
#[derive(Debug, Clone, Default)]
pub struct TimelineState {
    pub selected_task: Option<usize>,
    /// First visible week column
    pub week_offset: usize,
    pub scale: TimelineScale,
}

impl TimelineState {
    pub fn select_previous(&mut self, total: usize) {
        if total == 0 {
            self.selected_task = None;
            return;
        }
        self.selected_task = Some(match self.selected_task {
            Some(i) if i > 0 => i - 1,
            Some(_) => total - 1,
            None => 0,
        });
    }

    pub fn select_next(&mut self, total: usize) {
        if total == 0 {
            self.selected_task = None;
            return;
        }
        self.selected_task = Some(match self.selected_task {
            Some(i) if i + 1 < total => i + 1,
            _ => 0,
        });
    }

    /// Keep the selection valid after the task list changed
    pub fn clamp_selection(&mut self, total: usize) {
        self.selected_task = match (self.selected_task, total) {
            (_, 0) => None,
            (Some(i), n) if i >= n => Some(n - 1),
            (None, _) => Some(0),
            (sel, _) => sel,
        };
    }

    pub fn scroll_left(&mut self, weeks: usize) {
        self.week_offset = self.week_offset.saturating_sub(weeks);
    }

    pub fn scroll_right(&mut self, weeks: usize, total_weeks: usize) {
        let max = total_weeks.saturating_sub(1);
        self.week_offset = (self.week_offset + weeks).min(max);
    }

    pub fn toggle_scale(&mut self) {
        self.scale = self.scale.toggle();
    }
}

/// Gantt chart widget
pub struct TimelineWidget<'a> {
    tasks: &'a [Task],
    layout: &'a TimelineLayout,
    state: &'a TimelineState,
}

impl<'a> TimelineWidget<'a> {
    pub fn new(tasks: &'a [Task], layout: &'a TimelineLayout, state: &'a TimelineState) -> Self {
        Self {
            tasks,
            layout,
            state,
        }
    }

    /// Number of week columns that fit in `width`
    pub fn visible_weeks(width: u16) -> usize {
        (width.saturating_sub(NAME_COL_WIDTH) / WEEK_COL_WIDTH) as usize
    }

    fn bar_color(&self, column: usize, columns: usize) -> Color {
        let ratio = if columns > 1 {
            column as f32 / (columns - 1) as f32
        } else {
            0.0
        };
        blend(colors::BAR_FROM, colors::BAR_TO, ratio)
    }

    fn render_name(&self, x: u16, y: u16, buf: &mut Buffer, task: &Task, selected: bool) {
        let width = NAME_COL_WIDTH.saturating_sub(3) as usize;
        let name: String = if task.name.chars().count() > width {
            let cut: String = task.name.chars().take(width.saturating_sub(1)).collect();
            format!("{cut}…")
        } else {
            format!("{:width$}", task.name, width = width)
        };
        let (marker, style) = if selected {
            ("▸ ", styles::selected())
        } else {
            ("  ", styles::text())
        };
        buf.set_string(x, y, marker, Style::default().fg(colors::ACCENT));
        buf.set_string(x + 2, y, name, style);
    }

    fn render_week_header(&self, area: Rect, buf: &mut Buffer, weeks: usize) {
        buf.set_string(area.x + 2, area.y, "Task", styles::title());
        for col in 0..weeks {
            let index = self.state.week_offset + col;
            if index >= self.layout.total_weeks {
                break;
            }
            let (label, date) = self.layout.week_label(index);
            let x = area.x + NAME_COL_WIDTH + col as u16 * WEEK_COL_WIDTH;
            buf.set_string(x, area.y, label, styles::title_accent());
            buf.set_string(x, area.y + 1, date, styles::text_dim());
        }
    }

    fn render_week_row(&self, x: u16, y: u16, buf: &mut Buffer, row: &[Cell], weeks: usize, selected: bool) {
        for col in 0..weeks {
            let index = self.state.week_offset + col;
            let Some(cell) = row.get(index) else { break };
            let cell_x = x + col as u16 * WEEK_COL_WIDTH;
            let color = self.bar_color(index, self.layout.total_weeks);
            let style = if selected {
                Style::default().fg(color).add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(color)
            };

            for offset in 0..WEEK_COL_WIDTH {
                let last = offset + 1 == WEEK_COL_WIDTH;
                let symbol = match cell.kind() {
                    CellKind::Inactive => {
                        let symbol = if offset == WEEK_COL_WIDTH / 2 { EMPTY_CELL } else { ' ' };
                        buf[(cell_x + offset, y)]
                            .set_char(symbol)
                            .set_style(styles::text_hint());
                        continue;
                    }
                    CellKind::Start if offset == 0 => CAP_LEFT,
                    CellKind::End if last => CAP_RIGHT,
                    CellKind::Single if offset == 0 => CAP_LEFT,
                    CellKind::Single if last => CAP_RIGHT,
                    _ => BAR_FULL,
                };
                buf[(cell_x + offset, y)].set_char(symbol).set_style(style);
            }
        }
    }

    fn render_day_row(&self, x: u16, y: u16, width: u16, buf: &mut Buffer, task: &Task, selected: bool) {
        let Some(span) = day_span(task, self.tasks) else { return };
        if width == 0 {
            return;
        }
        let start = (span.offset * width as f64).floor() as u16;
        let len = ((span.width * width as f64).round() as u16).max(1);
        let end = (start + len).min(width);
        for col in start..end {
            let color = self.bar_color(col as usize, width as usize);
            let style = if selected {
                Style::default().fg(color).add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(color)
            };
            let symbol = if col == start && end - start > 1 {
                CAP_LEFT
            } else if col + 1 == end && end - start > 1 {
                CAP_RIGHT
            } else {
                BAR_FULL
            };
            buf[(x + col, y)].set_char(symbol).set_style(style);
        }
    }

    fn render_day_header(&self, area: Rect, buf: &mut Buffer, width: u16) {
        buf.set_string(area.x + 2, area.y, "Task", styles::title());
        let (Some(min), Some(max)) = (
            self.tasks.iter().map(|t| t.start_date).min(),
            self.tasks.iter().map(|t| t.end_date).max(),
        ) else {
            return;
        };
        let x = area.x + NAME_COL_WIDTH;
        buf.set_string(x, area.y, format_short(min), styles::title_accent());
        let end_label = format_short(max);
        let end_x = x + width.saturating_sub(end_label.chars().count() as u16);
        buf.set_string(end_x, area.y, end_label, styles::title_accent());
        for col in 0..width {
            buf[(x + col, area.y + 1)]
                .set_char('─')
                .set_style(styles::border_dim());
        }
    }
}

impl Widget for TimelineWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let title = format!(" Project Timeline ({}) ", self.state.scale.name());
        let block = Block::default()
            .title(title)
            .title_style(styles::title_accent())
            .borders(Borders::ALL)
            .border_style(styles::border())
            .style(Style::default().bg(colors::BG_DARK));

        let inner = block.inner(area);
        block.render(area, buf);

        if inner.width <= NAME_COL_WIDTH + WEEK_COL_WIDTH || inner.height < 3 {
            return;
        }

        let weeks = Self::visible_weeks(inner.width);
        let day_width = inner.width.saturating_sub(NAME_COL_WIDTH + 1);

        match self.state.scale {
            TimelineScale::Weeks => self.render_week_header(inner, buf, weeks),
            TimelineScale::Days => self.render_day_header(inner, buf, day_width),
        }

        let rows_top = inner.y + 2;
        let rows_height = inner.height.saturating_sub(2) as usize;
        let first_row = match self.state.selected_task {
            Some(sel) if sel >= rows_height => sel + 1 - rows_height,
            _ => 0,
        };

        for (line, (index, task)) in self
            .tasks
            .iter()
            .enumerate()
            .skip(first_row)
            .take(rows_height)
            .enumerate()
        {
            let y = rows_top + line as u16;
            let selected = self.state.selected_task == Some(index);
            self.render_name(inner.x, y, buf, task, selected);

            let bar_x = inner.x + NAME_COL_WIDTH;
            match self.state.scale {
                TimelineScale::Weeks => {
                    if let Some(row) = self.layout.rows.get(index) {
                        self.render_week_row(bar_x, y, buf, row, weeks, selected);
                    }
                }
                TimelineScale::Days => self.render_day_row(bar_x, y, day_width, buf, task, selected),
            }
        }

        if self.tasks.is_empty() {
            let msg = "No tasks yet. Press r to analyze or c to add one";
            let x = inner.x + inner.width.saturating_sub(msg.len() as u16) / 2;
            buf.set_string(x, inner.y + inner.height / 2, msg, styles::text_dim());
        }

        if self.state.scale == TimelineScale::Weeks {
            if self.state.week_offset > 0 {
                buf.set_string(area.x + 1, area.y + area.height - 1, "◀ h", styles::text_hint());
            }
            if self.state.week_offset + weeks < self.layout.total_weeks {
                buf.set_string(
                    area.x + area.width.saturating_sub(4),
                    area.y + area.height - 1,
                    "l ▶",
                    styles::text_hint(),
                );
            }
        }
    }
}
