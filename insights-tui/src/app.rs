//! Application state and event handling.
//!
//! This module implements the Elm Architecture pattern for state management,
//! with a centralized App struct holding all application state. Keys and
//! API replies go in, `ApiCommand`s come out; nothing here does I/O.

use std::path::PathBuf;
use std::time::{Duration, Instant};

use chrono::NaiveDate;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::api::{self, ApiCommand, ApiMessage};
use crate::config::AppConfig;
use crate::dates::{self, WeekStart};
use crate::models::{tasks_from_dtos, Emotion, RelevanceResponse, SummaryResponse, Task, TaskDraft};
use crate::requests::{RequestId, RequestKind, RequestTracker};
use crate::summary::{self, TextReveal};
use crate::timeline::{TimelineLayout, TimelineState};
use crate::upload::{AudioFile, UploadPhase, UploadState};

/// Active tab in the application
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Tab {
    /// Upload, summary and emotion plots (default)
    #[default]
    Dashboard,
    /// Action item Gantt chart
    Timeline,
    /// Per-speaker relevance
    Speakers,
}

impl Tab {
    pub fn all() -> [Tab; 3] {
        [Tab::Dashboard, Tab::Timeline, Tab::Speakers]
    }

    /// Move to the next tab
    pub fn next(&self) -> Self {
        match self {
            Tab::Dashboard => Tab::Timeline,
            Tab::Timeline => Tab::Speakers,
            Tab::Speakers => Tab::Dashboard,
        }
    }

    /// Move to the previous tab
    pub fn previous(&self) -> Self {
        match self {
            Tab::Dashboard => Tab::Speakers,
            Tab::Timeline => Tab::Dashboard,
            Tab::Speakers => Tab::Timeline,
        }
    }

    /// Get the display name of the tab
    pub fn name(&self) -> &'static str {
        match self {
            Tab::Dashboard => "Dashboard",
            Tab::Timeline => "Timeline",
            Tab::Speakers => "Speakers",
        }
    }
}

/// Input mode for the application
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InputMode {
    /// Normal navigation mode
    #[default]
    Normal,
    /// Typing into the file path prompt or the add-task form
    Editing,
}

/// Fields of the add-task form, in focus order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskField {
    Name,
    Description,
    StartDate,
    EndDate,
    SubmitButton,
    CancelButton,
}

impl TaskField {
    pub const ALL: [TaskField; 6] = [
        TaskField::Name,
        TaskField::Description,
        TaskField::StartDate,
        TaskField::EndDate,
        TaskField::SubmitButton,
        TaskField::CancelButton,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            TaskField::Name => "Task Name",
            TaskField::Description => "Description",
            TaskField::StartDate => "Start Date",
            TaskField::EndDate => "End Date",
            TaskField::SubmitButton => "Add Task",
            TaskField::CancelButton => "Cancel",
        }
    }

    pub fn is_date_picker(&self) -> bool {
        matches!(self, TaskField::StartDate | TaskField::EndDate)
    }

    pub fn is_button(&self) -> bool {
        matches!(self, TaskField::SubmitButton | TaskField::CancelButton)
    }
}

/// State of the add-task modal
#[derive(Debug, Clone)]
pub struct TaskForm {
    pub draft: TaskDraft,
    pub focused_field: usize,
    /// Validation error message
    pub error: Option<String>,
}

impl TaskForm {
    /// Empty form with both dates on `today`
    pub fn new(today: NaiveDate) -> Self {
        let today = dates::format_form(today);
        Self {
            draft: TaskDraft {
                start_date: today.clone(),
                end_date: today,
                ..TaskDraft::default()
            },
            focused_field: 0,
            error: None,
        }
    }

    pub fn current_field(&self) -> TaskField {
        TaskField::ALL[self.focused_field]
    }

    pub fn next_field(&mut self) {
        self.focused_field = (self.focused_field + 1) % TaskField::ALL.len();
    }

    pub fn prev_field(&mut self) {
        self.focused_field = self
            .focused_field
            .checked_sub(1)
            .unwrap_or(TaskField::ALL.len() - 1);
    }

    pub fn value(&self, field: TaskField) -> &str {
        match field {
            TaskField::Name => &self.draft.name,
            TaskField::Description => &self.draft.description,
            TaskField::StartDate => &self.draft.start_date,
            TaskField::EndDate => &self.draft.end_date,
            TaskField::SubmitButton | TaskField::CancelButton => "",
        }
    }

    fn current_text_mut(&mut self) -> Option<&mut String> {
        match self.current_field() {
            TaskField::Name => Some(&mut self.draft.name),
            TaskField::Description => Some(&mut self.draft.description),
            // Dates are typed too; arrows adjust them
            TaskField::StartDate => Some(&mut self.draft.start_date),
            TaskField::EndDate => Some(&mut self.draft.end_date),
            _ => None,
        }
    }

    pub fn handle_char(&mut self, c: char) {
        if let Some(text) = self.current_text_mut() {
            text.push(c);
        }
    }

    pub fn handle_backspace(&mut self) {
        if let Some(text) = self.current_text_mut() {
            text.pop();
        }
    }

    /// Move the focused date field by `days`
    pub fn shift_date(&mut self, days: i64, today: NaiveDate) {
        let field = match self.current_field() {
            TaskField::StartDate => &mut self.draft.start_date,
            TaskField::EndDate => &mut self.draft.end_date,
            _ => return,
        };
        let shifted = dates::shift_form_date(field.as_str(), days, today);
        *field = shifted;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Info,
    Success,
    Warning,
    Error,
}

/// Log entry for the message area
#[derive(Debug, Clone)]
pub struct LogEntry {
    pub timestamp: Instant,
    pub message: String,
    pub level: LogLevel,
}

impl LogEntry {
    fn new(level: LogLevel, message: impl Into<String>) -> Self {
        Self {
            timestamp: Instant::now(),
            message: message.into(),
            level,
        }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self::new(LogLevel::Info, message)
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self::new(LogLevel::Success, message)
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(LogLevel::Warning, message)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(LogLevel::Error, message)
    }
}

/// Toast shown in the corner until it expires
#[derive(Debug, Clone)]
pub struct Notice {
    pub title: String,
    pub message: String,
    pub level: LogLevel,
    pub shown_at: Instant,
    pub ttl: Duration,
}

impl Notice {
    pub fn is_expired(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.shown_at) >= self.ttl
    }
}

/// Relevance shown on the Speakers tab
#[derive(Debug, Clone, PartialEq)]
pub struct SpeakerRelevance {
    pub speaker_id: String,
    pub relevance: RelevanceResponse,
}

/// Main application state
#[derive(Debug)]
pub struct App {
    /// Whether the application should quit
    pub should_quit: bool,
    pub active_tab: Tab,
    pub input_mode: InputMode,

    // Settings
    pub api_base: String,
    pub week_start: WeekStart,
    reveal_interval: Duration,
    upload_step: Duration,
    notice_ttl: Duration,
    pub today: NaiveDate,

    // Timeline
    pub tasks: Vec<Task>,
    pub layout: TimelineLayout,
    pub timeline_state: TimelineState,
    pub tasks_loading: bool,
    pub tasks_error: Option<String>,
    pub task_form: Option<TaskForm>,

    // Dashboard
    /// Path prompt while choosing a file
    pub file_input: Option<String>,
    pub upload: UploadState,
    pub summary: Option<TextReveal>,
    pub emotion: Emotion,
    pub images: Vec<String>,

    // Speakers
    pub speakers: Vec<String>,
    pub selected_speaker: usize,
    pub relevance: Option<SpeakerRelevance>,

    requests: RequestTracker,
    pub notices: Vec<Notice>,
    pub logs: Vec<LogEntry>,
    /// Maximum number of log entries to keep
    max_logs: usize,
    pub frame_count: u64,
    pub show_help: bool,
}

impl App {
    pub fn new(config: &AppConfig, today: NaiveDate) -> Self {
        let mut app = Self {
            should_quit: false,
            active_tab: Tab::Dashboard,
            input_mode: InputMode::Normal,
            api_base: config.api.base_url.trim_end_matches('/').to_string(),
            week_start: config.ui.week_start,
            reveal_interval: config.ui.reveal_interval(),
            upload_step: config.ui.upload_step(),
            notice_ttl: config.ui.notice_duration(),
            today,
            tasks: Vec::new(),
            layout: TimelineLayout::compute(&[], today, config.ui.week_start),
            timeline_state: TimelineState::default(),
            tasks_loading: false,
            tasks_error: None,
            task_form: None,
            file_input: None,
            upload: UploadState::default(),
            summary: None,
            emotion: Emotion::default(),
            images: Vec::new(),
            speakers: config.ui.speaker_ids(),
            selected_speaker: 0,
            relevance: None,
            requests: RequestTracker::default(),
            notices: Vec::new(),
            logs: Vec::new(),
            max_logs: 100,
            frame_count: 0,
            show_help: false,
        };
        app.log(LogEntry::info("Audio Insights initialized"));
        app
    }

    /// Add a log entry, mirrored to the tracing log
    pub fn log(&mut self, entry: LogEntry) {
        match entry.level {
            LogLevel::Error => tracing::error!("{}", entry.message),
            LogLevel::Warning => tracing::warn!("{}", entry.message),
            LogLevel::Info | LogLevel::Success => tracing::info!("{}", entry.message),
        }
        self.logs.push(entry);
        if self.logs.len() > self.max_logs {
            self.logs.remove(0);
        }
    }

    /// Show a toast and log it
    pub fn notify(&mut self, level: LogLevel, title: impl Into<String>, message: impl Into<String>) {
        let title = title.into();
        let message = message.into();
        self.log(LogEntry::new(level, format!("{title}: {message}")));
        self.notices.push(Notice {
            title,
            message,
            level,
            shown_at: Instant::now(),
            ttl: self.notice_ttl,
        });
    }

    pub fn is_in_flight(&self, kind: RequestKind) -> bool {
        self.requests.in_flight(kind)
    }

    // ============================================
    // Commands
    // ============================================

    /// Ask the backend for the action items
    pub fn load_tasks(&mut self) -> ApiCommand {
        self.tasks_loading = true;
        self.tasks_error = None;
        self.log(LogEntry::info("Loading tasks..."));
        ApiCommand::LoadTasks(self.requests.issue(RequestKind::Tasks))
    }

    /// Validate a typed path and make it the upload selection
    pub fn select_file(&mut self, path: &str) {
        if self.upload.is_uploading() || self.upload.phase == UploadPhase::Generating {
            self.notify(LogLevel::Warning, "Busy", "Wait for the current request to finish.");
            return;
        }
        let path = PathBuf::from(path.trim());
        match AudioFile::select(&path) {
            Ok(file) => {
                let message = format!("{} is ready for upload.", file.name);
                self.upload.select(file);
                self.summary = None;
                self.images.clear();
                self.notify(LogLevel::Success, "File selected", message);
            }
            Err(e) => {
                self.upload.clear();
                self.notify(LogLevel::Error, "Invalid file type", e.to_string());
            }
        }
    }

    pub fn start_upload(&mut self) -> Option<ApiCommand> {
        match self.upload.begin_upload() {
            Ok(file) => {
                self.log(LogEntry::info(format!("Uploading {}...", file.name)));
                Some(ApiCommand::Upload {
                    file,
                    step_delay: self.upload_step,
                })
            }
            Err(e) => {
                self.notify(LogLevel::Warning, "Upload", e.to_string());
                None
            }
        }
    }

    pub fn generate_summary(&mut self) -> Option<ApiCommand> {
        match self.upload.begin_generate() {
            Ok((file, data)) => {
                self.summary = None;
                self.log(LogEntry::info("Generating summary..."));
                Some(ApiCommand::CreateSummary {
                    id: self.requests.issue(RequestKind::Summary),
                    file,
                    data,
                    emotion: Some(self.emotion),
                })
            }
            Err(e) => {
                self.notify(LogLevel::Warning, "Summary", e.to_string());
                None
            }
        }
    }

    /// Change the emotion; once a summary exists the plots are re-rendered.
    ///
    /// Locked while a summary is generating, since that request already
    /// carries the emotion its plots are drawn for.
    pub fn set_emotion(&mut self, emotion: Emotion) -> Option<ApiCommand> {
        if emotion == self.emotion {
            return None;
        }
        if self.upload.phase == UploadPhase::Generating {
            self.notify(
                LogLevel::Warning,
                "Emotion",
                "Wait for the summary before changing the emotion.",
            );
            return None;
        }
        self.emotion = emotion;
        self.log(LogEntry::info(format!("Emotion: {emotion}")));
        if self.upload.phase != UploadPhase::Done {
            return None;
        }
        Some(ApiCommand::UpdateEmotion {
            id: self.requests.issue(RequestKind::Emotion),
            emotion,
        })
    }

    pub fn fetch_relevance(&mut self) -> Option<ApiCommand> {
        let speaker_id = self.speakers.get(self.selected_speaker)?.clone();
        self.log(LogEntry::info(format!("Fetching relevance for {speaker_id}...")));
        Some(ApiCommand::GetRelevance {
            id: self.requests.issue(RequestKind::Relevance),
            speaker_id,
        })
    }

    /// Plot for `speaker` at the current emotion
    pub fn plot_url(&self, speaker: usize) -> Option<String> {
        let speaker_id = self.speakers.get(speaker)?;
        Some(api::plot_url(&self.api_base, self.emotion, speaker_id))
    }

    pub fn open_task_form(&mut self) {
        self.task_form = Some(TaskForm::new(self.today));
        self.input_mode = InputMode::Editing;
    }

    pub fn close_task_form(&mut self) {
        self.task_form = None;
        self.input_mode = InputMode::Normal;
    }

    pub fn open_file_input(&mut self) {
        let current = self
            .upload
            .file
            .as_ref()
            .map(|f| f.path.display().to_string())
            .unwrap_or_default();
        self.file_input = Some(current);
        self.input_mode = InputMode::Editing;
    }

    pub fn close_file_input(&mut self) {
        self.file_input = None;
        self.input_mode = InputMode::Normal;
    }

    fn set_tasks(&mut self, tasks: Vec<Task>) {
        self.tasks = tasks;
        self.layout = TimelineLayout::compute(&self.tasks, self.today, self.week_start);
        self.timeline_state.clamp_selection(self.tasks.len());
        self.timeline_state.week_offset = self
            .timeline_state
            .week_offset
            .min(self.layout.total_weeks.saturating_sub(1));
    }

    /// Selected task on the timeline
    pub fn selected_task(&self) -> Option<&Task> {
        self.timeline_state
            .selected_task
            .and_then(|i| self.tasks.get(i))
    }

    // ============================================
    // API replies
    // ============================================

    pub fn handle_api_message(&mut self, message: ApiMessage) {
        match message {
            ApiMessage::TasksLoaded(id, dtos) => {
                if !self.accept(RequestKind::Tasks, id) {
                    return;
                }
                self.tasks_loading = false;
                let (tasks, rejected) = tasks_from_dtos(&dtos);
                for (name, err) in rejected {
                    self.log(LogEntry::warning(format!("Skipped task '{name}': {err}")));
                }
                let count = tasks.len();
                self.set_tasks(tasks);
                self.log(LogEntry::success(format!("Loaded {count} tasks")));
            }
            ApiMessage::UploadProgress(progress) => self.upload.set_progress(progress),
            ApiMessage::Uploaded(data) => {
                self.upload.finish_upload(data);
                self.notify(
                    LogLevel::Success,
                    "Upload complete",
                    "Your audio file has been successfully uploaded.",
                );
            }
            ApiMessage::UploadFailed(error) => {
                self.upload.fail_upload();
                self.notify(LogLevel::Error, "Upload failed", error);
            }
            ApiMessage::SummaryReady(id, response) => {
                if !self.accept(RequestKind::Summary, id) {
                    return;
                }
                self.show_summary(response);
            }
            ApiMessage::ImagesUpdated(id, images) => {
                if !self.accept(RequestKind::Emotion, id) {
                    return;
                }
                self.images = images;
                self.log(LogEntry::success(format!("Plots updated for {}", self.emotion)));
            }
            ApiMessage::RelevanceLoaded {
                id,
                speaker_id,
                relevance,
            } => {
                if !self.accept(RequestKind::Relevance, id) {
                    return;
                }
                self.log(LogEntry::success(format!(
                    "{speaker_id}: {:.0}% relevant",
                    relevance.relevant_ratio() * 100.0
                )));
                self.relevance = Some(SpeakerRelevance {
                    speaker_id,
                    relevance,
                });
            }
            ApiMessage::Failed { kind, id, error } => {
                if !self.accept(kind, id) {
                    return;
                }
                match kind {
                    RequestKind::Tasks => {
                        self.tasks_loading = false;
                        self.tasks_error = Some(error.clone());
                    }
                    RequestKind::Summary => {
                        self.upload.fail_generate();
                        self.summary = Some(TextReveal::immediate(summary::GENERATION_FAILED));
                    }
                    RequestKind::Emotion | RequestKind::Relevance => {}
                }
                self.notify(LogLevel::Error, "API Error", error);
            }
        }
    }

    /// True if `id` is the latest request of `kind`; stale replies are logged and dropped.
    fn accept(&mut self, kind: RequestKind, id: RequestId) -> bool {
        if self.requests.settle(kind, id) {
            true
        } else {
            tracing::debug!(kind = kind.name(), ?id, "discarding stale response");
            false
        }
    }

    fn show_summary(&mut self, response: SummaryResponse) {
        let text = summary::join_chunks(&response.chunk_summaries);
        let segments = summary::emphasize(&text);
        self.summary = Some(TextReveal::new(segments, self.reveal_interval));
        self.images = response.images;
        self.upload.finish_generate();
        self.log(LogEntry::success("Summary generated"));
    }

    // ============================================
    // Keys
    // ============================================

    /// Handle key events and return optional API command
    pub fn handle_key(&mut self, key: KeyEvent) -> Option<ApiCommand> {
        if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
            self.should_quit = true;
            return Some(ApiCommand::Shutdown);
        }

        if self.show_help {
            if matches!(key.code, KeyCode::Esc | KeyCode::Char('?') | KeyCode::Enter) {
                self.show_help = false;
            }
            return None;
        }

        match self.input_mode {
            InputMode::Normal => self.handle_normal_key(key),
            InputMode::Editing => self.handle_editing_key(key),
        }
    }

    fn handle_normal_key(&mut self, key: KeyEvent) -> Option<ApiCommand> {
        match key.code {
            KeyCode::Char('q') | KeyCode::Char('Q') => {
                self.should_quit = true;
                return Some(ApiCommand::Shutdown);
            }
            KeyCode::Char('?') => {
                self.show_help = true;
                return None;
            }
            KeyCode::Tab => {
                self.active_tab = self.active_tab.next();
                return None;
            }
            KeyCode::BackTab => {
                self.active_tab = self.active_tab.previous();
                return None;
            }
            KeyCode::Char(c @ '1'..='3') => {
                self.active_tab = Tab::all()[(c as u8 - b'1') as usize];
                return None;
            }
            KeyCode::Esc => {
                self.notices.clear();
                return None;
            }
            _ => {}
        }

        match self.active_tab {
            Tab::Dashboard => self.handle_dashboard_key(key),
            Tab::Timeline => self.handle_timeline_key(key),
            Tab::Speakers => self.handle_speakers_key(key),
        }
    }

    fn handle_dashboard_key(&mut self, key: KeyEvent) -> Option<ApiCommand> {
        match key.code {
            KeyCode::Char('o') | KeyCode::Char('f') => {
                self.open_file_input();
                None
            }
            KeyCode::Char('u') => self.start_upload(),
            KeyCode::Char('g') => self.generate_summary(),
            KeyCode::Char('e') | KeyCode::Right => self.set_emotion(self.emotion.next()),
            KeyCode::Char('E') | KeyCode::Left => self.set_emotion(self.emotion.previous()),
            KeyCode::Char(' ') | KeyCode::Enter => {
                if let Some(reveal) = &mut self.summary {
                    reveal.skip();
                }
                None
            }
            _ => None,
        }
    }

    fn handle_timeline_key(&mut self, key: KeyEvent) -> Option<ApiCommand> {
        let total = self.tasks.len();
        match key.code {
            KeyCode::Char('j') | KeyCode::Down => self.timeline_state.select_next(total),
            KeyCode::Char('k') | KeyCode::Up => self.timeline_state.select_previous(total),
            KeyCode::Char('h') | KeyCode::Left => {
                let amount = if key.modifiers.contains(KeyModifiers::SHIFT) { 4 } else { 1 };
                self.timeline_state.scroll_left(amount);
            }
            KeyCode::Char('l') | KeyCode::Right => {
                let amount = if key.modifiers.contains(KeyModifiers::SHIFT) { 4 } else { 1 };
                self.timeline_state
                    .scroll_right(amount, self.layout.total_weeks);
            }
            KeyCode::Home => self.timeline_state.week_offset = 0,
            KeyCode::Char('s') => {
                self.timeline_state.toggle_scale();
                let scale = self.timeline_state.scale.name();
                self.log(LogEntry::info(format!("Timeline scale: {scale}")));
            }
            KeyCode::Char('a') | KeyCode::Char('n') => self.open_task_form(),
            KeyCode::Char('r') => return Some(self.load_tasks()),
            _ => {}
        }
        None
    }

    fn handle_speakers_key(&mut self, key: KeyEvent) -> Option<ApiCommand> {
        let total = self.speakers.len();
        if total == 0 {
            return None;
        }
        match key.code {
            KeyCode::Char('j') | KeyCode::Down => {
                self.selected_speaker = (self.selected_speaker + 1) % total;
                None
            }
            KeyCode::Char('k') | KeyCode::Up => {
                self.selected_speaker = self.selected_speaker.checked_sub(1).unwrap_or(total - 1);
                None
            }
            KeyCode::Enter | KeyCode::Char('r') => self.fetch_relevance(),
            KeyCode::Char('e') | KeyCode::Right => self.set_emotion(self.emotion.next()),
            KeyCode::Char('E') | KeyCode::Left => self.set_emotion(self.emotion.previous()),
            _ => None,
        }
    }

    fn handle_editing_key(&mut self, key: KeyEvent) -> Option<ApiCommand> {
        if self.file_input.is_some() {
            self.handle_file_input_key(key);
            return None;
        }
        if self.task_form.is_some() {
            self.handle_task_form_key(key);
            return None;
        }
        self.input_mode = InputMode::Normal;
        None
    }

    fn handle_file_input_key(&mut self, key: KeyEvent) {
        let Some(input) = &mut self.file_input else {
            return;
        };
        match key.code {
            KeyCode::Esc => self.close_file_input(),
            KeyCode::Enter => {
                let path = input.clone();
                self.close_file_input();
                if !path.trim().is_empty() {
                    self.select_file(&path);
                }
            }
            KeyCode::Backspace => {
                input.pop();
            }
            KeyCode::Char(c) => input.push(c),
            _ => {}
        }
    }

    fn handle_task_form_key(&mut self, key: KeyEvent) {
        let today = self.today;
        let Some(form) = &mut self.task_form else {
            return;
        };
        let on_date = form.current_field().is_date_picker();
        match key.code {
            KeyCode::Esc => self.close_task_form(),
            KeyCode::Tab => form.next_field(),
            KeyCode::BackTab => form.prev_field(),
            // Date pickers: Up/Down one day, Left/Right one week
            KeyCode::Up if on_date => form.shift_date(1, today),
            KeyCode::Down if on_date => form.shift_date(-1, today),
            KeyCode::Right if on_date => form.shift_date(7, today),
            KeyCode::Left if on_date => form.shift_date(-7, today),
            KeyCode::Down => form.next_field(),
            KeyCode::Up => form.prev_field(),
            KeyCode::Backspace => form.handle_backspace(),
            KeyCode::Enter => self.handle_form_submit(),
            KeyCode::Char(c) => form.handle_char(c),
            _ => {}
        }
    }

    fn handle_form_submit(&mut self) {
        let Some(form) = &mut self.task_form else {
            return;
        };
        match form.current_field() {
            TaskField::CancelButton => {
                self.close_task_form();
                return;
            }
            TaskField::SubmitButton => {}
            // Enter on an input moves to the next field
            _ => {
                form.next_field();
                return;
            }
        }

        match form.draft.build() {
            Ok(task) => {
                let name = task.name.clone();
                let mut tasks = std::mem::take(&mut self.tasks);
                tasks.push(task);
                self.set_tasks(tasks);
                self.timeline_state.selected_task = Some(self.tasks.len() - 1);
                self.close_task_form();
                self.notify(LogLevel::Success, "Task added", name);
            }
            Err(e) => {
                form.error = Some(e.to_string());
            }
        }
    }

    // ============================================
    // Frame
    // ============================================

    /// Update animations and expire notices (called every frame)
    pub fn tick(&mut self) {
        self.frame_count = self.frame_count.wrapping_add(1);
        if let Some(reveal) = &mut self.summary {
            reveal.tick();
        }
        let now = Instant::now();
        self.notices.retain(|n| !n.is_expired(now));
    }

    /// Get the status bar text
    pub fn status_text(&self) -> String {
        let busy = [
            RequestKind::Tasks,
            RequestKind::Summary,
            RequestKind::Emotion,
            RequestKind::Relevance,
        ]
        .iter()
        .filter(|k| self.requests.in_flight(**k))
        .map(|k| k.name())
        .collect::<Vec<_>>();
        let loading = if busy.is_empty() {
            String::new()
        } else {
            format!(" [Loading {}...]", busy.join(", "))
        };

        format!(
            "{}{} | {} | ?: Help | Tab: Switch | q: Quit",
            self.api_base,
            loading,
            self.active_tab.name()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ChunkSummary, TaskDto};
    use pretty_assertions::assert_eq;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn app() -> App {
        App::new(&AppConfig::default(), ymd(2024, 11, 20))
    }

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn type_text(app: &mut App, text: &str) {
        for c in text.chars() {
            app.handle_key(key(KeyCode::Char(c)));
        }
    }

    fn dto(name: &str, start: &str, end: &str) -> TaskDto {
        TaskDto {
            task_name: name.into(),
            start_date: start.into(),
            end_date: end.into(),
            description: String::new(),
        }
    }

    fn issued_id(cmd: Option<ApiCommand>) -> RequestId {
        match cmd {
            Some(ApiCommand::LoadTasks(id))
            | Some(ApiCommand::CreateSummary { id, .. })
            | Some(ApiCommand::UpdateEmotion { id, .. })
            | Some(ApiCommand::GetRelevance { id, .. }) => id,
            other => panic!("expected a tracked command, got {other:?}"),
        }
    }

    #[test]
    fn starts_with_default_four_week_grid() {
        let app = app();
        assert_eq!(app.layout.total_weeks, 4);
        assert_eq!(app.layout.project_start, ymd(2024, 11, 18));
        assert!(app.layout.rows.is_empty());
    }

    #[test]
    fn loaded_tasks_recompute_layout_and_skip_bad_dates() {
        let mut app = app();
        let id = issued_id(Some(app.load_tasks()));
        app.handle_api_message(ApiMessage::TasksLoaded(
            id,
            vec![
                dto("Press release", "01-06-2023", "14-06-2023"),
                dto("Broken", "2023-06-01", "14-06-2023"),
            ],
        ));

        assert!(!app.tasks_loading);
        assert_eq!(app.tasks.len(), 1);
        assert_eq!(app.layout.project_start, ymd(2023, 5, 29));
        assert_eq!(app.timeline_state.selected_task, Some(0));
        assert!(app.logs.iter().any(|l| l.message.contains("Skipped task 'Broken'")));
    }

    #[test]
    fn stale_relevance_is_discarded() {
        let mut app = app();
        app.active_tab = Tab::Speakers;
        let first = issued_id(app.handle_key(key(KeyCode::Enter)));
        app.handle_key(key(KeyCode::Down));
        let second = issued_id(app.handle_key(key(KeyCode::Enter)));

        let reply = |id, speaker: &str, relevant| ApiMessage::RelevanceLoaded {
            id,
            speaker_id: speaker.into(),
            relevance: RelevanceResponse {
                relevant,
                not_relevant: 100.0 - relevant,
            },
        };

        app.handle_api_message(reply(second, "spk_1", 40.0));
        app.handle_api_message(reply(first, "spk_0", 90.0));

        let shown = app.relevance.expect("relevance shown");
        assert_eq!(shown.speaker_id, "spk_1");
        assert_eq!(shown.relevance.relevant, 40.0);
    }

    #[test]
    fn stale_task_failure_does_not_clear_newer_tasks() {
        let mut app = app();
        let old = issued_id(Some(app.load_tasks()));
        let new = issued_id(Some(app.load_tasks()));
        app.handle_api_message(ApiMessage::TasksLoaded(
            new,
            vec![dto("A", "02-12-2024", "06-12-2024")],
        ));
        app.handle_api_message(ApiMessage::Failed {
            kind: RequestKind::Tasks,
            id: old,
            error: "timeout".into(),
        });
        assert_eq!(app.tasks.len(), 1);
        assert!(app.tasks_error.is_none());
    }

    #[test]
    fn task_failure_shows_error_and_default_grid() {
        let mut app = app();
        let id = issued_id(Some(app.load_tasks()));
        app.handle_api_message(ApiMessage::Failed {
            kind: RequestKind::Tasks,
            id,
            error: api::NO_TASKS.into(),
        });
        assert_eq!(app.tasks_error.as_deref(), Some(api::NO_TASKS));
        assert_eq!(app.layout.total_weeks, 4);
        assert_eq!(app.notices.len(), 1);
    }

    #[test]
    fn form_rejects_inverted_range() {
        let mut app = app();
        app.active_tab = Tab::Timeline;
        app.handle_key(key(KeyCode::Char('a')));
        assert_eq!(app.input_mode, InputMode::Editing);

        type_text(&mut app, "Launch");
        app.handle_key(key(KeyCode::Tab));
        type_text(&mut app, "Go live");
        app.handle_key(key(KeyCode::Tab));
        // start one week later than end
        app.handle_key(key(KeyCode::Right));
        app.handle_key(key(KeyCode::Tab));
        app.handle_key(key(KeyCode::Tab));
        app.handle_key(key(KeyCode::Enter));

        let form = app.task_form.as_ref().expect("form stays open");
        assert_eq!(form.draft.start_date, "2024-11-27");
        assert_eq!(form.draft.end_date, "2024-11-20");
        assert!(form.error.as_deref().unwrap_or("").contains("before start date"));
        assert!(app.tasks.is_empty());
    }

    #[test]
    fn form_requires_all_fields() {
        let mut app = app();
        app.open_task_form();
        type_text(&mut app, "Only a name");
        if let Some(form) = &mut app.task_form {
            form.focused_field = 4;
        }
        app.handle_key(key(KeyCode::Enter));
        let error = app.task_form.as_ref().and_then(|f| f.error.clone());
        assert_eq!(error.as_deref(), Some("Task description is required"));
    }

    #[test]
    fn form_adds_task_and_selects_it() {
        let mut app = app();
        app.open_task_form();
        type_text(&mut app, "Review");
        app.handle_key(key(KeyCode::Enter));
        type_text(&mut app, "Check copy");
        app.handle_key(key(KeyCode::Enter));
        app.handle_key(key(KeyCode::Enter));
        // end date: one week after start
        app.handle_key(key(KeyCode::Right));
        app.handle_key(key(KeyCode::Enter));
        app.handle_key(key(KeyCode::Enter));

        assert!(app.task_form.is_none());
        assert_eq!(app.input_mode, InputMode::Normal);
        assert_eq!(app.tasks.len(), 1);
        assert_eq!(app.tasks[0].duration_days(), 8);
        assert_eq!(app.timeline_state.selected_task, Some(0));
        assert_eq!(app.layout.rows.len(), 1);
    }

    #[test]
    fn failed_reload_keeps_manual_tasks() {
        let mut app = app();
        app.open_task_form();
        type_text(&mut app, "Review");
        app.handle_key(key(KeyCode::Enter));
        type_text(&mut app, "Check copy");
        if let Some(form) = &mut app.task_form {
            form.focused_field = 4;
        }
        app.handle_key(key(KeyCode::Enter));
        assert_eq!(app.tasks.len(), 1);

        app.active_tab = Tab::Timeline;
        let id = issued_id(app.handle_key(key(KeyCode::Char('r'))));
        app.handle_api_message(ApiMessage::Failed {
            kind: RequestKind::Tasks,
            id,
            error: "API error: 502 Bad Gateway - ".into(),
        });

        assert!(!app.tasks_loading);
        assert!(app.tasks_error.is_some());
        assert_eq!(app.tasks.len(), 1);
        assert_eq!(app.tasks[0].name, "Review");
        assert_eq!(app.layout.rows.len(), 1);
        assert_eq!(app.timeline_state.selected_task, Some(0));
    }

    #[test]
    fn invalid_file_clears_selection() {
        let dir = tempfile::tempdir().unwrap();
        let text = dir.path().join("notes.txt");
        std::fs::write(&text, b"x").unwrap();
        let audio = dir.path().join("call.mp3");
        std::fs::write(&audio, b"ID3").unwrap();

        let mut app = app();
        app.select_file(audio.to_str().unwrap());
        assert_eq!(app.upload.phase, UploadPhase::Selected);
        assert_eq!(app.notices[0].message, "call.mp3 is ready for upload.");

        app.select_file(text.to_str().unwrap());
        assert_eq!(app.upload.phase, UploadPhase::Idle);
        assert!(app.upload.file.is_none());
        assert_eq!(app.notices[1].title, "Invalid file type");
        assert_eq!(app.notices[1].message, "Please select a valid audio file.");
    }

    #[test]
    fn upload_then_generate_flow() {
        let dir = tempfile::tempdir().unwrap();
        let audio = dir.path().join("call.wav");
        std::fs::write(&audio, b"RIFF").unwrap();

        let mut app = app();
        app.select_file(audio.to_str().unwrap());
        assert!(matches!(app.handle_key(key(KeyCode::Char('u'))), Some(ApiCommand::Upload { .. })));
        assert!(app.handle_key(key(KeyCode::Char('u'))).is_none());

        app.handle_api_message(ApiMessage::UploadProgress(50));
        assert_eq!(app.upload.progress(), 50);
        app.handle_api_message(ApiMessage::Uploaded(std::sync::Arc::new(b"RIFF".to_vec())));
        assert!(app.upload.can_generate());

        // before a summary exists the emotion only changes locally
        assert!(app.handle_key(key(KeyCode::Char('e'))).is_none());
        assert_eq!(app.emotion, Emotion::Happiness);

        let cmd = app.handle_key(key(KeyCode::Char('g')));
        let id = match cmd {
            Some(ApiCommand::CreateSummary { id, emotion, .. }) => {
                assert_eq!(emotion, Some(Emotion::Happiness));
                id
            }
            other => panic!("expected summary command, got {other:?}"),
        };

        app.handle_api_message(ApiMessage::SummaryReady(
            id,
            SummaryResponse {
                chunk_summaries: vec![ChunkSummary {
                    summary: "The **launch** is set.".into(),
                }],
                images: vec!["http://localhost:8000/static/plots/happiness_speaker_spk_0.png".into()],
            },
        ));
        assert_eq!(app.upload.phase, UploadPhase::Done);
        app.handle_key(key(KeyCode::Char(' ')));
        assert_eq!(app.summary.as_ref().map(|s| s.full_text()).as_deref(), Some("The launch is set."));

        // after the summary, emotion changes hit the backend
        assert!(matches!(
            app.handle_key(key(KeyCode::Char('e'))),
            Some(ApiCommand::UpdateEmotion {
                emotion: Emotion::Sadness,
                ..
            })
        ));
    }

    #[test]
    fn failed_generation_allows_retry() {
        let dir = tempfile::tempdir().unwrap();
        let audio = dir.path().join("call.wav");
        std::fs::write(&audio, b"RIFF").unwrap();

        let mut app = app();
        app.select_file(audio.to_str().unwrap());
        app.start_upload();
        app.handle_api_message(ApiMessage::Uploaded(std::sync::Arc::new(b"RIFF".to_vec())));
        let id = issued_id(app.generate_summary());
        app.handle_api_message(ApiMessage::Failed {
            kind: RequestKind::Summary,
            id,
            error: "API error: 500".into(),
        });

        assert_eq!(
            app.summary.as_ref().map(|s| s.full_text()).as_deref(),
            Some(summary::GENERATION_FAILED)
        );
        assert!(app.upload.can_generate());
    }

    #[test]
    fn emotion_is_locked_while_generating() {
        let dir = tempfile::tempdir().unwrap();
        let audio = dir.path().join("call.wav");
        std::fs::write(&audio, b"RIFF").unwrap();

        let mut app = app();
        app.select_file(audio.to_str().unwrap());
        app.start_upload();
        app.handle_api_message(ApiMessage::Uploaded(std::sync::Arc::new(b"RIFF".to_vec())));
        let id = match app.generate_summary() {
            Some(ApiCommand::CreateSummary { id, emotion, .. }) => {
                assert_eq!(emotion, Some(Emotion::Calmness));
                id
            }
            other => panic!("expected summary command, got {other:?}"),
        };

        assert!(app.set_emotion(Emotion::Anger).is_none());
        assert_eq!(app.emotion, Emotion::Calmness);
        assert_eq!(app.notices.last().map(|n| n.title.as_str()), Some("Emotion"));

        app.handle_api_message(ApiMessage::SummaryReady(
            id,
            SummaryResponse {
                chunk_summaries: vec![ChunkSummary {
                    summary: "Done.".into(),
                }],
                images: vec!["http://localhost:8000/static/plots/calmness_speaker_spk_0.png".into()],
            },
        ));
        assert_eq!(app.emotion, Emotion::Calmness);
        assert!(matches!(
            app.set_emotion(Emotion::Anger),
            Some(ApiCommand::UpdateEmotion {
                emotion: Emotion::Anger,
                ..
            })
        ));
    }

    #[test]
    fn notices_expire() {
        let mut config = AppConfig::default();
        config.ui.notice_secs = 0;
        let mut app = App::new(&config, ymd(2024, 11, 20));
        app.notify(LogLevel::Info, "Hello", "world");
        app.tick();
        assert!(app.notices.is_empty());
    }

    #[test]
    fn number_keys_switch_tabs() {
        let mut app = app();
        app.handle_key(key(KeyCode::Char('2')));
        assert_eq!(app.active_tab, Tab::Timeline);
        app.handle_key(key(KeyCode::BackTab));
        assert_eq!(app.active_tab, Tab::Dashboard);
        app.handle_key(key(KeyCode::Char('q')));
        assert!(app.should_quit);
    }
}
