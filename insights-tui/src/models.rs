//! Domain models for the insights backend.
//!
//! Wire DTOs mirror the JSON the backend sends and receives. `Task` is the
//! validated in-memory form the timeline works with; dates are parsed at
//! construction and the range invariant holds for every `Task` value.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::dates::{self, format_long, format_short};
use crate::error::TaskError;

// ============================================
// Emotions
// ============================================

/// Emotion used to colour the generated speaker plots
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Emotion {
    #[default]
    Calmness,
    Happiness,
    Sadness,
    Anger,
    Fear,
    Surprise,
}

impl Emotion {
    pub fn all() -> &'static [Emotion] {
        &[
            Emotion::Calmness,
            Emotion::Happiness,
            Emotion::Sadness,
            Emotion::Anger,
            Emotion::Fear,
            Emotion::Surprise,
        ]
    }

    /// Wire name, also used in plot file names
    pub fn as_str(&self) -> &'static str {
        match self {
            Emotion::Calmness => "calmness",
            Emotion::Happiness => "happiness",
            Emotion::Sadness => "sadness",
            Emotion::Anger => "anger",
            Emotion::Fear => "fear",
            Emotion::Surprise => "surprise",
        }
    }

    pub fn next(&self) -> Self {
        let all = Self::all();
        let idx = all.iter().position(|e| e == self).unwrap_or(0);
        all[(idx + 1) % all.len()]
    }

    pub fn previous(&self) -> Self {
        let all = Self::all();
        let idx = all.iter().position(|e| e == self).unwrap_or(0);
        all[(idx + all.len() - 1) % all.len()]
    }
}

impl std::fmt::Display for Emotion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = self.as_str();
        let mut chars = name.chars();
        match chars.next() {
            Some(first) => write!(f, "{}{}", first.to_ascii_uppercase(), chars.as_str()),
            None => Ok(()),
        }
    }
}

// ============================================
// Task DTOs
// ============================================

/// Action item as sent by `/analyze_transcription/`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskDto {
    pub task_name: String,
    /// `dd-MM-yyyy`
    pub start_date: String,
    /// `dd-MM-yyyy`
    pub end_date: String,
    #[serde(default)]
    pub description: String,
}

/// A validated task on the timeline
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Task {
    pub name: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub description: String,
}

impl Task {
    pub fn new(
        name: impl Into<String>,
        start_date: NaiveDate,
        end_date: NaiveDate,
        description: impl Into<String>,
    ) -> Result<Self, TaskError> {
        if end_date < start_date {
            return Err(TaskError::InvertedRange {
                start: start_date,
                end: end_date,
            });
        }
        Ok(Self {
            name: name.into(),
            start_date,
            end_date,
            description: description.into(),
        })
    }

    pub fn from_dto(dto: &TaskDto) -> Result<Self, TaskError> {
        let start = dates::parse_backend_date(&dto.start_date)?;
        let end = dates::parse_backend_date(&dto.end_date)?;
        Self::new(dto.task_name.clone(), start, end, dto.description.clone())
    }

    /// Inclusive length in days
    pub fn duration_days(&self) -> i64 {
        (self.end_date - self.start_date).num_days() + 1
    }

    /// `Nov 25 - Dec 9, 2024`
    pub fn range_label(&self) -> String {
        format!(
            "{} - {}",
            format_short(self.start_date),
            format_long(self.end_date)
        )
    }
}

/// Convert backend DTOs, keeping the valid ones and reporting the rest.
pub fn tasks_from_dtos(dtos: &[TaskDto]) -> (Vec<Task>, Vec<(String, TaskError)>) {
    let mut tasks = Vec::with_capacity(dtos.len());
    let mut rejected = Vec::new();
    for dto in dtos {
        match Task::from_dto(dto) {
            Ok(task) => tasks.push(task),
            Err(e) => rejected.push((dto.task_name.clone(), e)),
        }
    }
    (tasks, rejected)
}

/// Raw values of the add-task form
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskDraft {
    pub name: String,
    pub description: String,
    /// `yyyy-MM-dd`
    pub start_date: String,
    /// `yyyy-MM-dd`
    pub end_date: String,
}

impl TaskDraft {
    /// Validate the draft and build a task from it
    pub fn build(&self) -> Result<Task, TaskError> {
        if self.name.trim().is_empty() {
            return Err(TaskError::MissingField("Task name"));
        }
        if self.description.trim().is_empty() {
            return Err(TaskError::MissingField("Task description"));
        }
        if self.start_date.trim().is_empty() {
            return Err(TaskError::MissingField("Start date"));
        }
        if self.end_date.trim().is_empty() {
            return Err(TaskError::MissingField("End date"));
        }
        let start = dates::parse_form_date(&self.start_date)?;
        let end = dates::parse_form_date(&self.end_date)?;
        Task::new(self.name.trim(), start, end, self.description.trim())
    }
}

// ============================================
// Summary DTOs
// ============================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkSummary {
    pub summary: String,
}

/// Response of `/create_summary/`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryResponse {
    #[serde(default)]
    pub chunk_summaries: Vec<ChunkSummary>,
    #[serde(default)]
    pub images: Vec<String>,
}

/// Body of `/update_emotion/`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmotionRequest {
    pub emotion: Emotion,
}

/// Response of `/update_emotion/`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImagesResponse {
    #[serde(default)]
    pub images: Vec<String>,
}

// ============================================
// Relevance DTOs
// ============================================

/// Body of `/get_relevance/`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelevanceRequest {
    pub speaker_id: String,
}

/// Response of `/get_relevance/`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RelevanceResponse {
    #[serde(rename = "Relevant")]
    pub relevant: f64,
    #[serde(rename = "Not Relevant")]
    pub not_relevant: f64,
}

impl RelevanceResponse {
    /// Relevant share in `0.0..=1.0`, whatever scale the backend used
    pub fn relevant_ratio(&self) -> f64 {
        let total = self.relevant.max(0.0) + self.not_relevant.max(0.0);
        if total <= f64::EPSILON {
            0.0
        } else {
            (self.relevant.max(0.0) / total).clamp(0.0, 1.0)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn task_from_backend_dto() {
        let dto = TaskDto {
            task_name: "Complete LogTeam Software Training".to_string(),
            start_date: "25-11-2024".to_string(),
            end_date: "09-12-2024".to_string(),
            description: "Two weeks of training".to_string(),
        };
        let task = Task::from_dto(&dto).unwrap();
        assert_eq!(task.start_date, ymd(2024, 11, 25));
        assert_eq!(task.end_date, ymd(2024, 12, 9));
        assert_eq!(task.duration_days(), 15);
        assert_eq!(task.range_label(), "Nov 25 - Dec 9, 2024");
    }

    #[test]
    fn inverted_range_is_rejected() {
        let err = Task::new("x", ymd(2024, 2, 2), ymd(2024, 2, 1), "").unwrap_err();
        assert_eq!(
            err,
            TaskError::InvertedRange {
                start: ymd(2024, 2, 2),
                end: ymd(2024, 2, 1)
            }
        );
    }

    #[test]
    fn invalid_backend_tasks_are_reported_not_loaded() {
        let dtos = vec![
            TaskDto {
                task_name: "ok".into(),
                start_date: "01-06-2023".into(),
                end_date: "14-06-2023".into(),
                description: String::new(),
            },
            TaskDto {
                task_name: "bad date".into(),
                start_date: "2023-06-01".into(),
                end_date: "14-06-2023".into(),
                description: String::new(),
            },
        ];
        let (tasks, rejected) = tasks_from_dtos(&dtos);
        assert_eq!(tasks.len(), 1);
        assert_eq!(rejected.len(), 1);
        assert_eq!(rejected[0].0, "bad date");
    }

    #[test]
    fn draft_requires_every_field() {
        let mut draft = TaskDraft::default();
        assert_eq!(draft.build(), Err(TaskError::MissingField("Task name")));

        draft.name = "Design".into();
        assert_eq!(draft.build(), Err(TaskError::MissingField("Task description")));

        draft.description = "UI work".into();
        draft.start_date = "2023-06-08".into();
        assert_eq!(draft.build(), Err(TaskError::MissingField("End date")));

        draft.end_date = "2023-06-28".into();
        let task = draft.build().unwrap();
        assert_eq!(task.name, "Design");
    }

    #[test]
    fn draft_with_start_after_end_is_a_validation_error() {
        let draft = TaskDraft {
            name: "Testing".into(),
            description: "QA".into(),
            start_date: "2023-07-24".into(),
            end_date: "2023-07-10".into(),
        };
        assert!(matches!(draft.build(), Err(TaskError::InvertedRange { .. })));
    }

    #[test]
    fn relevance_field_names_match_backend() {
        let parsed: RelevanceResponse =
            serde_json::from_str(r#"{"Relevant": 72.5, "Not Relevant": 27.5}"#).unwrap();
        assert_eq!(parsed.relevant, 72.5);
        assert!((parsed.relevant_ratio() - 0.725).abs() < 1e-9);

        let empty = RelevanceResponse {
            relevant: 0.0,
            not_relevant: 0.0,
        };
        assert_eq!(empty.relevant_ratio(), 0.0);
    }

    #[test]
    fn emotion_cycles_and_serializes_lowercase() {
        assert_eq!(Emotion::Surprise.next(), Emotion::Calmness);
        assert_eq!(Emotion::Calmness.previous(), Emotion::Surprise);
        assert_eq!(Emotion::Anger.to_string(), "Anger");
        let body = serde_json::to_string(&EmotionRequest {
            emotion: Emotion::Sadness,
        })
        .unwrap();
        assert_eq!(body, r#"{"emotion":"sadness"}"#);
    }
}
