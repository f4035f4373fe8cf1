//! API client for the insights backend.
//!
//! This module provides an async HTTP client for the four analysis
//! endpoints, plus the worker that runs them off the UI thread. Every
//! command carries a `RequestId` so the app can drop stale replies.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Response};
use tokio::sync::mpsc;

use crate::models::{
    Emotion, EmotionRequest, ImagesResponse, RelevanceRequest, RelevanceResponse,
    SummaryResponse, TaskDto,
};
use crate::requests::{RequestId, RequestKind};
use crate::upload::{self, AudioFile};

/// Default API base URL
pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";

pub const NO_TASKS: &str = "No tasks found in the response";

/// API client for the insights backend
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
}

impl ApiClient {
    /// Create a new API client with the specified base URL
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        reqwest::Url::parse(&base_url)
            .with_context(|| format!("Invalid API base URL '{base_url}'"))?;

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}/", self.base_url, path)
    }

    /// Extract action items from the latest transcription
    pub async fn analyze_transcription(&self) -> Result<Vec<TaskDto>> {
        let response = self
            .client
            .post(self.url("analyze_transcription"))
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .send()
            .await
            .context("Failed to send request to analyze_transcription endpoint")?;

        let body: serde_json::Value = ensure_success(response)
            .await?
            .json()
            .await
            .context("Failed to parse analyze_transcription response")?;

        match body.get("tasks") {
            Some(tasks @ serde_json::Value::Array(_)) => serde_json::from_value(tasks.clone())
                .context("Failed to parse tasks in analyze_transcription response"),
            _ => anyhow::bail!(NO_TASKS),
        }
    }

    /// Upload a recording and summarise it
    pub async fn create_summary(
        &self,
        file: &AudioFile,
        data: Arc<Vec<u8>>,
        emotion: Option<Emotion>,
    ) -> Result<SummaryResponse> {
        let part = Part::bytes(data.as_ref().clone())
            .file_name(file.name.clone())
            .mime_str(file.mime)
            .context("Invalid audio media type")?;
        let mut form = Form::new().part("audio", part);
        if let Some(emotion) = emotion {
            form = form.text("emotion", emotion.as_str());
        }

        let response = self
            .client
            .post(self.url("create_summary"))
            .multipart(form)
            .send()
            .await
            .context("Failed to send create summary request")?;

        ensure_success(response)
            .await?
            .json()
            .await
            .context("Failed to parse create summary response")
    }

    /// Re-render the speaker plots for another emotion
    pub async fn update_emotion(&self, emotion: Emotion) -> Result<ImagesResponse> {
        let response = self
            .client
            .post(self.url("update_emotion"))
            .json(&EmotionRequest { emotion })
            .send()
            .await
            .context("Failed to send update emotion request")?;

        ensure_success(response)
            .await?
            .json()
            .await
            .context("Failed to parse update emotion response")
    }

    pub async fn get_relevance(&self, speaker_id: &str) -> Result<RelevanceResponse> {
        let response = self
            .client
            .post(self.url("get_relevance"))
            .json(&RelevanceRequest {
                speaker_id: speaker_id.to_string(),
            })
            .send()
            .await
            .context("Failed to send relevance request")?;

        ensure_success(response)
            .await?
            .json()
            .await
            .context("Failed to parse relevance response")
    }

    pub fn plot_url(&self, emotion: Emotion, speaker_id: &str) -> String {
        plot_url(&self.base_url, emotion, speaker_id)
    }

    pub fn resolve_image(&self, image: &str) -> String {
        resolve_image(&self.base_url, image)
    }
}

/// Static plot for one speaker and emotion, e.g. `anger_speaker_spk_0.png`
pub fn plot_url(base_url: &str, emotion: Emotion, speaker_id: &str) -> String {
    format!(
        "{}/static/plots/{}_speaker_{}.png",
        base_url.trim_end_matches('/'),
        emotion.as_str(),
        speaker_id
    )
}

/// Image paths from the backend may be relative to its root.
pub fn resolve_image(base_url: &str, image: &str) -> String {
    if image.starts_with("http://") || image.starts_with("https://") {
        image.to_string()
    } else {
        format!(
            "{}/{}",
            base_url.trim_end_matches('/'),
            image.trim_start_matches('/')
        )
    }
}

async fn ensure_success(response: Response) -> Result<Response> {
    if !response.status().is_success() {
        anyhow::bail!(
            "API error: {} - {}",
            response.status(),
            response.text().await.unwrap_or_default()
        );
    }
    Ok(response)
}

/// Messages sent from API worker to the main TUI thread
#[derive(Debug, Clone)]
pub enum ApiMessage {
    TasksLoaded(RequestId, Vec<TaskDto>),
    /// Percentage read of the file being uploaded
    UploadProgress(u8),
    Uploaded(Arc<Vec<u8>>),
    UploadFailed(String),
    SummaryReady(RequestId, SummaryResponse),
    ImagesUpdated(RequestId, Vec<String>),
    RelevanceLoaded {
        id: RequestId,
        speaker_id: String,
        relevance: RelevanceResponse,
    },
    /// A request failed; the message is shown to the user
    Failed {
        kind: RequestKind,
        id: RequestId,
        error: String,
    },
}

/// Commands sent from TUI to the API worker
#[derive(Debug, Clone)]
pub enum ApiCommand {
    LoadTasks(RequestId),
    /// Read the file into memory, reporting progress
    Upload { file: AudioFile, step_delay: Duration },
    CreateSummary {
        id: RequestId,
        file: AudioFile,
        data: Arc<Vec<u8>>,
        emotion: Option<Emotion>,
    },
    UpdateEmotion { id: RequestId, emotion: Emotion },
    GetRelevance { id: RequestId, speaker_id: String },
    /// Shutdown the API worker
    Shutdown,
}

/// Run commands until `Shutdown` or the command channel closes.
///
/// Each command runs in its own task so a slow call never holds up the
/// next one; ordering is restored on the app side by request id.
pub async fn run_worker(
    client: ApiClient,
    tx: mpsc::Sender<ApiMessage>,
    mut rx: mpsc::Receiver<ApiCommand>,
) {
    while let Some(cmd) = rx.recv().await {
        if matches!(cmd, ApiCommand::Shutdown) {
            tracing::debug!("api worker shutting down");
            break;
        }
        tokio::spawn(execute(client.clone(), cmd, tx.clone()));
    }
}

async fn execute(client: ApiClient, cmd: ApiCommand, tx: mpsc::Sender<ApiMessage>) {
    let msg = match cmd {
        ApiCommand::LoadTasks(id) => {
            tracing::info!(?id, "loading tasks");
            match client.analyze_transcription().await {
                Ok(tasks) => ApiMessage::TasksLoaded(id, tasks),
                Err(e) => failed(RequestKind::Tasks, id, e),
            }
        }
        ApiCommand::Upload { file, step_delay } => {
            tracing::info!(file = %file.name, size = file.size, "reading upload");
            let (progress_tx, mut progress_rx) = mpsc::channel(16);
            let forward_tx = tx.clone();
            let forward = tokio::spawn(async move {
                while let Some(p) = progress_rx.recv().await {
                    forward_tx.send(ApiMessage::UploadProgress(p)).await.ok();
                }
            });
            let result = upload::read_with_progress(&file, step_delay, &progress_tx).await;
            drop(progress_tx);
            forward.await.ok();
            match result {
                Ok(data) => ApiMessage::Uploaded(Arc::new(data)),
                Err(e) => {
                    tracing::warn!(error = %e, "upload failed");
                    ApiMessage::UploadFailed(e.to_string())
                }
            }
        }
        ApiCommand::CreateSummary {
            id,
            file,
            data,
            emotion,
        } => {
            tracing::info!(?id, file = %file.name, ?emotion, "creating summary");
            match client.create_summary(&file, data, emotion).await {
                Ok(mut summary) => {
                    summary.images = resolve_all(&client, &summary.images);
                    ApiMessage::SummaryReady(id, summary)
                }
                Err(e) => failed(RequestKind::Summary, id, e),
            }
        }
        ApiCommand::UpdateEmotion { id, emotion } => {
            tracing::info!(?id, %emotion, "updating emotion");
            match client.update_emotion(emotion).await {
                Ok(images) => ApiMessage::ImagesUpdated(id, resolve_all(&client, &images.images)),
                Err(e) => failed(RequestKind::Emotion, id, e),
            }
        }
        ApiCommand::GetRelevance { id, speaker_id } => {
            tracing::info!(?id, %speaker_id, "fetching relevance");
            match client.get_relevance(&speaker_id).await {
                Ok(relevance) => ApiMessage::RelevanceLoaded {
                    id,
                    speaker_id,
                    relevance,
                },
                Err(e) => failed(RequestKind::Relevance, id, e),
            }
        }
        ApiCommand::Shutdown => return,
    };
    tx.send(msg).await.ok();
}

fn resolve_all(client: &ApiClient, images: &[String]) -> Vec<String> {
    images.iter().map(|i| client.resolve_image(i)).collect()
}

fn failed(kind: RequestKind, id: RequestId, error: anyhow::Error) -> ApiMessage {
    tracing::warn!(kind = kind.name(), ?id, error = %error, "request failed");
    ApiMessage::Failed {
        kind,
        id,
        error: error.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> ApiClient {
        ApiClient::new("http://localhost:8000/", Duration::from_secs(1)).unwrap()
    }

    #[test]
    fn trailing_slash_is_trimmed() {
        assert_eq!(client().base_url(), "http://localhost:8000");
        assert_eq!(
            client().url("get_relevance"),
            "http://localhost:8000/get_relevance/"
        );
    }

    #[test]
    fn malformed_base_url_fails_at_construction() {
        let err = ApiClient::new("http://bad host", Duration::from_secs(1)).unwrap_err();
        assert!(err.to_string().contains("Invalid API base URL"));
    }

    #[test]
    fn plot_url_format() {
        assert_eq!(
            client().plot_url(Emotion::Happiness, "spk_1"),
            "http://localhost:8000/static/plots/happiness_speaker_spk_1.png"
        );
    }

    #[test]
    fn relative_images_are_resolved() {
        let c = client();
        assert_eq!(
            c.resolve_image("/static/plots/a.png"),
            "http://localhost:8000/static/plots/a.png"
        );
        assert_eq!(c.resolve_image("https://cdn/x.png"), "https://cdn/x.png");
    }
}
