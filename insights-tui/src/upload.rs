//! Audio file selection and the upload / generate state machine.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use tokio::io::AsyncReadExt;
use tokio::sync::mpsc;

use crate::error::UploadError;

/// Largest accepted recording
pub const MAX_UPLOAD_MB: u64 = 50;
/// Progress is reported in this many equal steps
pub const UPLOAD_STEPS: u8 = 10;

/// Media type for a path, judged by extension. `None` for anything that is
/// not audio.
pub fn audio_mime(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    let mime = match ext.as_str() {
        "mp3" => "audio/mpeg",
        "wav" => "audio/wav",
        "m4a" => "audio/mp4",
        "ogg" | "oga" => "audio/ogg",
        "opus" => "audio/opus",
        "flac" => "audio/flac",
        "aac" => "audio/aac",
        "weba" | "webm" => "audio/webm",
        _ => return None,
    };
    Some(mime)
}

/// A recording chosen for upload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioFile {
    pub path: PathBuf,
    pub name: String,
    pub mime: &'static str,
    pub size: u64,
}

impl AudioFile {
    /// Check that `path` is an existing audio file within the size limit.
    pub fn select(path: impl AsRef<Path>) -> Result<Self, UploadError> {
        let path = path.as_ref().to_path_buf();
        let mime = audio_mime(&path).ok_or_else(|| UploadError::NotAudio { path: path.clone() })?;
        let meta = std::fs::metadata(&path).map_err(|_| UploadError::NotFound { path: path.clone() })?;
        if !meta.is_file() {
            return Err(UploadError::NotFound { path });
        }
        if meta.len() > MAX_UPLOAD_MB * 1024 * 1024 {
            return Err(UploadError::TooLarge {
                path,
                limit_mb: MAX_UPLOAD_MB,
            });
        }
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Ok(Self {
            path,
            name,
            mime,
            size: meta.len(),
        })
    }
}

/// Read `file` into memory in `UPLOAD_STEPS` chunks, sending the percentage
/// after each one (0 first, 100 last) and pausing `step_delay` between them.
pub async fn read_with_progress(
    file: &AudioFile,
    step_delay: Duration,
    progress: &mpsc::Sender<u8>,
) -> Result<Vec<u8>, UploadError> {
    let read_err = |source| UploadError::Read {
        path: file.path.clone(),
        source,
    };
    let mut handle = tokio::fs::File::open(&file.path).await.map_err(read_err)?;
    let mut data = Vec::with_capacity(file.size as usize);
    let chunk = (file.size / UPLOAD_STEPS as u64).max(1) as usize;

    progress.send(0).await.ok();
    for step in 1..=UPLOAD_STEPS {
        tokio::time::sleep(step_delay).await;
        if step == UPLOAD_STEPS {
            handle.read_to_end(&mut data).await.map_err(read_err)?;
        } else {
            let mut buf = vec![0u8; chunk];
            let n = handle.read(&mut buf).await.map_err(read_err)?;
            data.extend_from_slice(&buf[..n]);
        }
        progress.send(step * (100 / UPLOAD_STEPS)).await.ok();
    }
    Ok(data)
}

/// Where the dashboard is in the upload flow
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UploadPhase {
    #[default]
    Idle,
    Selected,
    Uploading {
        progress: u8,
    },
    Uploaded,
    Generating,
    Done,
}

#[derive(Debug, Clone, Default)]
pub struct UploadState {
    pub file: Option<AudioFile>,
    pub phase: UploadPhase,
    data: Option<Arc<Vec<u8>>>,
}

impl UploadState {
    /// Replace the selection; any previous upload is discarded.
    pub fn select(&mut self, file: AudioFile) {
        self.file = Some(file);
        self.phase = UploadPhase::Selected;
        self.data = None;
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    pub fn can_upload(&self) -> bool {
        self.phase == UploadPhase::Selected
    }

    pub fn can_generate(&self) -> bool {
        self.phase == UploadPhase::Uploaded
    }

    pub fn is_uploading(&self) -> bool {
        matches!(self.phase, UploadPhase::Uploading { .. })
    }

    pub fn progress(&self) -> u8 {
        match self.phase {
            UploadPhase::Uploading { progress } => progress,
            UploadPhase::Idle | UploadPhase::Selected => 0,
            _ => 100,
        }
    }

    pub fn begin_upload(&mut self) -> Result<AudioFile, UploadError> {
        let file = self.file.clone().ok_or(UploadError::NoFile)?;
        match self.phase {
            UploadPhase::Selected => {
                self.phase = UploadPhase::Uploading { progress: 0 };
                Ok(file)
            }
            UploadPhase::Uploading { .. } => Err(UploadError::Busy("in progress")),
            _ => Err(UploadError::Busy("complete")),
        }
    }

    pub fn set_progress(&mut self, progress: u8) {
        if self.is_uploading() {
            self.phase = UploadPhase::Uploading {
                progress: progress.min(100),
            };
        }
    }

    pub fn finish_upload(&mut self, data: impl Into<Arc<Vec<u8>>>) {
        self.data = Some(data.into());
        self.phase = UploadPhase::Uploaded;
    }

    pub fn fail_upload(&mut self) {
        self.data = None;
        self.phase = if self.file.is_some() {
            UploadPhase::Selected
        } else {
            UploadPhase::Idle
        };
    }

    /// Start generation, handing out the uploaded bytes
    pub fn begin_generate(&mut self) -> Result<(AudioFile, Arc<Vec<u8>>), UploadError> {
        let file = self.file.clone().ok_or(UploadError::NoFile)?;
        match (self.phase, &self.data) {
            (UploadPhase::Uploaded, Some(data)) => {
                let data = Arc::clone(data);
                self.phase = UploadPhase::Generating;
                Ok((file, data))
            }
            (UploadPhase::Generating, _) => Err(UploadError::Busy("generating")),
            (UploadPhase::Uploading { .. }, _) => Err(UploadError::Busy("in progress")),
            (UploadPhase::Done, _) => Err(UploadError::AlreadyGenerated),
            _ => Err(UploadError::NotUploaded),
        }
    }

    pub fn finish_generate(&mut self) {
        self.phase = UploadPhase::Done;
    }

    /// Generation failed: allow another attempt with the same upload
    pub fn fail_generate(&mut self) {
        if self.phase == UploadPhase::Generating {
            self.phase = UploadPhase::Uploaded;
        }
    }
}
