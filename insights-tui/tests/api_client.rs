//! API client against a local mock backend.

use std::io::Read;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use insights_tui::api::{self, ApiClient, ApiCommand, ApiMessage};
use insights_tui::models::Emotion;
use insights_tui::requests::{RequestId, RequestKind};
use insights_tui::upload::AudioFile;
use pretty_assertions::assert_eq;
use tiny_http::{Header, Response, Server};
use tokio::sync::mpsc;

/// Recorded request: url, content type, body
type Seen = Arc<Mutex<Vec<(String, String, String)>>>;

/// Serve canned `(status, body)` replies keyed by url path until dropped.
fn mock_backend(routes: Vec<(&'static str, u16, &'static str)>) -> (String, Seen) {
    let server = Server::http("127.0.0.1:0").unwrap();
    let port = server.server_addr().to_ip().unwrap().port();
    let seen: Seen = Arc::new(Mutex::new(Vec::new()));
    let log = Arc::clone(&seen);

    thread::spawn(move || {
        for mut request in server.incoming_requests() {
            let url = request.url().to_string();
            let content_type = request
                .headers()
                .iter()
                .find(|h| h.field.equiv("Content-Type"))
                .map(|h| h.value.as_str().to_string())
                .unwrap_or_default();
            let mut body = String::new();
            let mut bytes = Vec::new();
            request.as_reader().read_to_end(&mut bytes).ok();
            body.push_str(&String::from_utf8_lossy(&bytes));
            log.lock().unwrap().push((url.clone(), content_type, body));

            let (status, reply) = routes
                .iter()
                .find(|(path, _, _)| *path == url)
                .map(|(_, s, b)| (*s, *b))
                .unwrap_or((404, "not found"));
            let response = Response::from_string(reply)
                .with_status_code(status)
                .with_header(Header::from_bytes("Content-Type", "application/json").unwrap());
            request.respond(response).ok();
        }
    });

    (format!("http://127.0.0.1:{port}"), seen)
}

fn client(base: &str) -> ApiClient {
    ApiClient::new(base, Duration::from_secs(5)).unwrap()
}

#[tokio::test]
async fn analyze_transcription_returns_tasks() {
    let (base, seen) = mock_backend(vec![(
        "/analyze_transcription/",
        200,
        r#"{"tasks":[{"task_name":"Draft release","start_date":"25-11-2024","end_date":"29-11-2024","description":"Write it"}]}"#,
    )]);

    let tasks = client(&base).analyze_transcription().await.unwrap();
    assert_eq!(tasks.len(), 1);
    assert_eq!(tasks[0].task_name, "Draft release");
    assert_eq!(tasks[0].start_date, "25-11-2024");

    let seen = seen.lock().unwrap();
    assert_eq!(seen[0].1, "application/json");
}

#[tokio::test]
async fn missing_task_array_is_reported() {
    let (base, _) = mock_backend(vec![
        ("/analyze_transcription/", 200, r#"{"tasks":"none"}"#),
    ]);
    let err = client(&base).analyze_transcription().await.unwrap_err();
    assert_eq!(err.to_string(), api::NO_TASKS);
}

#[tokio::test]
async fn http_errors_carry_status_and_body() {
    let (base, _) = mock_backend(vec![("/get_relevance/", 500, "boom")]);
    let err = client(&base).get_relevance("spk_0").await.unwrap_err();
    let text = err.to_string();
    assert!(text.contains("500"), "{text}");
    assert!(text.contains("boom"), "{text}");
}

#[tokio::test]
async fn relevance_uses_backend_keys() {
    let (base, seen) = mock_backend(vec![(
        "/get_relevance/",
        200,
        r#"{"Relevant":75.0,"Not Relevant":25.0}"#,
    )]);
    let relevance = client(&base).get_relevance("spk_1").await.unwrap();
    assert_eq!(relevance.relevant, 75.0);
    assert!((relevance.relevant_ratio() - 0.75).abs() < 1e-9);

    let seen = seen.lock().unwrap();
    assert_eq!(seen[0].2, r#"{"speaker_id":"spk_1"}"#);
}

#[tokio::test]
async fn update_emotion_sends_lowercase_name() {
    let (base, seen) = mock_backend(vec![(
        "/update_emotion/",
        200,
        r#"{"images":["static/plots/anger_speaker_0.png"]}"#,
    )]);
    let images = client(&base).update_emotion(Emotion::Anger).await.unwrap();
    assert_eq!(images.images, vec!["static/plots/anger_speaker_0.png"]);
    assert_eq!(seen.lock().unwrap()[0].2, r#"{"emotion":"anger"}"#);
}

#[tokio::test]
async fn create_summary_posts_multipart_audio() {
    let (base, seen) = mock_backend(vec![(
        "/create_summary/",
        200,
        r#"{"chunk_summaries":[{"summary":"One."},{"summary":"Two."}],"images":["a.png"]}"#,
    )]);
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("call.wav");
    std::fs::write(&path, b"RIFFdata").unwrap();
    let file = AudioFile::select(&path).unwrap();

    let summary = client(&base)
        .create_summary(&file, Arc::new(b"RIFFdata".to_vec()), Some(Emotion::Fear))
        .await
        .unwrap();
    assert_eq!(summary.chunk_summaries.len(), 2);
    assert_eq!(summary.images, vec!["a.png"]);

    let seen = seen.lock().unwrap();
    let (_, content_type, body) = &seen[0];
    assert!(content_type.starts_with("multipart/form-data"));
    assert!(body.contains(r#"name="audio""#));
    assert!(body.contains(r#"filename="call.wav""#));
    assert!(body.contains("Content-Type: audio/wav"));
    assert!(body.contains(r#"name="emotion""#));
    assert!(body.contains("fear"));
}

#[tokio::test]
async fn worker_tags_replies_with_request_ids() {
    let (base, _) = mock_backend(vec![
        ("/update_emotion/", 200, r#"{"images":[]}"#),
        ("/get_relevance/", 404, "no speaker"),
    ]);
    let (cmd_tx, cmd_rx) = mpsc::channel(8);
    let (msg_tx, mut msg_rx) = mpsc::channel(8);
    let worker = tokio::spawn(api::run_worker(client(&base), msg_tx, cmd_rx));

    cmd_tx
        .send(ApiCommand::UpdateEmotion {
            id: RequestId(7),
            emotion: Emotion::Surprise,
        })
        .await
        .unwrap();
    match msg_rx.recv().await.unwrap() {
        ApiMessage::ImagesUpdated(id, images) => {
            assert_eq!(id, RequestId(7));
            assert!(images.is_empty());
        }
        other => panic!("unexpected message {other:?}"),
    }

    cmd_tx
        .send(ApiCommand::GetRelevance {
            id: RequestId(8),
            speaker_id: "spk_9".into(),
        })
        .await
        .unwrap();
    match msg_rx.recv().await.unwrap() {
        ApiMessage::Failed { kind, id, error } => {
            assert_eq!(kind, RequestKind::Relevance);
            assert_eq!(id, RequestId(8));
            assert!(error.contains("404"));
        }
        other => panic!("unexpected message {other:?}"),
    }

    cmd_tx.send(ApiCommand::Shutdown).await.unwrap();
    worker.await.unwrap();
}

#[tokio::test]
async fn worker_reports_upload_progress_in_order() {
    let (base, _) = mock_backend(vec![]);
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("memo.m4a");
    std::fs::write(&path, vec![1u8; 64]).unwrap();
    let file = AudioFile::select(&path).unwrap();

    let (cmd_tx, cmd_rx) = mpsc::channel(8);
    let (msg_tx, mut msg_rx) = mpsc::channel(32);
    tokio::spawn(api::run_worker(client(&base), msg_tx, cmd_rx));
    cmd_tx
        .send(ApiCommand::Upload {
            file,
            step_delay: Duration::ZERO,
        })
        .await
        .unwrap();

    let mut progress = Vec::new();
    loop {
        match msg_rx.recv().await.unwrap() {
            ApiMessage::UploadProgress(p) => progress.push(p),
            ApiMessage::Uploaded(data) => {
                assert_eq!(data.len(), 64);
                break;
            }
            other => panic!("unexpected message {other:?}"),
        }
    }
    assert_eq!(progress.first(), Some(&0));
    assert_eq!(progress.last(), Some(&100));
    assert_eq!(progress.len(), 11);
}
