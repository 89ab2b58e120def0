//! HTTP contract tests for `RemoveBgClient`
//!
//! A local `tiny_http` server stands in for the background-removal API and
//! captures what the client sends.

use bgremove_remote::{
    remove_background_from_file, BackgroundRemover, BgRemovalError, ProcessingOutcome,
    ProcessingStatus, RecordingNotifier, RemoteConfig, RemoteServiceError, RemoveBgClient,
    SourceImage, WidgetController,
};
use std::io::Read;
use std::sync::mpsc::{self, Receiver};
use std::time::Duration;
use tempfile::TempDir;
use tiny_http::{Header, Response, Server};

const RESULT_BODY: &[u8] = b"\x89PNG\r\n\x1a\nbackground removed";

struct CapturedRequest {
    method: String,
    headers: Vec<(String, String)>,
    body: Vec<u8>,
}

impl CapturedRequest {
    fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(field, _)| field.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

/// Start a server answering every request with `status` and `body`
fn start_test_server(status: i32, body: &'static [u8]) -> (String, Receiver<CapturedRequest>) {
    let server = Server::http("127.0.0.1:0").unwrap();
    let addr = server.server_addr().to_ip().unwrap();
    let (tx, rx) = mpsc::channel();

    std::thread::spawn(move || {
        for mut request in server.incoming_requests() {
            let mut received = Vec::new();
            let _ = request.as_reader().read_to_end(&mut received);
            let headers = request
                .headers()
                .iter()
                .map(|h| (h.field.to_string(), h.value.to_string()))
                .collect();
            let _ = tx.send(CapturedRequest {
                method: request.method().to_string(),
                headers,
                body: received,
            });

            let response = Response::from_data(body.to_vec())
                .with_status_code(status)
                .with_header("Content-Type: image/png".parse::<Header>().unwrap());
            let _ = request.respond(response);
        }
    });

    (format!("http://{}/v1.0/removebg", addr), rx)
}

fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    haystack.windows(needle.len()).any(|window| window == needle)
}

fn payload() -> bgremove_remote::UploadPayload {
    SourceImage::new(b"original image bytes".to_vec(), "photo.jpg").to_payload("image.png", "image/png")
}

fn received(rx: &Receiver<CapturedRequest>) -> CapturedRequest {
    rx.recv_timeout(Duration::from_secs(5)).unwrap()
}

#[tokio::test]
async fn test_success_returns_body_and_sends_multipart() {
    let (endpoint, rx) = start_test_server(200, RESULT_BODY);
    let config = RemoteConfig::builder()
        .endpoint(endpoint)
        .api_key("test-key")
        .build()
        .unwrap();
    let client = RemoveBgClient::new(config).unwrap();

    let processed = client.remove_background(payload()).await.unwrap();
    assert_eq!(processed.as_bytes(), RESULT_BODY);
    assert_eq!(processed.content_type(), Some("image/png"));

    let request = received(&rx);
    assert_eq!(request.method, "POST");
    assert_eq!(request.header("X-Api-Key"), Some("test-key"));
    assert!(request
        .header("Content-Type")
        .unwrap()
        .starts_with("multipart/form-data"));
    assert!(contains(&request.body, b"name=\"image_file\""));
    assert!(contains(&request.body, b"filename=\"image.png\""));
    assert!(contains(&request.body, b"original image bytes"));
}

#[tokio::test]
async fn test_non_success_status_is_remote_error() {
    let (endpoint, _rx) = start_test_server(403, b"{\"errors\":[{\"title\":\"Forbidden\"}]}");
    let config = RemoteConfig::builder()
        .endpoint(endpoint)
        .api_key("wrong-key")
        .build()
        .unwrap();
    let client = RemoveBgClient::new(config).unwrap();

    let err = client.remove_background(payload()).await.unwrap_err();
    assert!(matches!(
        err,
        BgRemovalError::RemoteService(RemoteServiceError::Status { status: 403 })
    ));
}

#[tokio::test]
async fn test_rate_limit_treated_like_any_failure() {
    let (endpoint, _rx) = start_test_server(429, b"");
    let client =
        RemoveBgClient::new(RemoteConfig::builder().endpoint(endpoint).build().unwrap()).unwrap();

    let err = client.remove_background(payload()).await.unwrap_err();
    assert!(err.is_remote());
}

#[tokio::test]
async fn test_proxy_mode_sends_no_key_header() {
    let (endpoint, rx) = start_test_server(200, RESULT_BODY);
    let config = RemoteConfig::builder()
        .endpoint(endpoint)
        .without_api_key()
        .build()
        .unwrap();
    let client = RemoveBgClient::new(config).unwrap();

    client.remove_background(payload()).await.unwrap();
    let request = received(&rx);
    assert!(request.header("X-Api-Key").is_none());
}

#[tokio::test]
async fn test_unreachable_endpoint_is_transport_error() {
    let port = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };
    let config = RemoteConfig::builder()
        .endpoint(format!("http://127.0.0.1:{}/removebg", port))
        .timeout_secs(5)
        .build()
        .unwrap();
    let client = RemoveBgClient::new(config).unwrap();

    let err = client.remove_background(payload()).await.unwrap_err();
    assert!(matches!(
        err,
        BgRemovalError::RemoteService(RemoteServiceError::Transport(_))
    ));
}

#[tokio::test]
async fn test_controller_against_rejecting_server() {
    let (endpoint, _rx) = start_test_server(402, b"insufficient credits");
    let dir = TempDir::new().unwrap();
    let config = RemoteConfig::builder()
        .endpoint(endpoint)
        .api_key("k")
        .download_dir(dir.path())
        .build()
        .unwrap();
    let notifier = RecordingNotifier::new();
    let widget = WidgetController::new(RemoveBgClient::new(config.clone()).unwrap(), config)
        .with_notifier(notifier.clone());

    widget.select_file(SourceImage::new(b"bytes".to_vec(), "a.png"));
    assert_eq!(widget.trigger_processing().await, ProcessingOutcome::Failed);
    assert_eq!(widget.status(), ProcessingStatus::Failed);
    assert_eq!(notifier.count(), 1);
    assert!(widget.download_result().unwrap().is_none());
}

#[tokio::test]
async fn test_remove_background_from_file_saves_result() {
    let (endpoint, _rx) = start_test_server(200, RESULT_BODY);
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("portrait.jpg");
    std::fs::write(&input, b"jpeg bytes").unwrap();

    let config = RemoteConfig::builder()
        .endpoint(endpoint)
        .api_key("k")
        .download_dir(dir.path().join("out"))
        .build()
        .unwrap();

    let saved = remove_background_from_file(&input, config).await.unwrap();
    assert_eq!(saved, dir.path().join("out").join("removed-background.png"));
    assert_eq!(std::fs::read(saved).unwrap(), RESULT_BODY);
}

#[tokio::test]
async fn test_remove_background_from_file_keeps_remote_error_kind() {
    let (endpoint, _rx) = start_test_server(403, b"forbidden");
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("portrait.jpg");
    std::fs::write(&input, b"jpeg bytes").unwrap();

    let config = RemoteConfig::builder()
        .endpoint(endpoint)
        .api_key("wrong")
        .download_dir(dir.path().join("out"))
        .build()
        .unwrap();

    let err = remove_background_from_file(&input, config).await.unwrap_err();
    assert!(matches!(
        err,
        BgRemovalError::RemoteService(RemoteServiceError::Status { status: 403 })
    ));
    assert!(!dir.path().join("out").exists());
}
