//! HTTP surface driven in-process through the router.

mod common;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use common::{bright_page, png_bytes, service_with, test_config, text_pdf, ScriptedProvider};
use docrecog::server::{router, AppState};
use serde_json::Value;
use tower::ServiceExt;

const BOUNDARY: &str = "docrecog-test-boundary";

enum Part<'a> {
    Text(&'a str, &'a str),
    File(&'a str, &'a str, Vec<u8>),
}

fn multipart_body(parts: Vec<Part<'_>>) -> Vec<u8> {
    let mut body = Vec::new();
    for part in parts {
        body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
        match part {
            Part::Text(name, value) => {
                body.extend_from_slice(
                    format!("Content-Disposition: form-data; name=\"{}\"\r\n\r\n", name)
                        .as_bytes(),
                );
                body.extend_from_slice(value.as_bytes());
            }
            Part::File(filename, content_type, data) => {
                body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"file\"; filename=\"{}\"\r\n\
                         Content-Type: {}\r\n\r\n",
                        filename, content_type
                    )
                    .as_bytes(),
                );
                body.extend_from_slice(&data);
            }
        }
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
    body
}

fn ocr_request(parts: Vec<Part<'_>>) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/ocr")
        .header(
            "content-type",
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(multipart_body(parts)))
        .unwrap()
}

fn app(provider: &ScriptedProvider, max_file_size: usize) -> axum::Router {
    let (service, _store) = service_with(provider);
    router(AppState::new(service, test_config(max_file_size), "scripted"))
}

async fn json_body(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_health() {
    let app = app(&ScriptedProvider::new(Vec::new()), 1 << 20);

    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
}

#[tokio::test]
async fn test_info_lists_categories_and_backend() {
    let app = app(&ScriptedProvider::new(Vec::new()), 4096);

    let response = app
        .oneshot(Request::builder().uri("/info").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["backend"], "scripted");
    assert_eq!(body["max_file_size_bytes"], 4096);
    assert_eq!(body["categories"].as_array().unwrap().len(), 5);
    assert_eq!(body["engines"].as_array().unwrap().len(), 3);
    assert_eq!(body["tuning"]["recognition"]["early_stop_confidence"], 85.0);
}

#[tokio::test]
async fn test_missing_file_is_bad_request() {
    let app = app(&ScriptedProvider::new(Vec::new()), 1 << 20);

    let response = app
        .oneshot(ocr_request(vec![Part::Text("session_id", "s1")]))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert_eq!(body["code"], "MISSING_FILE");
}

#[tokio::test]
async fn test_oversized_file_is_rejected() {
    let app = app(&ScriptedProvider::new(Vec::new()), 1024);

    let response = app
        .oneshot(ocr_request(vec![Part::File(
            "big.png",
            "image/png",
            vec![0u8; 2048],
        )]))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    let body = json_body(response).await;
    assert_eq!(body["code"], "DOCUMENT_TOO_LARGE");
}

#[tokio::test]
async fn test_upload_then_fetch_context() {
    let provider = ScriptedProvider::constant("Meeting notes for Tuesday", 90.0);
    let (service, _store) = service_with(&provider);
    let app = router(AppState::new(service, test_config(16 << 20), "scripted"));

    let response = app
        .clone()
        .oneshot(ocr_request(vec![
            Part::Text("session_id", "chat-7"),
            Part::Text("message_id", "m-1"),
            Part::File("notes.png", "image/png", png_bytes(&bright_page())),
        ]))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["session_id"], "chat-7");
    assert_eq!(body["message_id"], "m-1");
    let results = body["results"].as_array().unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0]["filename"], "notes.png");
    assert_eq!(results[0]["recognized_text"], "Meeting notes for Tuesday");
    assert_eq!(results[0]["document_category"], "printed");

    let response = app
        .oneshot(
            Request::builder()
                .uri("/sessions/chat-7/context")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(
        body["context"],
        "[Document 1 — printed, 90% confidence]\nMeeting notes for Tuesday"
    );
}

#[tokio::test]
async fn test_multiple_files_and_category_override() {
    let provider = ScriptedProvider::constant("never", 99.0);
    let app = app(&provider, 16 << 20);

    let response = app
        .oneshot(ocr_request(vec![
            Part::Text("category", "Handwritten"),
            Part::File("a.png", "image/png", png_bytes(&bright_page())),
            Part::File("b.pdf", "application/pdf", text_pdf("Second")),
        ]))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["session_id"], "default");
    assert!(body["message_id"].as_str().unwrap().starts_with("msg-"));

    let results = body["results"].as_array().unwrap();
    assert_eq!(results.len(), 2);
    assert_eq!(results[0]["filename"], "a.png");
    assert_eq!(results[1]["filename"], "b.pdf");
    for result in results {
        assert_eq!(result["document_category"], "handwritten");
    }
    assert_eq!(provider.calls(), 0);
}
