use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use course_builder::{build_router, config::Config, models::course::Category, AppState};
use serde_json::{json, Value as JsonValue};
use tower::ServiceExt;

const BOUNDARY: &str = "----course-builder-test";
const PNG: &[u8] = &[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 0];

const VALID_COURSE: &str = "\
COURSE NAME = Algebra basics
COURSE DESCRIPTION = A short first course in algebra
MAX MARKS = 4
CATEGORY = Mathematics
DIFFICULTY LEVELS = easy

DIFFICULTY SETTINGS:
easy:
  marks per question = 2
  max questions = 2
  min time = 10
  max time = 60

QUESTIONS:
[EASY]
Q: What is two plus two?
TYPE: single
ANSWER: 4
EXPLANATION: Basic arithmetic fact
Q: Which of these numbers is prime?
OPTIONS: 4, 6, 7, 9
CORRECT: 2
EXPLANATION: Seven has no divisors but one and itself
";

fn test_app(uploads: &std::path::Path) -> Router {
    let config = Config {
        server_address: "127.0.0.1:0".into(),
        public_rps: 1000,
        course_api_url: None,
        course_api_token: None,
        uploads_dir: uploads.to_string_lossy().into_owned(),
        max_import_bytes: 64 * 1024,
        session_ttl_minutes: 120,
        categories: vec![Category {
            id: "math".into(),
            name: "Mathematics".into(),
        }],
        cors_allowed_origins: Vec::new(),
    };
    let state = AppState::new(&config).expect("state");
    build_router(state, &config)
}

async fn send(app: &Router, req: Request<Body>) -> (StatusCode, JsonValue) {
    let res = app.clone().oneshot(req).await.expect("response");
    let status = res.status();
    let body = to_bytes(res.into_body(), usize::MAX).await.expect("body");
    let json = if body.is_empty() {
        JsonValue::Null
    } else {
        serde_json::from_slice(&body).expect("json body")
    };
    (status, json)
}

fn json_req(method: &str, uri: &str, body: JsonValue) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn empty_req(method: &str, uri: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

fn multipart_req(uri: &str, field: &str, file_name: &str, content_type: &str, data: &[u8]) -> Request<Body> {
    let mut body = Vec::new();
    body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
    body.extend_from_slice(
        format!(
            "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n",
            field, file_name
        )
        .as_bytes(),
    );
    body.extend_from_slice(format!("Content-Type: {}\r\n\r\n", content_type).as_bytes());
    body.extend_from_slice(data);
    body.extend_from_slice(format!("\r\n--{}--\r\n", BOUNDARY).as_bytes());

    Request::builder()
        .method("POST")
        .uri(uri)
        .header(
            "content-type",
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(body))
        .unwrap()
}

async fn new_session(app: &Router) -> String {
    let (status, body) = send(app, empty_req("POST", "/api/wizard/sessions")).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["step_number"], 1);
    body["id"].as_str().unwrap().to_string()
}

async fn attach_thumbnail(app: &Router, id: &str) {
    let (status, body) = send(
        app,
        multipart_req(
            &format!("/api/wizard/sessions/{}/thumbnail", id),
            "thumbnail",
            "cover.png",
            "image/png",
            PNG,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "thumbnail upload failed: {}", body);
    assert_eq!(body["draft"]["thumbnail"]["content_type"], "image/png");
}

#[tokio::test]
async fn next_reports_step_errors_and_keeps_them_on_the_session() {
    let dir = tempfile::tempdir().unwrap();
    let app = test_app(dir.path());
    let id = new_session(&app).await;

    let (status, body) = send(&app, empty_req("POST", &format!("/api/wizard/sessions/{}/next", id))).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["step"], "basic_info");
    assert_eq!(body["errors"]["max_marks"], "Max marks is required");
    assert!(body["errors"]["thumbnail"].is_string());

    let (status, body) = send(&app, empty_req("GET", &format!("/api/wizard/sessions/{}", id))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["step_number"], 1);
    assert!(body["errors"]["title"].is_string());
}

#[tokio::test]
async fn free_course_walks_the_wizard_and_skips_video() {
    let dir = tempfile::tempdir().unwrap();
    let app = test_app(dir.path());
    let id = new_session(&app).await;
    let base = format!("/api/wizard/sessions/{}", id);

    attach_thumbnail(&app, &id).await;
    let (status, _) = send(
        &app,
        json_req(
            "PUT",
            &format!("{}/basic-info", base),
            json!({
                "title": "Algebra basics",
                "description": "A short first course in algebra",
                "max_marks": 2,
                "is_paid": false
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(&app, empty_req("POST", &format!("{}/next", base))).await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["step_number"], 2);

    let (status, body) = send(&app, empty_req("POST", &format!("{}/difficulties/easy/toggle", base))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["selected"], true);

    let (status, _) = send(&app, empty_req("POST", &format!("{}/next", base))).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(
        &app,
        json_req(
            "PUT",
            &format!("{}/difficulties/easy/settings", base),
            json!({
                "marks_per_question": 2,
                "max_questions": 1,
                "min_time_seconds": 10,
                "max_time_seconds": 60
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(&app, empty_req("POST", &format!("{}/next", base))).await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["step_number"], 4);
    assert_eq!(body["editing_difficulty"], "easy");

    let (status, body) = send(
        &app,
        json_req(
            "POST",
            &format!("{}/difficulties/easy/questions", base),
            json!({
                "type": "truefalse",
                "question": "Is zero an even number?",
                "explanation": "Zero is divisible by two",
                "correct_answer": 0
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    assert_eq!(body["session"]["summary"]["question_count"], 1);

    let (status, body) = send(&app, empty_req("POST", &format!("{}/next", base))).await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["step_number"], 6);

    let (status, body) = send(&app, empty_req("POST", &format!("{}/prev", base))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["step_number"], 4);
}

#[tokio::test]
async fn unknown_difficulty_is_a_bad_request() {
    let dir = tempfile::tempdir().unwrap();
    let app = test_app(dir.path());
    let id = new_session(&app).await;

    let (status, body) = send(
        &app,
        empty_req("POST", &format!("/api/wizard/sessions/{}/difficulties/expert/toggle", id)),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("expert"));
}

#[tokio::test]
async fn import_requires_a_thumbnail_first() {
    let dir = tempfile::tempdir().unwrap();
    let app = test_app(dir.path());
    let id = new_session(&app).await;

    let (status, body) = send(
        &app,
        multipart_req(
            &format!("/api/wizard/sessions/{}/import", id),
            "file",
            "course.txt",
            "text/plain",
            VALID_COURSE.as_bytes(),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("thumbnail"));
}

#[tokio::test]
async fn import_rejects_non_text_files() {
    let dir = tempfile::tempdir().unwrap();
    let app = test_app(dir.path());
    let id = new_session(&app).await;
    attach_thumbnail(&app, &id).await;

    let (status, _) = send(
        &app,
        multipart_req(
            &format!("/api/wizard/sessions/{}/import", id),
            "file",
            "course.pdf",
            "application/pdf",
            b"%PDF-1.4",
        ),
    )
    .await;
    assert_eq!(status, StatusCode::UNSUPPORTED_MEDIA_TYPE);
}

#[tokio::test]
async fn valid_import_routes_to_preview_and_submit_needs_an_api() {
    let dir = tempfile::tempdir().unwrap();
    let app = test_app(dir.path());
    let id = new_session(&app).await;
    attach_thumbnail(&app, &id).await;

    let (status, body) = send(
        &app,
        multipart_req(
            &format!("/api/wizard/sessions/{}/import", id),
            "file",
            "course.txt",
            "text/plain",
            VALID_COURSE.as_bytes(),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["valid"], true, "{}", body["session"]["errors"]);
    assert_eq!(body["routed_to"], "preview_and_save");
    assert_eq!(body["questions_imported"], 2);
    assert_eq!(body["session"]["draft"]["category_id"], "math");
    assert!(body["session"]["draft"]["thumbnail"].is_object());

    let (status, _) = send(&app, empty_req("POST", &format!("/api/wizard/sessions/{}/submit", id))).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);

    let (_, body) = send(&app, empty_req("GET", &format!("/api/wizard/sessions/{}", id))).await;
    assert_eq!(body["submitting"], false);
    assert_eq!(body["step_number"], 6);
    assert_eq!(body["draft"]["title"], "Algebra basics");
}

#[tokio::test]
async fn failing_import_routes_to_the_first_broken_step() {
    let dir = tempfile::tempdir().unwrap();
    let app = test_app(dir.path());
    let id = new_session(&app).await;
    attach_thumbnail(&app, &id).await;

    let short = VALID_COURSE.replace("  max questions = 2", "  max questions = 5");
    let short = short.replace("MAX MARKS = 4", "MAX MARKS = 10");
    let (status, body) = send(
        &app,
        multipart_req(
            &format!("/api/wizard/sessions/{}/import", id),
            "file",
            "course.txt",
            "text/plain",
            short.as_bytes(),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["valid"], false);
    assert_eq!(body["routed_to"], "questions");
    assert_eq!(
        body["session"]["errors"]["questions.easy"],
        "Easy requires at least 5 questions (currently 2)"
    );
}

#[tokio::test]
async fn discarded_session_is_gone() {
    let dir = tempfile::tempdir().unwrap();
    let app = test_app(dir.path());
    let id = new_session(&app).await;

    let (status, _) = send(&app, empty_req("DELETE", &format!("/api/wizard/sessions/{}", id))).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = send(&app, empty_req("GET", &format!("/api/wizard/sessions/{}", id))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn categories_and_openapi_are_served() {
    let dir = tempfile::tempdir().unwrap();
    let app = test_app(dir.path());

    let (status, body) = send(&app, empty_req("GET", "/api/categories")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body[0]["id"], "math");

    let (status, body) = send(&app, empty_req("GET", "/api-docs/openapi.json")).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["paths"]["/api/wizard/sessions/{id}/import"].is_object());
}
