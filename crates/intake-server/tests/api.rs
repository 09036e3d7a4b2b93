//! End-to-end API tests over the in-memory stores.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

use intake_core::bank::default_bank;
use intake_core::model::ResponseKind;
use intake_report::HtmlRenderer;
use intake_server::auth::{TokenVerifier, PERM_MANAGE_STUDENTS};
use intake_server::build_router;
use intake_server::state::AppState;
use intake_stores::mock::{MemoryDocumentStore, MemoryRecordStore};

const SECRET: &str = "api-test-secret";

fn test_app() -> (Router, Arc<MemoryRecordStore>) {
    let records = Arc::new(MemoryRecordStore::new());
    let state = AppState::new(
        records.clone(),
        Arc::new(MemoryDocumentStore::new()),
        Arc::new(HtmlRenderer::new("Harbour Vocational College")),
        default_bank(),
        TokenVerifier::new(SECRET),
        "Harbour Vocational College",
    );
    (build_router(state), records)
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

fn post_json(uri: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn start_body(email: &str) -> Value {
    json!({
        "first_name": "Avery",
        "last_name": "Lee",
        "email": email,
        "date_of_birth": "1995-01-01",
    })
}

/// Responses crediting every question in the default bank.
fn perfect_responses() -> Value {
    let bank = default_bank();
    let mut map = serde_json::Map::new();
    for question in bank.questions() {
        let answer: Value = match &question.kind {
            ResponseKind::Text { expected } => {
                json!(expected.clone().unwrap_or_else(|| "A written answer.".into()))
            }
            ResponseKind::Number { expected } => {
                json!(expected.clone().unwrap_or_else(|| "1".into()))
            }
            ResponseKind::Email => json!("a@x.com"),
            ResponseKind::SingleChoice { options, expected } => {
                json!(expected.clone().unwrap_or_else(|| options[0].clone()))
            }
            ResponseKind::MultiChoice { options } => json!([options[0].clone()]),
        };
        map.insert(question.id.clone(), answer);
    }
    Value::Object(map)
}

/// Required questions answered, every expected answer wrong: 11/22 = 50%.
fn failing_responses() -> Value {
    let bank = default_bank();
    let mut map = serde_json::Map::new();
    for question in bank.questions() {
        map.insert(question.id.clone(), json!("zzz"));
    }
    Value::Object(map)
}

async fn start_session(app: &Router, email: &str) -> String {
    let (status, body) = send(app, post_json("/api/enrollment/start", &start_body(email))).await;
    assert_eq!(status, StatusCode::OK, "start failed: {body}");
    body["session_id"].as_str().unwrap().to_string()
}

fn multipart_body() -> (String, String) {
    let boundary = "XINTAKEBOUNDARY".to_string();
    let body = format!(
        "--{boundary}\r\n\
         Content-Disposition: form-data; name=\"identification\"; filename=\"photo-id.jpg\"\r\n\
         Content-Type: image/jpeg\r\n\r\n\
         not-really-a-jpeg\r\n\
         --{boundary}--\r\n"
    );
    (boundary, body)
}

async fn upload_documents(app: &Router, session: &str) -> (StatusCode, Value) {
    let (boundary, body) = multipart_body();
    let request = Request::builder()
        .method("POST")
        .uri(format!("/api/enrollment/{session}/documents"))
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={boundary}"),
        )
        .body(Body::from(body))
        .unwrap();
    send(app, request).await
}

fn personal_details_body() -> Value {
    json!({
        "personal_details": {
            "street_address": "1 Trade St",
            "suburb": "Geelong",
            "state": "VIC",
            "postcode": "3220",
            "phone": "0400 000 000",
            "emergency_contact_name": "Jordan Lee",
            "emergency_contact_phone": "0400 111 111",
        },
        "course_details": {
            "course_code": "CHC33021",
            "course_name": "Certificate III in Individual Support",
            "delivery_mode": "on-campus",
        },
    })
}

fn declaration_body() -> Value {
    json!({
        "privacy_consent": true,
        "information_accurate": true,
        "fees_acknowledged": true,
        "signature_name": "Avery Lee",
    })
}

#[tokio::test]
async fn happy_path_reaches_enrollment_complete() {
    let (app, _records) = test_app();
    let session = start_session(&app, "a@x.com").await;

    let (status, body) = send(&app, get(&format!("/api/enrollment/{session}/questions"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["questions"].as_array().unwrap().len(), 22);
    // Expected answers are never served to the student.
    assert!(!body.to_string().contains("expected"));

    let (status, body) = send(
        &app,
        post_json(
            &format!("/api/enrollment/{session}/assessment"),
            &json!({ "responses": perfect_responses() }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "assessment failed: {body}");
    assert_eq!(body["score"]["overall"], 100);
    assert_eq!(body["score"]["eligible"], true);
    assert_eq!(body["next"], "lln-results");
    assert_eq!(body["attempt_number"], 1);

    let (status, body) = send(
        &app,
        post_json(
            &format!("/api/enrollment/{session}/personal-details"),
            &personal_details_body(),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "personal details failed: {body}");
    assert_eq!(body["stage"], "personal-details-complete");

    let (status, _) = send(
        &app,
        post_json(
            &format!("/api/enrollment/{session}/declaration"),
            &declaration_body(),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = upload_documents(&app, &session).await;
    assert_eq!(status, StatusCode::OK, "upload failed: {body}");
    assert_eq!(body["stage"], "documents-collected");

    let (status, body) = send(
        &app,
        post_json(&format!("/api/enrollment/{session}/complete"), &json!({})),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "complete failed: {body}");
    assert_eq!(body["stage"], "enrollment-complete");
    assert!(body["report_url"].is_string());
    assert!(body["forms_url"].is_string());

    // Terminal: re-entry redisplays the summary.
    let (status, body) = send(
        &app,
        post_json(&format!("/api/enrollment/{session}/complete"), &json!({})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["stage"], "enrollment-complete");
}

#[tokio::test]
async fn documents_before_declaration_redirects_backward() {
    let (app, _records) = test_app();
    let session = start_session(&app, "a@x.com").await;

    send(
        &app,
        post_json(
            &format!("/api/enrollment/{session}/assessment"),
            &json!({ "responses": perfect_responses() }),
        ),
    )
    .await;
    send(
        &app,
        post_json(
            &format!("/api/enrollment/{session}/personal-details"),
            &personal_details_body(),
        ),
    )
    .await;

    let (status, body) = upload_documents(&app, &session).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "stale-state");
    assert_eq!(body["redirect_to"], "personal-details-complete");
}

#[tokio::test]
async fn ineligible_branch_blocks_personal_details_until_retake() {
    let (app, _records) = test_app();
    let session = start_session(&app, "a@x.com").await;

    let (status, body) = send(
        &app,
        post_json(
            &format!("/api/enrollment/{session}/assessment"),
            &json!({ "responses": failing_responses() }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["score"]["eligible"], false);
    assert_eq!(body["next"], "not-eligible");

    let (status, body) = send(
        &app,
        post_json(
            &format!("/api/enrollment/{session}/personal-details"),
            &personal_details_body(),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["redirect_to"], "not-eligible");

    let (status, body) = send(
        &app,
        post_json(&format!("/api/enrollment/{session}/retake"), &json!({})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["next"], "lln-in-progress");
    assert_eq!(body["attempts_remaining"], 2);
}

#[tokio::test]
async fn third_attempt_blocks_the_identity() {
    let (app, _records) = test_app();
    let session = start_session(&app, "a@x.com").await;

    for attempt in 1..=3 {
        let (status, body) = send(
            &app,
            post_json(
                &format!("/api/enrollment/{session}/assessment"),
                &json!({ "responses": failing_responses() }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["attempt_number"], attempt);

        if attempt < 3 {
            let (status, _) = send(
                &app,
                post_json(&format!("/api/enrollment/{session}/retake"), &json!({})),
            )
            .await;
            assert_eq!(status, StatusCode::OK);
        }
    }

    // The fourth attempt is refused before scoring.
    let (status, body) = send(
        &app,
        post_json(
            &format!("/api/enrollment/{session}/assessment"),
            &json!({ "responses": failing_responses() }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "attempt-limit-exceeded");

    // So is a fresh registration for the same identity.
    let (status, body) = send(&app, post_json("/api/enrollment/start", &start_body("a@x.com"))).await;
    assert_eq!(status, StatusCode::FORBIDDEN, "expected refusal: {body}");
}

#[tokio::test]
async fn missing_required_answers_are_rejected_without_consuming_an_attempt() {
    let (app, _records) = test_app();
    let session = start_session(&app, "a@x.com").await;

    let (status, body) = send(
        &app,
        post_json(
            &format!("/api/enrollment/{session}/assessment"),
            &json!({ "responses": {} }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"], "validation");

    // The failed validation did not consume an attempt.
    let (status, body) = send(
        &app,
        post_json(
            &format!("/api/enrollment/{session}/assessment"),
            &json!({ "responses": perfect_responses() }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["attempt_number"], 1);
}

#[tokio::test]
async fn store_outage_fails_closed() {
    let (app, records) = test_app();
    records.set_offline(true);

    let (status, body) = send(&app, post_json("/api/enrollment/start", &start_body("a@x.com"))).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["error"], "service-unavailable");
    // The retry-later message never leaks store internals.
    assert!(!body["message"].as_str().unwrap().contains("offline"));
}

#[tokio::test]
async fn unknown_session_is_not_found() {
    let (app, _records) = test_app();
    let (status, _) = send(
        &app,
        get(&format!("/api/enrollment/{}/questions", uuid::Uuid::new_v4())),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

// ---------------------------------------------------------------------------
// Admin surface
// ---------------------------------------------------------------------------

fn admin_token(permissions: &[&str]) -> String {
    TokenVerifier::new(SECRET)
        .issue(
            "admin",
            &permissions.iter().map(|p| p.to_string()).collect::<Vec<_>>(),
            chrono::Duration::hours(1),
        )
        .unwrap()
}

fn get_with_token(uri: &str, token: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap()
}

#[tokio::test]
async fn admin_requires_a_valid_token() {
    let (app, _records) = test_app();

    let (status, _) = send(&app, get("/api/admin/students")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(&app, get_with_token("/api/admin/students", "garbage")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = send(
        &app,
        get_with_token("/api/admin/students", &admin_token(&[])),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([]));
}

#[tokio::test]
async fn reset_requires_the_manage_permission() {
    let (app, _records) = test_app();
    let session = start_session(&app, "a@x.com").await;
    let (_, status_body) = send(&app, get(&format!("/api/enrollment/{session}"))).await;
    let student_id = status_body["student_id"].as_str().unwrap().to_string();

    // Exhaust the attempts.
    for _ in 0..3 {
        send(
            &app,
            post_json(
                &format!("/api/enrollment/{session}/assessment"),
                &json!({ "responses": failing_responses() }),
            ),
        )
        .await;
        send(
            &app,
            post_json(&format!("/api/enrollment/{session}/retake"), &json!({})),
        )
        .await;
    }

    let uri = format!("/api/admin/students/{student_id}/reset-attempts");

    let viewer = admin_token(&[]);
    let request = Request::builder()
        .method("POST")
        .uri(&uri)
        .header(header::AUTHORIZATION, format!("Bearer {viewer}"))
        .body(Body::empty())
        .unwrap();
    let (status, _) = send(&app, request).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let manager = admin_token(&[PERM_MANAGE_STUDENTS]);
    let request = Request::builder()
        .method("POST")
        .uri(&uri)
        .header(header::AUTHORIZATION, format!("Bearer {manager}"))
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["attempt_count"], 0);

    // The identity can register again after the reset.
    let (status, _) = send(&app, post_json("/api/enrollment/start", &start_body("a@x.com"))).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn admin_sees_attempt_counts() {
    let (app, _records) = test_app();
    let session = start_session(&app, "a@x.com").await;
    send(
        &app,
        post_json(
            &format!("/api/enrollment/{session}/assessment"),
            &json!({ "responses": perfect_responses() }),
        ),
    )
    .await;

    let (status, body) = send(
        &app,
        get_with_token("/api/admin/students", &admin_token(&[])),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let students = body.as_array().unwrap();
    assert_eq!(students.len(), 1);
    assert_eq!(students[0]["attempt_count"], 1);
    assert_eq!(students[0]["attempts_remaining"], 2);
    assert_eq!(students[0]["is_blocked"], false);
}
