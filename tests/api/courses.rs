use actix_web::http::StatusCode;
use actix_web::test;
use serde_json::{json, Value};

use crate::helpers::{error_message, TestApp};

async fn create_course(body: Value) -> (StatusCode, String) {
    let test_app = TestApp::new();
    let app = test::init_service(test_app.app()).await;

    let req = test::TestRequest::post()
        .uri("/api/v1/courses")
        .insert_header(("Authorization", test_app.bearer_for(7)))
        .set_json(body)
        .to_request();
    let resp = test::call_service(&app, req).await;

    let status = resp.status();
    let body: Value = test::read_body_json(resp).await;
    (status, error_message(&body).to_string())
}

#[actix_web::test]
async fn unknown_source_types_are_rejected() {
    let (status, message) = create_course(json!({
        "title": "Rust",
        "source_type": "ftp",
        "source_path_or_link": "ftp://videos"
    }))
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(message.contains("not a supported source type"));
}

#[actix_web::test]
async fn drive_courses_need_a_drive_link() {
    let (status, message) = create_course(json!({
        "title": "Rust",
        "source_type": "google-drive",
        "source_path_or_link": "https://example.com/videos"
    }))
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(message, "Invalid Google Drive link format");
}

#[actix_web::test]
async fn browser_folder_picker_values_are_rejected() {
    let (status, message) = create_course(json!({
        "title": "Rust",
        "source_type": "local",
        "source_path_or_link": "[Selected Folder: lectures]"
    }))
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(message.starts_with("Folder picker cannot be used"));
}

#[actix_web::test]
async fn local_folders_outside_media_roots_are_forbidden() {
    let (status, message) = create_course(json!({
        "title": "Rust",
        "source_type": "local",
        "source_path_or_link": "/etc"
    }))
    .await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(message, "Local path is not within allowed media roots");
}

#[actix_web::test]
async fn course_titles_are_required() {
    let (status, message) = create_course(json!({
        "title": "",
        "source_type": "local",
        "source_path_or_link": "./lectures"
    }))
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(message, "All fields are required");
}

#[actix_web::test]
async fn overlong_titles_are_rejected() {
    let (status, message) = create_course(json!({
        "title": "R".repeat(300),
        "source_type": "local",
        "source_path_or_link": "/srv/videos/rust"
    }))
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(message, "Course title must be at most 255 characters");
}
