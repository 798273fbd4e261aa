use actix_web::http::StatusCode;
use actix_web::test;
use serde_json::{json, Value};

use crate::helpers::{error_message, TestApp};
use study_hub::core::jwt_auth::AUTH_COOKIE;

#[actix_web::test]
async fn signup_rejects_short_passwords() {
    let test_app = TestApp::new();
    let app = test::init_service(test_app.app()).await;

    let req = test::TestRequest::post()
        .uri("/api/v1/auth/signup")
        .set_json(json!({ "name": "Ada", "email": "ada@example.com", "password": "abc" }))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(
        error_message(&body),
        "Password must be at least 6 characters long"
    );
}

#[actix_web::test]
async fn signup_with_missing_fields_is_a_bad_request() {
    let test_app = TestApp::new();
    let app = test::init_service(test_app.app()).await;

    let req = test::TestRequest::post()
        .uri("/api/v1/auth/signup")
        .set_json(json!({ "email": "ada@example.com" }))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn malformed_json_gets_the_standard_error_body() {
    let test_app = TestApp::new();
    let app = test::init_service(test_app.app()).await;

    let req = test::TestRequest::post()
        .uri("/api/v1/auth/login")
        .insert_header(("content-type", "application/json"))
        .set_payload("{\"email\": ")
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert!(error_message(&body).starts_with("Invalid request body"));
}

#[actix_web::test]
async fn logout_clears_the_session_cookie() {
    let test_app = TestApp::new();
    let app = test::init_service(test_app.app()).await;

    let req = test::TestRequest::post()
        .uri("/api/v1/auth/logout")
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::OK);
    let cookie = resp
        .response()
        .cookies()
        .find(|c| c.name() == AUTH_COOKIE)
        .expect("logout sets the auth cookie");
    assert_eq!(cookie.value(), "");
}

#[actix_web::test]
async fn reset_password_requires_matching_passwords() {
    let test_app = TestApp::new();
    let app = test::init_service(test_app.app()).await;

    let req = test::TestRequest::post()
        .uri("/api/v1/auth/reset-password")
        .set_json(json!({
            "token": "abc",
            "password": "secret1",
            "confirm_password": "secret2"
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(error_message(&body), "Passwords do not match");
}
