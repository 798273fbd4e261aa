use actix_web::cookie::Cookie;
use actix_web::http::StatusCode;
use actix_web::test;
use serde_json::{json, Value};

use crate::helpers::{error_message, TestApp};
use study_hub::core::jwt_auth::{generate_jwt_token, JwtClaims, AUTH_COOKIE};

#[actix_web::test]
async fn protected_routes_reject_anonymous_callers() {
    let test_app = TestApp::new();
    let app = test::init_service(test_app.app()).await;

    for uri in [
        "/api/v1/auth/me",
        "/api/v1/books",
        "/api/v1/books/stats",
        "/api/v1/books/1/annotations",
        "/api/v1/books/1/messages",
        "/api/v1/courses",
        "/api/v1/courses/1",
        "/api/v1/videos/1/annotations",
        "/api/v1/videos/1/stream",
    ] {
        let req = test::TestRequest::get().uri(uri).to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED, "GET {}", uri);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(error_message(&body), "Unauthorized: No token found");
    }
}

#[actix_web::test]
async fn tokens_signed_with_another_secret_are_rejected() {
    let test_app = TestApp::new();
    let app = test::init_service(test_app.app()).await;

    let claims = JwtClaims::for_user(1, "ada@example.com", "Ada", 1);
    let forged = generate_jwt_token(&claims, "not-the-server-secret").expect("signs");

    let req = test::TestRequest::get()
        .uri("/api/v1/books")
        .cookie(Cookie::new(AUTH_COOKIE, forged))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(
        error_message(&body),
        "Unauthorized: Token verification failed"
    );
}

#[actix_web::test]
async fn explain_requires_non_blank_text() {
    let test_app = TestApp::new();
    let app = test::init_service(test_app.app()).await;

    let req = test::TestRequest::post()
        .uri("/api/v1/ai/explain")
        .insert_header(("Authorization", test_app.bearer_for(1)))
        .set_json(json!({ "text": "   " }))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(error_message(&body), "Text is required");
}

#[actix_web::test]
async fn mutating_routes_reject_anonymous_callers() {
    let test_app = TestApp::new();
    let app = test::init_service(test_app.app()).await;

    let requests = vec![
        test::TestRequest::post()
            .uri("/api/v1/ai/explain")
            .set_json(json!({ "text": "entropy" })),
        test::TestRequest::post()
            .uri("/api/v1/courses")
            .set_json(json!({ "title": "Rust" })),
        test::TestRequest::put()
            .uri("/api/v1/videos/1/completion")
            .set_json(json!({ "completed": true })),
        test::TestRequest::delete().uri("/api/v1/annotations/1"),
        test::TestRequest::delete().uri("/api/v1/books/1"),
    ];

    for req in requests {
        let resp = test::call_service(&app, req.to_request()).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }
}
