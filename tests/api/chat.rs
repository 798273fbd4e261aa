use actix_web::http::StatusCode;
use actix_web::test;
use serde_json::{json, Value};

use crate::helpers::{error_message, TestApp};

#[actix_web::test]
async fn blank_chat_messages_are_rejected() {
    let test_app = TestApp::new();
    let app = test::init_service(test_app.app()).await;

    for uri in ["/api/v1/books/1/messages", "/api/v1/videos/1/messages"] {
        let req = test::TestRequest::post()
            .uri(uri)
            .insert_header(("Authorization", test_app.bearer_for(7)))
            .set_json(json!({ "content": " \n\t " }))
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::BAD_REQUEST, "POST {}", uri);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(error_message(&body), "Message content is required");
    }
}
