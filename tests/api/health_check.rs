use actix_web::http::StatusCode;
use actix_web::test;
use serde_json::Value;

use crate::helpers::TestApp;

#[actix_web::test]
async fn health_check_reports_database_status() {
    let test_app = TestApp::new();
    let app = test::init_service(test_app.app()).await;

    let req = test::TestRequest::get().uri("/api/v1/health_check").to_request();
    let resp = test::call_service(&app, req).await;

    let status = resp.status();
    let body: Value = test::read_body_json(resp).await;
    match status {
        StatusCode::OK => assert_eq!(body["status"], "success"),
        StatusCode::SERVICE_UNAVAILABLE => assert_eq!(body["status"], "error"),
        other => panic!("unexpected health check status {}", other),
    }
}
