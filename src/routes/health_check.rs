use actix_web::{get, web, HttpResponse};
use serde_json::json;
use sqlx::MySqlPool;

#[tracing::instrument(name = "Health check", skip(pool))]
#[get("/health_check")]
pub async fn health_check(pool: web::Data<MySqlPool>) -> HttpResponse {
    match sqlx::query("SELECT 1").execute(pool.get_ref()).await {
        Ok(_) => HttpResponse::Ok().json(json!({ "status": "success" })),
        Err(e) => {
            tracing::error!("Database ping failed: {}", e);
            HttpResponse::ServiceUnavailable().json(json!({
                "status": "error",
                "message": e.to_string(),
            }))
        }
    }
}
