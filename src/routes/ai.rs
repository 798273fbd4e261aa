use std::time::Duration;

use actix_web::{post, web, HttpResponse};
use serde::{Deserialize, Serialize};
use sqlx::MySqlPool;
use validator::Validate;

use crate::core::ai_service::explain_prompt;
use crate::core::jwt_auth::JwtMiddleware;
use crate::core::utils::cache_key;
use crate::core::{AppError, AppSuccessResponse, GeminiClient, RedisHelper};
use crate::db::annotations;

const EXPLANATION_TTL: Duration = Duration::from_secs(24 * 60 * 60);

#[derive(Validate, Debug, Default, Deserialize)]
#[serde(default)]
pub struct ExplainRequest {
    #[validate(length(min = 1, message = "Text is required"))]
    pub text: String,
    pub annotation_id: Option<i32>,
}

#[derive(Debug, Serialize)]
pub struct Explanation {
    pub explanation: String,
    pub cached: bool,
    pub annotation_id: Option<i32>,
}

#[tracing::instrument(name = "Explain text", skip(pool, gemini, cache, auth, request), fields(user_id = auth.user_id))]
#[post("/explain")]
pub async fn explain_text(
    pool: web::Data<MySqlPool>,
    gemini: web::Data<GeminiClient>,
    cache: web::Data<RedisHelper>,
    auth: JwtMiddleware,
    request: web::Json<ExplainRequest>,
) -> Result<HttpResponse, AppError> {
    request.validate()?;
    let text = request.text.trim();
    if text.is_empty() {
        return Err(AppError::validation_error("Text is required"));
    }

    // Ownership is checked before spending a model call.
    if let Some(annotation_id) = request.annotation_id {
        annotations::fetch_owned_annotation(&pool, annotation_id, auth.user_id).await?;
    }

    let key = cache_key("ai_explain", text);
    let (explanation, cached) = match cache.get_or_miss::<String>(&key).await {
        Some(hit) => (hit, true),
        None => {
            let fresh = gemini.generate(&explain_prompt(text)).await?;
            cache.set_or_log(&key, &fresh, EXPLANATION_TTL).await;
            (fresh, false)
        }
    };

    if let Some(annotation_id) = request.annotation_id {
        annotations::save_explanation(&pool, annotation_id, auth.user_id, &explanation).await?;
    }

    Ok(HttpResponse::Ok().json(AppSuccessResponse::new(
        Explanation {
            explanation,
            cached,
            annotation_id: request.annotation_id,
        },
        "Explanation generated successfully",
    )))
}
