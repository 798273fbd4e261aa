use actix_files::NamedFile;
use actix_web::{get, put, web, HttpRequest, HttpResponse};
use sqlx::MySqlPool;

use crate::core::jwt_auth::JwtMiddleware;
use crate::core::{AppError, AppSuccessResponse, BookStorage};
use crate::db::videos;
use crate::models::courses::SourceType;
use crate::models::videos::{CompletionRequest, CompletionResult};

#[tracing::instrument(name = "Set video completion", skip(pool, auth, request), fields(user_id = auth.user_id))]
#[put("/{video_id}/completion")]
pub async fn set_video_completion(
    pool: web::Data<MySqlPool>,
    auth: JwtMiddleware,
    video_id: web::Path<i32>,
    request: web::Json<CompletionRequest>,
) -> Result<HttpResponse, AppError> {
    let video = videos::fetch_owned_video(&pool, video_id.into_inner(), auth.user_id).await?;

    let (completed_videos, total_videos) =
        videos::set_completion(&pool, &video, request.completed).await?;

    Ok(HttpResponse::Ok().json(AppSuccessResponse::new(
        CompletionResult {
            video_id: video.id,
            is_completed: request.completed,
            completed_videos,
            total_videos,
        },
        "Video progress updated successfully",
    )))
}

#[tracing::instrument(name = "Stream local video", skip(pool, storage, auth, req), fields(user_id = auth.user_id))]
#[get("/{video_id}/stream")]
pub async fn stream_video(
    req: HttpRequest,
    pool: web::Data<MySqlPool>,
    storage: web::Data<BookStorage>,
    auth: JwtMiddleware,
    video_id: web::Path<i32>,
) -> Result<HttpResponse, AppError> {
    let video = videos::fetch_owned_video(&pool, video_id.into_inner(), auth.user_id).await?;

    if SourceType::try_from(video.source_type.as_str())? != SourceType::Local {
        return Err(AppError::validation_error(
            "Only videos from local courses can be streamed",
        ));
    }

    // Roots may have changed since the course was created.
    let path = storage.resolve_local_media(&video.video_url)?;

    let metadata = tokio::fs::metadata(&path)
        .await
        .map_err(|_| AppError::not_found("Video file not found"))?;
    if metadata.is_dir() {
        return Err(AppError::validation_error("Path is a directory, not a video file"));
    }

    let file = NamedFile::open_async(&path).await.map_err(|e| {
        tracing::error!("Failed to open video {}: {}", path.display(), e);
        AppError::not_found("Video file not found")
    })?;

    Ok(file.into_response(&req))
}
