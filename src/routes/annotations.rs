use actix_web::{delete, get, post, put, web, HttpResponse};
use sqlx::MySqlPool;
use validator::Validate;

use crate::core::jwt_auth::JwtMiddleware;
use crate::core::{AppError, AppSuccessResponse};
use crate::db::{annotations, books, videos};
use crate::models::annotations::{
    parse_color, AnnotationTarget, CreateBookAnnotationRequest, CreateVideoAnnotationRequest,
    NewAnnotation, UpdateExplanationRequest, BOOK_HIGHLIGHT_COLOR, VIDEO_NOTE_COLOR,
};

#[tracing::instrument(name = "Create book annotation", skip(pool, auth, request), fields(user_id = auth.user_id))]
#[post("/{book_id}/annotations")]
pub async fn create_book_annotation(
    pool: web::Data<MySqlPool>,
    auth: JwtMiddleware,
    book_id: web::Path<i32>,
    request: web::Json<CreateBookAnnotationRequest>,
) -> Result<HttpResponse, AppError> {
    request.validate()?;
    let book = books::fetch_owned_book(&pool, book_id.into_inner(), auth.user_id).await?;

    let selected_text = request.selected_text.trim();
    if selected_text.is_empty() {
        return Err(AppError::validation_error("Selected text is required"));
    }

    let annotation = annotations::insert_annotation(
        &pool,
        &NewAnnotation {
            user_id: auth.user_id,
            target: AnnotationTarget::Book {
                book_id: book.id,
                page_number: request.page_number,
            },
            selected_text: selected_text.to_string(),
            color: parse_color(request.color.as_deref(), BOOK_HIGHLIGHT_COLOR)?,
        },
    )
    .await?;

    Ok(HttpResponse::Created().json(AppSuccessResponse::new(
        annotation,
        "Annotation saved successfully",
    )))
}

#[tracing::instrument(name = "List book annotations", skip(pool, auth), fields(user_id = auth.user_id))]
#[get("/{book_id}/annotations")]
pub async fn get_book_annotations(
    pool: web::Data<MySqlPool>,
    auth: JwtMiddleware,
    book_id: web::Path<i32>,
) -> Result<HttpResponse, AppError> {
    let book = books::fetch_owned_book(&pool, book_id.into_inner(), auth.user_id).await?;
    let data = annotations::fetch_book_annotations(&pool, book.id, auth.user_id).await?;

    Ok(HttpResponse::Ok().json(AppSuccessResponse::new(
        data,
        "Annotations retrieved successfully",
    )))
}

#[tracing::instrument(name = "Create video note", skip(pool, auth, request), fields(user_id = auth.user_id))]
#[post("/{video_id}/annotations")]
pub async fn create_video_annotation(
    pool: web::Data<MySqlPool>,
    auth: JwtMiddleware,
    video_id: web::Path<i32>,
    request: web::Json<CreateVideoAnnotationRequest>,
) -> Result<HttpResponse, AppError> {
    request.validate()?;
    let video = videos::fetch_owned_video(&pool, video_id.into_inner(), auth.user_id).await?;

    let text = request.text.trim();
    if text.is_empty() {
        return Err(AppError::validation_error("Note text is required"));
    }

    let annotation = annotations::insert_annotation(
        &pool,
        &NewAnnotation {
            user_id: auth.user_id,
            target: AnnotationTarget::Video {
                video_id: video.id,
                timestamp_seconds: request.timestamp,
            },
            selected_text: text.to_string(),
            color: parse_color(request.color.as_deref(), VIDEO_NOTE_COLOR)?,
        },
    )
    .await?;

    Ok(HttpResponse::Created().json(AppSuccessResponse::new(
        annotation,
        "Note saved successfully",
    )))
}

#[tracing::instrument(name = "List video notes", skip(pool, auth), fields(user_id = auth.user_id))]
#[get("/{video_id}/annotations")]
pub async fn get_video_annotations(
    pool: web::Data<MySqlPool>,
    auth: JwtMiddleware,
    video_id: web::Path<i32>,
) -> Result<HttpResponse, AppError> {
    let video = videos::fetch_owned_video(&pool, video_id.into_inner(), auth.user_id).await?;
    let data = annotations::fetch_video_annotations(&pool, video.id, auth.user_id).await?;

    Ok(HttpResponse::Ok().json(AppSuccessResponse::new(data, "Notes retrieved successfully")))
}

#[tracing::instrument(name = "Delete annotation", skip(pool, auth), fields(user_id = auth.user_id))]
#[delete("/{annotation_id}")]
pub async fn delete_annotation(
    pool: web::Data<MySqlPool>,
    auth: JwtMiddleware,
    annotation_id: web::Path<i32>,
) -> Result<HttpResponse, AppError> {
    let annotation_id = annotation_id.into_inner();
    annotations::delete_annotation(&pool, annotation_id, auth.user_id).await?;

    Ok(HttpResponse::Ok().json(AppSuccessResponse::new(
        serde_json::json!({ "id": annotation_id }),
        "Annotation deleted successfully",
    )))
}

#[tracing::instrument(name = "Save annotation explanation", skip(pool, auth, request), fields(user_id = auth.user_id))]
#[put("/{annotation_id}/explanation")]
pub async fn save_explanation(
    pool: web::Data<MySqlPool>,
    auth: JwtMiddleware,
    annotation_id: web::Path<i32>,
    request: web::Json<UpdateExplanationRequest>,
) -> Result<HttpResponse, AppError> {
    request.validate()?;

    let annotation = annotations::save_explanation(
        &pool,
        annotation_id.into_inner(),
        auth.user_id,
        &request.explanation,
    )
    .await?;

    Ok(HttpResponse::Ok().json(AppSuccessResponse::new(
        annotation,
        "Explanation saved successfully",
    )))
}
