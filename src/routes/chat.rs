use actix_web::{get, post, web, HttpResponse};
use sqlx::MySqlPool;
use validator::Validate;

use crate::core::ai_service::{book_chat_prompt, course_chat_prompt};
use crate::core::jwt_auth::JwtMiddleware;
use crate::core::{AppError, AppSuccessResponse, GeminiClient};
use crate::db::{annotations, books, messages, videos};
use crate::models::messages::{
    prompt_history, ChatExchange, ChatSubject, MessageRole, NewMessage, SendMessageRequest,
    PROMPT_HISTORY_TURNS,
};

/// Stores the user turn, asks the model and stores its answer. The user
/// turn stays saved when the model call fails.
async fn exchange(
    pool: &MySqlPool,
    gemini: &GeminiClient,
    user_id: i32,
    subject: ChatSubject,
    content: &str,
    annotation_id: Option<i32>,
    prompt: String,
) -> Result<ChatExchange, AppError> {
    let user_message = messages::insert_message(
        pool,
        &NewMessage {
            user_id,
            subject,
            role: MessageRole::User,
            content,
            annotation_id,
        },
    )
    .await?;

    let answer = gemini.generate(&prompt).await?;

    let ai_message = messages::insert_message(
        pool,
        &NewMessage {
            user_id,
            subject,
            role: MessageRole::Ai,
            content: &answer,
            annotation_id,
        },
    )
    .await?;

    Ok(ChatExchange {
        user_message,
        ai_message,
    })
}

#[tracing::instrument(name = "Book chat history", skip(pool, auth), fields(user_id = auth.user_id))]
#[get("/{book_id}/messages")]
pub async fn get_book_messages(
    pool: web::Data<MySqlPool>,
    auth: JwtMiddleware,
    book_id: web::Path<i32>,
) -> Result<HttpResponse, AppError> {
    let book = books::fetch_owned_book(&pool, book_id.into_inner(), auth.user_id).await?;
    let data = messages::fetch_messages(&pool, ChatSubject::Book(book.id), auth.user_id).await?;

    Ok(HttpResponse::Ok().json(AppSuccessResponse::new(data, "Messages retrieved successfully")))
}

#[tracing::instrument(name = "Book chat message", skip(pool, gemini, auth, request), fields(user_id = auth.user_id))]
#[post("/{book_id}/messages")]
pub async fn send_book_message(
    pool: web::Data<MySqlPool>,
    gemini: web::Data<GeminiClient>,
    auth: JwtMiddleware,
    book_id: web::Path<i32>,
    request: web::Json<SendMessageRequest>,
) -> Result<HttpResponse, AppError> {
    request.validate()?;
    let content = request.trimmed_content()?;
    let book = books::fetch_owned_book(&pool, book_id.into_inner(), auth.user_id).await?;

    let highlighted = match request.annotation_id {
        Some(annotation_id) => {
            let annotation =
                annotations::fetch_owned_annotation(&pool, annotation_id, auth.user_id).await?;
            if annotation.book_id != Some(book.id) {
                return Err(AppError::not_found("Annotation not found"));
            }
            Some(annotation.selected_text)
        }
        None => None,
    };

    let prompt = book_chat_prompt(&book.title, highlighted.as_deref(), content);
    let data = exchange(
        &pool,
        &gemini,
        auth.user_id,
        ChatSubject::Book(book.id),
        content,
        request.annotation_id,
        prompt,
    )
    .await?;

    Ok(HttpResponse::Created().json(AppSuccessResponse::new(data, "Message sent successfully")))
}

#[tracing::instrument(name = "Video chat history", skip(pool, auth), fields(user_id = auth.user_id))]
#[get("/{video_id}/messages")]
pub async fn get_video_messages(
    pool: web::Data<MySqlPool>,
    auth: JwtMiddleware,
    video_id: web::Path<i32>,
) -> Result<HttpResponse, AppError> {
    let video = videos::fetch_owned_video(&pool, video_id.into_inner(), auth.user_id).await?;
    let data = messages::fetch_messages(&pool, ChatSubject::Video(video.id), auth.user_id).await?;

    Ok(HttpResponse::Ok().json(AppSuccessResponse::new(data, "Messages retrieved successfully")))
}

#[tracing::instrument(name = "Video chat message", skip(pool, gemini, auth, request), fields(user_id = auth.user_id))]
#[post("/{video_id}/messages")]
pub async fn send_video_message(
    pool: web::Data<MySqlPool>,
    gemini: web::Data<GeminiClient>,
    auth: JwtMiddleware,
    video_id: web::Path<i32>,
    request: web::Json<SendMessageRequest>,
) -> Result<HttpResponse, AppError> {
    request.validate()?;
    let content = request.trimmed_content()?;
    let video = videos::fetch_owned_video(&pool, video_id.into_inner(), auth.user_id).await?;

    let history = messages::fetch_recent_messages(
        &pool,
        ChatSubject::Video(video.id),
        auth.user_id,
        PROMPT_HISTORY_TURNS as i64,
    )
    .await?;
    let prompt = course_chat_prompt(
        &video.course_title,
        &video.title,
        &prompt_history(&history),
        content,
    );

    let data = exchange(
        &pool,
        &gemini,
        auth.user_id,
        ChatSubject::Video(video.id),
        content,
        None,
        prompt,
    )
    .await?;

    Ok(HttpResponse::Created().json(AppSuccessResponse::new(data, "Message sent successfully")))
}
