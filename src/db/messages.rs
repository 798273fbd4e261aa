use chrono::Utc;
use sqlx::MySqlPool;

use crate::core::AppError;
use crate::models::messages::{ChatSubject, Message, NewMessage, HISTORY_LIMIT};

const MESSAGE_COLUMNS: &str =
    "id, user_id, book_id, video_id, role, content, annotation_id, created_at";

pub async fn insert_message(pool: &MySqlPool, message: &NewMessage<'_>) -> Result<Message, AppError> {
    let (book_id, video_id) = match message.subject {
        ChatSubject::Book(id) => (Some(id), None),
        ChatSubject::Video(id) => (None, Some(id)),
    };

    let result = sqlx::query(
        r#"
        INSERT INTO tbl_messages (user_id, book_id, video_id, role, content, annotation_id, created_at)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(message.user_id)
    .bind(book_id)
    .bind(video_id)
    .bind(message.role.as_str())
    .bind(message.content)
    .bind(message.annotation_id)
    .bind(Utc::now().naive_utc())
    .execute(pool)
    .await
    .map_err(AppError::db_error)?;

    sqlx::query_as::<_, Message>(&format!(
        "SELECT {} FROM tbl_messages WHERE id = ?",
        MESSAGE_COLUMNS
    ))
    .bind(result.last_insert_id() as i32)
    .fetch_one(pool)
    .await
    .map_err(AppError::db_error)
}

/// The user's conversation about a book or video, oldest first.
pub async fn fetch_messages(
    pool: &MySqlPool,
    subject: ChatSubject,
    user_id: i32,
) -> Result<Vec<Message>, AppError> {
    let (column, id) = match subject {
        ChatSubject::Book(id) => ("book_id", id),
        ChatSubject::Video(id) => ("video_id", id),
    };

    sqlx::query_as::<_, Message>(&format!(
        r#"
        SELECT {} FROM tbl_messages
        WHERE {} = ? AND user_id = ?
        ORDER BY created_at ASC, id ASC
        LIMIT ?
        "#,
        MESSAGE_COLUMNS, column
    ))
    .bind(id)
    .bind(user_id)
    .bind(HISTORY_LIMIT)
    .fetch_all(pool)
    .await
    .map_err(AppError::db_error)
}

/// The latest `limit` turns of a conversation, oldest first.
pub async fn fetch_recent_messages(
    pool: &MySqlPool,
    subject: ChatSubject,
    user_id: i32,
    limit: i64,
) -> Result<Vec<Message>, AppError> {
    let (column, id) = match subject {
        ChatSubject::Book(id) => ("book_id", id),
        ChatSubject::Video(id) => ("video_id", id),
    };

    let mut recent = sqlx::query_as::<_, Message>(&format!(
        r#"
        SELECT {} FROM tbl_messages
        WHERE {} = ? AND user_id = ?
        ORDER BY created_at DESC, id DESC
        LIMIT ?
        "#,
        MESSAGE_COLUMNS, column
    ))
    .bind(id)
    .bind(user_id)
    .bind(limit)
    .fetch_all(pool)
    .await
    .map_err(AppError::db_error)?;

    recent.reverse();
    Ok(recent)
}
