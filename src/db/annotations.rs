use chrono::Utc;
use sqlx::MySqlPool;

use crate::core::AppError;
use crate::models::annotations::{Annotation, AnnotationTarget, NewAnnotation};

const ANNOTATION_COLUMNS: &str = r#"
    id, user_id, book_id, video_id, page_number, timestamp_seconds,
    selected_text, color, explanation, created_at, updated_at
"#;

pub async fn insert_annotation(
    pool: &MySqlPool,
    annotation: &NewAnnotation,
) -> Result<Annotation, AppError> {
    let now = Utc::now().naive_utc();
    let (book_id, video_id, page_number, timestamp_seconds) = match annotation.target {
        AnnotationTarget::Book {
            book_id,
            page_number,
        } => (Some(book_id), None, Some(page_number), None),
        AnnotationTarget::Video {
            video_id,
            timestamp_seconds,
        } => (None, Some(video_id), None, Some(timestamp_seconds)),
    };

    let result = sqlx::query(
        r#"
        INSERT INTO tbl_annotations (
            user_id, book_id, video_id, page_number, timestamp_seconds,
            selected_text, color, created_at, updated_at
        )
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(annotation.user_id)
    .bind(book_id)
    .bind(video_id)
    .bind(page_number)
    .bind(timestamp_seconds)
    .bind(&annotation.selected_text)
    .bind(&annotation.color)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await
    .map_err(AppError::db_error)?;

    fetch_owned_annotation(pool, result.last_insert_id() as i32, annotation.user_id).await
}

pub async fn fetch_book_annotations(
    pool: &MySqlPool,
    book_id: i32,
    user_id: i32,
) -> Result<Vec<Annotation>, AppError> {
    sqlx::query_as::<_, Annotation>(&format!(
        r#"
        SELECT {} FROM tbl_annotations
        WHERE book_id = ? AND user_id = ?
        ORDER BY page_number ASC, created_at ASC, id ASC
        "#,
        ANNOTATION_COLUMNS
    ))
    .bind(book_id)
    .bind(user_id)
    .fetch_all(pool)
    .await
    .map_err(AppError::db_error)
}

pub async fn fetch_video_annotations(
    pool: &MySqlPool,
    video_id: i32,
    user_id: i32,
) -> Result<Vec<Annotation>, AppError> {
    sqlx::query_as::<_, Annotation>(&format!(
        r#"
        SELECT {} FROM tbl_annotations
        WHERE video_id = ? AND user_id = ?
        ORDER BY timestamp_seconds ASC, id ASC
        "#,
        ANNOTATION_COLUMNS
    ))
    .bind(video_id)
    .bind(user_id)
    .fetch_all(pool)
    .await
    .map_err(AppError::db_error)
}

pub async fn fetch_owned_annotation(
    pool: &MySqlPool,
    annotation_id: i32,
    user_id: i32,
) -> Result<Annotation, AppError> {
    sqlx::query_as::<_, Annotation>(&format!(
        "SELECT {} FROM tbl_annotations WHERE id = ? AND user_id = ?",
        ANNOTATION_COLUMNS
    ))
    .bind(annotation_id)
    .bind(user_id)
    .fetch_optional(pool)
    .await
    .map_err(AppError::db_error)?
    .ok_or_else(|| AppError::not_found("Annotation not found"))
}

pub async fn delete_annotation(
    pool: &MySqlPool,
    annotation_id: i32,
    user_id: i32,
) -> Result<(), AppError> {
    let result = sqlx::query("DELETE FROM tbl_annotations WHERE id = ? AND user_id = ?")
        .bind(annotation_id)
        .bind(user_id)
        .execute(pool)
        .await
        .map_err(AppError::db_error)?;

    if result.rows_affected() == 0 {
        return Err(AppError::not_found("Annotation not found"));
    }
    Ok(())
}

pub async fn save_explanation(
    pool: &MySqlPool,
    annotation_id: i32,
    user_id: i32,
    explanation: &str,
) -> Result<Annotation, AppError> {
    // Ownership first: MySQL counts unchanged rows as unaffected.
    fetch_owned_annotation(pool, annotation_id, user_id).await?;

    sqlx::query(
        "UPDATE tbl_annotations SET explanation = ?, updated_at = ? WHERE id = ? AND user_id = ?",
    )
    .bind(explanation)
    .bind(Utc::now().naive_utc())
    .bind(annotation_id)
    .bind(user_id)
    .execute(pool)
    .await
    .map_err(AppError::db_error)?;

    fetch_owned_annotation(pool, annotation_id, user_id).await
}
