use chrono::Utc;
use sqlx::MySqlPool;

use crate::core::AppError;
use crate::db::videos;
use crate::models::courses::{Course, SourceType};
use crate::models::videos::NewVideo;

const COURSE_COLUMNS: &str = r#"
    id, owner_id, title, source_type, source_path_or_link,
    total_videos, completed_videos, created_at, updated_at
"#;

/// Creates the course and its videos, ordered as given, in one transaction.
pub async fn create_course(
    pool: &MySqlPool,
    owner_id: i32,
    title: &str,
    source_type: SourceType,
    source_path_or_link: &str,
    course_videos: &[NewVideo],
) -> Result<i32, AppError> {
    let now = Utc::now().naive_utc();
    let mut tx = pool.begin().await.map_err(AppError::db_error)?;

    let result = sqlx::query(
        r#"
        INSERT INTO tbl_courses (
            owner_id, title, source_type, source_path_or_link,
            total_videos, completed_videos, created_at, updated_at
        )
        VALUES (?, ?, ?, ?, ?, 0, ?, ?)
        "#,
    )
    .bind(owner_id)
    .bind(title)
    .bind(source_type.as_str())
    .bind(source_path_or_link)
    .bind(course_videos.len() as i32)
    .bind(now)
    .bind(now)
    .execute(tx.as_mut())
    .await
    .map_err(AppError::db_error)?;

    let course_id = result.last_insert_id() as i32;
    videos::insert_videos(tx.as_mut(), course_id, 0, course_videos).await?;

    tx.commit().await.map_err(AppError::db_error)?;
    Ok(course_id)
}

pub async fn fetch_courses(pool: &MySqlPool, owner_id: i32) -> Result<Vec<Course>, AppError> {
    sqlx::query_as::<_, Course>(&format!(
        "SELECT {} FROM tbl_courses WHERE owner_id = ? ORDER BY created_at DESC, id DESC",
        COURSE_COLUMNS
    ))
    .bind(owner_id)
    .fetch_all(pool)
    .await
    .map_err(AppError::db_error)
}

pub async fn fetch_owned_course(
    pool: &MySqlPool,
    course_id: i32,
    owner_id: i32,
) -> Result<Course, AppError> {
    sqlx::query_as::<_, Course>(&format!(
        "SELECT {} FROM tbl_courses WHERE id = ? AND owner_id = ?",
        COURSE_COLUMNS
    ))
    .bind(course_id)
    .bind(owner_id)
    .fetch_optional(pool)
    .await
    .map_err(AppError::db_error)?
    .ok_or_else(|| AppError::not_found("Course not found"))
}

pub async fn rename_course(
    pool: &MySqlPool,
    course_id: i32,
    owner_id: i32,
    title: &str,
) -> Result<Course, AppError> {
    sqlx::query("UPDATE tbl_courses SET title = ?, updated_at = ? WHERE id = ? AND owner_id = ?")
        .bind(title)
        .bind(Utc::now().naive_utc())
        .bind(course_id)
        .bind(owner_id)
        .execute(pool)
        .await
        .map_err(AppError::db_error)?;

    fetch_owned_course(pool, course_id, owner_id).await
}

/// Deletes the course, its videos and everything attached to them.
pub async fn delete_course(pool: &MySqlPool, course: &Course) -> Result<(), AppError> {
    let mut tx = pool.begin().await.map_err(AppError::db_error)?;

    for table in ["tbl_messages", "tbl_annotations"] {
        sqlx::query(&format!(
            "DELETE FROM {} WHERE video_id IN (SELECT id FROM tbl_videos WHERE course_id = ?)",
            table
        ))
        .bind(course.id)
        .execute(tx.as_mut())
        .await
        .map_err(AppError::db_error)?;
    }

    sqlx::query("DELETE FROM tbl_videos WHERE course_id = ?")
        .bind(course.id)
        .execute(tx.as_mut())
        .await
        .map_err(AppError::db_error)?;

    sqlx::query("DELETE FROM tbl_courses WHERE id = ? AND owner_id = ?")
        .bind(course.id)
        .bind(course.owner_id)
        .execute(tx.as_mut())
        .await
        .map_err(AppError::db_error)?;

    tx.commit().await.map_err(AppError::db_error)?;
    Ok(())
}

/// Appends videos after the existing ones. Returns the new video total.
pub async fn append_videos(
    pool: &MySqlPool,
    course: &Course,
    new_videos: &[NewVideo],
) -> Result<i32, AppError> {
    let mut tx = pool.begin().await.map_err(AppError::db_error)?;

    // Row lock so concurrent imports cannot reuse sort orders.
    let total_videos: i32 =
        sqlx::query_scalar("SELECT total_videos FROM tbl_courses WHERE id = ? FOR UPDATE")
            .bind(course.id)
            .fetch_one(tx.as_mut())
            .await
            .map_err(AppError::db_error)?;

    videos::insert_videos(tx.as_mut(), course.id, total_videos, new_videos).await?;

    let new_total = total_videos + new_videos.len() as i32;
    sqlx::query("UPDATE tbl_courses SET total_videos = ?, updated_at = ? WHERE id = ?")
        .bind(new_total)
        .bind(Utc::now().naive_utc())
        .bind(course.id)
        .execute(tx.as_mut())
        .await
        .map_err(AppError::db_error)?;

    tx.commit().await.map_err(AppError::db_error)?;
    Ok(new_total)
}
