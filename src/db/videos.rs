use chrono::Utc;
use sqlx::{MySqlConnection, MySqlPool};

use crate::core::AppError;
use crate::models::videos::{NewVideo, Video, VideoContext};

const VIDEO_COLUMNS: &str =
    "id, course_id, title, video_url, is_completed, duration, sort_order, created_at, updated_at";

/// Inserts `videos` with consecutive sort orders starting at `first_order`.
pub async fn insert_videos(
    conn: &mut MySqlConnection,
    course_id: i32,
    first_order: i32,
    videos: &[NewVideo],
) -> Result<(), AppError> {
    let now = Utc::now().naive_utc();

    for (offset, video) in videos.iter().enumerate() {
        sqlx::query(
            r#"
            INSERT INTO tbl_videos (course_id, title, video_url, is_completed, sort_order, created_at, updated_at)
            VALUES (?, ?, ?, FALSE, ?, ?, ?)
            "#,
        )
        .bind(course_id)
        .bind(&video.title)
        .bind(&video.video_url)
        .bind(first_order + offset as i32)
        .bind(now)
        .bind(now)
        .execute(&mut *conn)
        .await
        .map_err(AppError::db_error)?;
    }

    Ok(())
}

pub async fn fetch_course_videos(pool: &MySqlPool, course_id: i32) -> Result<Vec<Video>, AppError> {
    sqlx::query_as::<_, Video>(&format!(
        "SELECT {} FROM tbl_videos WHERE course_id = ? ORDER BY sort_order ASC",
        VIDEO_COLUMNS
    ))
    .bind(course_id)
    .fetch_all(pool)
    .await
    .map_err(AppError::db_error)
}

/// The video with its course, when the course belongs to `owner_id`.
pub async fn fetch_owned_video(
    pool: &MySqlPool,
    video_id: i32,
    owner_id: i32,
) -> Result<VideoContext, AppError> {
    sqlx::query_as::<_, VideoContext>(
        r#"
        SELECT v.id, v.course_id, v.title, v.video_url,
               c.title AS course_title, c.source_type, c.owner_id
        FROM tbl_videos v
        INNER JOIN tbl_courses c ON c.id = v.course_id
        WHERE v.id = ? AND c.owner_id = ?
        "#,
    )
    .bind(video_id)
    .bind(owner_id)
    .fetch_optional(pool)
    .await
    .map_err(AppError::db_error)?
    .ok_or_else(|| AppError::not_found("Video not found"))
}

/// Flags the video and recounts the course's completed videos in one
/// transaction. Returns `(completed_videos, total_videos)`.
pub async fn set_completion(
    pool: &MySqlPool,
    video: &VideoContext,
    completed: bool,
) -> Result<(i32, i32), AppError> {
    let now = Utc::now().naive_utc();
    let mut tx = pool.begin().await.map_err(AppError::db_error)?;

    sqlx::query("UPDATE tbl_videos SET is_completed = ?, updated_at = ? WHERE id = ?")
        .bind(completed)
        .bind(now)
        .bind(video.id)
        .execute(tx.as_mut())
        .await
        .map_err(AppError::db_error)?;

    sqlx::query(
        r#"
        UPDATE tbl_courses
        SET completed_videos = (
                SELECT COUNT(*) FROM tbl_videos WHERE course_id = ? AND is_completed = TRUE
            ),
            updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(video.course_id)
    .bind(now)
    .bind(video.course_id)
    .execute(tx.as_mut())
    .await
    .map_err(AppError::db_error)?;

    let counts: (i32, i32) =
        sqlx::query_as("SELECT completed_videos, total_videos FROM tbl_courses WHERE id = ?")
            .bind(video.course_id)
            .fetch_one(tx.as_mut())
            .await
            .map_err(AppError::db_error)?;

    tx.commit().await.map_err(AppError::db_error)?;
    Ok(counts)
}
