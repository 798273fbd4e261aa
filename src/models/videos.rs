use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::core::drive_service::DriveVideo;

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Video {
    pub id: i32,
    pub course_id: i32,
    pub title: String,
    pub video_url: String,
    pub is_completed: bool,
    pub duration: Option<i32>,
    pub sort_order: i32,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// A video joined with the course it belongs to.
#[derive(Debug, Clone, FromRow)]
pub struct VideoContext {
    pub id: i32,
    pub course_id: i32,
    pub title: String,
    pub video_url: String,
    pub course_title: String,
    pub source_type: String,
    pub owner_id: i32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewVideo {
    pub title: String,
    pub video_url: String,
}

impl From<DriveVideo> for NewVideo {
    fn from(video: DriveVideo) -> Self {
        Self {
            title: video.title,
            video_url: video.embed_url,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CompletionRequest {
    pub completed: bool,
}

#[derive(Debug, Serialize)]
pub struct CompletionResult {
    pub video_id: i32,
    pub is_completed: bool,
    pub completed_videos: i32,
    pub total_videos: i32,
}
