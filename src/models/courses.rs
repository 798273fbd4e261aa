use std::fmt::{Display, Formatter};

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

use crate::core::AppError;
use crate::models::videos::Video;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SourceType {
    #[serde(rename = "local")]
    Local,
    #[serde(rename = "google-drive")]
    GoogleDrive,
}

impl SourceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Local => "local",
            Self::GoogleDrive => "google-drive",
        }
    }
}

impl Display for SourceType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for SourceType {
    type Error = AppError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim() {
            "local" => Ok(Self::Local),
            "google-drive" => Ok(Self::GoogleDrive),
            other => Err(AppError::validation_error(format!(
                "{} is not a supported source type. Use either `local` or `google-drive`",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Course {
    pub id: i32,
    pub owner_id: i32,
    pub title: String,
    pub source_type: String,
    pub source_path_or_link: String,
    pub total_videos: i32,
    pub completed_videos: i32,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Serialize)]
pub struct CourseDetail {
    #[serde(flatten)]
    pub course: Course,
    pub videos: Vec<Video>,
}

#[derive(Validate, Debug, Default, Deserialize)]
#[serde(default)]
pub struct CreateCourseRequest {
    #[validate(length(min = 1, message = "All fields are required"))]
    pub title: String,
    #[validate(length(min = 1, message = "All fields are required"))]
    pub source_type: String,
    #[validate(length(min = 1, message = "All fields are required"))]
    pub source_path_or_link: String,
}

#[derive(Validate, Debug, Default, Deserialize)]
#[serde(default)]
pub struct RenameCourseRequest {
    #[validate(length(min = 1, message = "Course title is required"))]
    pub title: String,
}

#[derive(Validate, Debug, Default, Deserialize)]
#[serde(default)]
pub struct DriveImportRequest {
    #[validate(length(min = 1, message = "Folder link is required"))]
    pub folder_link: String,
}

#[derive(Debug, Serialize)]
pub struct CourseCreated {
    pub course_id: i32,
    pub total_videos: usize,
}

#[derive(Debug, Serialize)]
pub struct DriveImportResult {
    pub imported: usize,
    pub total_videos: i32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use claim::{assert_err, assert_ok};

    #[test]
    fn source_types_round_trip_through_their_wire_names() {
        assert_eq!(assert_ok!(SourceType::try_from("local")), SourceType::Local);
        assert_eq!(
            assert_ok!(SourceType::try_from(" google-drive ")),
            SourceType::GoogleDrive
        );
        assert_eq!(SourceType::GoogleDrive.to_string(), "google-drive");
        assert_err!(SourceType::try_from("dropbox"));
    }
}
