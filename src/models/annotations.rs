use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

use crate::core::AppError;

pub const BOOK_HIGHLIGHT_COLOR: &str = "#FFEB3B";
pub const VIDEO_NOTE_COLOR: &str = "#818cf8";

/// A highlight on a book page or a note at a point in a video.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Annotation {
    pub id: i32,
    pub user_id: i32,
    pub book_id: Option<i32>,
    pub video_id: Option<i32>,
    pub page_number: Option<i32>,
    pub timestamp_seconds: Option<f64>,
    pub selected_text: String,
    pub color: String,
    pub explanation: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Validate, Debug, Deserialize)]
pub struct CreateBookAnnotationRequest {
    #[validate(range(min = 1, message = "Page number must be at least 1"))]
    pub page_number: i32,
    #[validate(length(min = 1, message = "Selected text is required"))]
    pub selected_text: String,
    pub color: Option<String>,
}

#[derive(Validate, Debug, Deserialize)]
pub struct CreateVideoAnnotationRequest {
    #[validate(length(min = 1, message = "Note text is required"))]
    pub text: String,
    #[validate(range(min = 0.0, message = "Timestamp cannot be negative"))]
    pub timestamp: f64,
    pub color: Option<String>,
}

#[derive(Validate, Debug, Default, Deserialize)]
#[serde(default)]
pub struct UpdateExplanationRequest {
    #[validate(length(min = 1, message = "Explanation is required"))]
    pub explanation: String,
}

pub enum AnnotationTarget {
    Book { book_id: i32, page_number: i32 },
    Video { video_id: i32, timestamp_seconds: f64 },
}

pub struct NewAnnotation {
    pub user_id: i32,
    pub target: AnnotationTarget,
    pub selected_text: String,
    pub color: String,
}

const MAX_COLOR_NAME_LEN: usize = 20;

/// `#RGB`, `#RRGGBB` or a CSS color keyword such as `yellow`; the default
/// applies when none is given. Keywords are stored lowercased.
pub fn parse_color(color: Option<&str>, default: &str) -> Result<String, AppError> {
    let color = match color.map(str::trim).filter(|c| !c.is_empty()) {
        Some(c) => c,
        None => return Ok(default.to_string()),
    };

    if let Some(hex) = color.strip_prefix('#') {
        if (hex.len() == 3 || hex.len() == 6) && hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Ok(color.to_string());
        }
    } else if color.len() <= MAX_COLOR_NAME_LEN && color.chars().all(|c| c.is_ascii_alphabetic()) {
        return Ok(color.to_ascii_lowercase());
    }

    Err(AppError::validation_error(
        "Color must be a hex value like #FFEB3B or a color name like yellow",
    ))
}
