use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

use crate::core::ai_service::ChatTurn;
use crate::core::AppError;

/// Messages returned by a history listing.
pub const HISTORY_LIMIT: i64 = 100;
/// Prior turns replayed into a video chat prompt.
pub const PROMPT_HISTORY_TURNS: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageRole {
    User,
    Ai,
}

impl MessageRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Ai => "ai",
        }
    }
}

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Message {
    pub id: i32,
    pub user_id: i32,
    pub book_id: Option<i32>,
    pub video_id: Option<i32>,
    pub role: String,
    pub content: String,
    pub annotation_id: Option<i32>,
    pub created_at: NaiveDateTime,
}

impl From<&Message> for ChatTurn {
    fn from(message: &Message) -> Self {
        ChatTurn {
            role: message.role.clone(),
            content: message.content.clone(),
        }
    }
}

#[derive(Clone, Copy)]
pub enum ChatSubject {
    Book(i32),
    Video(i32),
}

pub struct NewMessage<'a> {
    pub user_id: i32,
    pub subject: ChatSubject,
    pub role: MessageRole,
    pub content: &'a str,
    pub annotation_id: Option<i32>,
}

#[derive(Validate, Debug, Default, Deserialize)]
#[serde(default)]
pub struct SendMessageRequest {
    #[validate(length(min = 1, message = "Message content is required"))]
    pub content: String,
    pub annotation_id: Option<i32>,
}

impl SendMessageRequest {
    /// The content without surrounding whitespace; blank content is rejected.
    pub fn trimmed_content(&self) -> Result<&str, AppError> {
        match self.content.trim() {
            "" => Err(AppError::validation_error("Message content is required")),
            content => Ok(content),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ChatExchange {
    pub user_message: Message,
    pub ai_message: Message,
}

/// The most recent `PROMPT_HISTORY_TURNS` turns, oldest first.
pub fn prompt_history(history: &[Message]) -> Vec<ChatTurn> {
    let skip = history.len().saturating_sub(PROMPT_HISTORY_TURNS);
    history[skip..].iter().map(ChatTurn::from).collect()
}
