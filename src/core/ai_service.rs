use std::time::Duration;

use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Serialize};

use crate::core::config::GeminiConfig;
use crate::core::AppError;

const SERVICE: &str = "gemini";

/// Thin client for the Generative Language `generateContent` endpoint.
pub struct GeminiClient {
    http: reqwest::Client,
    api_key: Option<Secret<String>>,
    model: String,
    base_url: String,
}

#[derive(Serialize)]
struct GenerateContentRequest<'a> {
    contents: Vec<RequestContent<'a>>,
}

#[derive(Serialize)]
struct RequestContent<'a> {
    role: &'static str,
    parts: Vec<RequestPart<'a>>,
}

#[derive(Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorEnvelope {
    error: ApiErrorBody,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: String,
}

/// One turn of a conversation replayed into a prompt.
#[derive(Debug, Clone)]
pub struct ChatTurn {
    pub role: String,
    pub content: String,
}

impl GeminiClient {
    pub fn new(config: &GeminiConfig) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()?;

        Ok(Self {
            http,
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn is_configured(&self) -> bool {
        self.api_key
            .as_ref()
            .map(|key| !key.expose_secret().is_empty())
            .unwrap_or(false)
    }

    #[tracing::instrument(name = "Gemini generate content", skip(self, prompt), fields(model = %self.model))]
    pub async fn generate(&self, prompt: &str) -> Result<String, AppError> {
        let api_key = self
            .api_key
            .as_ref()
            .filter(|key| !key.expose_secret().is_empty())
            .ok_or_else(|| AppError::internal_error("AI service is not configured"))?;

        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, self.model
        );
        let body = GenerateContentRequest {
            contents: vec![RequestContent {
                role: "user",
                parts: vec![RequestPart { text: prompt }],
            }],
        };

        let response = self
            .http
            .post(url)
            .query(&[("key", api_key.expose_secret())])
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::upstream_error(SERVICE, "Failed to generate response", e))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let detail = serde_json::from_str::<ApiErrorEnvelope>(&text)
                .map(|envelope| envelope.error.message)
                .unwrap_or(text);
            tracing::error!("Gemini returned {}: {}", status, detail);
            return Err(AppError::upstream_error(
                SERVICE,
                "Failed to generate response",
                format!("{}: {}", status, detail),
            ));
        }

        let parsed: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| AppError::upstream_error(SERVICE, "Failed to generate response", e))?;

        extract_text(parsed)
    }
}

/// Concatenated text parts of the first candidate.
pub fn extract_text(response: GenerateContentResponse) -> Result<String, AppError> {
    let blocked = response
        .prompt_feedback
        .and_then(|feedback| feedback.block_reason);

    let text: String = response
        .candidates
        .into_iter()
        .next()
        .and_then(|candidate| candidate.content)
        .map(|content| {
            content
                .parts
                .into_iter()
                .filter_map(|part| part.text)
                .collect::<Vec<_>>()
                .join("")
        })
        .unwrap_or_default();

    if text.trim().is_empty() {
        let cause = blocked.unwrap_or_else(|| "empty candidate list".to_string());
        return Err(AppError::upstream_error(
            SERVICE,
            "The AI service returned no answer",
            cause,
        ));
    }

    Ok(text)
}

pub fn explain_prompt(text: &str) -> String {
    format!(
        "Explain the following text clearly and concisely, providing context and definition where necessary. \
         If it's a specific term, define it. If it's a concept, explain it simply.\n\nText: \"{}\"",
        text.trim()
    )
}

pub fn book_chat_prompt(book_title: &str, highlighted: Option<&str>, message: &str) -> String {
    let mut prompt = format!(
        "You are a reading assistant helping a user with the book \"{}\".\n\
         Keep answers concise and helpful.\n",
        book_title
    );
    if let Some(excerpt) = highlighted.filter(|e| !e.trim().is_empty()) {
        prompt.push_str(&format!(
            "The user highlighted this passage:\n\"{}\"\n",
            excerpt.trim()
        ));
    }
    prompt.push_str(&format!("\nUser: {}\nAI:", message.trim()));
    prompt
}

pub fn course_chat_prompt(
    course_title: &str,
    video_title: &str,
    history: &[ChatTurn],
    message: &str,
) -> String {
    let conversation = history
        .iter()
        .map(|turn| {
            let speaker = if turn.role == "user" { "User" } else { "AI" };
            format!("{}: {}", speaker, turn.content)
        })
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "You are an AI assistant for the course \"{course}\".\n\
         The user is currently watching the video \"{video}\".\n\
         Answer their questions based on general knowledge, assuming they are asking about the topic of this video or course.\n\
         Keep answers concise and helpful.\n\n\
         Current conversation:\n{conversation}\n\n\
         User: {message}\n\
         AI:",
        course = course_title,
        video = video_title,
        conversation = conversation,
        message = message.trim()
    )
}
