use std::cmp::Ordering;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use once_cell::sync::Lazy;
use regex::Regex;
use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Serialize};

use crate::core::config::GoogleDriveConfig;
use crate::core::redis_helper::RedisHelper;
use crate::core::utils::cache_key;
use crate::core::AppError;

const SERVICE: &str = "google-drive";
const DRIVE_SCOPE: &str = "https://www.googleapis.com/auth/drive.readonly";
const LISTING_TTL: Duration = Duration::from_secs(10 * 60);

static FOLDER_LINK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"https://drive\.google\.com/drive/(?:u/[0-9]+/)?folders/([a-zA-Z0-9_-]+)")
        .expect("valid folder link regex")
});
static FILE_LINK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"https://drive\.google\.com/(?:file/d/|open\?id=)([a-zA-Z0-9_-]+)")
        .expect("valid file link regex")
});
static PLAIN_ID: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-zA-Z0-9_-]+$").expect("valid id regex"));
static FOLDER_PATH: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"drive(?:/u/[0-9]+)?/folders/([a-zA-Z0-9_-]+)").expect("valid folder path regex")
});
static ID_PARAM: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[?&]id=([a-zA-Z0-9_-]+)").expect("valid id param regex"));
static NUMERIC_PREFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d+)[\s.\-_]*").expect("valid numeric prefix regex"));

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriveLinkKind {
    File,
    Folder,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DriveId {
    pub kind: DriveLinkKind,
    pub id: String,
}

pub fn validate_drive_link(link: &str) -> bool {
    FOLDER_LINK.is_match(link) || FILE_LINK.is_match(link)
}

pub fn extract_drive_id(link: &str) -> Option<DriveId> {
    if let Some(caps) = FOLDER_LINK.captures(link) {
        return Some(DriveId {
            kind: DriveLinkKind::Folder,
            id: caps[1].to_string(),
        });
    }
    FILE_LINK.captures(link).map(|caps| DriveId {
        kind: DriveLinkKind::File,
        id: caps[1].to_string(),
    })
}

/// Accepts a bare folder id or any URL carrying one.
pub fn parse_folder_id(input: &str) -> Option<String> {
    let input = input.trim();
    if PLAIN_ID.is_match(input) {
        return Some(input.to_string());
    }
    FOLDER_PATH
        .captures(input)
        .or_else(|| ID_PARAM.captures(input))
        .map(|caps| caps[1].to_string())
}

pub fn preview_url(file_id: &str) -> String {
    format!("https://drive.google.com/file/d/{}/preview", file_id)
}

fn numeric_prefix(title: &str) -> Option<&str> {
    NUMERIC_PREFIX
        .captures(title)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim_start_matches('0'))
}

/// Numbered titles first in numeric order, then the rest alphabetically
/// ignoring case.
pub fn natural_cmp(a: &str, b: &str) -> Ordering {
    let by_number = match (numeric_prefix(a), numeric_prefix(b)) {
        // Compare digit strings by length first so huge prefixes never overflow.
        (Some(x), Some(y)) => x.len().cmp(&y.len()).then_with(|| x.cmp(y)),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    };

    by_number
        .then_with(|| a.to_lowercase().cmp(&b.to_lowercase()))
        .then_with(|| a.cmp(b))
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DriveFile {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub mime_type: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DriveVideo {
    pub title: String,
    pub embed_url: String,
}

impl From<DriveFile> for DriveVideo {
    fn from(file: DriveFile) -> Self {
        Self {
            embed_url: preview_url(&file.id),
            title: file.name,
        }
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct FilesListResponse {
    #[serde(default)]
    files: Vec<DriveFile>,
    next_page_token: Option<String>,
}

#[derive(Serialize)]
struct ServiceAccountClaims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    iat: i64,
    exp: i64,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default = "default_token_lifetime")]
    expires_in: u64,
}

fn default_token_lifetime() -> u64 {
    3600
}

struct CachedToken {
    value: String,
    expires_at: Instant,
}

enum Credentials {
    ServiceAccount {
        client_email: String,
        private_key: Secret<String>,
    },
    ApiKey(Secret<String>),
    Missing,
}

/// Read-only Drive v3 client that lists the videos inside a folder.
pub struct DriveClient {
    http: reqwest::Client,
    files_endpoint: String,
    token_endpoint: String,
    credentials: Credentials,
    token: Mutex<Option<CachedToken>>,
}

impl DriveClient {
    pub fn new(config: &GoogleDriveConfig) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;

        let credentials = match (&config.client_email, &config.private_key, &config.api_key) {
            (Some(email), Some(key), _) if !email.is_empty() && !key.expose_secret().is_empty() => {
                // Keys pasted into env vars usually carry literal "\n".
                Credentials::ServiceAccount {
                    client_email: email.clone(),
                    private_key: Secret::new(key.expose_secret().replace("\\n", "\n")),
                }
            }
            (_, _, Some(key)) if !key.expose_secret().is_empty() => Credentials::ApiKey(key.clone()),
            _ => Credentials::Missing,
        };

        Ok(Self {
            http,
            files_endpoint: format!(
                "{}/drive/v3/files",
                config.api_base_url.trim_end_matches('/')
            ),
            token_endpoint: config.token_url.clone(),
            credentials,
            token: Mutex::new(None),
        })
    }

    /// Folder videos in natural title order, served from Redis for ten
    /// minutes after the first listing.
    #[tracing::instrument(name = "List Drive folder videos", skip(self, cache))]
    pub async fn list_folder_videos(
        &self,
        folder_id: &str,
        cache: &RedisHelper,
    ) -> Result<Vec<DriveVideo>, AppError> {
        let key = cache_key("drive_folder", folder_id);
        if let Some(videos) = cache.get_or_miss::<Vec<DriveVideo>>(&key).await {
            tracing::info!("Drive listing cache hit for folder {}", folder_id);
            return Ok(videos);
        }

        let mut files = self.fetch_folder_files(folder_id).await?;
        files.sort_by(|a, b| natural_cmp(&a.name, &b.name));
        let videos: Vec<DriveVideo> = files.into_iter().map(DriveVideo::from).collect();

        cache.set_or_log(&key, &videos, LISTING_TTL).await;
        Ok(videos)
    }

    /// Videos a course link points at: the folder contents, or the single
    /// file for a file link.
    pub async fn videos_for_link(
        &self,
        link: &str,
        cache: &RedisHelper,
    ) -> Result<Vec<DriveVideo>, AppError> {
        match extract_drive_id(link) {
            Some(DriveId {
                kind: DriveLinkKind::File,
                id,
            }) => Ok(vec![DriveVideo {
                title: format!("Drive video {}", id),
                embed_url: preview_url(&id),
            }]),
            Some(DriveId {
                kind: DriveLinkKind::Folder,
                id,
            }) => self.list_folder_videos(&id, cache).await,
            None => Err(AppError::validation_error("Invalid Google Drive link format")),
        }
    }

    async fn fetch_folder_files(&self, folder_id: &str) -> Result<Vec<DriveFile>, AppError> {
        let query = format!(
            "'{}' in parents and mimeType contains 'video' and trashed = false",
            folder_id
        );
        let mut files = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut params: Vec<(&str, String)> = vec![
                ("q", query.clone()),
                ("fields", "nextPageToken, files(id, name, mimeType)".to_string()),
                ("pageSize", "1000".to_string()),
                ("supportsAllDrives", "true".to_string()),
                ("includeItemsFromAllDrives", "true".to_string()),
            ];
            if let Some(token) = &page_token {
                params.push(("pageToken", token.clone()));
            }

            let request = self.http.get(&self.files_endpoint);
            let request = match &self.credentials {
                Credentials::ServiceAccount { .. } => {
                    request.bearer_auth(self.access_token().await?)
                }
                Credentials::ApiKey(key) => {
                    params.push(("key", key.expose_secret().clone()));
                    request
                }
                Credentials::Missing => {
                    return Err(AppError::internal_error(
                        "No Google Drive credentials configured",
                    ))
                }
            };

            let response = request
                .query(&params)
                .send()
                .await
                .map_err(|e| AppError::upstream_error(SERVICE, "Failed to list Drive folder", e))?;

            let status = response.status();
            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                tracing::error!("Drive files.list returned {}: {}", status, body);
                return Err(AppError::upstream_error(
                    SERVICE,
                    "Failed to list Drive folder",
                    format!("{}: {}", status, body),
                ));
            }

            let page: FilesListResponse = response
                .json()
                .await
                .map_err(|e| AppError::upstream_error(SERVICE, "Failed to list Drive folder", e))?;

            files.extend(page.files);
            match page.next_page_token {
                Some(token) if !token.is_empty() => page_token = Some(token),
                _ => break,
            }
        }

        tracing::info!("Found {} videos in Drive folder {}", files.len(), folder_id);
        Ok(files)
    }

    async fn access_token(&self) -> Result<String, AppError> {
        if let Ok(guard) = self.token.lock() {
            if let Some(cached) = guard.as_ref() {
                if cached.expires_at > Instant::now() {
                    return Ok(cached.value.clone());
                }
            }
        }

        let (client_email, private_key) = match &self.credentials {
            Credentials::ServiceAccount {
                client_email,
                private_key,
            } => (client_email, private_key),
            _ => {
                return Err(AppError::internal_error(
                    "No Google Drive credentials configured",
                ))
            }
        };

        let assertion = service_account_assertion(
            client_email,
            private_key.expose_secret(),
            &self.token_endpoint,
            chrono::Utc::now().timestamp(),
        )?;

        let response = self
            .http
            .post(&self.token_endpoint)
            .form(&[
                ("grant_type", "urn:ietf:params:oauth:grant-type:jwt-bearer"),
                ("assertion", assertion.as_str()),
            ])
            .send()
            .await
            .map_err(|e| AppError::upstream_error(SERVICE, "Failed to authenticate with Google", e))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::upstream_error(
                SERVICE,
                "Failed to authenticate with Google",
                format!("{}: {}", status, body),
            ));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| AppError::upstream_error(SERVICE, "Failed to authenticate with Google", e))?;

        // Refresh a minute early.
        let lifetime = Duration::from_secs(token.expires_in.saturating_sub(60));
        if let Ok(mut guard) = self.token.lock() {
            *guard = Some(CachedToken {
                value: token.access_token.clone(),
                expires_at: Instant::now() + lifetime,
            });
        }

        Ok(token.access_token)
    }
}

fn service_account_assertion(
    client_email: &str,
    private_key_pem: &str,
    audience: &str,
    now: i64,
) -> Result<String, AppError> {
    let key = EncodingKey::from_rsa_pem(private_key_pem.as_bytes())
        .map_err(|e| AppError::internal_error(format!("Invalid Google service account key: {}", e)))?;

    let claims = ServiceAccountClaims {
        iss: client_email,
        scope: DRIVE_SCOPE,
        aud: audience,
        iat: now,
        exp: now + 3600,
    };

    encode(&Header::new(Algorithm::RS256), &claims, &key)
        .map_err(|e| AppError::internal_error(format!("Failed to sign Google assertion: {}", e)))
}
