use std::path::PathBuf;

use secrecy::{ExposeSecret, Secret};
use serde::Deserialize;

use sqlx::mysql::MySqlConnectOptions;
use sqlx::ConnectOptions;

#[derive(Deserialize, Clone)]
pub struct AppConfig {
    pub study_hub_server_config: StudyHubServer,
    pub mysql: MySqlConfig,
    pub redis: RedisConfig,
    pub jwt_auth_config: JwtAuthConfig,
    pub smtp: SmtpConfig,
    pub storage: StorageConfig,
    pub gemini: GeminiConfig,
    pub google_drive: GoogleDriveConfig,
}

impl AppConfig {
    pub fn new() -> Result<Self, config::ConfigError> {
        let base_path = std::env::current_dir()
            .map_err(|e| config::ConfigError::Message(format!("Failed to find the current dir: {}", e)))?;
        let config_dir = base_path.join("src/core/configurations");

        let app_environment: Environment = std::env::var("STUDY_HUB_APP_ENVIRONMENT")
            .unwrap_or_else(|_| "local".into())
            .try_into()
            .map_err(config::ConfigError::Message)?;

        let configurations = config::Config::builder()
            .add_source(
                config::File::from(config_dir.join(app_environment.as_str())).required(true),
            )
            // APP__GEMINI__API_KEY=... overrides gemini.api_key
            .add_source(
                config::Environment::with_prefix("APP")
                    .prefix_separator("__")
                    .separator("__"),
            )
            .build()?;

        configurations.try_deserialize()
    }
}

#[derive(Deserialize, Clone)]
pub struct StudyHubServer {
    pub port: u16,
    pub host: String,
    #[serde(default)]
    pub allowed_origins: Vec<String>,
    /// Used to build links sent by email, e.g. the reset-password page.
    pub public_base_url: String,
}

#[derive(Deserialize, Clone)]
pub struct RedisConfig {
    pub host: String,
    pub port: String,
    pub password: Option<Secret<String>>,
}

impl RedisConfig {
    pub fn connect(&self) -> Result<redis::Client, redis::RedisError> {
        let url = format!(
            "redis://:{password}@{host}:{port}",
            password = self
                .password
                .as_ref()
                .map(|p| p.expose_secret().as_str())
                .unwrap_or(""),
            host = self.host,
            port = self.port
        );
        redis::Client::open(url)
    }
}

#[derive(Deserialize, Clone)]
pub struct MySqlConfig {
    pub username: String,
    pub password: Secret<String>,
    pub host: String,
    pub port: u16,
    pub database_name: String,
}

impl MySqlConfig {
    pub fn connect(&self) -> MySqlConnectOptions {
        let options = MySqlConnectOptions::new()
            .host(&self.host)
            .username(&self.username)
            .password(self.password.expose_secret())
            .port(self.port)
            .database(&self.database_name);

        options.log_statements(tracing::log::LevelFilter::Trace)
    }
}

#[derive(Deserialize, Clone)]
pub struct JwtAuthConfig {
    pub secret: Secret<String>,
    #[serde(default = "default_token_expiration_days")]
    pub token_expiration_days: i64,
    #[serde(default)]
    pub secure_cookie: bool,
}

fn default_token_expiration_days() -> i64 {
    7
}

#[derive(Deserialize, Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: Secret<String>,
    pub from_email: String,
    pub from_name: String,
}

#[derive(Deserialize, Clone)]
pub struct StorageConfig {
    pub upload_dir: PathBuf,
    #[serde(default = "default_max_book_size")]
    pub max_book_size: usize,
    /// Folders local courses may be created from and streamed out of.
    #[serde(default)]
    pub local_media_roots: Vec<PathBuf>,
}

fn default_max_book_size() -> usize {
    20 * 1024 * 1024
}

#[derive(Deserialize, Clone)]
pub struct GeminiConfig {
    pub api_key: Option<Secret<String>>,
    #[serde(default = "default_gemini_model")]
    pub model: String,
    #[serde(default = "default_gemini_base_url")]
    pub base_url: String,
    #[serde(default = "default_gemini_timeout")]
    pub timeout_seconds: u64,
}

fn default_gemini_model() -> String {
    "gemini-2.5-flash".to_string()
}

fn default_gemini_base_url() -> String {
    "https://generativelanguage.googleapis.com".to_string()
}

fn default_gemini_timeout() -> u64 {
    60
}

#[derive(Deserialize, Clone)]
pub struct GoogleDriveConfig {
    pub api_key: Option<Secret<String>>,
    pub client_email: Option<String>,
    pub private_key: Option<Secret<String>>,
    #[serde(default = "default_drive_api_base_url")]
    pub api_base_url: String,
    #[serde(default = "default_google_token_url")]
    pub token_url: String,
}

fn default_drive_api_base_url() -> String {
    "https://www.googleapis.com".to_string()
}

fn default_google_token_url() -> String {
    "https://oauth2.googleapis.com/token".to_string()
}

#[derive(Debug)]
pub enum Environment {
    Local,
    Sandbox,
    Production,
}

impl Environment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Local => "local",
            Self::Sandbox => "sandbox",
            Self::Production => "production",
        }
    }
}

impl TryFrom<String> for Environment {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.to_lowercase().as_str() {
            "local" => Ok(Self::Local),
            "sandbox" => Ok(Self::Sandbox),
            "production" => Ok(Self::Production),
            other => Err(format!(
                "{} is not supported environment. Use either `local`, `sandbox` or `production` ",
                other
            )),
        }
    }
}
