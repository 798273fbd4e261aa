pub mod ai_service;
pub mod config;
pub mod drive_service;
pub mod email_service;
pub mod jwt_auth;
pub mod redis_helper;
mod responses;
pub mod storage;
mod telemetry;
pub mod utils;

pub use self::config::AppConfig;
pub use ai_service::GeminiClient;
pub use drive_service::DriveClient;
pub use email_service::EmailService;
pub use redis_helper::*;
pub use responses::*;
pub use storage::BookStorage;
pub use telemetry::*;
