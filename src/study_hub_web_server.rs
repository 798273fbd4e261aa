use std::net::TcpListener;

use actix_cors::Cors;
use actix_web::http::header;
use actix_web::web::{self, Data, ServiceConfig};
use actix_web::{dev::Server, App, HttpServer};
use sqlx::mysql::MySqlPoolOptions;
use sqlx::MySqlPool;
use tracing_actix_web::TracingLogger;

use crate::core::config::{JwtAuthConfig, StudyHubServer};
use crate::core::{
    AppConfig, AppError, BookStorage, DriveClient, EmailService, GeminiClient, RedisHelper,
};
use crate::routes::study_hub_routes;

const JSON_LIMIT: usize = 1024 * 1024;

pub struct StudyHubWebServer {
    port: u16,
    pool: MySqlPool,
    server: Server,
}

impl StudyHubWebServer {
    pub async fn build(configuration: AppConfig) -> Result<Self, anyhow::Error> {
        let mysql_pool = get_connection_pool(&configuration);
        sqlx::migrate!("./migrations").run(&mysql_pool).await?;

        Self::build_with_pool(configuration, mysql_pool)
    }

    /// Binds the listener and wires the routes around an already migrated pool.
    pub fn build_with_pool(
        configuration: AppConfig,
        mysql_pool: MySqlPool,
    ) -> Result<Self, anyhow::Error> {
        let address = format!(
            "{}:{}",
            configuration.study_hub_server_config.host,
            configuration.study_hub_server_config.port
        );

        let redis_client = configuration.redis.connect()?;

        let listener = TcpListener::bind(address)?;
        let port = listener.local_addr()?.port();

        let state = AppState::new(&configuration, mysql_pool.clone(), redis_client)?;
        let server = run(listener, state, configuration.study_hub_server_config.allowed_origins)?;

        Ok(Self {
            port,
            pool: mysql_pool,
            server,
        })
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// The pool the handlers use, for background jobs sharing its connections.
    pub fn pool(&self) -> MySqlPool {
        self.pool.clone()
    }

    pub async fn run_until_stopped(self) -> Result<(), std::io::Error> {
        self.server.await
    }
}

pub fn get_connection_pool(configuration: &AppConfig) -> MySqlPool {
    MySqlPoolOptions::new()
        .acquire_timeout(std::time::Duration::from_secs(5))
        .connect_lazy_with(configuration.mysql.connect())
}

/// Everything handlers pull out of `app_data`.
#[derive(Clone)]
pub struct AppState {
    pub pool: Data<MySqlPool>,
    pub redis_helper: Data<RedisHelper>,
    pub email_service: Data<EmailService>,
    pub jwt_config: Data<JwtAuthConfig>,
    pub server_config: Data<StudyHubServer>,
    pub storage: Data<BookStorage>,
    pub gemini: Data<GeminiClient>,
    pub drive: Data<DriveClient>,
}

impl AppState {
    pub fn new(
        configuration: &AppConfig,
        mysql_pool: MySqlPool,
        redis_client: redis::Client,
    ) -> Result<Self, anyhow::Error> {
        let gemini = GeminiClient::new(&configuration.gemini)?;
        if !gemini.is_configured() {
            tracing::warn!("Gemini API key is not set, AI requests will fail");
        }

        Ok(Self {
            pool: Data::new(mysql_pool),
            redis_helper: Data::new(RedisHelper::new(redis_client)),
            email_service: Data::new(EmailService::new(configuration.smtp.clone())),
            jwt_config: Data::new(configuration.jwt_auth_config.clone()),
            server_config: Data::new(configuration.study_hub_server_config.clone()),
            storage: Data::new(BookStorage::new(&configuration.storage)),
            gemini: Data::new(gemini),
            drive: Data::new(DriveClient::new(&configuration.google_drive)?),
        })
    }

    /// Registers shared state, the JSON extractor config and the routes.
    pub fn configure(&self, conf: &mut ServiceConfig) {
        conf.app_data(self.pool.clone())
            .app_data(self.redis_helper.clone())
            .app_data(self.email_service.clone())
            .app_data(self.jwt_config.clone())
            .app_data(self.server_config.clone())
            .app_data(self.storage.clone())
            .app_data(self.gemini.clone())
            .app_data(self.drive.clone())
            .app_data(json_config())
            .configure(study_hub_routes);
    }
}

/// Malformed bodies get the same JSON error shape as every other failure.
fn json_config() -> web::JsonConfig {
    web::JsonConfig::default()
        .limit(JSON_LIMIT)
        .error_handler(|err, _req| {
            AppError::validation_error(format!("Invalid request body: {}", err)).into()
        })
}

fn cors(allowed_origins: &[String]) -> Cors {
    let cors = Cors::default()
        .allow_any_method()
        .allowed_headers(vec![
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            header::ACCEPT,
            header::RANGE,
        ])
        .expose_headers(vec![header::CONTENT_RANGE, header::ACCEPT_RANGES])
        .supports_credentials();

    if allowed_origins.is_empty() {
        return cors.allow_any_origin();
    }
    allowed_origins
        .iter()
        .fold(cors, |cors, origin| cors.allowed_origin(origin))
}

pub fn run(
    listener: TcpListener,
    state: AppState,
    allowed_origins: Vec<String>,
) -> Result<Server, anyhow::Error> {
    let server = HttpServer::new(move || {
        App::new()
            .wrap(TracingLogger::default())
            .wrap(cors(&allowed_origins))
            .configure(|conf| state.configure(conf))
    })
    .listen(listener)?
    .run();

    Ok(server)
}
