use actix_web::body::MessageBody;
use actix_web::dev::{ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::{App, Error};
use secrecy::ExposeSecret;
use serde_json::Value;

use study_hub::core::jwt_auth::{generate_jwt_token, JwtClaims};
use study_hub::core::AppConfig;
use study_hub::study_hub_web_server::{get_connection_pool, AppState};

/// Application state wired from `local.yaml`. Nothing here opens a
/// connection until a handler touches MySQL or Redis.
pub struct TestApp {
    pub config: AppConfig,
    pub state: AppState,
}

impl TestApp {
    pub fn new() -> Self {
        let config = AppConfig::new().expect("Failed to read local configuration");
        let pool = get_connection_pool(&config);
        let redis_client = config.redis.connect().expect("Invalid redis url");
        let state =
            AppState::new(&config, pool, redis_client).expect("Failed to build app state");

        Self { config, state }
    }

    pub fn app(
        &self,
    ) -> App<
        impl ServiceFactory<
            ServiceRequest,
            Config = (),
            Response = ServiceResponse<impl MessageBody>,
            Error = Error,
            InitError = (),
        >,
    > {
        let state = self.state.clone();
        App::new().configure(move |conf| state.configure(conf))
    }

    /// A bearer token the server will accept for `user_id`.
    pub fn bearer_for(&self, user_id: i32) -> String {
        let claims = JwtClaims::for_user(user_id, "ada@example.com", "Ada", 1);
        let token = generate_jwt_token(
            &claims,
            self.config.jwt_auth_config.secret.expose_secret(),
        )
        .expect("Failed to sign test token");
        format!("Bearer {}", token)
    }
}

pub fn error_message(body: &Value) -> &str {
    assert_eq!(body["success"], Value::Bool(false));
    body["message"].as_str().expect("error body has a message")
}
