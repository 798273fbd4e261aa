use study_hub::core::AppConfig;
use study_hub::study_hub_web_server::{get_connection_pool, StudyHubWebServer};

#[actix_web::test]
async fn background_jobs_share_the_server_pool() {
    let mut config = AppConfig::new().expect("Failed to read local configuration");
    config.study_hub_server_config.host = "127.0.0.1".into();
    config.study_hub_server_config.port = 0;

    let pool = get_connection_pool(&config);
    let server = StudyHubWebServer::build_with_pool(config, pool.clone())
        .expect("server builds around a lazy pool");
    assert_ne!(server.port(), 0);

    let job_pool = server.pool();
    assert!(!job_pool.is_closed());
    pool.close().await;
    assert!(job_pool.is_closed());
}
