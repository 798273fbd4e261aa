pub mod core;
pub mod db;
pub mod jobs;
pub mod models;
pub mod routes;
pub mod study_hub_web_server;
