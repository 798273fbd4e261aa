mod auth;
mod chat;
mod courses;
mod health_check;
mod helpers;
mod protected_routes;
mod server;
