use std::str::FromStr;

use sqlx::mysql::{MySqlConnectOptions, MySqlPoolOptions};
use sqlx::{Connection, Executor, MySqlConnection, MySqlPool};
use uuid::Uuid;

use study_hub::core::storage::StoredFile;
use study_hub::db::{books, courses, messages, users};
use study_hub::models::books::Book;
use study_hub::models::courses::{Course, SourceType};
use study_hub::models::messages::{ChatSubject, MessageRole, NewMessage};
use study_hub::models::videos::NewVideo;

/// A freshly migrated database of its own, or `None` when `DATABASE_URL`
/// is not set.
pub async fn test_pool() -> Option<MySqlPool> {
    let url = match std::env::var("DATABASE_URL") {
        Ok(url) => url,
        Err(_) => {
            eprintln!("DATABASE_URL is not set, skipping database test");
            return None;
        }
    };

    let options = MySqlConnectOptions::from_str(&url).expect("Invalid DATABASE_URL");
    let database = format!("study_hub_test_{}", Uuid::new_v4().simple());

    let mut connection = MySqlConnection::connect_with(&options)
        .await
        .expect("Failed to connect to MySQL");
    connection
        .execute(format!("CREATE DATABASE `{}`", database).as_str())
        .await
        .expect("Failed to create test database");

    let pool = MySqlPoolOptions::new()
        .connect_with(options.database(&database))
        .await
        .expect("Failed to connect to test database");
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to migrate test database");

    Some(pool)
}

pub async fn seed_user(pool: &MySqlPool, email: &str) -> i32 {
    users::create_user(pool, "Ada", email, "$argon2id$placeholder")
        .await
        .expect("Failed to create user")
        .id
}

pub async fn seed_book(pool: &MySqlPool, owner_id: i32) -> Book {
    let file = StoredFile {
        file_name: format!("{}-rust.pdf", Uuid::new_v4()),
        storage_path: "/tmp/rust.pdf".to_string(),
        file_size: 1024,
    };
    books::insert_book(pool, owner_id, "Rust in Action", &file)
        .await
        .expect("Failed to insert book")
}

pub async fn seed_course(pool: &MySqlPool, owner_id: i32, video_count: usize) -> Course {
    let course_videos: Vec<NewVideo> = (1..=video_count)
        .map(|n| NewVideo {
            title: format!("{} Lesson", n),
            video_url: format!("/srv/media/rust/{}.mp4", n),
        })
        .collect();

    let course_id = courses::create_course(
        pool,
        owner_id,
        "Rust 101",
        SourceType::Local,
        "/srv/media/rust",
        &course_videos,
    )
    .await
    .expect("Failed to create course");

    courses::fetch_owned_course(pool, course_id, owner_id)
        .await
        .expect("Course was not stored")
}

pub async fn seed_message(pool: &MySqlPool, user_id: i32, subject: ChatSubject) {
    messages::insert_message(
        pool,
        &NewMessage {
            user_id,
            subject,
            role: MessageRole::User,
            content: "What does this mean?",
            annotation_id: None,
        },
    )
    .await
    .expect("Failed to insert message");
}

pub async fn count(pool: &MySqlPool, query: &str, id: i32) -> i64 {
    sqlx::query_scalar::<_, i64>(query)
        .bind(id)
        .fetch_one(pool)
        .await
        .expect("Failed to count rows")
}
