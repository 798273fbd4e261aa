use actix_web::http::StatusCode;
use actix_web::ResponseError;
use claim::assert_err;

use crate::helpers::{count, seed_course, seed_message, seed_user, test_pool};
use study_hub::db::{annotations, courses, videos};
use study_hub::models::annotations::{AnnotationTarget, NewAnnotation, VIDEO_NOTE_COLOR};
use study_hub::models::messages::ChatSubject;
use study_hub::models::videos::NewVideo;

#[tokio::test]
async fn deleting_a_course_removes_videos_with_their_notes_and_chat() {
    let Some(pool) = test_pool().await else { return };
    let owner = seed_user(&pool, "student@example.com").await;
    let course = seed_course(&pool, owner, 2).await;
    let course_videos = videos::fetch_course_videos(&pool, course.id)
        .await
        .expect("Failed to list videos");

    for video in &course_videos {
        annotations::insert_annotation(
            &pool,
            &NewAnnotation {
                user_id: owner,
                target: AnnotationTarget::Video {
                    video_id: video.id,
                    timestamp_seconds: 42.5,
                },
                selected_text: "pattern matching".to_string(),
                color: VIDEO_NOTE_COLOR.to_string(),
            },
        )
        .await
        .expect("Failed to insert note");
        seed_message(&pool, owner, ChatSubject::Video(video.id)).await;
    }

    courses::delete_course(&pool, &course)
        .await
        .expect("Failed to delete course");

    for video in &course_videos {
        let notes =
            count(&pool, "SELECT COUNT(*) FROM tbl_annotations WHERE video_id = ?", video.id).await;
        let chat = count(&pool, "SELECT COUNT(*) FROM tbl_messages WHERE video_id = ?", video.id).await;
        assert_eq!((notes, chat), (0, 0));
    }
    let videos_left =
        count(&pool, "SELECT COUNT(*) FROM tbl_videos WHERE course_id = ?", course.id).await;
    let courses_left = count(&pool, "SELECT COUNT(*) FROM tbl_courses WHERE id = ?", course.id).await;
    assert_eq!((videos_left, courses_left), (0, 0));
}

#[tokio::test]
async fn videos_are_only_visible_to_the_course_owner() {
    let Some(pool) = test_pool().await else { return };
    let owner = seed_user(&pool, "owner@example.com").await;
    let stranger = seed_user(&pool, "stranger@example.com").await;
    let course = seed_course(&pool, owner, 1).await;
    let video = &videos::fetch_course_videos(&pool, course.id)
        .await
        .expect("Failed to list videos")[0];

    let context = videos::fetch_owned_video(&pool, video.id, owner)
        .await
        .expect("Owner should see the video");
    assert_eq!(context.course_title, "Rust 101");
    assert_eq!(context.source_type, "local");

    let err = assert_err!(videos::fetch_owned_video(&pool, video.id, stranger).await);
    assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
    assert_eq!(err.message(), "Video not found");

    let err = assert_err!(courses::fetch_owned_course(&pool, course.id, stranger).await);
    assert_eq!(err.message(), "Course not found");
}

#[tokio::test]
async fn completion_changes_recount_completed_videos() {
    let Some(pool) = test_pool().await else { return };
    let owner = seed_user(&pool, "student@example.com").await;
    let course = seed_course(&pool, owner, 3).await;
    let course_videos = videos::fetch_course_videos(&pool, course.id)
        .await
        .expect("Failed to list videos");

    let mut counts = (0, 0);
    for video in &course_videos[..2] {
        let context = videos::fetch_owned_video(&pool, video.id, owner)
            .await
            .expect("Video not found");
        counts = videos::set_completion(&pool, &context, true)
            .await
            .expect("Failed to complete video");
    }
    assert_eq!(counts, (2, 3));

    // Completing twice does not double count.
    let first = videos::fetch_owned_video(&pool, course_videos[0].id, owner)
        .await
        .expect("Video not found");
    let counts = videos::set_completion(&pool, &first, true)
        .await
        .expect("Failed to complete video");
    assert_eq!(counts, (2, 3));

    let counts = videos::set_completion(&pool, &first, false)
        .await
        .expect("Failed to reset video");
    assert_eq!(counts, (1, 3));

    let stored = courses::fetch_owned_course(&pool, course.id, owner)
        .await
        .expect("Course not found");
    assert_eq!(stored.completed_videos, 1);
}

#[tokio::test]
async fn appended_videos_continue_the_sort_order() {
    let Some(pool) = test_pool().await else { return };
    let owner = seed_user(&pool, "student@example.com").await;
    let course = seed_course(&pool, owner, 2).await;

    let imported = vec![
        NewVideo {
            title: "3 Traits".to_string(),
            video_url: "https://drive.google.com/file/d/a/preview".to_string(),
        },
        NewVideo {
            title: "4 Generics".to_string(),
            video_url: "https://drive.google.com/file/d/b/preview".to_string(),
        },
    ];
    let total = courses::append_videos(&pool, &course, &imported)
        .await
        .expect("Failed to append videos");
    assert_eq!(total, 4);

    let course_videos = videos::fetch_course_videos(&pool, course.id)
        .await
        .expect("Failed to list videos");
    let orders: Vec<i32> = course_videos.iter().map(|v| v.sort_order).collect();
    assert_eq!(orders, vec![0, 1, 2, 3]);
    assert_eq!(course_videos[2].title, "3 Traits");
    assert_eq!(course_videos[3].title, "4 Generics");

    let stored = courses::fetch_owned_course(&pool, course.id, owner)
        .await
        .expect("Course not found");
    assert_eq!(stored.total_videos, 4);
}
