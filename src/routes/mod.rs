use actix_web::web::{scope, ServiceConfig};
use actix_web::Scope;

use ai::explain_text;
use annotations::{
    create_book_annotation, create_video_annotation, delete_annotation, get_book_annotations,
    get_video_annotations, save_explanation,
};
use auth::{change_password, forgot_password, login, logout, me, reset_password, signup};
use books::{
    delete_book, get_book, get_book_file, get_book_stats, get_books, rename_book, update_progress,
    upload_book,
};
use chat::{get_book_messages, get_video_messages, send_book_message, send_video_message};
use courses::{
    create_course, delete_course, get_course, get_courses, import_drive_folder, rename_course,
};
use self::health_check::health_check as health_check_service;
use videos::{set_video_completion, stream_video};

mod ai;
mod annotations;
mod auth;
mod books;
mod chat;
mod courses;
mod health_check;
mod videos;

fn auth_routes() -> Scope {
    scope("auth")
        .service(signup)
        .service(login)
        .service(logout)
        .service(me)
        .service(change_password)
        .service(forgot_password)
        .service(reset_password)
}

fn books_routes() -> Scope {
    // `stats` must come before `{book_id}`.
    scope("books")
        .service(upload_book)
        .service(get_books)
        .service(get_book_stats)
        .service(get_book)
        .service(get_book_file)
        .service(update_progress)
        .service(rename_book)
        .service(delete_book)
        // annotations
        .service(create_book_annotation)
        .service(get_book_annotations)
        // chat
        .service(get_book_messages)
        .service(send_book_message)
}

fn annotations_routes() -> Scope {
    scope("annotations")
        .service(delete_annotation)
        .service(save_explanation)
}

fn courses_routes() -> Scope {
    scope("courses")
        .service(create_course)
        .service(get_courses)
        .service(get_course)
        .service(rename_course)
        .service(delete_course)
        .service(import_drive_folder)
}

fn videos_routes() -> Scope {
    scope("videos")
        .service(set_video_completion)
        .service(stream_video)
        .service(create_video_annotation)
        .service(get_video_annotations)
        .service(get_video_messages)
        .service(send_video_message)
}

fn ai_routes() -> Scope {
    scope("ai").service(explain_text)
}

pub fn study_hub_routes(conf: &mut ServiceConfig) {
    conf.service(
        scope("api/v1")
            .service(auth_routes())
            .service(books_routes())
            .service(annotations_routes())
            .service(courses_routes())
            .service(videos_routes())
            .service(ai_routes())
            .service(health_check_service),
    );
}
