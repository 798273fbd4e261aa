use actix_web::http::StatusCode;
use actix_web::ResponseError;
use claim::assert_err;

use crate::helpers::{count, seed_book, seed_message, seed_user, test_pool};
use study_hub::db::{annotations, books};
use study_hub::models::annotations::{AnnotationTarget, NewAnnotation, BOOK_HIGHLIGHT_COLOR};
use study_hub::models::messages::ChatSubject;

#[tokio::test]
async fn deleting_a_book_removes_its_annotations_and_messages() {
    let Some(pool) = test_pool().await else { return };
    let owner = seed_user(&pool, "reader@example.com").await;
    let book = seed_book(&pool, owner).await;
    let other_book = seed_book(&pool, owner).await;

    for book_id in [book.id, other_book.id] {
        annotations::insert_annotation(
            &pool,
            &NewAnnotation {
                user_id: owner,
                target: AnnotationTarget::Book { book_id, page_number: 3 },
                selected_text: "borrowing".to_string(),
                color: BOOK_HIGHLIGHT_COLOR.to_string(),
            },
        )
        .await
        .expect("Failed to insert annotation");
        seed_message(&pool, owner, ChatSubject::Book(book_id)).await;
    }

    books::delete_book(&pool, &book).await.expect("Failed to delete book");

    let annotations_left =
        count(&pool, "SELECT COUNT(*) FROM tbl_annotations WHERE book_id = ?", book.id).await;
    let messages_left =
        count(&pool, "SELECT COUNT(*) FROM tbl_messages WHERE book_id = ?", book.id).await;
    let books_left = count(&pool, "SELECT COUNT(*) FROM tbl_books WHERE id = ?", book.id).await;
    assert_eq!((annotations_left, messages_left, books_left), (0, 0, 0));

    // The other book keeps its data.
    let kept =
        count(&pool, "SELECT COUNT(*) FROM tbl_annotations WHERE book_id = ?", other_book.id).await;
    assert_eq!(kept, 1);
    let kept = count(&pool, "SELECT COUNT(*) FROM tbl_messages WHERE book_id = ?", other_book.id).await;
    assert_eq!(kept, 1);
}

#[tokio::test]
async fn books_are_only_visible_to_their_owner() {
    let Some(pool) = test_pool().await else { return };
    let owner = seed_user(&pool, "owner@example.com").await;
    let stranger = seed_user(&pool, "stranger@example.com").await;
    let book = seed_book(&pool, owner).await;

    let found = books::fetch_owned_book(&pool, book.id, owner)
        .await
        .expect("Owner should see the book");
    assert_eq!(found.id, book.id);

    let err = assert_err!(books::fetch_owned_book(&pool, book.id, stranger).await);
    assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
    assert_eq!(err.message(), "Book not found");

    assert!(books::fetch_books(&pool, stranger)
        .await
        .expect("Failed to list books")
        .is_empty());
}
