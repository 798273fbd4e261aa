use chrono::Utc;
use sqlx::MySqlPool;

use crate::core::storage::StoredFile;
use crate::core::AppError;
use crate::models::books::{Book, BookProgressRow, ProgressUpdate};

const BOOK_COLUMNS: &str = r#"
    id, owner_id, title, file_name, storage_path, file_size, total_pages,
    current_page, scroll_top, highlighted_text, progress, is_completed,
    uploaded_at, last_accessed_at, created_at, updated_at
"#;

pub async fn insert_book(
    pool: &MySqlPool,
    owner_id: i32,
    title: &str,
    file: &StoredFile,
) -> Result<Book, AppError> {
    let now = Utc::now().naive_utc();

    let result = sqlx::query(
        r#"
        INSERT INTO tbl_books (
            owner_id, title, file_name, storage_path, file_size, total_pages,
            current_page, progress, is_completed, uploaded_at, last_accessed_at,
            created_at, updated_at
        )
        VALUES (?, ?, ?, ?, ?, 0, 1, 0, FALSE, ?, ?, ?, ?)
        "#,
    )
    .bind(owner_id)
    .bind(title)
    .bind(&file.file_name)
    .bind(&file.storage_path)
    .bind(file.file_size)
    .bind(now)
    .bind(now)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await
    .map_err(AppError::db_error)?;

    fetch_owned_book(pool, result.last_insert_id() as i32, owner_id).await
}

pub async fn fetch_books(pool: &MySqlPool, owner_id: i32) -> Result<Vec<Book>, AppError> {
    sqlx::query_as::<_, Book>(&format!(
        "SELECT {} FROM tbl_books WHERE owner_id = ? ORDER BY last_accessed_at DESC, id DESC",
        BOOK_COLUMNS
    ))
    .bind(owner_id)
    .fetch_all(pool)
    .await
    .map_err(AppError::db_error)
}

/// 404 "Book not found" when the book is missing or belongs to someone else.
pub async fn fetch_owned_book(
    pool: &MySqlPool,
    book_id: i32,
    owner_id: i32,
) -> Result<Book, AppError> {
    sqlx::query_as::<_, Book>(&format!(
        "SELECT {} FROM tbl_books WHERE id = ? AND owner_id = ?",
        BOOK_COLUMNS
    ))
    .bind(book_id)
    .bind(owner_id)
    .fetch_optional(pool)
    .await
    .map_err(AppError::db_error)?
    .ok_or_else(|| AppError::not_found("Book not found"))
}

pub async fn touch_book(pool: &MySqlPool, book_id: i32) -> Result<(), AppError> {
    sqlx::query("UPDATE tbl_books SET last_accessed_at = ? WHERE id = ?")
        .bind(Utc::now().naive_utc())
        .bind(book_id)
        .execute(pool)
        .await
        .map_err(AppError::db_error)?;
    Ok(())
}

pub async fn update_progress(
    pool: &MySqlPool,
    book_id: i32,
    owner_id: i32,
    update: &ProgressUpdate,
) -> Result<Book, AppError> {
    let now = Utc::now().naive_utc();

    sqlx::query(
        r#"
        UPDATE tbl_books
        SET current_page = ?, total_pages = ?, progress = ?, is_completed = ?,
            scroll_top = COALESCE(?, scroll_top),
            highlighted_text = COALESCE(?, highlighted_text),
            last_accessed_at = ?, updated_at = ?
        WHERE id = ? AND owner_id = ?
        "#,
    )
    .bind(update.current_page)
    .bind(update.total_pages)
    .bind(update.progress)
    .bind(update.is_completed)
    .bind(update.scroll_top)
    .bind(update.highlighted_text.as_deref())
    .bind(now)
    .bind(now)
    .bind(book_id)
    .bind(owner_id)
    .execute(pool)
    .await
    .map_err(AppError::db_error)?;

    fetch_owned_book(pool, book_id, owner_id).await
}

pub async fn rename_book(
    pool: &MySqlPool,
    book_id: i32,
    owner_id: i32,
    title: &str,
) -> Result<Book, AppError> {
    sqlx::query("UPDATE tbl_books SET title = ?, updated_at = ? WHERE id = ? AND owner_id = ?")
        .bind(title)
        .bind(Utc::now().naive_utc())
        .bind(book_id)
        .bind(owner_id)
        .execute(pool)
        .await
        .map_err(AppError::db_error)?;

    fetch_owned_book(pool, book_id, owner_id).await
}

/// Removes the book with its annotations and messages. The caller unlinks
/// the stored file once this commits.
pub async fn delete_book(pool: &MySqlPool, book: &Book) -> Result<(), AppError> {
    let mut tx = pool.begin().await.map_err(AppError::db_error)?;

    sqlx::query("DELETE FROM tbl_messages WHERE book_id = ?")
        .bind(book.id)
        .execute(tx.as_mut())
        .await
        .map_err(AppError::db_error)?;

    sqlx::query("DELETE FROM tbl_annotations WHERE book_id = ?")
        .bind(book.id)
        .execute(tx.as_mut())
        .await
        .map_err(AppError::db_error)?;

    sqlx::query("DELETE FROM tbl_books WHERE id = ? AND owner_id = ?")
        .bind(book.id)
        .bind(book.owner_id)
        .execute(tx.as_mut())
        .await
        .map_err(AppError::db_error)?;

    tx.commit().await.map_err(AppError::db_error)?;
    Ok(())
}

pub async fn fetch_progress_rows(
    pool: &MySqlPool,
    owner_id: i32,
) -> Result<Vec<BookProgressRow>, AppError> {
    sqlx::query_as::<_, BookProgressRow>(
        "SELECT total_pages, progress, is_completed FROM tbl_books WHERE owner_id = ?",
    )
    .bind(owner_id)
    .fetch_all(pool)
    .await
    .map_err(AppError::db_error)
}
