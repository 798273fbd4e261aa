use actix_files::NamedFile;
use actix_multipart::{Field, Multipart};
use actix_web::http::header::{ContentDisposition, DispositionParam, DispositionType};
use actix_web::{delete, get, post, put, web, HttpRequest, HttpResponse};
use futures_util::TryStreamExt;
use sqlx::MySqlPool;
use validator::Validate;

use crate::core::jwt_auth::JwtMiddleware;
use crate::core::utils::parse_title;
use crate::core::{AppError, AppSuccessResponse, BookStorage};
use crate::db::books;
use crate::models::books::{
    BookStats, BookView, ProgressUpdate, RenameBookRequest, UpdateProgressRequest,
};

struct UploadedFile {
    name: String,
    content_type: Option<String>,
    bytes: Vec<u8>,
}

async fn read_text_field(field: &mut Field) -> Result<String, AppError> {
    let mut data = Vec::new();
    while let Some(chunk) = field.try_next().await.map_err(|e| {
        AppError::validation_error(format!("Failed to read form field: {}", e))
    })? {
        data.extend_from_slice(&chunk);
    }
    String::from_utf8(data).map_err(|_| AppError::validation_error("Invalid text encoding"))
}

/// Reads at most `limit + 1` bytes so oversized uploads are detected
/// without buffering the whole body.
async fn read_file_field(field: &mut Field, limit: usize) -> Result<Vec<u8>, AppError> {
    let mut data = Vec::new();
    while let Some(chunk) = field
        .try_next()
        .await
        .map_err(|e| AppError::validation_error(format!("Failed to read file data: {}", e)))?
    {
        data.extend_from_slice(&chunk);
        if data.len() > limit {
            break;
        }
    }
    Ok(data)
}

#[tracing::instrument(name = "Upload book", skip(pool, storage, payload, auth), fields(user_id = auth.user_id))]
#[post("")]
pub async fn upload_book(
    pool: web::Data<MySqlPool>,
    storage: web::Data<BookStorage>,
    auth: JwtMiddleware,
    mut payload: Multipart,
) -> Result<HttpResponse, AppError> {
    let mut title = String::new();
    let mut upload: Option<UploadedFile> = None;

    while let Some(mut field) = payload.try_next().await.map_err(|e| {
        tracing::error!("Failed to read multipart field: {:?}", e);
        AppError::validation_error("Invalid file upload format")
    })? {
        let field_name = field.content_disposition().get_name().unwrap_or("").to_string();

        match field_name.as_str() {
            "title" => title = read_text_field(&mut field).await?,
            "file" => {
                let name = field
                    .content_disposition()
                    .get_filename()
                    .unwrap_or("book.pdf")
                    .to_string();
                let content_type = field.content_type().map(|ct| ct.essence_str().to_string());
                let bytes = read_file_field(&mut field, storage.max_book_size()).await?;
                upload = Some(UploadedFile {
                    name,
                    content_type,
                    bytes,
                });
            }
            _ => {
                while field
                    .try_next()
                    .await
                    .map_err(|_| AppError::validation_error("Invalid file upload format"))?
                    .is_some()
                {}
            }
        }
    }

    let upload = match upload {
        Some(upload) if !upload.bytes.is_empty() => upload,
        _ => return Err(AppError::validation_error("Title and file are required")),
    };
    if title.trim().is_empty() {
        return Err(AppError::validation_error("Title and file are required"));
    }
    let title = parse_title(&title, "Book")?;

    if upload.content_type.as_deref() != Some("application/pdf") {
        return Err(AppError::validation_error("Only PDF files are allowed"));
    }

    let stored = storage.store_pdf(&upload.name, &upload.bytes).await?;

    let book = match books::insert_book(&pool, auth.user_id, &title, &stored).await {
        Ok(book) => book,
        Err(e) => {
            storage.remove(&stored.storage_path).await;
            return Err(e);
        }
    };
    tracing::info!("Book {} uploaded ({} bytes)", book.id, book.file_size);

    Ok(HttpResponse::Created().json(AppSuccessResponse::new(
        BookView::from(book),
        "Book uploaded successfully",
    )))
}

#[tracing::instrument(name = "List books", skip(pool, auth), fields(user_id = auth.user_id))]
#[get("")]
pub async fn get_books(
    pool: web::Data<MySqlPool>,
    auth: JwtMiddleware,
) -> Result<HttpResponse, AppError> {
    let data: Vec<BookView> = books::fetch_books(&pool, auth.user_id)
        .await?
        .into_iter()
        .map(BookView::from)
        .collect();

    Ok(HttpResponse::Ok().json(AppSuccessResponse::new(data, "Books retrieved successfully")))
}

#[tracing::instrument(name = "Book stats", skip(pool, auth), fields(user_id = auth.user_id))]
#[get("/stats")]
pub async fn get_book_stats(
    pool: web::Data<MySqlPool>,
    auth: JwtMiddleware,
) -> Result<HttpResponse, AppError> {
    let rows = books::fetch_progress_rows(&pool, auth.user_id).await?;

    Ok(HttpResponse::Ok().json(AppSuccessResponse::new(
        BookStats::from_rows(&rows),
        "Book stats retrieved successfully",
    )))
}

#[tracing::instrument(name = "Get book", skip(pool, auth), fields(user_id = auth.user_id))]
#[get("/{book_id}")]
pub async fn get_book(
    pool: web::Data<MySqlPool>,
    auth: JwtMiddleware,
    book_id: web::Path<i32>,
) -> Result<HttpResponse, AppError> {
    let mut book = books::fetch_owned_book(&pool, book_id.into_inner(), auth.user_id).await?;
    books::touch_book(&pool, book.id).await?;
    book.last_accessed_at = chrono::Utc::now().naive_utc();

    Ok(HttpResponse::Ok().json(AppSuccessResponse::new(
        BookView::from(book),
        "Book retrieved successfully",
    )))
}

#[tracing::instrument(name = "Serve book file", skip(pool, auth, req), fields(user_id = auth.user_id))]
#[get("/{book_id}/file")]
pub async fn get_book_file(
    req: HttpRequest,
    pool: web::Data<MySqlPool>,
    auth: JwtMiddleware,
    book_id: web::Path<i32>,
) -> Result<HttpResponse, AppError> {
    let book = books::fetch_owned_book(&pool, book_id.into_inner(), auth.user_id).await?;

    let file = NamedFile::open_async(&book.storage_path).await.map_err(|e| {
        tracing::error!("Stored file for book {} is unreadable: {}", book.id, e);
        AppError::not_found("Book file not found")
    })?;

    // NamedFile answers Range requests with 206 on its own.
    Ok(file
        .set_content_disposition(ContentDisposition {
            disposition: DispositionType::Inline,
            parameters: vec![DispositionParam::Filename(book.file_name.clone())],
        })
        .into_response(&req))
}

#[tracing::instrument(name = "Update reading progress", skip(pool, auth, request), fields(user_id = auth.user_id))]
#[put("/{book_id}/progress")]
pub async fn update_progress(
    pool: web::Data<MySqlPool>,
    auth: JwtMiddleware,
    book_id: web::Path<i32>,
    request: web::Json<UpdateProgressRequest>,
) -> Result<HttpResponse, AppError> {
    request.validate()?;
    let book = books::fetch_owned_book(&pool, book_id.into_inner(), auth.user_id).await?;

    let update = ProgressUpdate::apply(request.into_inner(), &book);
    let book = books::update_progress(&pool, book.id, auth.user_id, &update).await?;

    Ok(HttpResponse::Ok().json(AppSuccessResponse::new(
        BookView::from(book),
        "Progress updated successfully",
    )))
}

#[tracing::instrument(name = "Rename book", skip(pool, auth, request), fields(user_id = auth.user_id))]
#[put("/{book_id}")]
pub async fn rename_book(
    pool: web::Data<MySqlPool>,
    auth: JwtMiddleware,
    book_id: web::Path<i32>,
    request: web::Json<RenameBookRequest>,
) -> Result<HttpResponse, AppError> {
    request.validate()?;
    let title = parse_title(&request.title, "Book")?;

    let book = books::rename_book(&pool, book_id.into_inner(), auth.user_id, &title).await?;

    Ok(HttpResponse::Ok().json(AppSuccessResponse::new(
        BookView::from(book),
        "Book renamed successfully",
    )))
}

#[tracing::instrument(name = "Delete book", skip(pool, storage, auth), fields(user_id = auth.user_id))]
#[delete("/{book_id}")]
pub async fn delete_book(
    pool: web::Data<MySqlPool>,
    storage: web::Data<BookStorage>,
    auth: JwtMiddleware,
    book_id: web::Path<i32>,
) -> Result<HttpResponse, AppError> {
    let book = books::fetch_owned_book(&pool, book_id.into_inner(), auth.user_id).await?;

    books::delete_book(&pool, &book).await?;
    storage.remove(&book.storage_path).await;
    tracing::info!("Book {} deleted", book.id);

    Ok(HttpResponse::Ok().json(AppSuccessResponse::new(
        serde_json::json!({ "id": book.id }),
        "Book deleted successfully",
    )))
}
