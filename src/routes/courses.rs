use actix_web::{delete, get, post, put, web, HttpResponse};
use sqlx::MySqlPool;
use validator::Validate;

use crate::core::drive_service::{parse_folder_id, validate_drive_link};
use crate::core::jwt_auth::JwtMiddleware;
use crate::core::storage::scan_video_folder;
use crate::core::utils::parse_title;
use crate::core::{AppError, AppSuccessResponse, BookStorage, DriveClient, RedisHelper};
use crate::db::{courses, videos};
use crate::models::courses::{
    CourseCreated, CourseDetail, CreateCourseRequest, DriveImportRequest, DriveImportResult,
    RenameCourseRequest, SourceType,
};
use crate::models::videos::NewVideo;

const FOLDER_PICKER_PREFIX: &str = "[Selected Folder:";
const INACCESSIBLE_PLACEHOLDER: &str = "Local videos (path not accessible)";

/// Videos found in a local folder. A missing or unreadable folder yields a
/// single placeholder pointing at the raw path.
async fn local_course_videos(storage: &BookStorage, raw: &str) -> Result<Vec<NewVideo>, AppError> {
    if raw.starts_with(FOLDER_PICKER_PREFIX) {
        return Err(AppError::validation_error(
            "Folder picker cannot be used for server-side local access. Please enter the absolute folder path",
        ));
    }

    let root = storage.resolve_local_media(raw)?;

    match scan_video_folder(&root).await {
        Ok(found) => Ok(found
            .into_iter()
            .map(|(title, path)| NewVideo {
                title,
                video_url: path.to_string_lossy().into_owned(),
            })
            .collect()),
        Err(e) => {
            tracing::warn!("Local folder {} is not readable: {}", root.display(), e);
            Ok(vec![NewVideo {
                title: INACCESSIBLE_PLACEHOLDER.to_string(),
                video_url: raw.to_string(),
            }])
        }
    }
}

#[tracing::instrument(name = "Create course", skip(pool, storage, drive, cache, auth, request), fields(user_id = auth.user_id))]
#[post("")]
pub async fn create_course(
    pool: web::Data<MySqlPool>,
    storage: web::Data<BookStorage>,
    drive: web::Data<DriveClient>,
    cache: web::Data<RedisHelper>,
    auth: JwtMiddleware,
    request: web::Json<CreateCourseRequest>,
) -> Result<HttpResponse, AppError> {
    request.validate()?;
    let title = parse_title(&request.title, "Course")?;
    let source_type = SourceType::try_from(request.source_type.as_str())?;
    let source = request.source_path_or_link.trim();

    let course_videos: Vec<NewVideo> = match source_type {
        SourceType::GoogleDrive => {
            if !validate_drive_link(source) {
                return Err(AppError::validation_error("Invalid Google Drive link format"));
            }
            drive
                .videos_for_link(source, &cache)
                .await?
                .into_iter()
                .map(NewVideo::from)
                .collect()
        }
        SourceType::Local => local_course_videos(&storage, source).await?,
    };

    let course_id = courses::create_course(
        &pool,
        auth.user_id,
        &title,
        source_type,
        source,
        &course_videos,
    )
    .await?;
    tracing::info!("Course {} created with {} videos", course_id, course_videos.len());

    Ok(HttpResponse::Created().json(AppSuccessResponse::new(
        CourseCreated {
            course_id,
            total_videos: course_videos.len(),
        },
        "Course created successfully",
    )))
}

#[tracing::instrument(name = "List courses", skip(pool, auth), fields(user_id = auth.user_id))]
#[get("")]
pub async fn get_courses(
    pool: web::Data<MySqlPool>,
    auth: JwtMiddleware,
) -> Result<HttpResponse, AppError> {
    let data = courses::fetch_courses(&pool, auth.user_id).await?;

    Ok(HttpResponse::Ok().json(AppSuccessResponse::new(data, "Courses retrieved successfully")))
}

#[tracing::instrument(name = "Get course", skip(pool, auth), fields(user_id = auth.user_id))]
#[get("/{course_id}")]
pub async fn get_course(
    pool: web::Data<MySqlPool>,
    auth: JwtMiddleware,
    course_id: web::Path<i32>,
) -> Result<HttpResponse, AppError> {
    let course = courses::fetch_owned_course(&pool, course_id.into_inner(), auth.user_id).await?;
    let course_videos = videos::fetch_course_videos(&pool, course.id).await?;

    Ok(HttpResponse::Ok().json(AppSuccessResponse::new(
        CourseDetail {
            course,
            videos: course_videos,
        },
        "Course retrieved successfully",
    )))
}

#[tracing::instrument(name = "Rename course", skip(pool, auth, request), fields(user_id = auth.user_id))]
#[put("/{course_id}")]
pub async fn rename_course(
    pool: web::Data<MySqlPool>,
    auth: JwtMiddleware,
    course_id: web::Path<i32>,
    request: web::Json<RenameCourseRequest>,
) -> Result<HttpResponse, AppError> {
    request.validate()?;
    let title = parse_title(&request.title, "Course")?;

    let course = courses::rename_course(&pool, course_id.into_inner(), auth.user_id, &title).await?;

    Ok(HttpResponse::Ok().json(AppSuccessResponse::new(course, "Course renamed successfully")))
}

#[tracing::instrument(name = "Delete course", skip(pool, auth), fields(user_id = auth.user_id))]
#[delete("/{course_id}")]
pub async fn delete_course(
    pool: web::Data<MySqlPool>,
    auth: JwtMiddleware,
    course_id: web::Path<i32>,
) -> Result<HttpResponse, AppError> {
    let course = courses::fetch_owned_course(&pool, course_id.into_inner(), auth.user_id).await?;
    courses::delete_course(&pool, &course).await?;
    tracing::info!("Course {} deleted", course.id);

    Ok(HttpResponse::Ok().json(AppSuccessResponse::new(
        serde_json::json!({ "id": course.id }),
        "Course deleted successfully",
    )))
}

#[tracing::instrument(name = "Import Drive folder", skip(pool, drive, cache, auth, request), fields(user_id = auth.user_id))]
#[post("/{course_id}/drive-import")]
pub async fn import_drive_folder(
    pool: web::Data<MySqlPool>,
    drive: web::Data<DriveClient>,
    cache: web::Data<RedisHelper>,
    auth: JwtMiddleware,
    course_id: web::Path<i32>,
    request: web::Json<DriveImportRequest>,
) -> Result<HttpResponse, AppError> {
    request.validate()?;
    let course = courses::fetch_owned_course(&pool, course_id.into_inner(), auth.user_id).await?;

    let folder_id = parse_folder_id(&request.folder_link)
        .ok_or_else(|| AppError::validation_error("Invalid Google Drive folder link"))?;

    let imported: Vec<NewVideo> = drive
        .list_folder_videos(&folder_id, &cache)
        .await?
        .into_iter()
        .map(NewVideo::from)
        .collect();

    let total_videos = courses::append_videos(&pool, &course, &imported).await?;
    tracing::info!("Imported {} Drive videos into course {}", imported.len(), course.id);

    Ok(HttpResponse::Ok().json(AppSuccessResponse::new(
        DriveImportResult {
            imported: imported.len(),
            total_videos,
        },
        "Drive videos imported successfully",
    )))
}
