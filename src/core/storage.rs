use std::path::{Component, Path, PathBuf};

use uuid::Uuid;

use crate::core::config::StorageConfig;
use crate::core::drive_service::natural_cmp;
use crate::core::AppError;

const PDF_MAGIC: &[u8] = b"%PDF-";
pub const VIDEO_EXTENSIONS: [&str; 7] = ["mp4", "avi", "mov", "wmv", "flv", "webm", "mkv"];

/// Where uploaded books live on disk.
pub struct BookStorage {
    books_dir: PathBuf,
    max_book_size: usize,
    local_media_roots: Vec<PathBuf>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StoredFile {
    pub file_name: String,
    pub storage_path: String,
    pub file_size: i64,
}

impl BookStorage {
    pub fn new(config: &StorageConfig) -> Self {
        Self {
            books_dir: config.upload_dir.join("books"),
            max_book_size: config.max_book_size,
            local_media_roots: config
                .local_media_roots
                .iter()
                .map(|root| absolutize(root))
                .collect(),
        }
    }

    pub fn max_book_size(&self) -> usize {
        self.max_book_size
    }

    /// Writes the PDF under a collision-free name. Nothing is written when
    /// the bytes are not a PDF or exceed the size limit.
    pub async fn store_pdf(&self, original_name: &str, bytes: &[u8]) -> Result<StoredFile, AppError> {
        validate_pdf(bytes, self.max_book_size)?;

        tokio::fs::create_dir_all(&self.books_dir).await.map_err(|e| {
            AppError::storage_error("Failed to prepare upload directory", e)
        })?;

        let file_name = format!("{}-{}", Uuid::new_v4(), sanitize_file_name(original_name));
        let path = self.books_dir.join(&file_name);

        tokio::fs::write(&path, bytes)
            .await
            .map_err(|e| AppError::storage_error("Failed to save file", e))?;

        tracing::info!("Book file saved to {}", path.display());

        Ok(StoredFile {
            file_name,
            storage_path: path.to_string_lossy().into_owned(),
            file_size: bytes.len() as i64,
        })
    }

    /// Best effort; a missing file is not an error.
    pub async fn remove(&self, storage_path: &str) {
        if let Err(e) = tokio::fs::remove_file(storage_path).await {
            if e.kind() != std::io::ErrorKind::NotFound {
                tracing::error!("Failed to delete file {} from disk: {}", storage_path, e);
            }
        }
    }

    /// Resolves `raw` and checks it sits under an allowed media root. With
    /// no roots configured only paths below the working directory pass.
    pub fn resolve_local_media(&self, raw: &str) -> Result<PathBuf, AppError> {
        let resolved = absolutize(Path::new(raw));
        let allowed = if self.local_media_roots.is_empty() {
            std::env::current_dir()
                .map(|cwd| resolved.starts_with(absolutize(&cwd)))
                .unwrap_or(false)
        } else {
            self.local_media_roots
                .iter()
                .any(|root| resolved.starts_with(root))
        };

        if !allowed {
            return Err(AppError::forbidden_error(
                "Local path is not within allowed media roots",
            ));
        }
        Ok(resolved)
    }
}

pub fn validate_pdf(bytes: &[u8], max_size: usize) -> Result<(), AppError> {
    if bytes.len() > max_size {
        return Err(AppError::validation_error(format!(
            "File size must be less than {}MB",
            max_size / (1024 * 1024)
        )));
    }
    if !bytes.starts_with(PDF_MAGIC) {
        return Err(AppError::validation_error("Only PDF files are allowed"));
    }
    Ok(())
}

/// Everything outside `[A-Za-z0-9.-]` becomes `_`; the name always ends
/// in `.pdf` so the file is served with the right content type.
pub fn sanitize_file_name(name: &str) -> String {
    let base = Path::new(name)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '.' || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect();

    if cleaned.trim_matches('.').is_empty() {
        "book.pdf".to_string()
    } else if !cleaned.to_lowercase().ends_with(".pdf") {
        format!("{}.pdf", cleaned)
    } else {
        cleaned
    }
}

pub fn is_video_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| VIDEO_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
        .unwrap_or(false)
}

/// Video files directly inside `dir` as `(title, path)` pairs in natural
/// title order. The title is the file stem.
pub async fn scan_video_folder(dir: &Path) -> std::io::Result<Vec<(String, PathBuf)>> {
    let mut entries = tokio::fs::read_dir(dir).await?;
    let mut found = Vec::new();

    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if !entry.file_type().await?.is_file() || !is_video_file(&path) {
            continue;
        }
        let title = path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_default();
        found.push((title, path));
    }

    found.sort_by(|(a, _), (b, _)| natural_cmp(a, b));
    Ok(found)
}

/// Lexical absolute path: joins onto the working directory and folds `.`
/// and `..` without touching the filesystem.
pub fn absolutize(path: &Path) -> PathBuf {
    let joined = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .map(|cwd| cwd.join(path))
            .unwrap_or_else(|_| path.to_path_buf())
    };

    let mut normalized = PathBuf::new();
    for component in joined.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                normalized.pop();
            }
            other => normalized.push(other.as_os_str()),
        }
    }
    normalized
}
