use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// A book counts as finished from this percentage on.
pub const COMPLETION_THRESHOLD: i32 = 95;

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Book {
    pub id: i32,
    pub owner_id: i32,
    pub title: String,
    pub file_name: String,
    #[serde(skip_serializing)]
    pub storage_path: String,
    pub file_size: i64,
    pub total_pages: i32,
    pub current_page: i32,
    pub scroll_top: Option<f64>,
    pub highlighted_text: Option<String>,
    pub progress: i32,
    pub is_completed: bool,
    pub uploaded_at: NaiveDateTime,
    pub last_accessed_at: NaiveDateTime,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Serialize)]
pub struct BookView {
    #[serde(flatten)]
    pub book: Book,
    pub file_url: String,
}

impl From<Book> for BookView {
    fn from(book: Book) -> Self {
        Self {
            file_url: format!("/api/v1/books/{}/file", book.id),
            book,
        }
    }
}

#[derive(Validate, Debug, Deserialize)]
pub struct UpdateProgressRequest {
    #[validate(range(min = 1, message = "Current page must be at least 1"))]
    pub current_page: i32,
    #[validate(range(min = 1, message = "Total pages must be at least 1"))]
    pub total_pages: Option<i32>,
    pub scroll_top: Option<f64>,
    pub highlighted_text: Option<String>,
}

#[derive(Validate, Debug, Default, Deserialize)]
#[serde(default)]
pub struct RenameBookRequest {
    #[validate(length(min = 1, message = "Book title is required"))]
    pub title: String,
}

/// Column values written by a progress update.
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressUpdate {
    pub current_page: i32,
    pub total_pages: i32,
    pub progress: i32,
    pub is_completed: bool,
    pub scroll_top: Option<f64>,
    pub highlighted_text: Option<String>,
}

impl ProgressUpdate {
    /// Without a page count in the request the stored progress is kept.
    pub fn apply(request: UpdateProgressRequest, book: &Book) -> Self {
        let (total_pages, progress, is_completed) = match request.total_pages {
            Some(total) => {
                let progress = reading_progress(request.current_page, total);
                (total, progress, progress >= COMPLETION_THRESHOLD)
            }
            None => (book.total_pages, book.progress, book.is_completed),
        };

        Self {
            current_page: request.current_page,
            total_pages,
            progress,
            is_completed,
            scroll_top: request.scroll_top,
            highlighted_text: request.highlighted_text,
        }
    }
}

/// Whole-number percentage of `current_page` over `total_pages`, clamped
/// to 0..=100.
pub fn reading_progress(current_page: i32, total_pages: i32) -> i32 {
    if total_pages <= 0 {
        return 0;
    }
    let ratio = f64::from(current_page) / f64::from(total_pages) * 100.0;
    (ratio.round() as i32).clamp(0, 100)
}

#[derive(Debug, Clone, FromRow)]
pub struct BookProgressRow {
    pub total_pages: i32,
    pub progress: i32,
    pub is_completed: bool,
}

#[derive(Debug, Default, PartialEq, Serialize)]
pub struct BookStats {
    pub total_books: i64,
    pub completed_books: i64,
    pub in_progress_books: i64,
    pub total_pages: i64,
    pub read_pages: i64,
    pub average_progress: i64,
}

impl BookStats {
    pub fn from_rows(rows: &[BookProgressRow]) -> Self {
        if rows.is_empty() {
            return Self::default();
        }

        let mut stats = Self {
            total_books: rows.len() as i64,
            ..Self::default()
        };
        let mut progress_sum: i64 = 0;

        for row in rows {
            if row.is_completed {
                stats.completed_books += 1;
            }
            stats.total_pages += i64::from(row.total_pages);
            stats.read_pages +=
                (f64::from(row.progress) / 100.0 * f64::from(row.total_pages)).floor() as i64;
            progress_sum += i64::from(row.progress);
        }

        // Unstarted books count as in progress.
        stats.in_progress_books = stats.total_books - stats.completed_books;
        stats.average_progress = (progress_sum as f64 / rows.len() as f64).round() as i64;
        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn book(total_pages: i32, progress: i32, is_completed: bool) -> Book {
        let now = Utc::now().naive_utc();
        Book {
            id: 7,
            owner_id: 1,
            title: "Rust in Action".into(),
            file_name: "x-rust.pdf".into(),
            storage_path: "/tmp/x-rust.pdf".into(),
            file_size: 10,
            total_pages,
            current_page: 1,
            scroll_top: None,
            highlighted_text: None,
            progress,
            is_completed,
            uploaded_at: now,
            last_accessed_at: now,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn progress_is_rounded_and_clamped() {
        assert_eq!(reading_progress(1, 3), 33);
        assert_eq!(reading_progress(2, 3), 67);
        assert_eq!(reading_progress(250, 200), 100);
        assert_eq!(reading_progress(5, 0), 0);
    }

    #[test]
    fn ninety_five_percent_counts_as_completed() {
        let request = UpdateProgressRequest {
            current_page: 95,
            total_pages: Some(100),
            scroll_top: Some(120.5),
            highlighted_text: None,
        };
        let update = ProgressUpdate::apply(request, &book(0, 0, false));
        assert_eq!(update.progress, 95);
        assert!(update.is_completed);
        assert_eq!(update.total_pages, 100);
    }

    #[test]
    fn page_only_updates_keep_stored_progress() {
        let request = UpdateProgressRequest {
            current_page: 40,
            total_pages: None,
            scroll_top: None,
            highlighted_text: Some("ownership".into()),
        };
        let update = ProgressUpdate::apply(request, &book(300, 12, false));
        assert_eq!(update.current_page, 40);
        assert_eq!(update.progress, 12);
        assert_eq!(update.total_pages, 300);
        assert!(!update.is_completed);
    }

    #[test]
    fn book_views_link_to_the_file_endpoint_and_hide_the_disk_path() {
        let json = serde_json::to_value(BookView::from(book(10, 0, false))).expect("serialize");
        assert_eq!(json["file_url"], "/api/v1/books/7/file");
        assert!(json.get("storage_path").is_none());
        assert_eq!(json["title"], "Rust in Action");
    }

    #[test]
    fn stats_aggregate_pages_and_progress() {
        let rows = vec![
            BookProgressRow { total_pages: 200, progress: 50, is_completed: false },
            BookProgressRow { total_pages: 100, progress: 100, is_completed: true },
            BookProgressRow { total_pages: 33, progress: 0, is_completed: false },
        ];
        let stats = BookStats::from_rows(&rows);
        assert_eq!(
            stats,
            BookStats {
                total_books: 3,
                completed_books: 1,
                in_progress_books: 2,
                total_pages: 333,
                read_pages: 200,
                average_progress: 50,
            }
        );
    }

    #[test]
    fn unstarted_books_count_as_in_progress() {
        let rows = vec![
            BookProgressRow { total_pages: 0, progress: 0, is_completed: false },
            BookProgressRow { total_pages: 10, progress: 100, is_completed: true },
        ];
        let stats = BookStats::from_rows(&rows);
        assert_eq!(stats.in_progress_books, 1);
        assert_eq!(stats.completed_books, 1);
    }

    #[test]
    fn empty_library_has_zeroed_stats() {
        assert_eq!(BookStats::from_rows(&[]), BookStats::default());
    }
}
