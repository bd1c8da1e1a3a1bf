//! Search and offset pagination over the book collection.

use shelf_db::DbError;
use shelf_kernel::settings::BooksSettings;

use super::{
    models::{Book, ListParams, Pagination},
    repository::BooksRepository,
};

/// A normalized listing request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    /// 1-based page number
    pub page: u32,
    pub limit: u32,
    /// Trimmed, non-empty search text
    pub search: Option<String>,
}

impl PageRequest {
    /// Parse raw query parameters. Unparsable or missing values fall back to
    /// defaults and `limit` is clamped to the configured maximum.
    pub fn from_params(params: &ListParams, paging: &BooksSettings) -> Self {
        let max_limit = paging.max_page_size.max(1);

        let page = params
            .page
            .as_deref()
            .and_then(|raw| raw.trim().parse::<i64>().ok())
            .map(|page| page.clamp(1, i64::from(u32::MAX)) as u32)
            .unwrap_or(1);

        let limit = params
            .limit
            .as_deref()
            .and_then(|raw| raw.trim().parse::<i64>().ok())
            .map(|limit| limit.clamp(1, i64::from(max_limit)) as u32)
            .unwrap_or_else(|| paging.default_page_size.clamp(1, max_limit));

        let search = params
            .search
            .as_deref()
            .map(str::trim)
            .filter(|term| !term.is_empty())
            .map(str::to_string);

        Self {
            page,
            limit,
            search,
        }
    }

    /// Number of matching records to skip
    pub fn skip(&self) -> usize {
        (self.page as usize - 1).saturating_mul(self.limit as usize)
    }
}

/// Lowercased title, author, isbn and genre as one searchable string.
/// The separator keeps a search term from matching across two fields.
pub fn search_text(book: &Book) -> String {
    [&book.title, &book.author, &book.isbn, &book.genre]
        .iter()
        .map(|field| field.to_lowercase())
        .collect::<Vec<_>>()
        .join("\u{1f}")
}

/// `ceil(total / limit)`, zero when nothing matches
pub fn total_pages(total: u64, limit: u32) -> u32 {
    let limit = u64::from(limit.max(1));
    u32::try_from(total.div_ceil(limit)).unwrap_or(u32::MAX)
}

/// Run a listing request: case-insensitive substring search over title,
/// author, isbn and genre, newest records first
pub async fn list(
    books: &BooksRepository,
    request: &PageRequest,
) -> Result<(Vec<Book>, Pagination), DbError> {
    let needle = request.search.as_deref().map(str::to_lowercase);

    let total = books.count(needle.as_deref()).await?;
    let items = books
        .list(needle.as_deref(), request.limit, request.skip())
        .await?;

    let pagination = Pagination {
        page: request.page,
        limit: request.limit,
        total_books: total,
        total_pages: total_pages(total, request.limit),
    };

    Ok((items, pagination))
}
