//! Book CRUD composed from validation, query and the repository.

use shelf_db::Database;
use shelf_kernel::settings::BooksSettings;
use time::OffsetDateTime;
use uuid::Uuid;

use super::{
    error::BooksError,
    models::{Book, BookInput, ListParams, Pagination},
    query::{self, PageRequest},
    repository::BooksRepository,
    validation::{self, normalize_isbn},
};

#[derive(Debug, Clone)]
pub struct BooksService {
    books: BooksRepository,
    paging: BooksSettings,
}

impl BooksService {
    pub fn new(books: BooksRepository, paging: BooksSettings) -> Self {
        Self { books, paging }
    }

    /// Service over the `books` table of a migrated database
    pub fn open(db: &Database, paging: BooksSettings) -> Self {
        Self::new(BooksRepository::new(db.pool().clone()), paging)
    }

    pub async fn count(&self) -> Result<u64, BooksError> {
        Ok(self.books.count(None).await?)
    }

    /// Validate and insert a new book
    pub async fn create(&self, input: &BookInput) -> Result<Book, BooksError> {
        let new_book = validation::validate_new(input).map_err(BooksError::Validation)?;
        let key = normalize_isbn(&new_book.isbn);

        if self.books.get_by_isbn_key(&key).await?.is_some() {
            return Err(BooksError::Conflict { isbn: key });
        }

        // A racing insert of the same isbn fails on the unique index.
        let book = self
            .books
            .insert(&new_book.into_book(OffsetDateTime::now_utc()))
            .await
            .map_err(|error| BooksError::from_write(error, &key))?;

        tracing::info!(book_id = %book.id, isbn = %book.isbn, "book created");
        Ok(book)
    }

    pub async fn get(&self, id: &str) -> Result<Book, BooksError> {
        let id = parse_id(id)?;
        self.books.get(id).await?.ok_or(BooksError::NotFound)
    }

    /// Search and page through the books
    pub async fn list(&self, params: &ListParams) -> Result<(Vec<Book>, Pagination), BooksError> {
        let request = PageRequest::from_params(params, &self.paging);
        let (books, pagination) = query::list(&self.books, &request).await?;

        tracing::debug!(
            search = ?request.search,
            page = pagination.page,
            limit = pagination.limit,
            total = pagination.total_books,
            "listed books"
        );

        Ok((books, pagination))
    }

    /// Apply the supplied fields of `input` to an existing book
    pub async fn update(&self, id: &str, input: &BookInput) -> Result<Book, BooksError> {
        let id = parse_id(id)?;
        let existing = self.books.get(id).await?.ok_or(BooksError::NotFound)?;

        let patch = validation::validate_patch(input).map_err(BooksError::Validation)?;

        let key = patch
            .isbn
            .as_deref()
            .map(normalize_isbn)
            .unwrap_or_else(|| existing.isbn_key());
        if key != existing.isbn_key() {
            let taken = self
                .books
                .get_by_isbn_key(&key)
                .await?
                .is_some_and(|other| other.id != id);
            if taken {
                return Err(BooksError::Conflict { isbn: key });
            }
        }

        let updated = self
            .books
            .update(id, patch, OffsetDateTime::now_utc())
            .await
            .map_err(|error| BooksError::from_write(error, &key))?
            .ok_or(BooksError::NotFound)?;

        tracing::info!(book_id = %updated.id, "book updated");
        Ok(updated)
    }

    /// Remove a book, returning what was removed
    pub async fn delete(&self, id: &str) -> Result<Book, BooksError> {
        let id = parse_id(id)?;
        let removed = self.books.delete(id).await?.ok_or(BooksError::NotFound)?;

        tracing::info!(book_id = %removed.id, "book deleted");
        Ok(removed)
    }
}

/// Identifiers that are not UUIDs can never match a record
fn parse_id(raw: &str) -> Result<Uuid, BooksError> {
    Uuid::parse_str(raw.trim()).map_err(|_| BooksError::NotFound)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::books::migrated_db;
    use serde_json::{json, Value};

    async fn service() -> BooksService {
        BooksService::open(&migrated_db().await, BooksSettings::default())
    }

    fn payload(isbn: &str) -> BookInput {
        serde_json::from_value(json!({
            "title": "Gödel, Escher, Bach",
            "author": "Douglas Hofstadter",
            "isbn": isbn,
            "publishedDate": "1979-01-01",
            "publisher": "Basic Books",
            "pages": 777,
            "genre": "Philosophy",
            "description": "An eternal golden braid.",
            "price": "24.5"
        }))
        .unwrap()
    }

    fn patch(value: Value) -> BookInput {
        serde_json::from_value(value).unwrap()
    }

    #[tokio::test]
    async fn create_then_get_round_trips_coerced_values() {
        let service = service().await;

        let created = service.create(&payload("978-0-465-02656-2")).await.unwrap();
        let fetched = service.get(&created.id.to_string()).await.unwrap();

        assert_eq!(fetched, created);
        assert_eq!(fetched.pages, 777);
        assert_eq!(fetched.price.to_string(), "24.50");
        assert_eq!(fetched.stock, 0);
    }

    #[tokio::test]
    async fn duplicate_normalized_isbn_conflicts() {
        let service = service().await;
        service.create(&payload("978-0-465-02656-2")).await.unwrap();

        let err = service.create(&payload("978 0465 026562")).await.unwrap_err();

        assert!(matches!(err, BooksError::Conflict { .. }));
        assert_eq!(service.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn update_isbn_conflicts_only_with_other_records() {
        let service = service().await;
        let first = service.create(&payload("0-306-40615-2")).await.unwrap();
        let second = service.create(&payload("978-0-465-02656-2")).await.unwrap();
        let id = second.id.to_string();

        let err = service
            .update(&id, &patch(json!({ "isbn": "0306406152" })))
            .await
            .unwrap_err();
        assert!(matches!(err, BooksError::Conflict { .. }));

        let same = service
            .update(&id, &patch(json!({ "isbn": "978-0-465-02656-2" })))
            .await
            .unwrap();
        assert_eq!(same.isbn, second.isbn);

        assert_eq!(service.get(&first.id.to_string()).await.unwrap(), first);
    }

    #[tokio::test]
    async fn update_applies_zero_stock_and_keeps_other_fields() {
        let service = service().await;
        let created = service
            .create(&payload("978-0-465-02656-2"))
            .await
            .unwrap();
        let id = created.id.to_string();
        service.update(&id, &patch(json!({ "stock": 7 }))).await.unwrap();

        let updated = service.update(&id, &patch(json!({ "stock": 0 }))).await.unwrap();

        assert_eq!(updated.stock, 0);
        assert_eq!(updated.title, created.title);
        assert_eq!(updated.created_at, created.created_at);
        assert!(updated.updated_at >= created.updated_at);
    }

    #[tokio::test]
    async fn update_checks_existence_before_validation() {
        let service = service().await;

        let err = service
            .update(&uuid::Uuid::now_v7().to_string(), &patch(json!({ "pages": 0 })))
            .await
            .unwrap_err();

        assert!(matches!(err, BooksError::NotFound));
    }

    #[tokio::test]
    async fn delete_twice_is_not_found() {
        let service = service().await;
        let created = service
            .create(&payload("978-0-465-02656-2"))
            .await
            .unwrap();
        let id = created.id.to_string();

        assert_eq!(service.delete(&id).await.unwrap().id, created.id);
        assert!(matches!(
            service.delete(&id).await.unwrap_err(),
            BooksError::NotFound
        ));
        assert!(matches!(
            service.delete("not-a-uuid").await.unwrap_err(),
            BooksError::NotFound
        ));
    }
}
