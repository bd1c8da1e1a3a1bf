//! Books Repository

use std::str::FromStr;

use rust_decimal::Decimal;
use shelf_db::DbError;
use sqlx::{
    query, query_scalar,
    sqlite::{SqlitePool, SqliteRow},
    Row,
};
use time::{format_description::well_known::Rfc3339, OffsetDateTime};
use uuid::Uuid;

use super::{
    models::{Book, BookPatch},
    query::search_text,
};

const GET_BOOK_SQL: &str = include_str!("sql/get_book.sql");
const GET_BOOK_BY_ISBN_KEY_SQL: &str = include_str!("sql/get_book_by_isbn_key.sql");
const COUNT_BOOKS_SQL: &str = include_str!("sql/count_books.sql");
const LIST_BOOKS_SQL: &str = include_str!("sql/list_books.sql");
const CREATE_BOOK_SQL: &str = include_str!("sql/create_book.sql");
const UPDATE_BOOK_SQL: &str = include_str!("sql/update_book.sql");
const DELETE_BOOK_SQL: &str = include_str!("sql/delete_book.sql");

#[derive(Debug, Clone)]
pub struct BooksRepository {
    pool: SqlitePool,
}

impl BooksRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn get(&self, id: Uuid) -> Result<Option<Book>, DbError> {
        let book = query(GET_BOOK_SQL)
            .bind(id.to_string())
            .try_map(decode_book)
            .fetch_optional(&self.pool)
            .await?;
        Ok(book)
    }

    pub async fn get_by_isbn_key(&self, key: &str) -> Result<Option<Book>, DbError> {
        let book = query(GET_BOOK_BY_ISBN_KEY_SQL)
            .bind(key)
            .try_map(decode_book)
            .fetch_optional(&self.pool)
            .await?;
        Ok(book)
    }

    /// Number of records whose search text contains `needle` (all when `None`)
    pub async fn count(&self, needle: Option<&str>) -> Result<u64, DbError> {
        let count: i64 = query_scalar(COUNT_BOOKS_SQL)
            .bind(needle)
            .bind(needle)
            .fetch_one(&self.pool)
            .await?;
        Ok(u64::try_from(count).unwrap_or_default())
    }

    /// One page of matching records, newest first
    pub async fn list(
        &self,
        needle: Option<&str>,
        limit: u32,
        offset: usize,
    ) -> Result<Vec<Book>, DbError> {
        let books = query(LIST_BOOKS_SQL)
            .bind(needle)
            .bind(needle)
            .bind(i64::from(limit))
            .bind(i64::try_from(offset).unwrap_or(i64::MAX))
            .try_map(decode_book)
            .fetch_all(&self.pool)
            .await?;
        Ok(books)
    }

    /// Insert a record. A taken isbn key fails with [`DbError::UniqueViolation`].
    pub async fn insert(&self, book: &Book) -> Result<Book, DbError> {
        let columns = Columns::of(book)?;

        let stored = query(CREATE_BOOK_SQL)
            .bind(columns.id.as_str())
            .bind(book.title.as_str())
            .bind(book.author.as_str())
            .bind(book.isbn.as_str())
            .bind(columns.isbn_key.as_str())
            .bind(columns.published_date.as_str())
            .bind(book.publisher.as_str())
            .bind(i64::from(book.pages))
            .bind(book.genre.as_str())
            .bind(book.description.as_str())
            .bind(columns.price.as_str())
            .bind(i64::from(book.stock))
            .bind(columns.search_text.as_str())
            .bind(columns.created_at)
            .bind(columns.updated_at)
            .try_map(decode_book)
            .fetch_one(&self.pool)
            .await?;

        Ok(stored)
    }

    /// Read, patch and write back one record inside a transaction.
    /// `Ok(None)` when no record has `id`.
    pub async fn update(
        &self,
        id: Uuid,
        patch: BookPatch,
        now: OffsetDateTime,
    ) -> Result<Option<Book>, DbError> {
        let mut tx = self.pool.begin().await?;

        let Some(mut book) = query(GET_BOOK_SQL)
            .bind(id.to_string())
            .try_map(decode_book)
            .fetch_optional(&mut *tx)
            .await?
        else {
            return Ok(None);
        };

        patch.apply(&mut book, now);
        let columns = Columns::of(&book)?;

        let updated = query(UPDATE_BOOK_SQL)
            .bind(book.title.as_str())
            .bind(book.author.as_str())
            .bind(book.isbn.as_str())
            .bind(columns.isbn_key.as_str())
            .bind(columns.published_date.as_str())
            .bind(book.publisher.as_str())
            .bind(i64::from(book.pages))
            .bind(book.genre.as_str())
            .bind(book.description.as_str())
            .bind(columns.price.as_str())
            .bind(i64::from(book.stock))
            .bind(columns.search_text.as_str())
            .bind(columns.updated_at)
            .bind(columns.id.as_str())
            .try_map(decode_book)
            .fetch_optional(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(updated)
    }

    /// Delete a record, returning it if it existed
    pub async fn delete(&self, id: Uuid) -> Result<Option<Book>, DbError> {
        let removed = query(DELETE_BOOK_SQL)
            .bind(id.to_string())
            .try_map(decode_book)
            .fetch_optional(&self.pool)
            .await?;
        Ok(removed)
    }
}

/// Stored forms of the fields that are not plain text
struct Columns {
    id: String,
    isbn_key: String,
    published_date: String,
    price: String,
    search_text: String,
    created_at: i64,
    updated_at: i64,
}

impl Columns {
    fn of(book: &Book) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: book.id.to_string(),
            isbn_key: book.isbn_key(),
            published_date: book.published_date.format(&Rfc3339).map_err(encode_error)?,
            price: book.price.to_string(),
            search_text: search_text(book),
            created_at: unix_nanos(book.created_at)?,
            updated_at: unix_nanos(book.updated_at)?,
        })
    }
}

fn unix_nanos(at: OffsetDateTime) -> Result<i64, sqlx::Error> {
    i64::try_from(at.unix_timestamp_nanos()).map_err(encode_error)
}

fn encode_error(source: impl std::error::Error + Send + Sync + 'static) -> sqlx::Error {
    sqlx::Error::Encode(Box::new(source))
}

fn decode_error(column: &str, source: impl std::error::Error + Send + Sync + 'static) -> sqlx::Error {
    sqlx::Error::ColumnDecode {
        index: column.to_string(),
        source: Box::new(source),
    }
}

fn timestamp(row: &SqliteRow, column: &str) -> Result<OffsetDateTime, sqlx::Error> {
    let nanos: i64 = row.try_get(column)?;
    OffsetDateTime::from_unix_timestamp_nanos(i128::from(nanos))
        .map_err(|e| decode_error(column, e))
}

fn unsigned_column(row: &SqliteRow, column: &str) -> Result<u32, sqlx::Error> {
    let value: i64 = row.try_get(column)?;
    u32::try_from(value).map_err(|e| decode_error(column, e))
}

fn decode_book(row: SqliteRow) -> Result<Book, sqlx::Error> {
    let id: String = row.try_get("id")?;
    let published_date: String = row.try_get("published_date")?;
    let price: String = row.try_get("price")?;

    Ok(Book {
        id: Uuid::parse_str(&id).map_err(|e| decode_error("id", e))?,
        title: row.try_get("title")?,
        author: row.try_get("author")?,
        isbn: row.try_get("isbn")?,
        published_date: OffsetDateTime::parse(&published_date, &Rfc3339)
            .map_err(|e| decode_error("published_date", e))?,
        publisher: row.try_get("publisher")?,
        pages: unsigned_column(&row, "pages")?,
        genre: row.try_get("genre")?,
        description: row.try_get("description")?,
        price: Decimal::from_str(&price).map_err(|e| decode_error("price", e))?,
        stock: unsigned_column(&row, "stock")?,
        created_at: timestamp(&row, "created_at")?,
        updated_at: timestamp(&row, "updated_at")?,
    })
}
