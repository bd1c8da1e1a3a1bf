use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::validation::normalize_isbn;

/// A book record as stored and returned by the API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Book {
    /// Unique identifier, assigned on create
    pub id: Uuid,
    pub title: String,
    pub author: String,
    /// ISBN as submitted (trimmed); uniqueness is on its normalized form
    pub isbn: String,
    #[serde(with = "time::serde::rfc3339")]
    pub published_date: OffsetDateTime,
    pub publisher: String,
    pub pages: u32,
    pub genre: String,
    pub description: String,
    /// Always carries two fractional digits
    pub price: Decimal,
    pub stock: u32,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl Book {
    /// Normalized ISBN; the key the store keeps unique
    pub fn isbn_key(&self) -> String {
        normalize_isbn(&self.isbn)
    }
}

/// Raw create/update payload.
///
/// Every field is kept as untyped JSON so that wrong types and unparsable
/// numbers surface as field errors from validation instead of body rejections.
/// `null` and missing are equivalent.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookInput {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub isbn: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published_date: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub publisher: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pages: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub genre: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stock: Option<Value>,
}

/// A fully validated book, ready to be stored. Also the payload the client
/// sends for create and edit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewBook {
    pub title: String,
    pub author: String,
    pub isbn: String,
    #[serde(with = "time::serde::rfc3339")]
    pub published_date: OffsetDateTime,
    pub publisher: String,
    pub pages: u32,
    pub genre: String,
    pub description: String,
    pub price: Decimal,
    pub stock: u32,
}

impl NewBook {
    /// Turn into a stored record with a fresh id and timestamps
    pub fn into_book(self, now: OffsetDateTime) -> Book {
        Book {
            id: Uuid::now_v7(),
            title: self.title,
            author: self.author,
            isbn: self.isbn,
            published_date: self.published_date,
            publisher: self.publisher,
            pages: self.pages,
            genre: self.genre,
            description: self.description,
            price: self.price,
            stock: self.stock,
            created_at: now,
            updated_at: now,
        }
    }
}

impl From<NewBook> for BookInput {
    fn from(book: NewBook) -> Self {
        let published_date = book
            .published_date
            .format(&time::format_description::well_known::Rfc3339)
            .ok()
            .map(Value::String);

        Self {
            title: Some(Value::String(book.title)),
            author: Some(Value::String(book.author)),
            isbn: Some(Value::String(book.isbn)),
            published_date,
            publisher: Some(Value::String(book.publisher)),
            pages: Some(Value::from(book.pages)),
            genre: Some(Value::String(book.genre)),
            description: Some(Value::String(book.description)),
            price: Some(Value::String(book.price.to_string())),
            stock: Some(Value::from(book.stock)),
        }
    }
}

/// Validated partial update; `None` leaves the stored value untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BookPatch {
    pub title: Option<String>,
    pub author: Option<String>,
    pub isbn: Option<String>,
    pub published_date: Option<OffsetDateTime>,
    pub publisher: Option<String>,
    pub pages: Option<u32>,
    pub genre: Option<String>,
    pub description: Option<String>,
    pub price: Option<Decimal>,
    pub stock: Option<u32>,
}

impl BookPatch {
    pub fn is_empty(&self) -> bool {
        *self == BookPatch::default()
    }

    /// Apply supplied fields and bump `updated_at`
    pub fn apply(self, book: &mut Book, now: OffsetDateTime) {
        if let Some(title) = self.title {
            book.title = title;
        }
        if let Some(author) = self.author {
            book.author = author;
        }
        if let Some(isbn) = self.isbn {
            book.isbn = isbn;
        }
        if let Some(published_date) = self.published_date {
            book.published_date = published_date;
        }
        if let Some(publisher) = self.publisher {
            book.publisher = publisher;
        }
        if let Some(pages) = self.pages {
            book.pages = pages;
        }
        if let Some(genre) = self.genre {
            book.genre = genre;
        }
        if let Some(description) = self.description {
            book.description = description;
        }
        if let Some(price) = self.price {
            book.price = price;
        }
        if let Some(stock) = self.stock {
            book.stock = stock;
        }
        book.updated_at = now;
    }
}

/// Raw listing query string; parsed leniently into a page request
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListParams {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
}

/// Pagination metadata returned alongside a page of books
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub page: u32,
    pub limit: u32,
    pub total_books: u64,
    pub total_pages: u32,
}

/// Body of `GET /api/book`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookListResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub data: Vec<Book>,
    pub pagination: Pagination,
}
