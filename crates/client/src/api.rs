//! Typed access to the `/api/book` endpoints.

use std::time::Duration;

use async_trait::async_trait;
use mockall::automock;
use reqwest::{Client, Response};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use shelf_model::{
    models::{Book, BookInput, BookListResponse},
    validation::FieldError,
};
use uuid::Uuid;

use crate::error::ClientError;

/// One listing request
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ListQuery {
    pub page: u32,
    pub limit: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
}

#[automock]
#[async_trait]
pub trait BooksApi: Send + Sync {
    /// Fetch one page of books, optionally filtered
    async fn list(&self, query: ListQuery) -> Result<BookListResponse, ClientError>;

    async fn get(&self, id: Uuid) -> Result<Book, ClientError>;

    /// Create a book from a full payload
    async fn create(&self, input: BookInput) -> Result<Book, ClientError>;

    /// Update the supplied fields of a book
    async fn update(&self, id: Uuid, input: BookInput) -> Result<Book, ClientError>;

    /// Delete a book, returning the removed record
    async fn delete(&self, id: Uuid) -> Result<Book, ClientError>;
}

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    data: T,
}

#[derive(Debug, Default, Deserialize)]
struct ErrorEnvelope {
    #[serde(default)]
    message: String,
    #[serde(default)]
    details: Vec<FieldError>,
}

/// [`BooksApi`] over HTTP
#[derive(Debug, Clone)]
pub struct HttpBooksApi {
    http: Client,
    base_url: String,
}

impl HttpBooksApi {
    /// `base_url` is the API root, e.g. `http://localhost:5000/api`
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, ClientError> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|error| ClientError::Network(error.to_string()))?;

        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn books_url(&self) -> String {
        format!("{}/book", self.base_url)
    }

    fn book_url(&self, id: Uuid) -> String {
        format!("{}/book/{}", self.base_url, id)
    }
}

/// Read the success body, or turn a failure envelope into [`ClientError::Server`]
async fn read<T: DeserializeOwned>(response: Response) -> Result<T, ClientError> {
    let status = response.status();

    if status.is_success() {
        return Ok(response.json::<T>().await?);
    }

    let text = response.text().await.unwrap_or_default();
    let envelope = serde_json::from_str::<ErrorEnvelope>(&text).unwrap_or_default();

    tracing::debug!(status = status.as_u16(), message = %envelope.message, "book api request failed");

    Err(ClientError::Server {
        status: status.as_u16(),
        message: envelope.message,
        details: envelope.details,
    })
}

#[async_trait]
impl BooksApi for HttpBooksApi {
    async fn list(&self, query: ListQuery) -> Result<BookListResponse, ClientError> {
        let response = self.http.get(self.books_url()).query(&query).send().await?;
        read(response).await
    }

    async fn get(&self, id: Uuid) -> Result<Book, ClientError> {
        let response = self.http.get(self.book_url(id)).send().await?;
        read::<Envelope<Book>>(response).await.map(|e| e.data)
    }

    async fn create(&self, input: BookInput) -> Result<Book, ClientError> {
        let response = self.http.post(self.books_url()).json(&input).send().await?;
        read::<Envelope<Book>>(response).await.map(|e| e.data)
    }

    async fn update(&self, id: Uuid, input: BookInput) -> Result<Book, ClientError> {
        let response = self.http.patch(self.book_url(id)).json(&input).send().await?;
        read::<Envelope<Book>>(response).await.map(|e| e.data)
    }

    async fn delete(&self, id: Uuid) -> Result<Book, ClientError> {
        let response = self.http.delete(self.book_url(id)).send().await?;
        read::<Envelope<Book>>(response).await.map(|e| e.data)
    }
}
