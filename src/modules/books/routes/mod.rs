//! REST handlers mounted under `/api/book`.

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use shelf_http::{ApiResponse, AppError};

use super::{
    models::{Book, BookInput, BookListResponse, ListParams},
    service::BooksService,
};

type BooksState = State<Arc<BooksService>>;

/// Routes for the books module
pub fn router(service: Arc<BooksService>) -> Router {
    Router::new()
        .route("/", get(list_books).post(create_book))
        .route("/health", get(health_check))
        .route(
            "/{id}",
            get(get_book).patch(update_book).delete(delete_book),
        )
        .with_state(service)
}

fn body(payload: Result<Json<BookInput>, JsonRejection>) -> Result<BookInput, AppError> {
    payload
        .map(|Json(input)| input)
        .map_err(|rejection| AppError::bad_request(rejection.body_text()))
}

async fn health_check() -> &'static str {
    "books module is healthy"
}

async fn create_book(
    State(service): BooksState,
    payload: Result<Json<BookInput>, JsonRejection>,
) -> Result<(StatusCode, ApiResponse<Book>), AppError> {
    let input = body(payload)?;
    let book = service.create(&input).await?;

    Ok(ApiResponse::ok("Book created successfully", book).with_status(StatusCode::CREATED))
}

async fn list_books(
    State(service): BooksState,
    Query(params): Query<ListParams>,
) -> Result<Json<BookListResponse>, AppError> {
    let (data, pagination) = service.list(&params).await?;

    Ok(Json(BookListResponse {
        success: true,
        message: None,
        data,
        pagination,
    }))
}

async fn get_book(
    State(service): BooksState,
    Path(id): Path<String>,
) -> Result<ApiResponse<Book>, AppError> {
    let book = service.get(&id).await?;
    Ok(ApiResponse::ok("Book retrieved successfully", book))
}

async fn update_book(
    State(service): BooksState,
    Path(id): Path<String>,
    payload: Result<Json<BookInput>, JsonRejection>,
) -> Result<ApiResponse<Book>, AppError> {
    let input = body(payload)?;
    let book = service.update(&id, &input).await?;
    Ok(ApiResponse::ok("Book updated successfully", book))
}

async fn delete_book(
    State(service): BooksState,
    Path(id): Path<String>,
) -> Result<ApiResponse<Book>, AppError> {
    let book = service.delete(&id).await?;
    Ok(ApiResponse::ok("Book deleted successfully", book))
}
